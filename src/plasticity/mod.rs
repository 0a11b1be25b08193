//! Plasticity policy: how connection weights change.
//!
//! Pure math over an immutable configuration — no I/O. The service asks
//! this module for effective amounts; it never writes the graph itself.
//!
//! Three independent knobs shape every change:
//!
//! 1. A per-context base amount (strengthen, weaken, hebbian, retrieval,
//!    decay), multiplied by the master `learning_rate`.
//! 2. A plasticity [`Curve`] that scales the amount by the connection's
//!    current strength (harder or easier to move near the bounds).
//! 3. Strength bounds `[min_strength, max_strength]` that every write
//!    clamps to.
//!
//! Time-based decay has its own curve and half-life, measured in
//! maintenance cycles rather than wall-clock time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::models::Curve;
use crate::{Error, Result};

/// Semantic similarity hook: `(content_a, content_b) -> similarity in [0, 1]`.
///
/// Returning `None` means the comparison failed; the caller falls back to
/// the configured base strength. Never serialized.
pub type SimilarityFn = Arc<dyn Fn(&str, &str) -> Option<f64> + Send + Sync>;

/// Operation context a plasticity amount is computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlasticityContext {
    /// Explicit strengthen operation.
    Strengthen,
    /// Explicit weaken operation.
    Weaken,
    /// Co-access (Hebbian) strengthening.
    Hebbian,
    /// Retrieval-induced strengthening.
    Retrieval,
    /// Time-based decay.
    Decay,
}

impl PlasticityContext {
    /// True for contexts that increase strength.
    #[must_use]
    pub const fn is_increase(self) -> bool {
        matches!(self, Self::Strengthen | Self::Hebbian | Self::Retrieval)
    }
}

/// Configuration for brain-like plasticity behavior.
///
/// Design principles:
/// - Independent context-specific amounts for each operation type
/// - Symmetrical curves for strengthening and weakening
/// - Clear separation: decay (time-based) vs weaken (explicit action)
/// - Semantic similarity can only boost initial strength, never weaken
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlasticityConfig {
    /// Global multiplier for all plasticity operations (0 disables).
    pub learning_rate: f64,

    /// Base amount for explicit strengthen operations.
    pub strengthen_amount: f64,
    /// Base amount for explicit weaken operations.
    pub weaken_amount: f64,
    /// Base amount for co-access strengthening.
    pub hebbian_amount: f64,
    /// Base amount for retrieval-induced changes.
    pub retrieval_amount: f64,
    /// Base amount for time-based decay.
    pub decay_amount: f64,

    /// Starting strength for user-created connections.
    pub initial_strength_explicit: f64,
    /// Starting strength for Hebbian/emergent connections.
    pub initial_strength_implicit: f64,
    /// Whether to boost initial strength with the similarity hook.
    pub use_semantic_similarity: bool,
    /// Similarity hook; set programmatically, never serialized.
    #[serde(skip)]
    pub similarity_fn: Option<SimilarityFn>,

    /// Connection strength ceiling.
    pub max_strength: f64,
    /// Connection strength floor.
    pub min_strength: f64,

    /// How current strength affects the rate of change.
    pub curve: Curve,
    /// Curve intensity (0.1 = steep, 0.9 = gentle); clamped to [0.1, 0.9].
    pub curve_steepness: f64,

    /// How elapsed cycles affect decay.
    pub decay_curve: Curve,
    /// Fraction of 100 cycles for the half-life (0.1 = 10 cycles).
    pub decay_half_life: f64,
    /// Only connections below this strength decay, unless `decay_all`.
    pub decay_threshold: f64,
    /// If true, all connections decay regardless of strength.
    pub decay_all: bool,

    /// Connections at or below this strength are pruned.
    pub prune_threshold: f64,
    /// Automatically prune during decay operations.
    pub auto_prune: bool,

    /// Strengthen incoming connections when a memory is retrieved.
    pub retrieval_strengthens: bool,
    /// Weaken related-but-not-accessed memories on retrieval.
    pub retrieval_weakens_competitors: bool,
    /// Scale factor for competitor weakening.
    pub competitor_distance: f64,

    /// Create new links between co-accessed memories.
    pub hebbian_creates_connections: bool,
}

impl Default for PlasticityConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1.0,
            strengthen_amount: 0.1,
            weaken_amount: 0.1,
            hebbian_amount: 0.05,
            retrieval_amount: 0.02,
            decay_amount: 0.05,
            initial_strength_explicit: 0.5,
            initial_strength_implicit: 0.3,
            use_semantic_similarity: false,
            similarity_fn: None,
            max_strength: 1.0,
            min_strength: 0.0,
            curve: Curve::Linear,
            curve_steepness: 0.5,
            decay_curve: Curve::Exponential,
            decay_half_life: 0.1,
            decay_threshold: 0.5,
            decay_all: false,
            prune_threshold: 0.01,
            auto_prune: true,
            retrieval_strengthens: true,
            retrieval_weakens_competitors: false,
            competitor_distance: 0.1,
            hebbian_creates_connections: true,
        }
    }
}

impl fmt::Debug for PlasticityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlasticityConfig")
            .field("learning_rate", &self.learning_rate)
            .field("strengthen_amount", &self.strengthen_amount)
            .field("weaken_amount", &self.weaken_amount)
            .field("hebbian_amount", &self.hebbian_amount)
            .field("retrieval_amount", &self.retrieval_amount)
            .field("decay_amount", &self.decay_amount)
            .field("initial_strength_explicit", &self.initial_strength_explicit)
            .field("initial_strength_implicit", &self.initial_strength_implicit)
            .field("use_semantic_similarity", &self.use_semantic_similarity)
            .field("max_strength", &self.max_strength)
            .field("min_strength", &self.min_strength)
            .field("curve", &self.curve)
            .field("curve_steepness", &self.curve_steepness)
            .field("decay_curve", &self.decay_curve)
            .field("decay_half_life", &self.decay_half_life)
            .field("decay_threshold", &self.decay_threshold)
            .field("decay_all", &self.decay_all)
            .field("prune_threshold", &self.prune_threshold)
            .field("auto_prune", &self.auto_prune)
            .field("retrieval_strengthens", &self.retrieval_strengthens)
            .field(
                "retrieval_weakens_competitors",
                &self.retrieval_weakens_competitors,
            )
            .field("competitor_distance", &self.competitor_distance)
            .field(
                "hebbian_creates_connections",
                &self.hebbian_creates_connections,
            )
            .finish_non_exhaustive()
    }
}

impl PlasticityConfig {
    /// Balanced default configuration.
    #[must_use]
    pub fn default_preset() -> Self {
        Self::default()
    }

    /// Fast learning with quick adaptation.
    #[must_use]
    pub fn aggressive_learning() -> Self {
        Self {
            learning_rate: 1.0,
            strengthen_amount: 0.15,
            hebbian_amount: 0.1,
            retrieval_amount: 0.05,
            decay_threshold: 0.3,
            ..Self::default()
        }
    }

    /// Slow, stable learning with gradual changes.
    #[must_use]
    pub fn conservative_learning() -> Self {
        Self {
            learning_rate: 0.5,
            curve: Curve::Exponential,
            decay_threshold: 0.7,
            prune_threshold: 0.005,
            ..Self::default()
        }
    }

    /// Disable all automatic plasticity (manual operations only).
    #[must_use]
    pub fn no_plasticity() -> Self {
        Self {
            learning_rate: 0.0,
            retrieval_strengthens: false,
            retrieval_weakens_competitors: false,
            auto_prune: false,
            ..Self::default()
        }
    }

    /// Aggressive forgetting for memory-pressure scenarios.
    #[must_use]
    pub fn high_decay() -> Self {
        Self {
            decay_amount: 0.1,
            decay_threshold: 0.7,
            decay_all: true,
            prune_threshold: 0.05,
            decay_half_life: 0.05,
            ..Self::default()
        }
    }

    /// Looks up a preset by name.
    #[must_use]
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::default_preset()),
            "aggressive_learning" => Some(Self::aggressive_learning()),
            "conservative_learning" => Some(Self::conservative_learning()),
            "no_plasticity" => Some(Self::no_plasticity()),
            "high_decay" => Some(Self::high_decay()),
            _ => None,
        }
    }

    /// Sets the semantic similarity hook.
    pub fn set_similarity_fn(&mut self, f: SimilarityFn) {
        self.similarity_fn = Some(f);
    }

    fn context_amount(&self, context: PlasticityContext) -> f64 {
        match context {
            PlasticityContext::Strengthen => self.strengthen_amount,
            PlasticityContext::Weaken => self.weaken_amount,
            PlasticityContext::Hebbian => self.hebbian_amount,
            PlasticityContext::Retrieval => self.retrieval_amount,
            PlasticityContext::Decay => self.decay_amount,
        }
    }

    /// Applies the plasticity curve to a base amount.
    fn apply_curve(&self, amount: f64, current_strength: f64, for_increase: bool) -> f64 {
        if self.curve == Curve::Linear {
            return amount;
        }

        // Convert 0-1 steepness to effective exponent (0.1 -> 10, 0.5 -> 2, 0.9 -> 1.1)
        let steepness = self.curve_steepness.clamp(0.1, 0.9);
        let exponent = 1.0 / steepness;

        if self.curve == Curve::Exponential {
            let factor = if for_increase {
                // Harder to strengthen already-strong connections
                1.0 - current_strength.powf(exponent)
            } else {
                // Harder to weaken already-weak connections (symmetrical)
                current_strength.powf(exponent)
            };
            return amount * factor.max(0.1);
        }

        // Logarithmic: slower changes near the starting point, faster near limits
        let factor = if for_increase {
            (1.0 - steepness) + current_strength * steepness
        } else {
            steepness + (1.0 - current_strength) * (1.0 - steepness)
        };
        amount * factor
    }

    /// Effective plasticity amount for a context at a given current strength.
    ///
    /// `base = context_amount * learning_rate`, then the curve scales it:
    /// increase contexts (strengthen, hebbian, retrieval) use the curve
    /// directly, decrease contexts (weaken, decay) use its inverse.
    #[must_use]
    pub fn effective_amount(&self, context: PlasticityContext, current_strength: f64) -> f64 {
        let base = self.context_amount(context) * self.learning_rate;
        self.apply_curve(base, current_strength, context.is_increase())
    }

    /// Decay amount after `cycles` maintenance cycles.
    ///
    /// Connections above `decay_threshold` do not decay unless `decay_all`
    /// is set. The exponential curve is half-life based: the half-life in
    /// cycles is `max(1, floor(decay_half_life * 100))`.
    #[must_use]
    pub fn effective_decay(&self, current_strength: f64, cycles: u64) -> f64 {
        if current_strength > self.decay_threshold && !self.decay_all {
            return 0.0;
        }

        let base = self.decay_amount * self.learning_rate;
        let cycles_f = cycles as f64;

        match self.decay_curve {
            Curve::Linear => (base * cycles_f).min(1.0),
            Curve::Exponential => {
                let half_life_cycles = ((self.decay_half_life * 100.0).floor()).max(1.0);
                current_strength * (1.0 - 0.5_f64.powf(cycles_f / half_life_cycles))
            }
            Curve::Logarithmic => (base * cycles_f.ln_1p()).min(1.0),
        }
    }

    /// Initial strength for a new connection.
    ///
    /// Starts from the explicit or implicit base. When semantic similarity
    /// is enabled and both contents are available, the similarity scales the
    /// headroom between base and `max_strength`; a failed comparison falls
    /// back to the base silently. Similarity never reduces the strength.
    #[must_use]
    pub fn initial_strength(
        &self,
        explicit: bool,
        content_a: Option<&str>,
        content_b: Option<&str>,
    ) -> f64 {
        let mut base = if explicit {
            self.initial_strength_explicit
        } else {
            self.initial_strength_implicit
        };

        if self.use_semantic_similarity {
            if let (Some(f), Some(a), Some(b)) = (&self.similarity_fn, content_a, content_b) {
                if let Some(similarity) = f(a, b) {
                    let headroom = self.max_strength - base;
                    base += headroom * similarity;
                }
            }
        }

        base.clamp(self.min_strength, self.max_strength)
    }

    /// Serializes the configuration to a flat key/value map.
    ///
    /// Enum values become their string forms; the similarity hook is
    /// omitted.
    #[must_use]
    pub fn to_map(&self) -> serde_json::Map<String, serde_json::Value> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        }
    }

    /// Deserializes a configuration from a flat key/value map.
    ///
    /// Missing keys take their defaults; unknown keys are ignored. The
    /// similarity hook cannot be restored from a document and stays unset.
    pub fn from_map(map: &serde_json::Map<String, serde_json::Value>) -> Result<Self> {
        serde_json::from_value(serde_json::Value::Object(map.clone()))
            .map_err(|e| Error::InvalidInput(format!("invalid plasticity config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_default_constants() {
        let c = PlasticityConfig::default();
        assert_eq!(c.learning_rate, 1.0);
        assert_eq!(c.strengthen_amount, 0.1);
        assert_eq!(c.hebbian_amount, 0.05);
        assert_eq!(c.retrieval_amount, 0.02);
        assert_eq!(c.initial_strength_explicit, 0.5);
        assert_eq!(c.initial_strength_implicit, 0.3);
        assert_eq!(c.prune_threshold, 0.01);
        assert!(c.auto_prune);
        assert!(c.retrieval_strengthens);
        assert!(!c.retrieval_weakens_competitors);
    }

    #[test]
    fn test_linear_curve_is_identity() {
        let c = PlasticityConfig::default();
        let amount = c.effective_amount(PlasticityContext::Strengthen, 0.9);
        assert!((amount - 0.1).abs() < EPSILON);
        let amount = c.effective_amount(PlasticityContext::Strengthen, 0.1);
        assert!((amount - 0.1).abs() < EPSILON);
    }

    #[test]
    fn test_learning_rate_scales_everything() {
        let c = PlasticityConfig {
            learning_rate: 0.5,
            ..PlasticityConfig::default()
        };
        let amount = c.effective_amount(PlasticityContext::Strengthen, 0.5);
        assert!((amount - 0.05).abs() < EPSILON);

        let zero = PlasticityConfig::no_plasticity();
        for ctx in [
            PlasticityContext::Strengthen,
            PlasticityContext::Weaken,
            PlasticityContext::Hebbian,
            PlasticityContext::Retrieval,
            PlasticityContext::Decay,
        ] {
            assert_eq!(zero.effective_amount(ctx, 0.5), 0.0);
        }
    }

    #[test]
    fn test_exponential_curve_saturates_strong_connections() {
        let c = PlasticityConfig {
            curve: Curve::Exponential,
            curve_steepness: 0.5,
            ..PlasticityConfig::default()
        };
        // exponent = 2; at s=0.9: factor = 1 - 0.81 = 0.19
        let strong = c.effective_amount(PlasticityContext::Strengthen, 0.9);
        assert!((strong - 0.1 * 0.19).abs() < EPSILON);
        // at s=0.1: factor = 1 - 0.01 = 0.99
        let weak = c.effective_amount(PlasticityContext::Strengthen, 0.1);
        assert!((weak - 0.1 * 0.99).abs() < EPSILON);
        assert!(weak > strong);
    }

    #[test]
    fn test_exponential_curve_floor() {
        let c = PlasticityConfig {
            curve: Curve::Exponential,
            curve_steepness: 0.5,
            ..PlasticityConfig::default()
        };
        // At s=1.0 the raw factor is 0; the 0.1 floor applies.
        let amount = c.effective_amount(PlasticityContext::Strengthen, 1.0);
        assert!((amount - 0.1 * 0.1).abs() < EPSILON);
    }

    #[test]
    fn test_exponential_weaken_is_symmetric() {
        let c = PlasticityConfig {
            curve: Curve::Exponential,
            curve_steepness: 0.5,
            ..PlasticityConfig::default()
        };
        // Weakening uses s^k: hard to weaken weak connections.
        let weak = c.effective_amount(PlasticityContext::Weaken, 0.1);
        let strong = c.effective_amount(PlasticityContext::Weaken, 0.9);
        assert!(strong > weak);
        assert!((strong - 0.1 * 0.81).abs() < EPSILON);
    }

    #[test]
    fn test_logarithmic_curve() {
        let c = PlasticityConfig {
            curve: Curve::Logarithmic,
            curve_steepness: 0.5,
            ..PlasticityConfig::default()
        };
        // for_increase: factor = 0.5 + s * 0.5
        let amount = c.effective_amount(PlasticityContext::Strengthen, 0.8);
        assert!((amount - 0.1 * 0.9).abs() < EPSILON);
        // for_decrease: factor = 0.5 + (1 - s) * 0.5
        let amount = c.effective_amount(PlasticityContext::Weaken, 0.8);
        assert!((amount - 0.1 * 0.6).abs() < EPSILON);
    }

    #[test_case(0.05 ; "below range clamps to steep")]
    #[test_case(0.95 ; "above range clamps to gentle")]
    fn test_steepness_clamped(steepness: f64) {
        let c = PlasticityConfig {
            curve: Curve::Exponential,
            curve_steepness: steepness,
            ..PlasticityConfig::default()
        };
        let amount = c.effective_amount(PlasticityContext::Strengthen, 0.5);
        assert!(amount.is_finite());
        assert!(amount > 0.0);
    }

    #[test]
    fn test_decay_threshold_gates_decay() {
        let c = PlasticityConfig::default();
        // Above the threshold, no decay.
        assert_eq!(c.effective_decay(0.8, 1), 0.0);
        // Below the threshold, decay applies.
        assert!(c.effective_decay(0.3, 1) > 0.0);

        let all = PlasticityConfig {
            decay_all: true,
            ..PlasticityConfig::default()
        };
        assert!(all.effective_decay(0.8, 1) > 0.0);
    }

    #[test]
    fn test_linear_decay_accumulates_and_caps() {
        let c = PlasticityConfig {
            decay_curve: Curve::Linear,
            ..PlasticityConfig::default()
        };
        assert!((c.effective_decay(0.3, 2) - 0.1).abs() < EPSILON);
        assert_eq!(c.effective_decay(0.3, 1000), 1.0);
    }

    #[test]
    fn test_exponential_decay_half_life() {
        let c = PlasticityConfig::default();
        // half_life = 0.1 -> 10 cycles; after 10 cycles half the strength decays.
        let decay = c.effective_decay(0.4, 10);
        assert!((decay - 0.2).abs() < EPSILON);
        // After 0 cycles, nothing decays.
        assert_eq!(c.effective_decay(0.4, 0), 0.0);
    }

    #[test]
    fn test_logarithmic_decay() {
        let c = PlasticityConfig {
            decay_curve: Curve::Logarithmic,
            ..PlasticityConfig::default()
        };
        let one = c.effective_decay(0.3, 1);
        let many = c.effective_decay(0.3, 100);
        assert!(one < many);
        assert!((one - 0.05 * 2.0_f64.ln()).abs() < EPSILON);
    }

    #[test]
    fn test_initial_strength_bases() {
        let c = PlasticityConfig::default();
        assert_eq!(c.initial_strength(true, None, None), 0.5);
        assert_eq!(c.initial_strength(false, None, None), 0.3);
    }

    #[test]
    fn test_similarity_boosts_headroom() {
        let mut c = PlasticityConfig {
            use_semantic_similarity: true,
            ..PlasticityConfig::default()
        };
        c.set_similarity_fn(Arc::new(|_, _| Some(0.8)));
        // base 0.5, headroom 0.5, boost 0.4 -> 0.9
        let s = c.initial_strength(true, Some("a"), Some("b"));
        assert!((s - 0.9).abs() < EPSILON);
        // Missing content skips the hook.
        assert_eq!(c.initial_strength(true, Some("a"), None), 0.5);
    }

    #[test]
    fn test_similarity_failure_falls_back() {
        let mut c = PlasticityConfig {
            use_semantic_similarity: true,
            ..PlasticityConfig::default()
        };
        c.set_similarity_fn(Arc::new(|_, _| None));
        assert_eq!(c.initial_strength(false, Some("a"), Some("b")), 0.3);
    }

    #[test]
    fn test_similarity_never_reduces() {
        let mut c = PlasticityConfig {
            use_semantic_similarity: true,
            ..PlasticityConfig::default()
        };
        c.set_similarity_fn(Arc::new(|_, _| Some(0.0)));
        assert_eq!(c.initial_strength(true, Some("a"), Some("b")), 0.5);
    }

    #[test_case("default" ; "default preset")]
    #[test_case("aggressive_learning" ; "aggressive preset")]
    #[test_case("conservative_learning" ; "conservative preset")]
    #[test_case("no_plasticity" ; "disabled preset")]
    #[test_case("high_decay" ; "forgetful preset")]
    fn test_presets_resolve(name: &str) {
        assert!(PlasticityConfig::preset(name).is_some());
    }

    #[test]
    fn test_unknown_preset() {
        assert!(PlasticityConfig::preset("warp_speed").is_none());
    }

    #[test]
    fn test_no_plasticity_preset_disables_effects() {
        let c = PlasticityConfig::no_plasticity();
        assert_eq!(c.learning_rate, 0.0);
        assert!(!c.retrieval_strengthens);
        assert!(!c.auto_prune);
    }

    #[test]
    fn test_map_round_trip() {
        let original = PlasticityConfig {
            curve: Curve::Logarithmic,
            decay_curve: Curve::Linear,
            learning_rate: 0.7,
            decay_all: true,
            ..PlasticityConfig::default()
        };
        let map = original.to_map();
        assert_eq!(map["curve"], "logarithmic");
        assert_eq!(map["decay_curve"], "linear");
        assert!(!map.contains_key("similarity_fn"));

        let restored = PlasticityConfig::from_map(&map).unwrap();
        assert_eq!(restored.curve, Curve::Logarithmic);
        assert_eq!(restored.learning_rate, 0.7);
        assert!(restored.decay_all);
        assert!(restored.similarity_fn.is_none());
    }

    #[test]
    fn test_from_map_defaults_missing_keys() {
        let mut map = serde_json::Map::new();
        map.insert("learning_rate".into(), serde_json::json!(0.25));
        let c = PlasticityConfig::from_map(&map).unwrap();
        assert_eq!(c.learning_rate, 0.25);
        assert_eq!(c.strengthen_amount, 0.1);
    }

    #[test]
    fn test_from_map_rejects_bad_values() {
        let mut map = serde_json::Map::new();
        map.insert("curve".into(), serde_json::json!("sideways"));
        assert!(PlasticityConfig::from_map(&map).is_err());
    }
}
