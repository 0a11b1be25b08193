//! Non-memory node types: associations, trackers, and compartments.
//!
//! Interned types (Concept, Keyword, Topic, Entity, Source, Context,
//! Preference, Compartment) carry an identity tuple; creating one whose
//! tuple already exists in the graph returns the existing node's id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{validate_range, validate_required};
use crate::models::{
    ContextKind, ContextStatus, ContradictionStatus, EntityKind, GoalStatus, Permeability,
    QuestionStatus, SourceKind, TemporalKind,
};
use crate::Result;

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// An abstract idea a memory can be about. Interned by `name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Concept {
    /// Unique identifier.
    pub id: String,
    /// Identity: the concept name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
}

impl Concept {
    /// Creates a concept with a validated name.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_required(&name, "name")?;
        Ok(Self {
            id: new_id(),
            name,
            description: String::new(),
            created: Utc::now(),
        })
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// A retrieval keyword. Interned by `term`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Keyword {
    /// Unique identifier.
    pub id: String,
    /// Identity: the keyword term.
    pub term: String,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
}

impl Keyword {
    /// Creates a keyword with a validated term.
    pub fn new(term: impl Into<String>) -> Result<Self> {
        let term = term.into();
        validate_required(&term, "term")?;
        Ok(Self {
            id: new_id(),
            term,
            created: Utc::now(),
        })
    }
}

/// A broad subject area. Interned by `name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    /// Unique identifier.
    pub id: String,
    /// Identity: the topic name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
}

impl Topic {
    /// Creates a topic with a validated name.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_required(&name, "name")?;
        Ok(Self {
            id: new_id(),
            name,
            description: String::new(),
            created: Utc::now(),
        })
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// A named real-world entity. Interned by `(name, kind)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Unique identifier.
    pub id: String,
    /// Identity part 1: the entity name.
    pub name: String,
    /// Identity part 2: the entity kind.
    pub kind: EntityKind,
    /// Free-form description.
    pub description: String,
    /// Alternative names.
    pub aliases: Vec<String>,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
}

impl Entity {
    /// Creates an entity with a validated name.
    pub fn new(name: impl Into<String>, kind: EntityKind) -> Result<Self> {
        let name = name.into();
        validate_required(&name, "name")?;
        Ok(Self {
            id: new_id(),
            name,
            kind,
            description: String::new(),
            aliases: Vec::new(),
            created: Utc::now(),
        })
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the aliases.
    #[must_use]
    pub fn with_aliases(mut self, aliases: Vec<String>) -> Self {
        self.aliases = aliases;
        self
    }
}

/// Provenance for a memory. Interned by `(reference, kind)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    /// Unique identifier.
    pub id: String,
    /// Identity part 1: the source kind.
    pub kind: SourceKind,
    /// Identity part 2: the reference (path, URL, conversation id, ...).
    pub reference: String,
    /// Human-readable title.
    pub title: String,
    /// Reliability of the source, in [0, 1].
    pub reliability: f64,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
}

impl Source {
    /// Creates a source with a validated reference.
    pub fn new(kind: SourceKind, reference: impl Into<String>) -> Result<Self> {
        let reference = reference.into();
        validate_required(&reference, "reference")?;
        Ok(Self {
            id: new_id(),
            kind,
            reference,
            title: String::new(),
            reliability: 1.0,
            created: Utc::now(),
        })
    }

    /// Sets the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the reliability, validating it against [0, 1].
    pub fn with_reliability(mut self, reliability: f64) -> Result<Self> {
        self.reliability = validate_range(reliability, 0.0, 1.0, "reliability")?;
        Ok(self)
    }
}

/// A decision the agent or user made.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    /// Unique identifier.
    pub id: String,
    /// What was decided.
    pub description: String,
    /// Why it was decided.
    pub rationale: String,
    /// When it was decided.
    pub date: DateTime<Utc>,
    /// Observed outcome, if any.
    pub outcome: String,
    /// Whether the decision can be reversed.
    pub reversible: bool,
}

impl Decision {
    /// Creates a decision.
    #[must_use]
    pub fn new(description: impl Into<String>, rationale: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            description: description.into(),
            rationale: rationale.into(),
            date: Utc::now(),
            outcome: String::new(),
            reversible: true,
        }
    }
}

/// A goal being pursued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    /// Unique identifier.
    pub id: String,
    /// What the goal is.
    pub description: String,
    /// Lifecycle status.
    pub status: GoalStatus,
    /// Priority; lower sorts first.
    pub priority: i64,
    /// Optional target date.
    pub target_date: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
}

impl Goal {
    /// Creates an active goal with default priority.
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            description: description.into(),
            status: GoalStatus::Active,
            priority: 5,
            target_date: None,
            created: Utc::now(),
        }
    }

    /// Sets the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }
}

/// An open question the agent is tracking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// Unique identifier.
    pub id: String,
    /// The question text.
    pub text: String,
    /// Answer status.
    pub status: QuestionStatus,
    /// When the question was answered, if it was.
    pub answered_date: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
}

impl Question {
    /// Creates an open question.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            text: text.into(),
            status: QuestionStatus::Open,
            answered_date: None,
            created: Utc::now(),
        }
    }
}

/// A working context. Interned by `(name, kind)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Context {
    /// Unique identifier.
    pub id: String,
    /// Identity part 1: the context name.
    pub name: String,
    /// Identity part 2: the context kind.
    pub kind: ContextKind,
    /// Free-form description.
    pub description: String,
    /// Lifecycle status.
    pub status: ContextStatus,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
}

impl Context {
    /// Creates an active context.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ContextKind) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            kind,
            description: String::new(),
            status: ContextStatus::Active,
            created: Utc::now(),
        }
    }
}

/// An observed preference. Interned by `(category, preference)`.
///
/// Unlike the other interned types, a repeat create merges: `observations`
/// increments and `strength` becomes the running average of all observed
/// strengths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preference {
    /// Unique identifier.
    pub id: String,
    /// Identity part 1: the preference category.
    pub category: String,
    /// Identity part 2: the preference itself.
    pub preference: String,
    /// Observed strength in [-1, 1]; negative is dislike.
    pub strength: f64,
    /// Number of times the preference was observed.
    pub observations: i64,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
}

impl Preference {
    /// Creates a preference with validated category and text.
    pub fn new(category: impl Into<String>, preference: impl Into<String>) -> Result<Self> {
        let category = category.into();
        let preference = preference.into();
        validate_required(&category, "category")?;
        validate_required(&preference, "preference")?;
        Ok(Self {
            id: new_id(),
            category,
            preference,
            strength: 0.5,
            observations: 1,
            created: Utc::now(),
        })
    }

    /// Sets the strength, validating it against [-1, 1].
    pub fn with_strength(mut self, strength: f64) -> Result<Self> {
        self.strength = validate_range(strength, -1.0, 1.0, "strength")?;
        Ok(self)
    }
}

/// A point, period, or sequence in time a memory is anchored to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemporalMarker {
    /// Unique identifier.
    pub id: String,
    /// Shape of the marker.
    pub kind: TemporalKind,
    /// What the marker denotes.
    pub description: String,
    /// Start of the period, if bounded.
    pub start_date: Option<DateTime<Utc>>,
    /// End of the period, if bounded.
    pub end_date: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
}

impl TemporalMarker {
    /// Creates a temporal marker.
    #[must_use]
    pub fn new(kind: TemporalKind, description: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            kind,
            description: description.into(),
            start_date: None,
            end_date: None,
            created: Utc::now(),
        }
    }
}

/// A recorded disagreement between memories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contradiction {
    /// Unique identifier.
    pub id: String,
    /// What the disagreement is about.
    pub description: String,
    /// How it was resolved, once it is.
    pub resolution: String,
    /// Resolution status.
    pub status: ContradictionStatus,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
}

impl Contradiction {
    /// Creates an unresolved contradiction.
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            description: description.into(),
            resolution: String::new(),
            status: ContradictionStatus::Unresolved,
            created: Utc::now(),
        }
    }
}

/// An isolation boundary for memories. Interned by `name`.
///
/// Compartments serve two purposes: they decide whether organic connections
/// may form across their boundary (`allow_external_connections`) and they
/// control query-time data flow through their `permeability`. A memory may
/// belong to several compartments; the most restrictive one wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Compartment {
    /// Unique identifier.
    pub id: String,
    /// Identity: the compartment name.
    pub name: String,
    /// Compartment-level flow policy.
    pub permeability: Permeability,
    /// Whether organic connections may form to memories outside.
    pub allow_external_connections: bool,
    /// Free-form description.
    pub description: String,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
}

impl Compartment {
    /// Creates an open compartment with a validated name.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_required(&name, "name")?;
        Ok(Self {
            id: new_id(),
            name,
            permeability: Permeability::Open,
            allow_external_connections: true,
            description: String::new(),
            created: Utc::now(),
        })
    }

    /// Sets the compartment-level permeability.
    #[must_use]
    pub fn with_permeability(mut self, permeability: Permeability) -> Self {
        self.permeability = permeability;
        self
    }

    /// Sets whether external organic connections are allowed.
    #[must_use]
    pub fn with_external_connections(mut self, allow: bool) -> Self {
        self.allow_external_connections = allow;
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_required_fields_validated() {
        assert!(matches!(
            Concept::new("  ").unwrap_err(),
            Error::MissingRequired("name")
        ));
        assert!(matches!(
            Keyword::new("").unwrap_err(),
            Error::MissingRequired("term")
        ));
        assert!(matches!(
            Source::new(SourceKind::File, " ").unwrap_err(),
            Error::MissingRequired("reference")
        ));
        assert!(matches!(
            Preference::new("style", "").unwrap_err(),
            Error::MissingRequired("preference")
        ));
    }

    #[test]
    fn test_preference_strength_bounds() {
        let p = Preference::new("style", "concise").unwrap();
        assert!(p.clone().with_strength(1.5).is_err());
        assert!(p.clone().with_strength(-1.5).is_err());
        assert_eq!(p.with_strength(-0.4).unwrap().strength, -0.4);
    }

    #[test]
    fn test_compartment_defaults() {
        let c = Compartment::new("Project Q").unwrap();
        assert_eq!(c.permeability, Permeability::Open);
        assert!(c.allow_external_connections);
    }

    #[test]
    fn test_source_reliability_bounds() {
        let s = Source::new(SourceKind::Url, "https://example.com").unwrap();
        assert!(s.clone().with_reliability(2.0).is_err());
        assert_eq!(s.with_reliability(0.7).unwrap().reliability, 0.7);
    }
}
