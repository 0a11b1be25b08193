//! Typed result rows returned by query operations.
//!
//! Each operation returns a tagged record rather than a loose map; the
//! shapes serialize to the JSON maps the tool surface exposes. Timestamps
//! are the ISO-8601 strings the store holds.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::Permeability;

/// A memory row as returned by retrieval and search operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryRecord {
    /// Memory id.
    pub id: String,
    /// Full content.
    pub content: String,
    /// Short summary.
    pub summary: String,
    /// Creation timestamp (ISO-8601).
    pub created: String,
    /// Last access timestamp (ISO-8601).
    pub last_accessed: String,
    /// Retrieval count.
    pub access_count: i64,
    /// Confidence in [0, 1].
    pub confidence: f64,
}

/// Abbreviated memory reference used inside grouped results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRef {
    /// Memory id.
    pub id: String,
    /// Short summary.
    pub summary: String,
}

/// A compartment row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompartmentRecord {
    /// Compartment id.
    pub id: String,
    /// Compartment name.
    pub name: String,
    /// Compartment-level flow policy.
    pub permeability: Permeability,
    /// Whether organic connections may form to the outside.
    pub allow_external_connections: bool,
    /// Description.
    pub description: String,
    /// Creation timestamp (ISO-8601).
    pub created: String,
}

/// Compartment membership row: the policy fields a flow check needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompartmentRef {
    /// Compartment id.
    pub id: String,
    /// Compartment name.
    pub name: String,
    /// Compartment-level flow policy.
    pub permeability: Permeability,
    /// Whether organic connections may form to the outside.
    pub allow_external_connections: bool,
}

/// A memory row as listed inside a compartment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompartmentMemberRecord {
    /// Memory id.
    pub id: String,
    /// Short summary.
    pub summary: String,
    /// Full content.
    pub content: String,
    /// Creation timestamp (ISO-8601).
    pub created: String,
    /// Confidence in [0, 1].
    pub confidence: f64,
}

/// One endpoint of a memory-to-memory connection, with its edge weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionRecord {
    /// The related memory's id.
    pub id: String,
    /// The related memory's summary.
    pub summary: String,
    /// Edge strength in [min_strength, max_strength].
    pub strength: f64,
    /// Connection-level flow policy.
    pub permeability: Permeability,
}

/// A raw strength edge between two memories.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStrength {
    /// Owning memory id.
    pub from_id: String,
    /// Target memory id.
    pub to_id: String,
    /// Edge strength.
    pub strength: f64,
}

/// Aggregate statistics over every memory-to-memory connection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatistics {
    /// Number of connections.
    pub count: u64,
    /// Smallest strength, if any connections exist.
    pub min: Option<f64>,
    /// Largest strength, if any connections exist.
    pub max: Option<f64>,
    /// Mean strength, if any connections exist.
    pub avg: Option<f64>,
    /// Ten-bucket histogram keyed "0.0-0.1" through "0.9-1.0".
    pub buckets: BTreeMap<String, u64>,
    /// Connections below the decay threshold.
    pub below_threshold: u64,
    /// Connections at or below the prune threshold.
    pub pruning_candidates: u64,
}

/// A question row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    /// Question id.
    pub id: String,
    /// Question text.
    pub text: String,
    /// Answer status.
    pub status: String,
    /// When answered, if answered (ISO-8601, empty if not).
    pub answered_date: String,
    /// Creation timestamp (ISO-8601).
    pub created: String,
}

/// A goal row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalRecord {
    /// Goal id.
    pub id: String,
    /// Goal description.
    pub description: String,
    /// Lifecycle status.
    pub status: String,
    /// Priority; lower sorts first.
    pub priority: i64,
    /// Target date (ISO-8601, empty if unset).
    pub target_date: String,
    /// Creation timestamp (ISO-8601).
    pub created: String,
}

/// A preference row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferenceRecord {
    /// Preference id.
    pub id: String,
    /// Preference category.
    pub category: String,
    /// The preference itself.
    pub preference: String,
    /// Running-average strength in [-1, 1].
    pub strength: f64,
    /// Number of observations merged in.
    pub observations: i64,
    /// Creation timestamp (ISO-8601).
    pub created: String,
}

/// Whether a decision in a chain came before or after the queried one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainRole {
    /// The decision led to the queried one.
    Predecessor,
    /// The queried decision led to this one.
    Successor,
}

/// A decision row inside a decision chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionChainEntry {
    /// Decision id.
    pub id: String,
    /// What was decided.
    pub description: String,
    /// Why it was decided.
    pub rationale: String,
    /// When it was decided (ISO-8601).
    pub date: String,
    /// Observed outcome.
    pub outcome: String,
    /// Position relative to the queried decision.
    pub relation: ChainRole,
}

/// An unresolved contradiction with the memories it implicates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContradictionGroup {
    /// Contradiction id.
    pub id: String,
    /// What the disagreement is about.
    pub description: String,
    /// The conflicting memories.
    pub memories: Vec<MemoryRef>,
}
