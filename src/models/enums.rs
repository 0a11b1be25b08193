//! Closed enumerations for the memory graph.
//!
//! Every enum is stored in the graph as its lowercase string value and can
//! be parsed back with [`parse`](Permeability::parse)-style constructors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Directional flow policy for memories, compartments, and connections.
///
/// Governs two distinct decisions: whether organic connections may form
/// across a compartment boundary, and whether a memory may appear in a
/// query answer. Direction is always from the perspective of the owner.
///
/// | Value | Outward | Inward | Meaning |
/// |-------|---------|--------|---------|
/// | `Open` | yes | yes | default, no restrictions |
/// | `Closed` | no | no | total isolation |
/// | `OsmoticInward` | no | yes | can pull data in, cannot leak out |
/// | `OsmoticOutward` | yes | no | can share out, cannot pull in |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permeability {
    /// Bidirectional data flow.
    #[default]
    Open,
    /// No data flow in either direction.
    Closed,
    /// Data can flow in; external queries cannot retrieve data from inside.
    OsmoticInward,
    /// Data can flow out; cannot retrieve external data from inside.
    OsmoticOutward,
}

impl Permeability {
    /// Returns true if this policy admits inward data flow.
    #[must_use]
    pub fn allows_inward(self) -> bool {
        matches!(self, Self::Open | Self::OsmoticInward)
    }

    /// Returns true if this policy admits outward data flow.
    #[must_use]
    pub fn allows_outward(self) -> bool {
        matches!(self, Self::Open | Self::OsmoticOutward)
    }

    /// Returns the stored string value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::OsmoticInward => "osmotic_inward",
            Self::OsmoticOutward => "osmotic_outward",
        }
    }

    /// Parses a stored string value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(Self::Open),
            "closed" => Some(Self::Closed),
            "osmotic_inward" => Some(Self::OsmoticInward),
            "osmotic_outward" => Some(Self::OsmoticOutward),
            _ => None,
        }
    }
}

impl fmt::Display for Permeability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of named entity a memory can mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Named individual.
    Person,
    /// Company, team, or group.
    Organization,
    /// A project or initiative.
    Project,
    /// A tool or utility.
    Tool,
    /// A technology, framework, or language.
    Technology,
    /// A physical or virtual place.
    Place,
}

impl EntityKind {
    /// Returns the stored string value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Organization => "organization",
            Self::Project => "project",
            Self::Tool => "tool",
            Self::Technology => "technology",
            Self::Place => "place",
        }
    }

    /// Parses a stored string value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "person" => Some(Self::Person),
            "organization" => Some(Self::Organization),
            "project" => Some(Self::Project),
            "tool" => Some(Self::Tool),
            "technology" => Some(Self::Technology),
            "place" => Some(Self::Place),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provenance kind for a memory source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// A conversation transcript.
    Conversation,
    /// A file on disk.
    File,
    /// A web resource.
    Url,
    /// A document.
    Document,
    /// A direct observation by the agent.
    Observation,
}

impl SourceKind {
    /// Returns the stored string value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Conversation => "conversation",
            Self::File => "file",
            Self::Url => "url",
            Self::Document => "document",
            Self::Observation => "observation",
        }
    }

    /// Parses a stored string value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "conversation" => Some(Self::Conversation),
            "file" => Some(Self::File),
            "url" => Some(Self::Url),
            "document" => Some(Self::Document),
            "observation" => Some(Self::Observation),
            _ => None,
        }
    }
}

/// Lifecycle status of a goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    /// Still being pursued.
    #[default]
    Active,
    /// Achieved.
    Achieved,
    /// Abandoned.
    Abandoned,
}

impl GoalStatus {
    /// Returns the stored string value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Achieved => "achieved",
            Self::Abandoned => "abandoned",
        }
    }
}

/// Answer status of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionStatus {
    /// No answer yet.
    #[default]
    Open,
    /// Partially answered.
    Partial,
    /// Fully answered.
    Answered,
}

impl QuestionStatus {
    /// Returns the stored string value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Partial => "partial",
            Self::Answered => "answered",
        }
    }
}

/// Kind of working context a memory can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextKind {
    /// A long-lived project.
    Project,
    /// A bounded task.
    Task,
    /// A single conversation.
    Conversation,
    /// An agent session.
    Session,
    /// A knowledge domain.
    Domain,
}

impl ContextKind {
    /// Returns the stored string value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Task => "task",
            Self::Conversation => "conversation",
            Self::Session => "session",
            Self::Domain => "domain",
        }
    }

    /// Parses a stored string value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "project" => Some(Self::Project),
            "task" => Some(Self::Task),
            "conversation" => Some(Self::Conversation),
            "session" => Some(Self::Session),
            "domain" => Some(Self::Domain),
            _ => None,
        }
    }
}

/// Lifecycle status of a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextStatus {
    /// Currently in use.
    #[default]
    Active,
    /// Work concluded.
    Completed,
    /// Kept for history only.
    Archived,
}

impl ContextStatus {
    /// Returns the stored string value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Archived => "archived",
        }
    }
}

/// Shape of a temporal marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalKind {
    /// A single instant.
    Point,
    /// A bounded period.
    Period,
    /// An ordered sequence of events.
    Sequence,
}

impl TemporalKind {
    /// Returns the stored string value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Point => "point",
            Self::Period => "period",
            Self::Sequence => "sequence",
        }
    }
}

/// Resolution status of a contradiction between memories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContradictionStatus {
    /// Not yet resolved.
    #[default]
    Unresolved,
    /// Resolved in favor of a superseding memory.
    Resolved,
    /// Accepted as a standing disagreement.
    Accepted,
}

impl ContradictionStatus {
    /// Returns the stored string value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unresolved => "unresolved",
            Self::Resolved => "resolved",
            Self::Accepted => "accepted",
        }
    }
}

/// Mathematical curve for plasticity operations.
///
/// Used both as the plasticity curve (how current strength shapes the rate
/// of change) and as the decay curve (how elapsed cycles shape decay).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Curve {
    /// Constant rate.
    #[default]
    Linear,
    /// Fast start, slowing (half-life based for decay).
    Exponential,
    /// Slow start, accelerating.
    Logarithmic,
}

impl Curve {
    /// Returns the stored string value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Exponential => "exponential",
            Self::Logarithmic => "logarithmic",
        }
    }

    /// Parses a stored string value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "linear" => Some(Self::Linear),
            "exponential" => Some(Self::Exponential),
            "logarithmic" => Some(Self::Logarithmic),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permeability_directions() {
        assert!(Permeability::Open.allows_inward());
        assert!(Permeability::Open.allows_outward());
        assert!(!Permeability::Closed.allows_inward());
        assert!(!Permeability::Closed.allows_outward());
        assert!(Permeability::OsmoticInward.allows_inward());
        assert!(!Permeability::OsmoticInward.allows_outward());
        assert!(!Permeability::OsmoticOutward.allows_inward());
        assert!(Permeability::OsmoticOutward.allows_outward());
    }

    #[test]
    fn test_permeability_round_trip() {
        for p in [
            Permeability::Open,
            Permeability::Closed,
            Permeability::OsmoticInward,
            Permeability::OsmoticOutward,
        ] {
            assert_eq!(Permeability::parse(p.as_str()), Some(p));
        }
        assert_eq!(Permeability::parse("sideways"), None);
    }

    #[test]
    fn test_entity_kind_round_trip() {
        for k in [
            EntityKind::Person,
            EntityKind::Organization,
            EntityKind::Project,
            EntityKind::Tool,
            EntityKind::Technology,
            EntityKind::Place,
        ] {
            assert_eq!(EntityKind::parse(k.as_str()), Some(k));
        }
    }

    #[test]
    fn test_serde_uses_snake_case_strings() {
        let json = serde_json::to_string(&Permeability::OsmoticInward).unwrap();
        assert_eq!(json, "\"osmotic_inward\"");
        let back: Permeability = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Permeability::OsmoticInward);
    }
}
