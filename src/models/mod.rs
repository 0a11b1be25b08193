//! Data models for the memory graph.
//!
//! Node types mirror the graph schema one-to-one; interned types document
//! their identity tuple. Query results come back as the typed records in
//! [`records`].

mod enums;
mod memory;
mod nodes;
mod records;

pub use enums::{
    ContextKind, ContextStatus, ContradictionStatus, Curve, EntityKind, GoalStatus, Permeability,
    QuestionStatus, SourceKind, TemporalKind,
};
pub use memory::{Memory, MemoryId};
pub use nodes::{
    Compartment, Concept, Context, Contradiction, Decision, Entity, Goal, Keyword, Preference,
    Question, Source, TemporalMarker, Topic,
};
pub use records::{
    ChainRole, CompartmentMemberRecord, CompartmentRecord, CompartmentRef, ConnectionRecord,
    ConnectionStatistics, ConnectionStrength, ContradictionGroup, DecisionChainEntry, GoalRecord,
    MemoryRecord, MemoryRef, PreferenceRecord, QuestionRecord,
};

use crate::{Error, Result};

/// Validates that a numeric value lies within `[min, max]`.
///
/// NaN never satisfies the interval and is rejected.
pub(crate) fn validate_range(value: f64, min: f64, max: f64, name: &'static str) -> Result<f64> {
    if value.is_nan() || value < min || value > max {
        return Err(Error::OutOfRange {
            name,
            min,
            max,
            value,
        });
    }
    Ok(value)
}

/// Validates that a required string is non-empty after trimming.
pub(crate) fn validate_required(value: &str, name: &'static str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::MissingRequired(name));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_range() {
        assert_eq!(validate_range(0.5, 0.0, 1.0, "x").unwrap(), 0.5);
        assert_eq!(validate_range(0.0, 0.0, 1.0, "x").unwrap(), 0.0);
        assert_eq!(validate_range(1.0, 0.0, 1.0, "x").unwrap(), 1.0);
        assert!(validate_range(1.01, 0.0, 1.0, "x").is_err());
        assert!(validate_range(-0.01, 0.0, 1.0, "x").is_err());
        assert!(validate_range(f64::NAN, 0.0, 1.0, "x").is_err());
    }

    #[test]
    fn test_validate_required() {
        assert!(validate_required("ok", "x").is_ok());
        assert!(validate_required("", "x").is_err());
        assert!(validate_required(" \t\n", "x").is_err());
    }
}
