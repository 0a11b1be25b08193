//! Memory node type and identifier.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::{validate_range, validate_required};
use crate::models::Permeability;
use crate::Result;

/// Unique identifier for a memory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryId(String);

impl MemoryId {
    /// Creates a memory ID from an existing string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for MemoryId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MemoryId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for MemoryId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A semantic unit written by an agent.
///
/// Construct through [`Memory::new`], which validates the required fields;
/// `confidence` and `permeability` can then be adjusted with the builder
/// methods before the memory is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    /// Unique identifier.
    pub id: MemoryId,
    /// Full memory content.
    pub content: String,
    /// Short summary used in listings and traversal results.
    pub summary: String,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
    /// Timestamp of the most recent access.
    pub last_accessed: DateTime<Utc>,
    /// Number of times the memory has been retrieved.
    pub access_count: i64,
    /// Confidence in the memory's accuracy, in [0, 1].
    pub confidence: f64,
    /// Memory-level flow policy.
    pub permeability: Permeability,
}

impl Memory {
    /// Creates a memory with validated content and summary.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MissingRequired`] if `content` or `summary`
    /// is empty after trimming.
    pub fn new(content: impl Into<String>, summary: impl Into<String>) -> Result<Self> {
        let content = content.into();
        let summary = summary.into();
        validate_required(&content, "content")?;
        validate_required(&summary, "summary")?;

        let now = Utc::now();
        Ok(Self {
            id: MemoryId::generate(),
            content,
            summary,
            created: now,
            last_accessed: now,
            access_count: 0,
            confidence: 1.0,
            permeability: Permeability::Open,
        })
    }

    /// Sets the confidence, validating it against [0, 1].
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfRange`] if `confidence` is outside [0, 1].
    pub fn with_confidence(mut self, confidence: f64) -> Result<Self> {
        self.confidence = validate_range(confidence, 0.0, 1.0, "confidence")?;
        Ok(self)
    }

    /// Sets the memory-level permeability.
    #[must_use]
    pub fn with_permeability(mut self, permeability: Permeability) -> Self {
        self.permeability = permeability;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_new_memory_defaults() {
        let m = Memory::new("some content", "a summary").unwrap();
        assert_eq!(m.access_count, 0);
        assert_eq!(m.confidence, 1.0);
        assert_eq!(m.permeability, Permeability::Open);
        assert!(!m.id.as_str().is_empty());
    }

    #[test]
    fn test_empty_content_rejected() {
        let err = Memory::new("   ", "summary").unwrap_err();
        assert!(matches!(err, Error::MissingRequired("content")));

        let err = Memory::new("content", "").unwrap_err();
        assert!(matches!(err, Error::MissingRequired("summary")));
    }

    #[test]
    fn test_confidence_bounds() {
        let m = Memory::new("c", "s").unwrap();
        assert!(m.with_confidence(1.5).is_err());

        let m = Memory::new("c", "s").unwrap();
        assert_eq!(m.with_confidence(0.25).unwrap().confidence, 0.25);
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Memory::new("c", "s").unwrap();
        let b = Memory::new("c", "s").unwrap();
        assert_ne!(a.id, b.id);
    }
}
