//! # Axons
//!
//! A graph-structured associative memory for autonomous language agents.
//!
//! Agents write semantic units ([`Memory`] nodes) with rich typed
//! associations — concepts, keywords, topics, entities, sources, decisions,
//! goals, questions — and later recall them by content, association, or by
//! traversing the memory graph. Two behaviors distinguish the design:
//!
//! - **Synaptic plasticity**: memory-to-memory edges carry weights that
//!   strengthen on co-access, decay over maintenance cycles, and are pruned
//!   when they fall to zero. Retrieval itself modifies the graph.
//! - **Compartmentalization**: memories and compartments carry a directional
//!   flow policy ([`Permeability`]). A fail-safe, multi-layer check governs
//!   both organic edge formation and query-result visibility.
//!
//! ## Example
//!
//! ```rust,ignore
//! use axons::{MemoryGraphService, StoreRequest};
//!
//! let mut service = MemoryGraphService::open_in_memory(Default::default())?;
//! let id = service.quick_store_memory(&StoreRequest {
//!     content: "The deploy pipeline requires a signed tag".into(),
//!     summary: "Deploy requires signed tag".into(),
//!     concepts: vec!["release process".into()],
//!     keywords: vec!["deploy".into(), "tag".into()],
//!     ..Default::default()
//! })?;
//! let memory = service.get_memory(id.as_str(), true)?;
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

use thiserror::Error as ThisError;

// Module declarations
pub mod config;
pub mod mcp;
pub mod models;
pub mod permeability;
pub mod plasticity;
pub mod service;
pub mod storage;

// Re-exports for convenience
pub use config::AxonsConfig;
pub use models::{
    Compartment, Concept, Context, Contradiction, Curve, Decision, Entity, EntityKind, Goal,
    GoalStatus, Keyword, Memory, MemoryId, Permeability, Preference, Question, QuestionStatus,
    Source, SourceKind, TemporalMarker, Topic,
};
pub use plasticity::{PlasticityConfig, PlasticityContext};
pub use service::{MemoryGraphService, StoreRequest};
pub use storage::{GraphStore, SqliteGraphStore};

/// Error type for axons operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait
/// implementations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `OutOfRange` | A numeric argument falls outside its declared interval |
/// | `MissingRequired` | A required string is empty or whitespace |
/// | `ClientClosed` | Any operation is attempted after `close()` |
/// | `CompartmentInUse` | Deleting a populated compartment without reassignment |
/// | `Store` | The underlying graph store reports a failure |
/// | `InvalidInput` | Malformed tool-boundary or configuration input |
///
/// Lookups that find nothing return `Ok(None)` rather than an error.
#[derive(Debug, ThisError)]
pub enum Error {
    /// A numeric argument is outside its declared bounds.
    ///
    /// Raised at validation time, before any write reaches the store.
    #[error("{name} must be between {min} and {max}, got {value}")]
    OutOfRange {
        /// Name of the offending argument.
        name: &'static str,
        /// Lower bound (inclusive).
        min: f64,
        /// Upper bound (inclusive).
        max: f64,
        /// The rejected value.
        value: f64,
    },

    /// A required string field is empty or whitespace-only.
    #[error("{0} is required and cannot be empty")]
    MissingRequired(&'static str),

    /// The service has been closed; no further operations are possible.
    #[error("client is closed")]
    ClientClosed,

    /// A compartment delete was refused because memories still reside in it.
    ///
    /// Raised when `delete_compartment` is called with
    /// `reassign_memories = false` on a non-empty compartment.
    #[error(
        "compartment {compartment_id} has {resident_count} memories; \
         pass reassign_memories=true to remove them from the compartment"
    )]
    CompartmentInUse {
        /// The compartment that could not be deleted.
        compartment_id: String,
        /// Number of memories still assigned to it.
        resident_count: i64,
    },

    /// An operation against the underlying graph store failed.
    ///
    /// Engine errors propagate upward unmodified in meaning; the service
    /// does not retry or swallow them.
    #[error("store operation '{operation}' failed: {cause}")]
    Store {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// Invalid input at the tool boundary or in a configuration document.
    ///
    /// Raised when:
    /// - Tool arguments fail to deserialize or reference unknown enums
    /// - A plasticity configuration file cannot be parsed
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for axons operations.
pub type Result<T> = std::result::Result<T, Error>;
