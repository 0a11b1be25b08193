//! The memory graph service: the public facade over the store.
//!
//! Owns the plasticity configuration, the active compartment, and the
//! access-cycle counter; composes the plasticity policy, the permeability
//! evaluator, and the graph store into the full operation set. One service
//! instance serves one logical agent session; the host serializes
//! concurrent agents.

mod compartment;
mod create;
mod link;
mod plasticity_ops;
mod query;
mod quick;

pub use quick::StoreRequest;

use chrono::{SecondsFormat, Utc};
use std::path::Path;

use crate::models::{MemoryRecord, Permeability};
use crate::plasticity::PlasticityConfig;
use crate::storage::{GraphStore, Row, SqliteGraphStore};
use crate::{Error, Result};

/// Memory columns selected by every retrieval query.
pub(crate) const MEMORY_COLUMNS: &str = "m.id AS id, m.content AS content, m.summary AS summary, \
     m.created AS created, m.lastAccessed AS lastAccessed, \
     m.accessCount AS accessCount, m.confidence AS confidence";

/// Client for the memory graph.
///
/// All mutations go through the operations defined here; the underlying
/// store is never exposed mutably. Operations after [`close`](Self::close)
/// fail with [`Error::ClientClosed`].
pub struct MemoryGraphService {
    store: Box<dyn GraphStore>,
    plasticity: PlasticityConfig,
    active_compartment: Option<String>,
    access_cycle: u64,
    closed: bool,
}

impl MemoryGraphService {
    /// Creates a service over an already-constructed store.
    ///
    /// Initializes the schema; re-initialization of an existing database is
    /// a no-op.
    pub fn new(store: Box<dyn GraphStore>, plasticity: PlasticityConfig) -> Result<Self> {
        store.initialize_schema()?;
        Ok(Self {
            store,
            plasticity,
            active_compartment: None,
            access_cycle: 0,
            closed: false,
        })
    }

    /// Opens (creating if needed) a service over the database at `path`.
    pub fn open(path: impl AsRef<Path>, plasticity: PlasticityConfig) -> Result<Self> {
        let store = SqliteGraphStore::open(path.as_ref())?;
        Self::new(Box::new(store), plasticity)
    }

    /// Opens a service over an in-memory database.
    pub fn open_in_memory(plasticity: PlasticityConfig) -> Result<Self> {
        let store = SqliteGraphStore::open_in_memory()?;
        Self::new(Box::new(store), plasticity)
    }

    /// Closes the service. Every subsequent operation fails.
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Whether the service has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The store, gated on the closed flag.
    pub(crate) fn store(&self) -> Result<&dyn GraphStore> {
        if self.closed {
            return Err(Error::ClientClosed);
        }
        Ok(self.store.as_ref())
    }

    /// The active plasticity configuration.
    #[must_use]
    pub fn plasticity_config(&self) -> &PlasticityConfig {
        &self.plasticity
    }

    /// Replaces the plasticity configuration.
    pub fn set_plasticity_config(&mut self, config: PlasticityConfig) {
        self.plasticity = config;
    }

    /// Saves the plasticity configuration to a JSON file.
    pub fn save_plasticity_config(&self, path: impl AsRef<Path>) -> Result<()> {
        crate::config::save_plasticity_file(path.as_ref(), &self.plasticity)
    }

    /// Loads the plasticity configuration from a JSON file.
    pub fn load_plasticity_config(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.plasticity = crate::config::load_plasticity_file(path.as_ref())?;
        Ok(())
    }

    /// Number of maintenance cycles this instance has run.
    ///
    /// Process-local; not persisted.
    #[must_use]
    pub fn access_cycle(&self) -> u64 {
        self.access_cycle
    }

    /// Opens an explicit transaction.
    pub fn begin_transaction(&self) -> Result<()> {
        self.store()?.begin_transaction()
    }

    /// Commits the open transaction.
    pub fn commit(&self) -> Result<()> {
        self.store()?.commit()
    }

    /// Rolls back the open transaction.
    pub fn rollback(&self) -> Result<()> {
        self.store()?.rollback()
    }

    /// Current timestamp in the stored ISO-8601 form.
    pub(crate) fn now() -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    /// Decodes a stored permeability string.
    pub(crate) fn decode_permeability(s: &str) -> Result<Permeability> {
        Permeability::parse(s).ok_or_else(|| Error::Store {
            operation: "decode_row".to_string(),
            cause: format!("invalid permeability '{s}'"),
        })
    }

    /// Decodes a memory row selected with [`MEMORY_COLUMNS`].
    pub(crate) fn memory_record(row: &Row) -> Result<MemoryRecord> {
        Ok(MemoryRecord {
            id: row.text("id")?,
            content: row.text("content")?,
            summary: row.text("summary")?,
            created: row.text("created")?,
            last_accessed: row.text("lastAccessed")?,
            access_count: row.int("accessCount")?,
            confidence: row.float("confidence")?,
        })
    }
}
