//! The composite store helper: one request, one transaction.
//!
//! `quick_store_memory` creates the memory and interns/links every
//! association inside an explicit transaction; any failure unwinds through
//! the scoped guard, which rolls back on drop unless committed.

use tracing::debug;

use super::MemoryGraphService;
use crate::models::{Concept, Entity, EntityKind, Keyword, Memory, MemoryId, Permeability, Topic};
use crate::storage::GraphStore;
use crate::Result;

/// Everything needed to store a memory with its associations in one call.
#[derive(Debug, Clone)]
pub struct StoreRequest {
    /// Full memory content (required non-empty).
    pub content: String,
    /// Short summary (required non-empty).
    pub summary: String,
    /// Concepts to intern and link at full relevance.
    pub concepts: Vec<String>,
    /// Keywords to intern and link.
    pub keywords: Vec<String>,
    /// Topics to intern and link.
    pub topics: Vec<String>,
    /// Entities to intern and link, as (name, kind) pairs.
    pub entities: Vec<(String, EntityKind)>,
    /// Confidence in [0, 1].
    pub confidence: f64,
    /// Memory-level flow policy.
    pub permeability: Permeability,
    /// Compartment assignment: `Some(id)` places the memory there, `None`
    /// defers to the active compartment, `Some("")` suppresses both.
    pub compartment_id: Option<String>,
}

impl Default for StoreRequest {
    fn default() -> Self {
        Self {
            content: String::new(),
            summary: String::new(),
            concepts: Vec::new(),
            keywords: Vec::new(),
            topics: Vec::new(),
            entities: Vec::new(),
            confidence: 1.0,
            permeability: Permeability::Open,
            compartment_id: None,
        }
    }
}

/// Scoped transaction: commits explicitly, rolls back on drop otherwise.
struct TransactionGuard<'a> {
    store: &'a dyn GraphStore,
    committed: bool,
}

impl<'a> TransactionGuard<'a> {
    fn begin(store: &'a dyn GraphStore) -> Result<Self> {
        store.begin_transaction()?;
        Ok(Self {
            store,
            committed: false,
        })
    }

    fn commit(mut self) -> Result<()> {
        self.store.commit()?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for TransactionGuard<'_> {
    fn drop(&mut self) {
        if !self.committed {
            // Unwinding an incomplete composite write; the rollback error
            // (if any) is secondary to the one already propagating.
            let _ = self.store.rollback();
        }
    }
}

impl MemoryGraphService {
    /// Stores a memory with all of its associations in one transaction.
    ///
    /// Validation happens before the transaction opens; any write failure
    /// rolls back the whole request and re-raises.
    pub fn quick_store_memory(&self, request: &StoreRequest) -> Result<MemoryId> {
        let memory = Memory::new(request.content.clone(), request.summary.clone())?
            .with_confidence(request.confidence)?
            .with_permeability(request.permeability);

        let guard = TransactionGuard::begin(self.store()?)?;

        let memory_id = self.create_memory(&memory, request.compartment_id.as_deref())?;

        for name in &request.concepts {
            let concept_id = self.create_concept(&Concept::new(name)?)?;
            self.link_memory_to_concept(memory_id.as_str(), &concept_id, 1.0)?;
        }
        for term in &request.keywords {
            let keyword_id = self.create_keyword(&Keyword::new(term)?)?;
            self.link_memory_to_keyword(memory_id.as_str(), &keyword_id)?;
        }
        for name in &request.topics {
            let topic_id = self.create_topic(&Topic::new(name)?)?;
            self.link_memory_to_topic(memory_id.as_str(), &topic_id, false)?;
        }
        for (name, kind) in &request.entities {
            let entity_id = self.create_entity(&Entity::new(name, *kind)?)?;
            self.link_memory_to_entity(memory_id.as_str(), &entity_id, "")?;
        }

        guard.commit()?;
        debug!(memory_id = %memory_id, "stored memory with associations");
        Ok(memory_id)
    }
}
