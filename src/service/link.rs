//! Link operations.
//!
//! Every link is idempotent: relinking an existing pair leaves the edge
//! untouched (properties are set only on creation, mirroring
//! `MERGE ... ON CREATE SET`). A link whose endpoints are missing writes
//! nothing. Weighted properties are validated before any write.

use super::MemoryGraphService;
use crate::models::{validate_range, Permeability};
use crate::storage::Value;
use crate::Result;

impl MemoryGraphService {
    /// Links a memory to a concept with a relevance weight in [0, 1].
    pub fn link_memory_to_concept(
        &self,
        memory_id: &str,
        concept_id: &str,
        relevance: f64,
    ) -> Result<()> {
        validate_range(relevance, 0.0, 1.0, "relevance")?;
        self.store()?.run_write(
            "INSERT OR IGNORE INTO HAS_CONCEPT (from_id, to_id, relevance) \
             SELECT m.id, c.id, :relevance FROM Memory m, Concept c \
             WHERE m.id = :memory_id AND c.id = :concept_id",
            &[
                (":memory_id", Value::from(memory_id)),
                (":concept_id", Value::from(concept_id)),
                (":relevance", Value::from(relevance)),
            ],
        )
    }

    /// Links a memory to a keyword.
    pub fn link_memory_to_keyword(&self, memory_id: &str, keyword_id: &str) -> Result<()> {
        self.store()?.run_write(
            "INSERT OR IGNORE INTO HAS_KEYWORD (from_id, to_id) \
             SELECT m.id, k.id FROM Memory m, Keyword k \
             WHERE m.id = :memory_id AND k.id = :keyword_id",
            &[
                (":memory_id", Value::from(memory_id)),
                (":keyword_id", Value::from(keyword_id)),
            ],
        )
    }

    /// Links a memory to a topic, optionally marking it as the primary one.
    pub fn link_memory_to_topic(&self, memory_id: &str, topic_id: &str, primary: bool) -> Result<()> {
        self.store()?.run_write(
            "INSERT OR IGNORE INTO BELONGS_TO (from_id, to_id, isPrimary) \
             SELECT m.id, t.id, :is_primary FROM Memory m, Topic t \
             WHERE m.id = :memory_id AND t.id = :topic_id",
            &[
                (":memory_id", Value::from(memory_id)),
                (":topic_id", Value::from(topic_id)),
                (":is_primary", Value::from(primary)),
            ],
        )
    }

    /// Links a memory to an entity with an optional role description.
    pub fn link_memory_to_entity(&self, memory_id: &str, entity_id: &str, role: &str) -> Result<()> {
        self.store()?.run_write(
            "INSERT OR IGNORE INTO MENTIONS (from_id, to_id, role) \
             SELECT m.id, e.id, :role FROM Memory m, Entity e \
             WHERE m.id = :memory_id AND e.id = :entity_id",
            &[
                (":memory_id", Value::from(memory_id)),
                (":entity_id", Value::from(entity_id)),
                (":role", Value::from(role)),
            ],
        )
    }

    /// Links a memory to its source with an optional excerpt.
    pub fn link_memory_to_source(
        &self,
        memory_id: &str,
        source_id: &str,
        excerpt: &str,
    ) -> Result<()> {
        self.store()?.run_write(
            "INSERT OR IGNORE INTO FROM_SOURCE (from_id, to_id, excerpt) \
             SELECT m.id, s.id, :excerpt FROM Memory m, Source s \
             WHERE m.id = :memory_id AND s.id = :source_id",
            &[
                (":memory_id", Value::from(memory_id)),
                (":source_id", Value::from(source_id)),
                (":excerpt", Value::from(excerpt)),
            ],
        )
    }

    /// Links a memory to a context.
    pub fn link_memory_to_context(&self, memory_id: &str, context_id: &str) -> Result<()> {
        self.store()?.run_write(
            "INSERT OR IGNORE INTO IN_CONTEXT (from_id, to_id) \
             SELECT m.id, c.id FROM Memory m, Context c \
             WHERE m.id = :memory_id AND c.id = :context_id",
            &[
                (":memory_id", Value::from(memory_id)),
                (":context_id", Value::from(context_id)),
            ],
        )
    }

    /// Links a memory that informed a decision.
    pub fn link_memory_to_decision(&self, memory_id: &str, decision_id: &str) -> Result<()> {
        self.store()?.run_write(
            "INSERT OR IGNORE INTO INFORMED (from_id, to_id) \
             SELECT m.id, d.id FROM Memory m, Decision d \
             WHERE m.id = :memory_id AND d.id = :decision_id",
            &[
                (":memory_id", Value::from(memory_id)),
                (":decision_id", Value::from(decision_id)),
            ],
        )
    }

    /// Links a memory that partially answers a question; `completeness` is
    /// in [0, 1].
    pub fn link_memory_to_question(
        &self,
        memory_id: &str,
        question_id: &str,
        completeness: f64,
    ) -> Result<()> {
        validate_range(completeness, 0.0, 1.0, "completeness")?;
        self.store()?.run_write(
            "INSERT OR IGNORE INTO PARTIALLY_ANSWERS (from_id, to_id, completeness) \
             SELECT m.id, q.id, :completeness FROM Memory m, Question q \
             WHERE m.id = :memory_id AND q.id = :question_id",
            &[
                (":memory_id", Value::from(memory_id)),
                (":question_id", Value::from(question_id)),
                (":completeness", Value::from(completeness)),
            ],
        )
    }

    /// Links a memory that supports a goal; `strength` is in [0, 1].
    pub fn link_memory_to_goal(&self, memory_id: &str, goal_id: &str, strength: f64) -> Result<()> {
        validate_range(strength, 0.0, 1.0, "strength")?;
        self.store()?.run_write(
            "INSERT OR IGNORE INTO SUPPORTS (from_id, to_id, strength) \
             SELECT m.id, g.id, :strength FROM Memory m, Goal g \
             WHERE m.id = :memory_id AND g.id = :goal_id",
            &[
                (":memory_id", Value::from(memory_id)),
                (":goal_id", Value::from(goal_id)),
                (":strength", Value::from(strength)),
            ],
        )
    }

    /// Links a memory that reveals a preference.
    pub fn link_memory_to_preference(&self, memory_id: &str, preference_id: &str) -> Result<()> {
        self.store()?.run_write(
            "INSERT OR IGNORE INTO REVEALS (from_id, to_id) \
             SELECT m.id, p.id FROM Memory m, Preference p \
             WHERE m.id = :memory_id AND p.id = :preference_id",
            &[
                (":memory_id", Value::from(memory_id)),
                (":preference_id", Value::from(preference_id)),
            ],
        )
    }

    /// Links a memory to a temporal marker.
    pub fn link_memory_to_temporal(&self, memory_id: &str, temporal_id: &str) -> Result<()> {
        self.store()?.run_write(
            "INSERT OR IGNORE INTO OCCURRED_DURING (from_id, to_id) \
             SELECT m.id, t.id FROM Memory m, TemporalMarker t \
             WHERE m.id = :memory_id AND t.id = :temporal_id",
            &[
                (":memory_id", Value::from(memory_id)),
                (":temporal_id", Value::from(temporal_id)),
            ],
        )
    }

    /// Links two memories with a synaptic edge owned by `memory_id_1`.
    ///
    /// When `check_compartments` is set and the formation rule denies the
    /// pair, nothing is written and `false` is returned. A missing
    /// `permeability` stores the open policy.
    pub fn link_memories(
        &self,
        memory_id_1: &str,
        memory_id_2: &str,
        strength: f64,
        rel_type: &str,
        permeability: Option<Permeability>,
        check_compartments: bool,
    ) -> Result<bool> {
        validate_range(strength, 0.0, 1.0, "strength")?;
        if check_compartments && !self.can_form_connection(memory_id_1, memory_id_2)? {
            return Ok(false);
        }

        let permeability = permeability.unwrap_or(Permeability::Open);
        self.store()?.run_write(
            "INSERT OR IGNORE INTO RELATES_TO (from_id, to_id, strength, relType, permeability) \
             SELECT m1.id, m2.id, :strength, :rel_type, :permeability \
             FROM Memory m1, Memory m2 WHERE m1.id = :id1 AND m2.id = :id2",
            &[
                (":id1", Value::from(memory_id_1)),
                (":id2", Value::from(memory_id_2)),
                (":strength", Value::from(strength)),
                (":rel_type", Value::from(rel_type)),
                (":permeability", Value::from(permeability.as_str())),
            ],
        )?;
        Ok(true)
    }

    /// Links two related concepts.
    pub fn link_concepts(&self, concept_id_1: &str, concept_id_2: &str, rel_type: &str) -> Result<()> {
        self.store()?.run_write(
            "INSERT OR IGNORE INTO CONCEPT_RELATED_TO (from_id, to_id, relType) \
             SELECT c1.id, c2.id, :rel_type FROM Concept c1, Concept c2 \
             WHERE c1.id = :id1 AND c2.id = :id2",
            &[
                (":id1", Value::from(concept_id_1)),
                (":id2", Value::from(concept_id_2)),
                (":rel_type", Value::from(rel_type)),
            ],
        )
    }

    /// Links a goal that depends on another.
    pub fn link_goals(&self, goal_id_1: &str, goal_id_2: &str) -> Result<()> {
        self.store()?.run_write(
            "INSERT OR IGNORE INTO DEPENDS_ON (from_id, to_id) \
             SELECT g1.id, g2.id FROM Goal g1, Goal g2 WHERE g1.id = :id1 AND g2.id = :id2",
            &[
                (":id1", Value::from(goal_id_1)),
                (":id2", Value::from(goal_id_2)),
            ],
        )
    }

    /// Links a decision that led to another.
    pub fn link_decisions(&self, decision_id_1: &str, decision_id_2: &str) -> Result<()> {
        self.store()?.run_write(
            "INSERT OR IGNORE INTO LED_TO (from_id, to_id) \
             SELECT d1.id, d2.id FROM Decision d1, Decision d2 \
             WHERE d1.id = :id1 AND d2.id = :id2",
            &[
                (":id1", Value::from(decision_id_1)),
                (":id2", Value::from(decision_id_2)),
            ],
        )
    }

    /// Links a context as part of a parent context.
    pub fn link_contexts(&self, parent_id: &str, child_id: &str) -> Result<()> {
        self.store()?.run_write(
            "INSERT OR IGNORE INTO PART_OF (from_id, to_id) \
             SELECT c.id, p.id FROM Context p, Context c \
             WHERE p.id = :parent_id AND c.id = :child_id",
            &[
                (":parent_id", Value::from(parent_id)),
                (":child_id", Value::from(child_id)),
            ],
        )
    }

    /// Marks two memories as conflicting under a contradiction node.
    pub fn mark_contradiction(
        &self,
        contradiction_id: &str,
        memory_id_1: &str,
        memory_id_2: &str,
    ) -> Result<()> {
        for memory_id in [memory_id_1, memory_id_2] {
            self.store()?.run_write(
                "INSERT OR IGNORE INTO CONFLICTS_WITH (from_id, to_id) \
                 SELECT c.id, m.id FROM Contradiction c, Memory m \
                 WHERE c.id = :cid AND m.id = :mid",
                &[
                    (":cid", Value::from(contradiction_id)),
                    (":mid", Value::from(memory_id)),
                ],
            )?;
        }
        Ok(())
    }

    /// Resolves a contradiction, recording which memory supersedes.
    ///
    /// Sets the status to resolved, stores the resolution text, and writes
    /// the SUPERSEDES edge to the winning memory.
    pub fn resolve_contradiction(
        &self,
        contradiction_id: &str,
        superseding_memory_id: &str,
        resolution: &str,
    ) -> Result<()> {
        self.store()?.run_write(
            "UPDATE Contradiction SET status = 'resolved', resolution = :resolution \
             WHERE id = :cid",
            &[
                (":cid", Value::from(contradiction_id)),
                (":resolution", Value::from(resolution)),
            ],
        )?;
        self.store()?.run_write(
            "INSERT OR IGNORE INTO SUPERSEDES (from_id, to_id) \
             SELECT c.id, m.id FROM Contradiction c, Memory m \
             WHERE c.id = :cid AND m.id = :mid",
            &[
                (":cid", Value::from(contradiction_id)),
                (":mid", Value::from(superseding_memory_id)),
            ],
        )
    }
}
