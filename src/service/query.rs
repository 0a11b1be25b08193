//! Query operations.
//!
//! Retrieval is an act that changes memory: `get_memory` updates the access
//! tracking columns and, when enabled, triggers retrieval-induced
//! strengthening. Queries that answer on behalf of a memory respect
//! permeability by over-fetching and post-filtering.

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use super::{MemoryGraphService, MEMORY_COLUMNS};
use crate::models::{
    ChainRole, ConnectionRecord, ContradictionGroup, DecisionChainEntry, GoalRecord, MemoryRecord,
    MemoryRef, PreferenceRecord, QuestionRecord,
};
use crate::storage::Value;
use crate::Result;

/// All node tables, in deletion-safe order for wholesale wipes.
pub(crate) const NODE_TABLE_NAMES: &[&str] = &[
    "Memory",
    "Concept",
    "Keyword",
    "Topic",
    "Entity",
    "Source",
    "Decision",
    "Goal",
    "Question",
    "Context",
    "Preference",
    "TemporalMarker",
    "Contradiction",
    "Compartment",
];

/// All relation tables.
pub(crate) const REL_TABLE_NAMES: &[&str] = &[
    "HAS_CONCEPT",
    "HAS_KEYWORD",
    "BELONGS_TO",
    "MENTIONS",
    "FROM_SOURCE",
    "IN_CONTEXT",
    "INFORMED",
    "PARTIALLY_ANSWERS",
    "SUPPORTS",
    "REVEALS",
    "OCCURRED_DURING",
    "RELATES_TO",
    "IN_COMPARTMENT",
    "CONCEPT_RELATED_TO",
    "DEPENDS_ON",
    "LED_TO",
    "PART_OF",
    "CONFLICTS_WITH",
    "SUPERSEDES",
];

/// Quotes every whitespace-separated token of a full-text query so user
/// input cannot hit match-syntax errors.
fn sanitize_match_query(term: &str) -> String {
    term.split_whitespace()
        .map(|token| format!("\"{}\"", token.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(" ")
}

impl MemoryGraphService {
    /// Retrieves a memory by id, updating its access tracking.
    ///
    /// `lastAccessed` and `accessCount` update atomically before the read,
    /// so the returned row reflects this access. Retrieval side-effects run
    /// after the read when requested.
    pub fn get_memory(
        &self,
        memory_id: &str,
        apply_retrieval_effects: bool,
    ) -> Result<Option<MemoryRecord>> {
        self.store()?.run_write(
            "UPDATE Memory SET lastAccessed = :now, accessCount = accessCount + 1 \
             WHERE id = :id",
            &[
                (":id", Value::from(memory_id)),
                (":now", Value::from(Self::now())),
            ],
        )?;

        let rows = self.store()?.run_query(
            &format!("SELECT {MEMORY_COLUMNS} FROM Memory m WHERE m.id = :id"),
            &[(":id", Value::from(memory_id))],
        )?;
        let record = rows.first().map(Self::memory_record).transpose()?;

        if record.is_some() && apply_retrieval_effects {
            self.apply_retrieval_effects(memory_id, None)?;
        }
        Ok(record)
    }

    /// Searches memories by content or summary.
    ///
    /// Uses the full-text index with relevance ordering when the store
    /// probed it successfully; otherwise falls back to a containment scan
    /// ordered by last access.
    pub fn search_memories(&self, search_term: &str, limit: i64) -> Result<Vec<MemoryRecord>> {
        if self.store()?.fts_available() {
            let sanitized = sanitize_match_query(search_term);
            if sanitized.is_empty() {
                return Ok(Vec::new());
            }
            let rows = self.store()?.run_query(
                &format!(
                    "SELECT {MEMORY_COLUMNS} FROM memory_fts \
                     JOIN Memory m ON m.id = memory_fts.id \
                     WHERE memory_fts MATCH :term \
                     ORDER BY memory_fts.rank LIMIT :limit"
                ),
                &[
                    (":term", Value::from(sanitized)),
                    (":limit", Value::from(limit)),
                ],
            )?;
            return rows.iter().map(Self::memory_record).collect();
        }

        let rows = self.store()?.run_query(
            &format!(
                "SELECT {MEMORY_COLUMNS} FROM Memory m \
                 WHERE instr(m.content, :term) > 0 OR instr(m.summary, :term) > 0 \
                 ORDER BY m.lastAccessed DESC LIMIT :limit"
            ),
            &[
                (":term", Value::from(search_term)),
                (":limit", Value::from(limit)),
            ],
        )?;
        rows.iter().map(Self::memory_record).collect()
    }

    /// Memories related to the given one through shared concepts, topped up
    /// with shared keywords.
    ///
    /// When permeability is respected, candidates are over-fetched threefold
    /// and post-filtered: only memories whose data may flow to the requester
    /// survive.
    pub fn get_related_memories(
        &self,
        memory_id: &str,
        limit: i64,
        respect_permeability: bool,
    ) -> Result<Vec<MemoryRecord>> {
        let fetch_limit = if respect_permeability { limit * 3 } else { limit };

        let rows = self.store()?.run_query(
            &format!(
                "SELECT DISTINCT {MEMORY_COLUMNS} FROM HAS_CONCEPT hc1 \
                 JOIN HAS_CONCEPT hc2 ON hc2.to_id = hc1.to_id AND hc2.from_id <> hc1.from_id \
                 JOIN Memory m ON m.id = hc2.from_id \
                 WHERE hc1.from_id = :id LIMIT :limit"
            ),
            &[
                (":id", Value::from(memory_id)),
                (":limit", Value::from(fetch_limit)),
            ],
        )?;
        let mut results: Vec<MemoryRecord> =
            rows.iter().map(Self::memory_record).collect::<Result<_>>()?;

        if (results.len() as i64) < fetch_limit {
            let remaining = fetch_limit - results.len() as i64;
            let rows = self.store()?.run_query(
                &format!(
                    "SELECT DISTINCT {MEMORY_COLUMNS} FROM HAS_KEYWORD hk1 \
                     JOIN HAS_KEYWORD hk2 ON hk2.to_id = hk1.to_id AND hk2.from_id <> hk1.from_id \
                     JOIN Memory m ON m.id = hk2.from_id \
                     WHERE hk1.from_id = :id LIMIT :remaining"
                ),
                &[
                    (":id", Value::from(memory_id)),
                    (":remaining", Value::from(remaining)),
                ],
            )?;
            let mut seen: HashSet<String> = results.iter().map(|r| r.id.clone()).collect();
            for row in &rows {
                let record = Self::memory_record(row)?;
                if seen.insert(record.id.clone()) {
                    results.push(record);
                }
            }
        }

        if respect_permeability {
            results = self.filter_memories_by_permeability(memory_id, results, |r| &r.id)?;
        }

        results.truncate(limit.max(0) as usize);
        Ok(results)
    }

    /// Memories associated with a concept, most recently accessed first.
    ///
    /// Applies retrieval side-effects through the concept edge when both
    /// the caller and the configuration allow it.
    pub fn get_memories_by_concept(
        &self,
        concept_name: &str,
        limit: i64,
        apply_retrieval_effects: bool,
    ) -> Result<Vec<MemoryRecord>> {
        let concept_rows = self.store()?.run_query(
            "SELECT id FROM Concept WHERE name = :name",
            &[(":name", Value::from(concept_name))],
        )?;
        let concept_id = concept_rows.first().map(|row| row.text("id")).transpose()?;

        let rows = self.store()?.run_query(
            &format!(
                "SELECT {MEMORY_COLUMNS} FROM Memory m \
                 JOIN HAS_CONCEPT hc ON hc.from_id = m.id \
                 JOIN Concept c ON c.id = hc.to_id \
                 WHERE c.name = :name \
                 ORDER BY m.lastAccessed DESC LIMIT :limit"
            ),
            &[
                (":name", Value::from(concept_name)),
                (":limit", Value::from(limit)),
            ],
        )?;
        let results: Vec<MemoryRecord> =
            rows.iter().map(Self::memory_record).collect::<Result<_>>()?;

        if apply_retrieval_effects && self.plasticity_config().retrieval_strengthens {
            if let Some(concept_id) = concept_id {
                debug!(concept = concept_name, hits = results.len(), "concept retrieval");
                for record in &results {
                    self.apply_retrieval_effects(&record.id, Some(concept_id.as_str()))?;
                }
            }
        }
        Ok(results)
    }

    /// Memories associated with a keyword, most recently accessed first.
    pub fn get_memories_by_keyword(&self, keyword: &str, limit: i64) -> Result<Vec<MemoryRecord>> {
        let rows = self.store()?.run_query(
            &format!(
                "SELECT {MEMORY_COLUMNS} FROM Memory m \
                 JOIN HAS_KEYWORD hk ON hk.from_id = m.id \
                 JOIN Keyword k ON k.id = hk.to_id \
                 WHERE k.term = :term \
                 ORDER BY m.lastAccessed DESC LIMIT :limit"
            ),
            &[
                (":term", Value::from(keyword)),
                (":limit", Value::from(limit)),
            ],
        )?;
        rows.iter().map(Self::memory_record).collect()
    }

    /// Memories belonging to a topic, most recently accessed first.
    pub fn get_memories_by_topic(&self, topic_name: &str, limit: i64) -> Result<Vec<MemoryRecord>> {
        let rows = self.store()?.run_query(
            &format!(
                "SELECT {MEMORY_COLUMNS} FROM Memory m \
                 JOIN BELONGS_TO bt ON bt.from_id = m.id \
                 JOIN Topic t ON t.id = bt.to_id \
                 WHERE t.name = :name \
                 ORDER BY m.lastAccessed DESC LIMIT :limit"
            ),
            &[
                (":name", Value::from(topic_name)),
                (":limit", Value::from(limit)),
            ],
        )?;
        rows.iter().map(Self::memory_record).collect()
    }

    /// Memories mentioning an entity, most recently accessed first.
    pub fn get_memories_by_entity(&self, entity_name: &str, limit: i64) -> Result<Vec<MemoryRecord>> {
        let rows = self.store()?.run_query(
            &format!(
                "SELECT {MEMORY_COLUMNS} FROM Memory m \
                 JOIN MENTIONS mn ON mn.from_id = m.id \
                 JOIN Entity e ON e.id = mn.to_id \
                 WHERE e.name = :name \
                 ORDER BY m.lastAccessed DESC LIMIT :limit"
            ),
            &[
                (":name", Value::from(entity_name)),
                (":limit", Value::from(limit)),
            ],
        )?;
        rows.iter().map(Self::memory_record).collect()
    }

    /// The strongest connections from a memory.
    ///
    /// Over-fetches threefold and post-filters when permeability is
    /// respected.
    pub fn get_strongest_connections(
        &self,
        memory_id: &str,
        limit: i64,
        respect_permeability: bool,
    ) -> Result<Vec<ConnectionRecord>> {
        self.connections_by_strength(memory_id, limit, respect_permeability, "DESC")
    }

    /// The weakest connections from a memory (pruning candidates).
    pub fn get_weakest_connections(
        &self,
        memory_id: &str,
        limit: i64,
        respect_permeability: bool,
    ) -> Result<Vec<ConnectionRecord>> {
        self.connections_by_strength(memory_id, limit, respect_permeability, "ASC")
    }

    fn connections_by_strength(
        &self,
        memory_id: &str,
        limit: i64,
        respect_permeability: bool,
        order: &str,
    ) -> Result<Vec<ConnectionRecord>> {
        let fetch_limit = if respect_permeability { limit * 3 } else { limit };
        let rows = self.store()?.run_query(
            &format!(
                "SELECT related.id AS id, related.summary AS summary, \
                        r.strength AS strength, r.permeability AS permeability \
                 FROM RELATES_TO r JOIN Memory related ON related.id = r.to_id \
                 WHERE r.from_id = :memory_id \
                 ORDER BY r.strength {order} LIMIT :limit"
            ),
            &[
                (":memory_id", Value::from(memory_id)),
                (":limit", Value::from(fetch_limit)),
            ],
        )?;
        let mut results: Vec<ConnectionRecord> = rows
            .iter()
            .map(|row| {
                Ok(ConnectionRecord {
                    id: row.text("id")?,
                    summary: row.text("summary")?,
                    strength: row.float("strength")?,
                    permeability: Self::decode_permeability(&row.text("permeability")?)?,
                })
            })
            .collect::<Result<_>>()?;

        if respect_permeability {
            results = self.filter_memories_by_permeability(memory_id, results, |r| &r.id)?;
        }
        results.truncate(limit.max(0) as usize);
        Ok(results)
    }

    /// Open and partially answered questions, newest first.
    pub fn get_open_questions(&self) -> Result<Vec<QuestionRecord>> {
        let rows = self.store()?.run_query(
            "SELECT id, text, status, answeredDate, created FROM Question \
             WHERE status = 'open' OR status = 'partial' \
             ORDER BY created DESC",
            &[],
        )?;
        rows.iter()
            .map(|row| {
                Ok(QuestionRecord {
                    id: row.text("id")?,
                    text: row.text("text")?,
                    status: row.text("status")?,
                    answered_date: row.text("answeredDate")?,
                    created: row.text("created")?,
                })
            })
            .collect()
    }

    /// Active goals, highest priority (lowest number) first.
    pub fn get_active_goals(&self) -> Result<Vec<GoalRecord>> {
        let rows = self.store()?.run_query(
            "SELECT id, description, status, priority, targetDate, created FROM Goal \
             WHERE status = 'active' \
             ORDER BY priority ASC, created ASC",
            &[],
        )?;
        rows.iter()
            .map(|row| {
                Ok(GoalRecord {
                    id: row.text("id")?,
                    description: row.text("description")?,
                    status: row.text("status")?,
                    priority: row.int("priority")?,
                    target_date: row.text("targetDate")?,
                    created: row.text("created")?,
                })
            })
            .collect()
    }

    /// Unresolved contradictions grouped with their conflicting memories.
    pub fn get_unresolved_contradictions(&self) -> Result<Vec<ContradictionGroup>> {
        let rows = self.store()?.run_query(
            "SELECT c.id AS contradiction_id, c.description AS description, \
                    m.id AS memory_id, m.summary AS memory_summary \
             FROM Contradiction c \
             JOIN CONFLICTS_WITH cw ON cw.from_id = c.id \
             JOIN Memory m ON m.id = cw.to_id \
             WHERE c.status = 'unresolved'",
            &[],
        )?;

        let mut groups: Vec<ContradictionGroup> = Vec::new();
        for row in &rows {
            let cid = row.text("contradiction_id")?;
            let memory = MemoryRef {
                id: row.text("memory_id")?,
                summary: row.text("memory_summary")?,
            };
            if let Some(group) = groups.iter_mut().find(|g| g.id == cid) {
                group.memories.push(memory);
            } else {
                groups.push(ContradictionGroup {
                    id: cid,
                    description: row.text("description")?,
                    memories: vec![memory],
                });
            }
        }
        Ok(groups)
    }

    /// Memories marked as superseding under a resolved contradiction.
    pub fn get_superseded_memories(&self, contradiction_id: &str) -> Result<Vec<MemoryRef>> {
        let rows = self.store()?.run_query(
            "SELECT m.id AS id, m.summary AS summary \
             FROM SUPERSEDES s JOIN Memory m ON m.id = s.to_id \
             WHERE s.from_id = :cid",
            &[(":cid", Value::from(contradiction_id))],
        )?;
        rows.iter()
            .map(|row| {
                Ok(MemoryRef {
                    id: row.text("id")?,
                    summary: row.text("summary")?,
                })
            })
            .collect()
    }

    /// Preferences in a category, strongest first.
    pub fn get_preferences_by_category(&self, category: &str) -> Result<Vec<PreferenceRecord>> {
        let rows = self.store()?.run_query(
            "SELECT id, category, preference, strength, observations, created FROM Preference \
             WHERE category = :category \
             ORDER BY strength DESC",
            &[(":category", Value::from(category))],
        )?;
        rows.iter()
            .map(|row| {
                Ok(PreferenceRecord {
                    id: row.text("id")?,
                    category: row.text("category")?,
                    preference: row.text("preference")?,
                    strength: row.float("strength")?,
                    observations: row.int("observations")?,
                    created: row.text("created")?,
                })
            })
            .collect()
    }

    /// Predecessors and successors of a decision in the LED_TO chain.
    pub fn get_decision_chain(&self, decision_id: &str) -> Result<Vec<DecisionChainEntry>> {
        let decode = |row: &crate::storage::Row, relation: ChainRole| -> Result<DecisionChainEntry> {
            Ok(DecisionChainEntry {
                id: row.text("id")?,
                description: row.text("description")?,
                rationale: row.text("rationale")?,
                date: row.text("date")?,
                outcome: row.text("outcome")?,
                relation,
            })
        };

        let predecessors = self.store()?.run_query(
            "SELECT d1.id AS id, d1.description AS description, d1.rationale AS rationale, \
                    d1.date AS date, d1.outcome AS outcome \
             FROM Decision d1 JOIN LED_TO lt ON lt.from_id = d1.id \
             WHERE lt.to_id = :id",
            &[(":id", Value::from(decision_id))],
        )?;
        let successors = self.store()?.run_query(
            "SELECT d2.id AS id, d2.description AS description, d2.rationale AS rationale, \
                    d2.date AS date, d2.outcome AS outcome \
             FROM Decision d2 JOIN LED_TO lt ON lt.to_id = d2.id \
             WHERE lt.from_id = :id",
            &[(":id", Value::from(decision_id))],
        )?;

        let mut chain = Vec::with_capacity(predecessors.len() + successors.len());
        for row in &predecessors {
            chain.push(decode(row, ChainRole::Predecessor)?);
        }
        for row in &successors {
            chain.push(decode(row, ChainRole::Successor)?);
        }
        Ok(chain)
    }

    /// Counts of every node type in one batched query.
    pub fn get_node_counts(&self) -> Result<BTreeMap<String, i64>> {
        let sql = NODE_TABLE_NAMES
            .iter()
            .map(|table| format!("SELECT '{table}' AS type, COUNT(*) AS cnt FROM {table}"))
            .collect::<Vec<_>>()
            .join(" UNION ALL ");
        let rows = self.store()?.run_query(&sql, &[])?;

        let mut counts: BTreeMap<String, i64> = NODE_TABLE_NAMES
            .iter()
            .map(|table| ((*table).to_string(), 0))
            .collect();
        for row in &rows {
            counts.insert(row.text("type")?, row.int("cnt")?);
        }
        Ok(counts)
    }

    /// Deletes all data from the database.
    pub fn delete_all_data(&self) -> Result<()> {
        for table in REL_TABLE_NAMES {
            self.store()?
                .run_write(&format!("DELETE FROM {table}"), &[])?;
        }
        for table in NODE_TABLE_NAMES {
            self.store()?
                .run_write(&format!("DELETE FROM {table}"), &[])?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_match_query_quotes_tokens() {
        assert_eq!(sanitize_match_query("embedded"), "\"embedded\"");
        assert_eq!(
            sanitize_match_query("graph database"),
            "\"graph\" \"database\""
        );
        assert_eq!(sanitize_match_query("a\"b"), "\"a\"\"b\"");
        assert_eq!(sanitize_match_query("   "), "");
    }
}
