//! Plasticity operations: strengthening, weakening, Hebbian learning,
//! decay, pruning, retrieval side-effects, and connection statistics.
//!
//! Every strength write is a single CASE expression so the clamp is
//! evaluated inside the store; two concurrent relative updates cannot both
//! read the pre-value. An explicitly supplied amount is scaled by the
//! learning rate only; the implicit path runs through the plasticity curve.

use std::collections::BTreeMap;

use tracing::debug;

use super::MemoryGraphService;
use crate::models::{ConnectionStatistics, ConnectionStrength};
use crate::plasticity::PlasticityContext;
use crate::storage::Value;
use crate::Result;

impl MemoryGraphService {
    /// Current strength of the edge from one memory to another, if any.
    pub fn get_memory_link_strength(
        &self,
        memory_id_1: &str,
        memory_id_2: &str,
    ) -> Result<Option<f64>> {
        let rows = self.store()?.run_query(
            "SELECT strength FROM RELATES_TO WHERE from_id = :id1 AND to_id = :id2",
            &[
                (":id1", Value::from(memory_id_1)),
                (":id2", Value::from(memory_id_2)),
            ],
        )?;
        rows.first().map(|row| row.float("strength")).transpose()
    }

    /// Strengthens the connection between two memories.
    ///
    /// Without an explicit amount, the plasticity curve shapes the change
    /// from the current strength; a missing edge reads as 0. The new value
    /// is clamped to `max_strength` in the store.
    pub fn strengthen_memory_link(
        &self,
        memory_id_1: &str,
        memory_id_2: &str,
        amount: Option<f64>,
    ) -> Result<()> {
        let current = self
            .get_memory_link_strength(memory_id_1, memory_id_2)?
            .unwrap_or(0.0);
        let effective = match amount {
            Some(a) => a * self.plasticity_config().learning_rate,
            None => self
                .plasticity_config()
                .effective_amount(PlasticityContext::Strengthen, current),
        };
        if effective <= 0.0 {
            return Ok(());
        }

        self.store()?.run_write(
            "UPDATE RELATES_TO SET strength = CASE \
                 WHEN strength + :amount > :max THEN :max \
                 ELSE strength + :amount \
             END \
             WHERE from_id = :id1 AND to_id = :id2",
            &[
                (":id1", Value::from(memory_id_1)),
                (":id2", Value::from(memory_id_2)),
                (":amount", Value::from(effective)),
                (":max", Value::from(self.plasticity_config().max_strength)),
            ],
        )
    }

    /// Weakens the connection between two memories.
    ///
    /// A missing edge reads as 1.0 for the curve. The new value is clamped
    /// to `min_strength` in the store.
    pub fn weaken_memory_link(
        &self,
        memory_id_1: &str,
        memory_id_2: &str,
        amount: Option<f64>,
    ) -> Result<()> {
        let current = self
            .get_memory_link_strength(memory_id_1, memory_id_2)?
            .unwrap_or(1.0);
        let effective = match amount {
            Some(a) => a * self.plasticity_config().learning_rate,
            None => self
                .plasticity_config()
                .effective_amount(PlasticityContext::Weaken, current),
        };
        if effective <= 0.0 {
            return Ok(());
        }

        self.store()?.run_write(
            "UPDATE RELATES_TO SET strength = CASE \
                 WHEN strength - :amount < :min THEN :min \
                 ELSE strength - :amount \
             END \
             WHERE from_id = :id1 AND to_id = :id2",
            &[
                (":id1", Value::from(memory_id_1)),
                (":id2", Value::from(memory_id_2)),
                (":amount", Value::from(effective)),
                (":min", Value::from(self.plasticity_config().min_strength)),
            ],
        )
    }

    /// Increases a concept's relevance to a memory, clamped to 1.0.
    pub fn strengthen_concept_relevance(
        &self,
        memory_id: &str,
        concept_id: &str,
        amount: Option<f64>,
    ) -> Result<()> {
        let amount = amount.unwrap_or_else(|| {
            self.plasticity_config()
                .effective_amount(PlasticityContext::Strengthen, 0.5)
        });
        if amount <= 0.0 {
            return Ok(());
        }

        self.store()?.run_write(
            "UPDATE HAS_CONCEPT SET relevance = CASE \
                 WHEN relevance + :amount > 1.0 THEN 1.0 \
                 ELSE relevance + :amount \
             END \
             WHERE from_id = :memory_id AND to_id = :concept_id",
            &[
                (":memory_id", Value::from(memory_id)),
                (":concept_id", Value::from(concept_id)),
                (":amount", Value::from(amount)),
            ],
        )
    }

    /// Decreases a concept's relevance to a memory, clamped to 0.0.
    pub fn weaken_concept_relevance(
        &self,
        memory_id: &str,
        concept_id: &str,
        amount: Option<f64>,
    ) -> Result<()> {
        let amount = amount.unwrap_or_else(|| {
            self.plasticity_config()
                .effective_amount(PlasticityContext::Weaken, 0.5)
        });
        if amount <= 0.0 {
            return Ok(());
        }

        self.store()?.run_write(
            "UPDATE HAS_CONCEPT SET relevance = CASE \
                 WHEN relevance - :amount < 0.0 THEN 0.0 \
                 ELSE relevance - :amount \
             END \
             WHERE from_id = :memory_id AND to_id = :concept_id",
            &[
                (":memory_id", Value::from(memory_id)),
                (":concept_id", Value::from(concept_id)),
                (":amount", Value::from(amount)),
            ],
        )
    }

    /// Strengthens connections between every pair of co-accessed memories.
    ///
    /// Pairs with no edge in either direction get fresh bidirectional
    /// "hebbian" edges at the implicit initial strength, provided
    /// `hebbian_creates_connections` is enabled and, when
    /// `respect_compartments` is set, the formation rule permits the pair.
    /// Pairs with an existing edge strengthen whichever directions exist.
    pub fn apply_hebbian_learning(
        &self,
        memory_ids: &[&str],
        amount: Option<f64>,
        respect_compartments: bool,
    ) -> Result<()> {
        for (i, &id1) in memory_ids.iter().enumerate() {
            for &id2 in &memory_ids[i + 1..] {
                let strength_fwd = self.get_memory_link_strength(id1, id2)?;
                let strength_rev = self.get_memory_link_strength(id2, id1)?;
                let has_connection = strength_fwd.is_some() || strength_rev.is_some();

                if !has_connection {
                    if !self.plasticity_config().hebbian_creates_connections {
                        continue;
                    }
                    if respect_compartments && !self.can_form_connection(id1, id2)? {
                        continue;
                    }
                    let initial = self.plasticity_config().initial_strength(false, None, None);
                    self.link_memories(id1, id2, initial, "hebbian", None, false)?;
                    self.link_memories(id2, id1, initial, "hebbian", None, false)?;
                    debug!(from = id1, to = id2, initial, "hebbian edge pair created");
                } else {
                    let effective = amount.unwrap_or_else(|| {
                        self.plasticity_config().effective_amount(
                            PlasticityContext::Hebbian,
                            strength_fwd.or(strength_rev).unwrap_or(0.0),
                        )
                    });
                    if strength_fwd.is_some() {
                        self.strengthen_memory_link(id1, id2, Some(effective))?;
                    }
                    if strength_rev.is_some() {
                        self.strengthen_memory_link(id2, id1, Some(effective))?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Whether an organic connection may form between two memories.
    pub fn can_form_connection(&self, memory_id_1: &str, memory_id_2: &str) -> Result<bool> {
        let comps1 = self.get_memory_compartments(memory_id_1)?;
        let comps2 = self.get_memory_compartments(memory_id_2)?;
        Ok(crate::permeability::can_form_connection(&comps1, &comps2))
    }

    /// Applies decay to weak connections.
    ///
    /// With `decay_all`, every edge decays; otherwise only those below the
    /// threshold. Strength clamps to `min_strength`; when `auto_prune` is
    /// enabled the dead edges are pruned immediately after.
    pub fn decay_weak_connections(
        &self,
        threshold: Option<f64>,
        decay_amount: Option<f64>,
    ) -> Result<()> {
        let threshold = threshold.unwrap_or(self.plasticity_config().decay_threshold);
        let decay_amount = decay_amount.unwrap_or_else(|| {
            self.plasticity_config()
                .effective_amount(PlasticityContext::Decay, 0.5)
        });
        if decay_amount <= 0.0 {
            return Ok(());
        }

        let min = self.plasticity_config().min_strength;
        if self.plasticity_config().decay_all {
            self.store()?.run_write(
                "UPDATE RELATES_TO SET strength = CASE \
                     WHEN strength - :decay_amount < :min THEN :min \
                     ELSE strength - :decay_amount \
                 END",
                &[
                    (":decay_amount", Value::from(decay_amount)),
                    (":min", Value::from(min)),
                ],
            )?;
        } else {
            self.store()?.run_write(
                "UPDATE RELATES_TO SET strength = CASE \
                     WHEN strength - :decay_amount < :min THEN :min \
                     ELSE strength - :decay_amount \
                 END \
                 WHERE strength < :threshold",
                &[
                    (":threshold", Value::from(threshold)),
                    (":decay_amount", Value::from(decay_amount)),
                    (":min", Value::from(min)),
                ],
            )?;
        }

        if self.plasticity_config().auto_prune {
            self.prune_dead_connections(None)?;
        }
        Ok(())
    }

    /// Deletes connections at or below the prune threshold (or an override).
    pub fn prune_dead_connections(&self, min_strength: Option<f64>) -> Result<()> {
        let min_strength = min_strength.unwrap_or(self.plasticity_config().prune_threshold);
        self.store()?.run_write(
            "DELETE FROM RELATES_TO WHERE strength <= :min_strength",
            &[(":min_strength", Value::from(min_strength))],
        )
    }

    /// One tick of logical time: bumps the cycle counter and decays.
    pub fn run_maintenance_cycle(&mut self) -> Result<()> {
        self.access_cycle += 1;
        debug!(cycle = self.access_cycle, "maintenance cycle");
        self.decay_weak_connections(None, None)
    }

    /// Runs several maintenance cycles back to back.
    pub fn run_aggressive_maintenance(&mut self, cycles: u32) -> Result<()> {
        for _ in 0..cycles {
            self.run_maintenance_cycle()?;
        }
        Ok(())
    }

    /// Boosts every memory connection supporting a goal, clamped to 1.0.
    pub fn strengthen_goal_connections(&self, goal_id: &str, amount: Option<f64>) -> Result<()> {
        let amount = amount.unwrap_or_else(|| {
            self.plasticity_config()
                .effective_amount(PlasticityContext::Strengthen, 0.5)
        });
        if amount <= 0.0 {
            return Ok(());
        }

        self.store()?.run_write(
            "UPDATE SUPPORTS SET strength = CASE \
                 WHEN strength + :amount > 1.0 THEN 1.0 \
                 ELSE strength + :amount \
             END \
             WHERE to_id = :goal_id",
            &[
                (":goal_id", Value::from(goal_id)),
                (":amount", Value::from(amount)),
            ],
        )
    }

    /// Boosts the completeness of every answer connection to a question,
    /// clamped to 1.0.
    pub fn strengthen_question_connections(
        &self,
        question_id: &str,
        amount: Option<f64>,
    ) -> Result<()> {
        let amount = amount.unwrap_or_else(|| {
            self.plasticity_config()
                .effective_amount(PlasticityContext::Strengthen, 0.5)
        });
        if amount <= 0.0 {
            return Ok(());
        }

        self.store()?.run_write(
            "UPDATE PARTIALLY_ANSWERS SET completeness = CASE \
                 WHEN completeness + :amount > 1.0 THEN 1.0 \
                 ELSE completeness + :amount \
             END \
             WHERE to_id = :question_id",
            &[
                (":question_id", Value::from(question_id)),
                (":amount", Value::from(amount)),
            ],
        )
    }

    /// Every memory-to-memory connection, strongest first.
    pub fn get_all_connection_strengths(&self) -> Result<Vec<ConnectionStrength>> {
        let rows = self.store()?.run_query(
            "SELECT from_id, to_id, strength FROM RELATES_TO ORDER BY strength DESC",
            &[],
        )?;
        rows.iter()
            .map(|row| {
                Ok(ConnectionStrength {
                    from_id: row.text("from_id")?,
                    to_id: row.text("to_id")?,
                    strength: row.float("strength")?,
                })
            })
            .collect()
    }

    /// Aggregate statistics over all connections.
    ///
    /// Includes a ten-bucket histogram plus the counts relevant to
    /// maintenance: edges below the decay threshold and edges at or below
    /// the prune threshold.
    pub fn get_connection_statistics(&self) -> Result<ConnectionStatistics> {
        let connections = self.get_all_connection_strengths()?;
        if connections.is_empty() {
            return Ok(ConnectionStatistics::default());
        }

        let strengths: Vec<f64> = connections.iter().map(|c| c.strength).collect();
        let decay_threshold = self.plasticity_config().decay_threshold;
        let prune_threshold = self.plasticity_config().prune_threshold;

        let mut buckets: BTreeMap<String, u64> = (0..10)
            .map(|i| {
                (
                    format!("{:.1}-{:.1}", i as f64 / 10.0, (i + 1) as f64 / 10.0),
                    0,
                )
            })
            .collect();
        for s in &strengths {
            let idx = ((s * 10.0) as usize).min(9);
            let key = format!("{:.1}-{:.1}", idx as f64 / 10.0, (idx + 1) as f64 / 10.0);
            if let Some(count) = buckets.get_mut(&key) {
                *count += 1;
            }
        }

        let min = strengths.iter().copied().fold(f64::INFINITY, f64::min);
        let max = strengths.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let sum: f64 = strengths.iter().sum();

        Ok(ConnectionStatistics {
            count: strengths.len() as u64,
            min: Some(min),
            max: Some(max),
            avg: Some(sum / strengths.len() as f64),
            buckets,
            below_threshold: strengths.iter().filter(|&&s| s < decay_threshold).count() as u64,
            pruning_candidates: strengths.iter().filter(|&&s| s <= prune_threshold).count() as u64,
        })
    }

    /// Retrieval-induced modification for an accessed memory.
    ///
    /// Gated on `retrieval_strengthens`: boosts every incoming synaptic
    /// edge (incoming only), boosts the concept relevance when the access
    /// came through a concept, and optionally weakens competitors.
    pub(crate) fn apply_retrieval_effects(
        &self,
        memory_id: &str,
        via_concept_id: Option<&str>,
    ) -> Result<()> {
        if !self.plasticity_config().retrieval_strengthens {
            return Ok(());
        }

        let amount = self
            .plasticity_config()
            .effective_amount(PlasticityContext::Retrieval, 0.5);
        if amount > 0.0 {
            self.store()?.run_write(
                "UPDATE RELATES_TO SET strength = CASE \
                     WHEN strength + :amount > :max THEN :max \
                     ELSE strength + :amount \
                 END \
                 WHERE to_id = :id",
                &[
                    (":id", Value::from(memory_id)),
                    (":amount", Value::from(amount)),
                    (":max", Value::from(self.plasticity_config().max_strength)),
                ],
            )?;
        }

        if let Some(concept_id) = via_concept_id {
            self.strengthen_concept_relevance(memory_id, concept_id, None)?;
        }

        if self.plasticity_config().retrieval_weakens_competitors {
            self.weaken_competitors(memory_id)?;
        }
        Ok(())
    }

    /// Weakens the other edges of memories related to the accessed one.
    ///
    /// The amount is `weaken_amount * learning_rate * competitor_distance`
    /// with no curve applied.
    fn weaken_competitors(&self, accessed_memory_id: &str) -> Result<()> {
        let config = self.plasticity_config();
        let amount = config.weaken_amount * config.learning_rate * config.competitor_distance;
        if amount <= 0.0 {
            return Ok(());
        }

        // Competitors are neighbors of the accessed memory in either
        // direction; their edges not touching the accessed memory weaken.
        self.store()?.run_write(
            "UPDATE RELATES_TO SET strength = CASE \
                 WHEN strength - :amount < :min THEN :min \
                 ELSE strength - :amount \
             END \
             WHERE rowid IN ( \
                 SELECT r.rowid FROM RELATES_TO r \
                 JOIN ( \
                     SELECT CASE WHEN from_id = :id THEN to_id ELSE from_id END AS competitor_id \
                     FROM RELATES_TO WHERE from_id = :id OR to_id = :id \
                 ) neighbors \
                 ON r.from_id = neighbors.competitor_id OR r.to_id = neighbors.competitor_id \
                 WHERE r.from_id <> :id AND r.to_id <> :id \
             )",
            &[
                (":id", Value::from(accessed_memory_id)),
                (":amount", Value::from(amount)),
                (":min", Value::from(config.min_strength)),
            ],
        )
    }
}
