//! Create operations.
//!
//! Interned types (concept, keyword, topic, entity, source, context,
//! compartment) look up their identity tuple first and return the existing
//! id when present. Preference is the documented exception: a repeat create
//! merges into the existing row (running-average strength, incremented
//! observation count).

use chrono::SecondsFormat;
use tracing::debug;

use super::MemoryGraphService;
use crate::models::{
    Compartment, Concept, Context, Contradiction, Decision, Entity, Goal, Keyword, Memory,
    MemoryId, Preference, Question, Source, TemporalMarker, Topic,
};
use crate::storage::Value;
use crate::Result;

impl MemoryGraphService {
    /// Inserts a memory node.
    ///
    /// Compartment assignment: `Some(id)` adds the memory to that
    /// compartment, `None` uses the active compartment (if set), and
    /// `Some("")` explicitly suppresses both.
    pub fn create_memory(&self, memory: &Memory, compartment_id: Option<&str>) -> Result<MemoryId> {
        self.store()?.run_write(
            "INSERT INTO Memory \
             (id, content, summary, created, lastAccessed, accessCount, confidence, permeability) \
             VALUES (:id, :content, :summary, :created, :last_accessed, :access_count, \
                     :confidence, :permeability)",
            &[
                (":id", Value::from(memory.id.as_str())),
                (":content", Value::from(memory.content.as_str())),
                (":summary", Value::from(memory.summary.as_str())),
                (":created", Value::from(memory.created.to_rfc3339_opts(SecondsFormat::Micros, true))),
                (":last_accessed", Value::from(memory.last_accessed.to_rfc3339_opts(SecondsFormat::Micros, true))),
                (":access_count", Value::from(memory.access_count)),
                (":confidence", Value::from(memory.confidence)),
                (":permeability", Value::from(memory.permeability.as_str())),
            ],
        )?;
        debug!(memory_id = %memory.id, "created memory");

        let effective = match compartment_id {
            Some(explicit) => {
                if explicit.is_empty() {
                    None
                } else {
                    Some(explicit.to_string())
                }
            }
            None => self.active_compartment().map(ToString::to_string),
        };
        if let Some(compartment) = effective {
            self.add_memory_to_compartment(&[memory.id.as_str()], &compartment)?;
        }

        Ok(memory.id.clone())
    }

    /// Looks up an interned node by its identity query, returning its id.
    fn intern(&self, check_sql: &str, params: &[(&str, Value)]) -> Result<Option<String>> {
        let rows = self.store()?.run_query(check_sql, params)?;
        rows.first().map(|row| row.text("id")).transpose()
    }

    /// Creates a concept node or returns the existing one with the same name.
    pub fn create_concept(&self, concept: &Concept) -> Result<String> {
        if let Some(id) = self.intern(
            "SELECT id FROM Concept WHERE name = :name",
            &[(":name", Value::from(concept.name.as_str()))],
        )? {
            return Ok(id);
        }

        self.store()?.run_write(
            "INSERT INTO Concept (id, name, description, created) \
             VALUES (:id, :name, :description, :created)",
            &[
                (":id", Value::from(concept.id.as_str())),
                (":name", Value::from(concept.name.as_str())),
                (":description", Value::from(concept.description.as_str())),
                (":created", Value::from(concept.created.to_rfc3339_opts(SecondsFormat::Micros, true))),
            ],
        )?;
        Ok(concept.id.clone())
    }

    /// Creates a keyword node or returns the existing one with the same term.
    pub fn create_keyword(&self, keyword: &Keyword) -> Result<String> {
        if let Some(id) = self.intern(
            "SELECT id FROM Keyword WHERE term = :term",
            &[(":term", Value::from(keyword.term.as_str()))],
        )? {
            return Ok(id);
        }

        self.store()?.run_write(
            "INSERT INTO Keyword (id, term, created) VALUES (:id, :term, :created)",
            &[
                (":id", Value::from(keyword.id.as_str())),
                (":term", Value::from(keyword.term.as_str())),
                (":created", Value::from(keyword.created.to_rfc3339_opts(SecondsFormat::Micros, true))),
            ],
        )?;
        Ok(keyword.id.clone())
    }

    /// Creates a topic node or returns the existing one with the same name.
    pub fn create_topic(&self, topic: &Topic) -> Result<String> {
        if let Some(id) = self.intern(
            "SELECT id FROM Topic WHERE name = :name",
            &[(":name", Value::from(topic.name.as_str()))],
        )? {
            return Ok(id);
        }

        self.store()?.run_write(
            "INSERT INTO Topic (id, name, description, created) \
             VALUES (:id, :name, :description, :created)",
            &[
                (":id", Value::from(topic.id.as_str())),
                (":name", Value::from(topic.name.as_str())),
                (":description", Value::from(topic.description.as_str())),
                (":created", Value::from(topic.created.to_rfc3339_opts(SecondsFormat::Micros, true))),
            ],
        )?;
        Ok(topic.id.clone())
    }

    /// Creates an entity node or returns the existing one with the same
    /// (name, kind) pair.
    pub fn create_entity(&self, entity: &Entity) -> Result<String> {
        if let Some(id) = self.intern(
            "SELECT id FROM Entity WHERE name = :name AND type = :type",
            &[
                (":name", Value::from(entity.name.as_str())),
                (":type", Value::from(entity.kind.as_str())),
            ],
        )? {
            return Ok(id);
        }

        let aliases = serde_json::to_string(&entity.aliases).unwrap_or_else(|_| "[]".to_string());
        self.store()?.run_write(
            "INSERT INTO Entity (id, name, type, description, aliases, created) \
             VALUES (:id, :name, :type, :description, :aliases, :created)",
            &[
                (":id", Value::from(entity.id.as_str())),
                (":name", Value::from(entity.name.as_str())),
                (":type", Value::from(entity.kind.as_str())),
                (":description", Value::from(entity.description.as_str())),
                (":aliases", Value::from(aliases)),
                (":created", Value::from(entity.created.to_rfc3339_opts(SecondsFormat::Micros, true))),
            ],
        )?;
        Ok(entity.id.clone())
    }

    /// Creates a source node or returns the existing one with the same
    /// (reference, kind) pair.
    pub fn create_source(&self, source: &Source) -> Result<String> {
        if let Some(id) = self.intern(
            "SELECT id FROM Source WHERE reference = :reference AND type = :type",
            &[
                (":reference", Value::from(source.reference.as_str())),
                (":type", Value::from(source.kind.as_str())),
            ],
        )? {
            return Ok(id);
        }

        self.store()?.run_write(
            "INSERT INTO Source (id, type, reference, title, reliability, created) \
             VALUES (:id, :type, :reference, :title, :reliability, :created)",
            &[
                (":id", Value::from(source.id.as_str())),
                (":type", Value::from(source.kind.as_str())),
                (":reference", Value::from(source.reference.as_str())),
                (":title", Value::from(source.title.as_str())),
                (":reliability", Value::from(source.reliability)),
                (":created", Value::from(source.created.to_rfc3339_opts(SecondsFormat::Micros, true))),
            ],
        )?;
        Ok(source.id.clone())
    }

    /// Creates a decision node.
    pub fn create_decision(&self, decision: &Decision) -> Result<String> {
        self.store()?.run_write(
            "INSERT INTO Decision (id, description, rationale, date, outcome, reversible) \
             VALUES (:id, :description, :rationale, :date, :outcome, :reversible)",
            &[
                (":id", Value::from(decision.id.as_str())),
                (":description", Value::from(decision.description.as_str())),
                (":rationale", Value::from(decision.rationale.as_str())),
                (":date", Value::from(decision.date.to_rfc3339_opts(SecondsFormat::Micros, true))),
                (":outcome", Value::from(decision.outcome.as_str())),
                (":reversible", Value::from(decision.reversible)),
            ],
        )?;
        Ok(decision.id.clone())
    }

    /// Creates a goal node.
    pub fn create_goal(&self, goal: &Goal) -> Result<String> {
        let target = goal
            .target_date
            .map(|d| d.to_rfc3339_opts(SecondsFormat::Micros, true))
            .unwrap_or_default();
        self.store()?.run_write(
            "INSERT INTO Goal (id, description, status, priority, targetDate, created) \
             VALUES (:id, :description, :status, :priority, :target_date, :created)",
            &[
                (":id", Value::from(goal.id.as_str())),
                (":description", Value::from(goal.description.as_str())),
                (":status", Value::from(goal.status.as_str())),
                (":priority", Value::from(goal.priority)),
                (":target_date", Value::from(target)),
                (":created", Value::from(goal.created.to_rfc3339_opts(SecondsFormat::Micros, true))),
            ],
        )?;
        Ok(goal.id.clone())
    }

    /// Creates a question node.
    pub fn create_question(&self, question: &Question) -> Result<String> {
        let answered = question
            .answered_date
            .map(|d| d.to_rfc3339_opts(SecondsFormat::Micros, true))
            .unwrap_or_default();
        self.store()?.run_write(
            "INSERT INTO Question (id, text, status, answeredDate, created) \
             VALUES (:id, :text, :status, :answered_date, :created)",
            &[
                (":id", Value::from(question.id.as_str())),
                (":text", Value::from(question.text.as_str())),
                (":status", Value::from(question.status.as_str())),
                (":answered_date", Value::from(answered)),
                (":created", Value::from(question.created.to_rfc3339_opts(SecondsFormat::Micros, true))),
            ],
        )?;
        Ok(question.id.clone())
    }

    /// Creates a context node or returns the existing one with the same
    /// (name, kind) pair.
    pub fn create_context(&self, context: &Context) -> Result<String> {
        if let Some(id) = self.intern(
            "SELECT id FROM Context WHERE name = :name AND type = :type",
            &[
                (":name", Value::from(context.name.as_str())),
                (":type", Value::from(context.kind.as_str())),
            ],
        )? {
            return Ok(id);
        }

        self.store()?.run_write(
            "INSERT INTO Context (id, name, type, description, status, created) \
             VALUES (:id, :name, :type, :description, :status, :created)",
            &[
                (":id", Value::from(context.id.as_str())),
                (":name", Value::from(context.name.as_str())),
                (":type", Value::from(context.kind.as_str())),
                (":description", Value::from(context.description.as_str())),
                (":status", Value::from(context.status.as_str())),
                (":created", Value::from(context.created.to_rfc3339_opts(SecondsFormat::Micros, true))),
            ],
        )?;
        Ok(context.id.clone())
    }

    /// Creates a preference node, or merges into the existing one with the
    /// same (category, preference) pair.
    ///
    /// The merge keeps a running average:
    /// `strength <- (strength * observations + new_strength) / (observations + 1)`
    /// and increments `observations` by exactly one. Other fields are
    /// untouched.
    pub fn create_preference(&self, preference: &Preference) -> Result<String> {
        let rows = self.store()?.run_query(
            "SELECT id, strength, observations FROM Preference \
             WHERE category = :category AND preference = :preference",
            &[
                (":category", Value::from(preference.category.as_str())),
                (":preference", Value::from(preference.preference.as_str())),
            ],
        )?;

        if let Some(existing) = rows.first() {
            let id = existing.text("id")?;
            let strength = existing.float("strength")?;
            let observations = existing.int("observations")?;

            let new_observations = observations + 1;
            let new_strength = (strength * observations as f64 + preference.strength)
                / new_observations as f64;
            self.store()?.run_write(
                "UPDATE Preference SET observations = :observations, strength = :strength \
                 WHERE id = :id",
                &[
                    (":id", Value::from(id.as_str())),
                    (":observations", Value::from(new_observations)),
                    (":strength", Value::from(new_strength)),
                ],
            )?;
            return Ok(id);
        }

        self.store()?.run_write(
            "INSERT INTO Preference (id, category, preference, strength, observations, created) \
             VALUES (:id, :category, :preference, :strength, :observations, :created)",
            &[
                (":id", Value::from(preference.id.as_str())),
                (":category", Value::from(preference.category.as_str())),
                (":preference", Value::from(preference.preference.as_str())),
                (":strength", Value::from(preference.strength)),
                (":observations", Value::from(preference.observations)),
                (":created", Value::from(preference.created.to_rfc3339_opts(SecondsFormat::Micros, true))),
            ],
        )?;
        Ok(preference.id.clone())
    }

    /// Creates a temporal marker node.
    pub fn create_temporal_marker(&self, marker: &TemporalMarker) -> Result<String> {
        let start = marker.start_date.map(|d| d.to_rfc3339_opts(SecondsFormat::Micros, true)).unwrap_or_default();
        let end = marker.end_date.map(|d| d.to_rfc3339_opts(SecondsFormat::Micros, true)).unwrap_or_default();
        self.store()?.run_write(
            "INSERT INTO TemporalMarker (id, type, description, startDate, endDate, created) \
             VALUES (:id, :type, :description, :start_date, :end_date, :created)",
            &[
                (":id", Value::from(marker.id.as_str())),
                (":type", Value::from(marker.kind.as_str())),
                (":description", Value::from(marker.description.as_str())),
                (":start_date", Value::from(start)),
                (":end_date", Value::from(end)),
                (":created", Value::from(marker.created.to_rfc3339_opts(SecondsFormat::Micros, true))),
            ],
        )?;
        Ok(marker.id.clone())
    }

    /// Creates a contradiction node.
    pub fn create_contradiction(&self, contradiction: &Contradiction) -> Result<String> {
        self.store()?.run_write(
            "INSERT INTO Contradiction (id, description, resolution, status, created) \
             VALUES (:id, :description, :resolution, :status, :created)",
            &[
                (":id", Value::from(contradiction.id.as_str())),
                (":description", Value::from(contradiction.description.as_str())),
                (":resolution", Value::from(contradiction.resolution.as_str())),
                (":status", Value::from(contradiction.status.as_str())),
                (":created", Value::from(contradiction.created.to_rfc3339_opts(SecondsFormat::Micros, true))),
            ],
        )?;
        Ok(contradiction.id.clone())
    }

    /// Creates a compartment or returns the existing one with the same name.
    pub fn create_compartment(&self, compartment: &Compartment) -> Result<String> {
        if let Some(id) = self.intern(
            "SELECT id FROM Compartment WHERE name = :name",
            &[(":name", Value::from(compartment.name.as_str()))],
        )? {
            return Ok(id);
        }

        self.store()?.run_write(
            "INSERT INTO Compartment \
             (id, name, permeability, allowExternalConnections, description, created) \
             VALUES (:id, :name, :permeability, :allow_external, :description, :created)",
            &[
                (":id", Value::from(compartment.id.as_str())),
                (":name", Value::from(compartment.name.as_str())),
                (
                    ":permeability",
                    Value::from(compartment.permeability.as_str()),
                ),
                (
                    ":allow_external",
                    Value::from(compartment.allow_external_connections),
                ),
                (":description", Value::from(compartment.description.as_str())),
                (":created", Value::from(compartment.created.to_rfc3339_opts(SecondsFormat::Micros, true))),
            ],
        )?;
        Ok(compartment.id.clone())
    }
}
