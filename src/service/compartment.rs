//! Compartment operations and permeability plumbing.
//!
//! The service fetches memory- and compartment-level policies (batched, one
//! round-trip per layer) and delegates every decision to the pure evaluator
//! in [`crate::permeability`].

use tracing::debug;

use super::MemoryGraphService;
use crate::models::{CompartmentMemberRecord, CompartmentRecord, CompartmentRef, Permeability};
use crate::permeability::{can_data_flow, filter_by_permeability, FlowProfile};
use crate::storage::{Row, Value};
use crate::{Error, Result};

fn compartment_record(row: &Row) -> Result<CompartmentRecord> {
    Ok(CompartmentRecord {
        id: row.text("id")?,
        name: row.text("name")?,
        permeability: MemoryGraphService::decode_permeability(&row.text("permeability")?)?,
        allow_external_connections: row.boolean("allowExternalConnections")?,
        description: row.text("description")?,
        created: row.text("created")?,
    })
}

impl MemoryGraphService {
    /// Retrieves a compartment by id.
    pub fn get_compartment(&self, compartment_id: &str) -> Result<Option<CompartmentRecord>> {
        let rows = self.store()?.run_query(
            "SELECT id, name, permeability, allowExternalConnections, description, created \
             FROM Compartment WHERE id = :id",
            &[(":id", Value::from(compartment_id))],
        )?;
        rows.first().map(compartment_record).transpose()
    }

    /// Retrieves a compartment by name.
    pub fn get_compartment_by_name(&self, name: &str) -> Result<Option<CompartmentRecord>> {
        let rows = self.store()?.run_query(
            "SELECT id, name, permeability, allowExternalConnections, description, created \
             FROM Compartment WHERE name = :name",
            &[(":name", Value::from(name))],
        )?;
        rows.first().map(compartment_record).transpose()
    }

    /// Updates compartment properties; `None` fields are left untouched.
    pub fn update_compartment(
        &self,
        compartment_id: &str,
        permeability: Option<Permeability>,
        allow_external_connections: Option<bool>,
        description: Option<&str>,
    ) -> Result<()> {
        let mut updates = Vec::new();
        let mut params = vec![(":id", Value::from(compartment_id))];

        if let Some(permeability) = permeability {
            updates.push("permeability = :permeability");
            params.push((":permeability", Value::from(permeability.as_str())));
        }
        if let Some(allow) = allow_external_connections {
            updates.push("allowExternalConnections = :allow_external");
            params.push((":allow_external", Value::from(allow)));
        }
        if let Some(description) = description {
            updates.push("description = :description");
            params.push((":description", Value::from(description)));
        }

        if updates.is_empty() {
            return Ok(());
        }
        let sql = format!(
            "UPDATE Compartment SET {} WHERE id = :id",
            updates.join(", ")
        );
        self.store()?.run_write(&sql, &params)
    }

    /// Deletes a compartment.
    ///
    /// With `reassign_memories` the resident memories simply lose the
    /// membership; without it the delete fails on a non-empty compartment.
    pub fn delete_compartment(&self, compartment_id: &str, reassign_memories: bool) -> Result<()> {
        if !reassign_memories {
            let rows = self.store()?.run_query(
                "SELECT COUNT(*) AS count FROM IN_COMPARTMENT WHERE to_id = :id",
                &[(":id", Value::from(compartment_id))],
            )?;
            let resident_count = rows.first().map_or(Ok(0), |row| row.int("count"))?;
            if resident_count > 0 {
                return Err(Error::CompartmentInUse {
                    compartment_id: compartment_id.to_string(),
                    resident_count,
                });
            }
        }

        self.store()?.run_write(
            "DELETE FROM IN_COMPARTMENT WHERE to_id = :id",
            &[(":id", Value::from(compartment_id))],
        )?;
        self.store()?.run_write(
            "DELETE FROM Compartment WHERE id = :id",
            &[(":id", Value::from(compartment_id))],
        )?;
        debug!(compartment_id, "deleted compartment");
        Ok(())
    }

    /// Sets the active compartment for new memories; `None` clears it.
    pub fn set_active_compartment(&mut self, compartment_id: Option<String>) {
        self.active_compartment = compartment_id;
    }

    /// The currently active compartment id, if any.
    #[must_use]
    pub fn active_compartment(&self) -> Option<&str> {
        self.active_compartment.as_deref()
    }

    /// Adds memories to a compartment.
    ///
    /// Membership is many-to-many; adding a memory already in the
    /// compartment is a no-op.
    pub fn add_memory_to_compartment(
        &self,
        memory_ids: &[&str],
        compartment_id: &str,
    ) -> Result<()> {
        let ids: Vec<String> = memory_ids.iter().map(ToString::to_string).collect();
        self.store()?.run_write(
            "INSERT OR IGNORE INTO IN_COMPARTMENT (from_id, to_id) \
             SELECT m.id, c.id FROM Memory m, Compartment c \
             WHERE m.id IN (SELECT value FROM rarray(:mids)) AND c.id = :cid",
            &[
                (":mids", Value::from(ids)),
                (":cid", Value::from(compartment_id)),
            ],
        )
    }

    /// Removes memories from a compartment, or from all compartments when
    /// none is named.
    pub fn remove_memory_from_compartment(
        &self,
        memory_ids: &[&str],
        compartment_id: Option<&str>,
    ) -> Result<()> {
        let ids: Vec<String> = memory_ids.iter().map(ToString::to_string).collect();
        match compartment_id {
            Some(cid) => self.store()?.run_write(
                "DELETE FROM IN_COMPARTMENT \
                 WHERE from_id IN (SELECT value FROM rarray(:mids)) AND to_id = :cid",
                &[(":mids", Value::from(ids)), (":cid", Value::from(cid))],
            ),
            None => self.store()?.run_write(
                "DELETE FROM IN_COMPARTMENT \
                 WHERE from_id IN (SELECT value FROM rarray(:mids))",
                &[(":mids", Value::from(ids))],
            ),
        }
    }

    /// Every compartment a memory belongs to; empty means the memory is
    /// global.
    pub fn get_memory_compartments(&self, memory_id: &str) -> Result<Vec<CompartmentRef>> {
        let rows = self.store()?.run_query(
            "SELECT c.id AS id, c.name AS name, c.permeability AS permeability, \
                    c.allowExternalConnections AS allowExternalConnections \
             FROM IN_COMPARTMENT ic JOIN Compartment c ON c.id = ic.to_id \
             WHERE ic.from_id = :mid",
            &[(":mid", Value::from(memory_id))],
        )?;
        rows.iter()
            .map(|row| {
                Ok(CompartmentRef {
                    id: row.text("id")?,
                    name: row.text("name")?,
                    permeability: Self::decode_permeability(&row.text("permeability")?)?,
                    allow_external_connections: row.boolean("allowExternalConnections")?,
                })
            })
            .collect()
    }

    /// Memories inside a compartment.
    pub fn get_memories_in_compartment(
        &self,
        compartment_id: &str,
        limit: i64,
    ) -> Result<Vec<CompartmentMemberRecord>> {
        let rows = self.store()?.run_query(
            "SELECT m.id AS id, m.summary AS summary, m.content AS content, \
                    m.created AS created, m.confidence AS confidence \
             FROM Memory m JOIN IN_COMPARTMENT ic ON ic.from_id = m.id \
             WHERE ic.to_id = :cid LIMIT :limit",
            &[
                (":cid", Value::from(compartment_id)),
                (":limit", Value::from(limit)),
            ],
        )?;
        rows.iter()
            .map(|row| {
                Ok(CompartmentMemberRecord {
                    id: row.text("id")?,
                    summary: row.text("summary")?,
                    content: row.text("content")?,
                    created: row.text("created")?,
                    confidence: row.float("confidence")?,
                })
            })
            .collect()
    }

    /// A memory's own flow policy, if the memory exists.
    pub fn get_memory_permeability(&self, memory_id: &str) -> Result<Option<Permeability>> {
        let rows = self.store()?.run_query(
            "SELECT permeability FROM Memory WHERE id = :id",
            &[(":id", Value::from(memory_id))],
        )?;
        rows.first()
            .map(|row| Self::decode_permeability(&row.text("permeability")?))
            .transpose()
    }

    /// Sets the flow policy on one or more memories.
    pub fn set_memory_permeability(
        &self,
        memory_ids: &[&str],
        permeability: Permeability,
    ) -> Result<()> {
        let ids: Vec<String> = memory_ids.iter().map(ToString::to_string).collect();
        self.store()?.run_write(
            "UPDATE Memory SET permeability = :perm \
             WHERE id IN (SELECT value FROM rarray(:ids))",
            &[
                (":perm", Value::from(permeability.as_str())),
                (":ids", Value::from(ids)),
            ],
        )
    }

    /// The flow policy on a specific connection, if the edge exists.
    pub fn get_connection_permeability(
        &self,
        memory_id_1: &str,
        memory_id_2: &str,
    ) -> Result<Option<Permeability>> {
        let rows = self.store()?.run_query(
            "SELECT permeability FROM RELATES_TO WHERE from_id = :id1 AND to_id = :id2",
            &[
                (":id1", Value::from(memory_id_1)),
                (":id2", Value::from(memory_id_2)),
            ],
        )?;
        rows.first()
            .map(|row| Self::decode_permeability(&row.text("permeability")?))
            .transpose()
    }

    /// Sets the flow policy on a specific connection.
    pub fn set_connection_permeability(
        &self,
        memory_id_1: &str,
        memory_id_2: &str,
        permeability: Permeability,
    ) -> Result<()> {
        self.store()?.run_write(
            "UPDATE RELATES_TO SET permeability = :perm \
             WHERE from_id = :id1 AND to_id = :id2",
            &[
                (":id1", Value::from(memory_id_1)),
                (":id2", Value::from(memory_id_2)),
                (":perm", Value::from(permeability.as_str())),
            ],
        )
    }

    /// The full flow profile of a memory: its own policy plus every
    /// compartment's.
    pub(crate) fn flow_profile(&self, memory_id: &str) -> Result<FlowProfile> {
        let permeability = self.get_memory_permeability(memory_id)?;
        let compartments = self.get_memory_compartments(memory_id)?;
        Ok(FlowProfile::new(permeability, &compartments))
    }

    /// Whether data may flow from one memory to another, across every layer.
    pub fn can_data_flow(
        &self,
        from_memory_id: &str,
        to_memory_id: &str,
        connection_permeability: Option<Permeability>,
    ) -> Result<bool> {
        let from = self.flow_profile(from_memory_id)?;
        let to = self.flow_profile(to_memory_id)?;
        Ok(can_data_flow(&from, &to, connection_permeability))
    }

    /// Post-filters query results by permeability with batched lookups.
    ///
    /// One round-trip fetches every involved memory policy, a second
    /// fetches every compartment membership; the pure evaluator then drops
    /// candidates whose data may not flow to the requester.
    pub(crate) fn filter_memories_by_permeability<T>(
        &self,
        requester_memory_id: &str,
        candidates: Vec<T>,
        id_of: impl Fn(&T) -> &str,
    ) -> Result<Vec<T>> {
        if candidates.is_empty() {
            return Ok(candidates);
        }

        let mut ids: Vec<String> = candidates.iter().map(|c| id_of(c).to_string()).collect();
        ids.push(requester_memory_id.to_string());

        let perm_rows = self.store()?.run_query(
            "SELECT id, permeability FROM Memory \
             WHERE id IN (SELECT value FROM rarray(:ids))",
            &[(":ids", Value::from(ids.clone()))],
        )?;
        let mut memory_perms = std::collections::HashMap::new();
        for row in &perm_rows {
            memory_perms.insert(
                row.text("id")?,
                Self::decode_permeability(&row.text("permeability")?)?,
            );
        }

        let comp_rows = self.store()?.run_query(
            "SELECT ic.from_id AS mem_id, c.permeability AS permeability \
             FROM IN_COMPARTMENT ic JOIN Compartment c ON c.id = ic.to_id \
             WHERE ic.from_id IN (SELECT value FROM rarray(:ids))",
            &[(":ids", Value::from(ids))],
        )?;
        let mut memory_comps: std::collections::HashMap<String, Vec<Permeability>> =
            std::collections::HashMap::new();
        for row in &comp_rows {
            memory_comps
                .entry(row.text("mem_id")?)
                .or_default()
                .push(Self::decode_permeability(&row.text("permeability")?)?);
        }

        let profile_for = |id: &str| FlowProfile {
            permeability: memory_perms.get(id).copied(),
            compartments: memory_comps.get(id).cloned().unwrap_or_default(),
        };

        let requester = profile_for(requester_memory_id);
        Ok(filter_by_permeability(&requester, candidates, |c| {
            profile_for(id_of(c))
        }))
    }
}
