//! The agent-facing tool surface.
//!
//! A registry of `{name, description, input_schema}` definitions plus a
//! dispatch table mapping tool names to handlers over the memory graph
//! service. Results are JSON maps; every failure surfaces as an
//! `{"error": "<message>"}` map at this boundary.
//!
//! # Module Structure
//!
//! - [`definitions`]: tool schema definitions (JSON Schema input validation)
//! - [`handlers`]: tool execution logic

mod definitions;
mod handlers;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::service::MemoryGraphService;

/// Definition of one tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name.
    pub name: String,
    /// Tool description.
    pub description: String,
    /// JSON Schema for input validation.
    pub input_schema: Value,
}

/// Registry of all axons tools.
pub struct ToolRegistry {
    tools: BTreeMap<String, ToolDefinition>,
}

impl ToolRegistry {
    /// Creates the registry with the full operation set.
    #[must_use]
    pub fn new() -> Self {
        let mut tools = BTreeMap::new();
        for definition in [
            // memory
            definitions::store_tool(),
            definitions::recall_tool(),
            definitions::search_tool(),
            definitions::related_tool(),
            // associations
            definitions::create_concept_tool(),
            definitions::create_keyword_tool(),
            definitions::create_topic_tool(),
            definitions::create_entity_tool(),
            definitions::link_concepts_tool(),
            definitions::memories_by_concept_tool(),
            definitions::memories_by_keyword_tool(),
            definitions::memories_by_topic_tool(),
            definitions::memories_by_entity_tool(),
            // plasticity
            definitions::strengthen_tool(),
            definitions::weaken_tool(),
            definitions::run_maintenance_tool(),
            definitions::connection_stats_tool(),
            definitions::configure_tool(),
            // compartments
            definitions::create_compartment_tool(),
            definitions::add_to_compartment_tool(),
            definitions::set_active_compartment_tool(),
            definitions::set_permeability_tool(),
            definitions::check_data_flow_tool(),
        ] {
            tools.insert(definition.name.clone(), definition);
        }
        Self { tools }
    }

    /// All tool definitions, name-ordered.
    #[must_use]
    pub fn list_tools(&self) -> Vec<&ToolDefinition> {
        self.tools.values().collect()
    }

    /// Looks up a tool definition by name.
    #[must_use]
    pub fn get_tool(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.get(name)
    }

    /// Executes a tool against the service.
    ///
    /// Never returns an error: failures become `{"error": "<message>"}`
    /// maps, which is what programmatic agents see.
    pub fn execute(&self, service: &mut MemoryGraphService, name: &str, args: &Value) -> Value {
        let result = match name {
            "axons_store" => handlers::execute_store(service, args),
            "axons_recall" => handlers::execute_recall(service, args),
            "axons_search" => handlers::execute_search(service, args),
            "axons_related" => handlers::execute_related(service, args),
            "axons_create_concept" => handlers::execute_create_concept(service, args),
            "axons_create_keyword" => handlers::execute_create_keyword(service, args),
            "axons_create_topic" => handlers::execute_create_topic(service, args),
            "axons_create_entity" => handlers::execute_create_entity(service, args),
            "axons_link_concepts" => handlers::execute_link_concepts(service, args),
            "axons_memories_by_concept" => handlers::execute_memories_by_concept(service, args),
            "axons_memories_by_keyword" => handlers::execute_memories_by_keyword(service, args),
            "axons_memories_by_topic" => handlers::execute_memories_by_topic(service, args),
            "axons_memories_by_entity" => handlers::execute_memories_by_entity(service, args),
            "axons_strengthen" => handlers::execute_strengthen(service, args),
            "axons_weaken" => handlers::execute_weaken(service, args),
            "axons_run_maintenance" => handlers::execute_run_maintenance(service, args),
            "axons_connection_stats" => handlers::execute_connection_stats(service, args),
            "axons_configure" => handlers::execute_configure(service, args),
            "axons_create_compartment" => handlers::execute_create_compartment(service, args),
            "axons_add_to_compartment" => handlers::execute_add_to_compartment(service, args),
            "axons_set_active_compartment" => {
                handlers::execute_set_active_compartment(service, args)
            }
            "axons_set_permeability" => handlers::execute_set_permeability(service, args),
            "axons_check_data_flow" => handlers::execute_check_data_flow(service, args),
            _ => return json!({ "error": format!("Unknown tool: {name}") }),
        };
        result.unwrap_or_else(|e| json!({ "error": e.to_string() }))
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plasticity::PlasticityConfig;

    fn service() -> MemoryGraphService {
        MemoryGraphService::open_in_memory(PlasticityConfig::default()).unwrap()
    }

    #[test]
    fn test_registry_lists_full_operation_set() {
        let registry = ToolRegistry::new();
        let tools = registry.list_tools();
        assert_eq!(tools.len(), 23);
        assert!(registry.get_tool("axons_store").is_some());
        assert!(registry.get_tool("axons_recall").is_some());
        assert!(registry.get_tool("axons_check_data_flow").is_some());
    }

    #[test]
    fn test_store_and_recall_round_trip() {
        let registry = ToolRegistry::new();
        let mut service = service();

        let stored = registry.execute(
            &mut service,
            "axons_store",
            &json!({
                "content": "LadybugDB is embedded",
                "summary": "DB overview",
                "keywords": ["embedded"]
            }),
        );
        let id = stored["id"].as_str().unwrap().to_string();

        let recalled = registry.execute(&mut service, "axons_recall", &json!({ "id": id }));
        assert_eq!(recalled["summary"], "DB overview");
        assert_eq!(recalled["accessCount"], 1);
    }

    #[test]
    fn test_recall_missing_memory_is_null() {
        let registry = ToolRegistry::new();
        let mut service = service();
        let result = registry.execute(&mut service, "axons_recall", &json!({ "id": "nope" }));
        assert!(result.is_null());
    }

    #[test]
    fn test_errors_surface_as_error_maps() {
        let registry = ToolRegistry::new();
        let mut service = service();

        let result = registry.execute(&mut service, "axons_store", &json!({ "content": "x" }));
        assert!(result["error"].as_str().unwrap().contains("summary"));

        let result = registry.execute(&mut service, "bogus_tool", &json!({}));
        assert!(result["error"].as_str().unwrap().contains("Unknown tool"));
    }

    #[test]
    fn test_configure_applies_preset_and_rate() {
        let registry = ToolRegistry::new();
        let mut service = service();

        let result = registry.execute(
            &mut service,
            "axons_configure",
            &json!({ "preset": "no_plasticity", "learning_rate": 0.2 }),
        );
        assert_eq!(result["learning_rate"], 0.2);
        assert_eq!(service.plasticity_config().learning_rate, 0.2);
        assert!(!service.plasticity_config().retrieval_strengthens);
    }

    #[test]
    fn test_set_permeability_requires_a_target() {
        let registry = ToolRegistry::new();
        let mut service = service();
        let result = registry.execute(
            &mut service,
            "axons_set_permeability",
            &json!({ "value": "closed" }),
        );
        assert!(result["error"].as_str().unwrap().contains("memory_id"));
    }
}
