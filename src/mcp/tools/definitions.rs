//! Tool definitions for the agent-facing surface.
//!
//! Contains the JSON Schema definitions for all axons tools.

use super::ToolDefinition;

const PERMEABILITY_VALUES: [&str; 4] = ["open", "closed", "osmotic_inward", "osmotic_outward"];
const ENTITY_KINDS: [&str; 6] = [
    "person",
    "organization",
    "project",
    "tool",
    "technology",
    "place",
];

/// Defines the store tool.
pub fn store_tool() -> ToolDefinition {
    ToolDefinition {
        name: "axons_store".to_string(),
        description: "Store a memory with its associations (concepts, keywords, topics, entities) \
                      in one transaction"
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "content": {
                    "type": "string",
                    "description": "The full memory content"
                },
                "summary": {
                    "type": "string",
                    "description": "A short summary used in listings"
                },
                "concepts": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Concept names to intern and link"
                },
                "keywords": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Keyword terms to intern and link"
                },
                "topics": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Topic names to intern and link"
                },
                "entities": {
                    "type": "array",
                    "description": "Entities to intern and link",
                    "items": {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string" },
                            "type": { "type": "string", "enum": ENTITY_KINDS }
                        },
                        "required": ["name", "type"]
                    }
                },
                "confidence": {
                    "type": "number",
                    "description": "Confidence in the memory's accuracy (default 1.0)",
                    "minimum": 0.0,
                    "maximum": 1.0
                },
                "permeability": {
                    "type": "string",
                    "description": "Memory-level flow policy (default open)",
                    "enum": PERMEABILITY_VALUES
                },
                "compartment_id": {
                    "type": "string",
                    "description": "Compartment to place the memory in; empty string suppresses \
                                    the active compartment"
                }
            },
            "required": ["content", "summary"]
        }),
    }
}

/// Defines the recall tool.
pub fn recall_tool() -> ToolDefinition {
    ToolDefinition {
        name: "axons_recall".to_string(),
        description: "Recall a memory by id. Updates access tracking and applies \
                      retrieval-induced strengthening."
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "id": {
                    "type": "string",
                    "description": "The memory id"
                }
            },
            "required": ["id"]
        }),
    }
}

/// Defines the search tool.
pub fn search_tool() -> ToolDefinition {
    ToolDefinition {
        name: "axons_search".to_string(),
        description: "Search memories by content or summary (full-text when available, \
                      containment otherwise)"
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "term": {
                    "type": "string",
                    "description": "The search term"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of results (default 10)",
                    "minimum": 1,
                    "maximum": 100
                }
            },
            "required": ["term"]
        }),
    }
}

/// Defines the related-memories tool.
pub fn related_tool() -> ToolDefinition {
    ToolDefinition {
        name: "axons_related".to_string(),
        description: "Find memories related to one through shared concepts and keywords, \
                      honoring permeability"
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "id": {
                    "type": "string",
                    "description": "The anchor memory id"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of results (default 20)",
                    "minimum": 1,
                    "maximum": 100
                }
            },
            "required": ["id"]
        }),
    }
}

/// Defines the create-concept tool.
pub fn create_concept_tool() -> ToolDefinition {
    ToolDefinition {
        name: "axons_create_concept".to_string(),
        description: "Create a concept node (or return the existing one with this name)"
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "name": { "type": "string", "description": "Concept name" },
                "description": { "type": "string", "description": "Optional description" }
            },
            "required": ["name"]
        }),
    }
}

/// Defines the create-keyword tool.
pub fn create_keyword_tool() -> ToolDefinition {
    ToolDefinition {
        name: "axons_create_keyword".to_string(),
        description: "Create a keyword node (or return the existing one with this term)"
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "term": { "type": "string", "description": "Keyword term" }
            },
            "required": ["term"]
        }),
    }
}

/// Defines the create-topic tool.
pub fn create_topic_tool() -> ToolDefinition {
    ToolDefinition {
        name: "axons_create_topic".to_string(),
        description: "Create a topic node (or return the existing one with this name)".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "name": { "type": "string", "description": "Topic name" },
                "description": { "type": "string", "description": "Optional description" }
            },
            "required": ["name"]
        }),
    }
}

/// Defines the create-entity tool.
pub fn create_entity_tool() -> ToolDefinition {
    ToolDefinition {
        name: "axons_create_entity".to_string(),
        description: "Create an entity node (or return the existing one with this name and type)"
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "name": { "type": "string", "description": "Entity name" },
                "type": {
                    "type": "string",
                    "description": "Entity kind",
                    "enum": ENTITY_KINDS
                },
                "description": { "type": "string", "description": "Optional description" },
                "aliases": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Alternative names"
                }
            },
            "required": ["name", "type"]
        }),
    }
}

/// Defines the link-concepts tool.
pub fn link_concepts_tool() -> ToolDefinition {
    ToolDefinition {
        name: "axons_link_concepts".to_string(),
        description: "Link two related concepts".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "concept_id_1": { "type": "string", "description": "First concept id" },
                "concept_id_2": { "type": "string", "description": "Second concept id" },
                "rel_type": { "type": "string", "description": "Optional relationship label" }
            },
            "required": ["concept_id_1", "concept_id_2"]
        }),
    }
}

fn memories_by_tool(name: &str, description: &str, key: &str, key_description: &str) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                key: { "type": "string", "description": key_description },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of results (default 20)",
                    "minimum": 1,
                    "maximum": 100
                }
            },
            "required": [key]
        }),
    }
}

/// Defines the memories-by-concept tool.
pub fn memories_by_concept_tool() -> ToolDefinition {
    memories_by_tool(
        "axons_memories_by_concept",
        "List memories associated with a concept (applies retrieval-induced strengthening)",
        "name",
        "Concept name",
    )
}

/// Defines the memories-by-keyword tool.
pub fn memories_by_keyword_tool() -> ToolDefinition {
    memories_by_tool(
        "axons_memories_by_keyword",
        "List memories associated with a keyword",
        "term",
        "Keyword term",
    )
}

/// Defines the memories-by-topic tool.
pub fn memories_by_topic_tool() -> ToolDefinition {
    memories_by_tool(
        "axons_memories_by_topic",
        "List memories belonging to a topic",
        "name",
        "Topic name",
    )
}

/// Defines the memories-by-entity tool.
pub fn memories_by_entity_tool() -> ToolDefinition {
    memories_by_tool(
        "axons_memories_by_entity",
        "List memories mentioning an entity",
        "name",
        "Entity name",
    )
}

fn link_strength_tool(name: &str, description: &str) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "memory_id_1": { "type": "string", "description": "Edge owner memory id" },
                "memory_id_2": { "type": "string", "description": "Edge target memory id" },
                "amount": {
                    "type": "number",
                    "description": "Explicit amount; omitted means the configured \
                                    context amount shaped by the plasticity curve"
                }
            },
            "required": ["memory_id_1", "memory_id_2"]
        }),
    }
}

/// Defines the strengthen tool.
pub fn strengthen_tool() -> ToolDefinition {
    link_strength_tool(
        "axons_strengthen",
        "Strengthen the connection between two memories",
    )
}

/// Defines the weaken tool.
pub fn weaken_tool() -> ToolDefinition {
    link_strength_tool(
        "axons_weaken",
        "Weaken the connection between two memories",
    )
}

/// Defines the maintenance tool.
pub fn run_maintenance_tool() -> ToolDefinition {
    ToolDefinition {
        name: "axons_run_maintenance".to_string(),
        description: "Run maintenance cycles: decay weak connections and prune dead ones"
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "cycles": {
                    "type": "integer",
                    "description": "Number of cycles to run (default 1)",
                    "minimum": 1,
                    "maximum": 1000
                }
            },
            "required": []
        }),
    }
}

/// Defines the connection-statistics tool.
pub fn connection_stats_tool() -> ToolDefinition {
    ToolDefinition {
        name: "axons_connection_stats".to_string(),
        description: "Statistics over all memory-to-memory connections: count, bounds, average, \
                      strength histogram, decay/prune candidates"
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        }),
    }
}

/// Defines the configure tool.
pub fn configure_tool() -> ToolDefinition {
    ToolDefinition {
        name: "axons_configure".to_string(),
        description: "Adjust plasticity: apply a preset and/or override the learning rate"
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "preset": {
                    "type": "string",
                    "description": "Named preset to apply",
                    "enum": [
                        "default",
                        "aggressive_learning",
                        "conservative_learning",
                        "no_plasticity",
                        "high_decay"
                    ]
                },
                "learning_rate": {
                    "type": "number",
                    "description": "Master multiplier for all plasticity operations",
                    "minimum": 0.0
                }
            },
            "required": []
        }),
    }
}

/// Defines the create-compartment tool.
pub fn create_compartment_tool() -> ToolDefinition {
    ToolDefinition {
        name: "axons_create_compartment".to_string(),
        description: "Create a compartment for memory isolation (or return the existing one \
                      with this name)"
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "name": { "type": "string", "description": "Compartment name" },
                "permeability": {
                    "type": "string",
                    "description": "Compartment-level flow policy (default open)",
                    "enum": PERMEABILITY_VALUES
                },
                "allow_external_connections": {
                    "type": "boolean",
                    "description": "Whether organic connections may form to the outside \
                                    (default true)"
                },
                "description": { "type": "string", "description": "Optional description" }
            },
            "required": ["name"]
        }),
    }
}

/// Defines the add-to-compartment tool.
pub fn add_to_compartment_tool() -> ToolDefinition {
    ToolDefinition {
        name: "axons_add_to_compartment".to_string(),
        description: "Add memories to a compartment (membership is many-to-many; duplicates \
                      are no-ops)"
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "memory_ids": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Memory ids to add"
                },
                "compartment_id": { "type": "string", "description": "Target compartment id" }
            },
            "required": ["memory_ids", "compartment_id"]
        }),
    }
}

/// Defines the set-active-compartment tool.
pub fn set_active_compartment_tool() -> ToolDefinition {
    ToolDefinition {
        name: "axons_set_active_compartment".to_string(),
        description: "Set (or clear) the compartment newly stored memories default into"
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "compartment_id": {
                    "type": "string",
                    "description": "Compartment id; omit to clear the active compartment"
                }
            },
            "required": []
        }),
    }
}

/// Defines the set-permeability tool.
pub fn set_permeability_tool() -> ToolDefinition {
    ToolDefinition {
        name: "axons_set_permeability".to_string(),
        description: "Set the flow policy on a memory or a compartment".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "memory_id": { "type": "string", "description": "Memory to update" },
                "compartment_id": { "type": "string", "description": "Compartment to update" },
                "value": {
                    "type": "string",
                    "description": "The new flow policy",
                    "enum": PERMEABILITY_VALUES
                }
            },
            "required": ["value"]
        }),
    }
}

/// Defines the check-data-flow tool.
pub fn check_data_flow_tool() -> ToolDefinition {
    ToolDefinition {
        name: "axons_check_data_flow".to_string(),
        description: "Check whether data may flow from one memory to another across every \
                      permeability layer"
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "from": { "type": "string", "description": "Source memory id" },
                "to": { "type": "string", "description": "Destination memory id" }
            },
            "required": ["from", "to"]
        }),
    }
}
