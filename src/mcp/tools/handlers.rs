//! Tool execution logic.
//!
//! Handlers deserialize loosely-typed JSON arguments, call the service, and
//! serialize the typed result records back to JSON. Argument problems raise
//! `InvalidInput`; the registry turns every error into an `{"error": ...}`
//! map at the boundary.

use serde_json::{json, Value};

use crate::models::{
    Compartment, Concept, Entity, EntityKind, Keyword, Permeability, Topic,
};
use crate::service::{MemoryGraphService, StoreRequest};
use crate::{Error, Result};

fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::InvalidInput(format!("missing required argument '{key}'")))
}

fn opt_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

fn opt_f64(args: &Value, key: &str) -> Option<f64> {
    args.get(key).and_then(Value::as_f64)
}

fn opt_i64(args: &Value, key: &str, default: i64) -> i64 {
    args.get(key).and_then(Value::as_i64).unwrap_or(default)
}

fn opt_bool(args: &Value, key: &str) -> Option<bool> {
    args.get(key).and_then(Value::as_bool)
}

fn str_array(args: &Value, key: &str) -> Vec<String> {
    args.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn parse_permeability(value: &str) -> Result<Permeability> {
    Permeability::parse(value)
        .ok_or_else(|| Error::InvalidInput(format!("unknown permeability '{value}'")))
}

fn parse_entity_kind(value: &str) -> Result<EntityKind> {
    EntityKind::parse(value)
        .ok_or_else(|| Error::InvalidInput(format!("unknown entity type '{value}'")))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| Error::InvalidInput(format!("unserializable: {e}")))
}

pub fn execute_store(service: &mut MemoryGraphService, args: &Value) -> Result<Value> {
    let mut entities = Vec::new();
    if let Some(items) = args.get("entities").and_then(Value::as_array) {
        for item in items {
            let name = required_str(item, "name")?;
            let kind = parse_entity_kind(required_str(item, "type")?)?;
            entities.push((name.to_string(), kind));
        }
    }

    let permeability = match opt_str(args, "permeability") {
        Some(value) => parse_permeability(value)?,
        None => Permeability::Open,
    };

    let request = StoreRequest {
        content: required_str(args, "content")?.to_string(),
        summary: required_str(args, "summary")?.to_string(),
        concepts: str_array(args, "concepts"),
        keywords: str_array(args, "keywords"),
        topics: str_array(args, "topics"),
        entities,
        confidence: opt_f64(args, "confidence").unwrap_or(1.0),
        permeability,
        compartment_id: opt_str(args, "compartment_id").map(ToString::to_string),
    };
    let id = service.quick_store_memory(&request)?;
    Ok(json!({ "id": id.as_str() }))
}

pub fn execute_recall(service: &mut MemoryGraphService, args: &Value) -> Result<Value> {
    let id = required_str(args, "id")?;
    match service.get_memory(id, true)? {
        Some(record) => to_json(&record),
        None => Ok(Value::Null),
    }
}

pub fn execute_search(service: &mut MemoryGraphService, args: &Value) -> Result<Value> {
    let term = required_str(args, "term")?;
    let limit = opt_i64(args, "limit", 10);
    let results = service.search_memories(term, limit)?;
    to_json(&results)
}

pub fn execute_related(service: &mut MemoryGraphService, args: &Value) -> Result<Value> {
    let id = required_str(args, "id")?;
    let limit = opt_i64(args, "limit", 20);
    let results = service.get_related_memories(id, limit, true)?;
    to_json(&results)
}

pub fn execute_create_concept(service: &mut MemoryGraphService, args: &Value) -> Result<Value> {
    let concept = Concept::new(required_str(args, "name")?)?
        .with_description(opt_str(args, "description").unwrap_or_default());
    let id = service.create_concept(&concept)?;
    Ok(json!({ "id": id }))
}

pub fn execute_create_keyword(service: &mut MemoryGraphService, args: &Value) -> Result<Value> {
    let keyword = Keyword::new(required_str(args, "term")?)?;
    let id = service.create_keyword(&keyword)?;
    Ok(json!({ "id": id }))
}

pub fn execute_create_topic(service: &mut MemoryGraphService, args: &Value) -> Result<Value> {
    let topic = Topic::new(required_str(args, "name")?)?
        .with_description(opt_str(args, "description").unwrap_or_default());
    let id = service.create_topic(&topic)?;
    Ok(json!({ "id": id }))
}

pub fn execute_create_entity(service: &mut MemoryGraphService, args: &Value) -> Result<Value> {
    let kind = parse_entity_kind(required_str(args, "type")?)?;
    let entity = Entity::new(required_str(args, "name")?, kind)?
        .with_description(opt_str(args, "description").unwrap_or_default())
        .with_aliases(str_array(args, "aliases"));
    let id = service.create_entity(&entity)?;
    Ok(json!({ "id": id }))
}

pub fn execute_link_concepts(service: &mut MemoryGraphService, args: &Value) -> Result<Value> {
    service.link_concepts(
        required_str(args, "concept_id_1")?,
        required_str(args, "concept_id_2")?,
        opt_str(args, "rel_type").unwrap_or_default(),
    )?;
    Ok(json!({ "linked": true }))
}

pub fn execute_memories_by_concept(
    service: &mut MemoryGraphService,
    args: &Value,
) -> Result<Value> {
    let results = service.get_memories_by_concept(
        required_str(args, "name")?,
        opt_i64(args, "limit", 20),
        true,
    )?;
    to_json(&results)
}

pub fn execute_memories_by_keyword(
    service: &mut MemoryGraphService,
    args: &Value,
) -> Result<Value> {
    let results =
        service.get_memories_by_keyword(required_str(args, "term")?, opt_i64(args, "limit", 20))?;
    to_json(&results)
}

pub fn execute_memories_by_topic(service: &mut MemoryGraphService, args: &Value) -> Result<Value> {
    let results =
        service.get_memories_by_topic(required_str(args, "name")?, opt_i64(args, "limit", 20))?;
    to_json(&results)
}

pub fn execute_memories_by_entity(service: &mut MemoryGraphService, args: &Value) -> Result<Value> {
    let results =
        service.get_memories_by_entity(required_str(args, "name")?, opt_i64(args, "limit", 20))?;
    to_json(&results)
}

pub fn execute_strengthen(service: &mut MemoryGraphService, args: &Value) -> Result<Value> {
    let id1 = required_str(args, "memory_id_1")?;
    let id2 = required_str(args, "memory_id_2")?;
    service.strengthen_memory_link(id1, id2, opt_f64(args, "amount"))?;
    let strength = service.get_memory_link_strength(id1, id2)?;
    Ok(json!({ "strength": strength }))
}

pub fn execute_weaken(service: &mut MemoryGraphService, args: &Value) -> Result<Value> {
    let id1 = required_str(args, "memory_id_1")?;
    let id2 = required_str(args, "memory_id_2")?;
    service.weaken_memory_link(id1, id2, opt_f64(args, "amount"))?;
    let strength = service.get_memory_link_strength(id1, id2)?;
    Ok(json!({ "strength": strength }))
}

pub fn execute_run_maintenance(service: &mut MemoryGraphService, args: &Value) -> Result<Value> {
    let cycles = opt_i64(args, "cycles", 1).max(1) as u32;
    service.run_aggressive_maintenance(cycles)?;
    Ok(json!({ "cycles_run": cycles, "total_cycles": service.access_cycle() }))
}

pub fn execute_connection_stats(service: &mut MemoryGraphService, _args: &Value) -> Result<Value> {
    let stats = service.get_connection_statistics()?;
    to_json(&stats)
}

pub fn execute_configure(service: &mut MemoryGraphService, args: &Value) -> Result<Value> {
    let mut config = match opt_str(args, "preset") {
        Some(name) => crate::plasticity::PlasticityConfig::preset(name)
            .ok_or_else(|| Error::InvalidInput(format!("unknown preset '{name}'")))?,
        None => service.plasticity_config().clone(),
    };
    if let Some(learning_rate) = opt_f64(args, "learning_rate") {
        if learning_rate < 0.0 {
            return Err(Error::OutOfRange {
                name: "learning_rate",
                min: 0.0,
                max: f64::INFINITY,
                value: learning_rate,
            });
        }
        config.learning_rate = learning_rate;
    }
    service.set_plasticity_config(config);
    Ok(Value::Object(service.plasticity_config().to_map()))
}

pub fn execute_create_compartment(service: &mut MemoryGraphService, args: &Value) -> Result<Value> {
    let permeability = match opt_str(args, "permeability") {
        Some(value) => parse_permeability(value)?,
        None => Permeability::Open,
    };
    let compartment = Compartment::new(required_str(args, "name")?)?
        .with_permeability(permeability)
        .with_external_connections(opt_bool(args, "allow_external_connections").unwrap_or(true))
        .with_description(opt_str(args, "description").unwrap_or_default());
    let id = service.create_compartment(&compartment)?;
    Ok(json!({ "id": id }))
}

pub fn execute_add_to_compartment(service: &mut MemoryGraphService, args: &Value) -> Result<Value> {
    let ids = str_array(args, "memory_ids");
    if ids.is_empty() {
        return Err(Error::InvalidInput(
            "missing required argument 'memory_ids'".to_string(),
        ));
    }
    let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
    service.add_memory_to_compartment(&refs, required_str(args, "compartment_id")?)?;
    Ok(json!({ "added": refs.len() }))
}

pub fn execute_set_active_compartment(
    service: &mut MemoryGraphService,
    args: &Value,
) -> Result<Value> {
    let compartment_id = opt_str(args, "compartment_id").map(ToString::to_string);
    service.set_active_compartment(compartment_id.clone());
    Ok(json!({ "active_compartment": compartment_id }))
}

pub fn execute_set_permeability(service: &mut MemoryGraphService, args: &Value) -> Result<Value> {
    let value = parse_permeability(required_str(args, "value")?)?;
    if let Some(memory_id) = opt_str(args, "memory_id") {
        service.set_memory_permeability(&[memory_id], value)?;
        return Ok(json!({ "memory_id": memory_id, "permeability": value.as_str() }));
    }
    if let Some(compartment_id) = opt_str(args, "compartment_id") {
        service.update_compartment(compartment_id, Some(value), None, None)?;
        return Ok(json!({ "compartment_id": compartment_id, "permeability": value.as_str() }));
    }
    Err(Error::InvalidInput(
        "provide either 'memory_id' or 'compartment_id'".to_string(),
    ))
}

pub fn execute_check_data_flow(service: &mut MemoryGraphService, args: &Value) -> Result<Value> {
    let from = required_str(args, "from")?;
    let to = required_str(args, "to")?;
    let allowed = service.can_data_flow(from, to, None)?;
    Ok(json!({ "from": from, "to": to, "allowed": allowed }))
}
