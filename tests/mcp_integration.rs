//! End-to-end tests for the MCP tool surface: JSON-RPC round trips through
//! the server against a live in-memory graph.

use serde_json::{json, Value};

use axons::mcp::protocol::JsonRpcRequest;
use axons::mcp::McpServer;
use axons::plasticity::PlasticityConfig;
use axons::service::MemoryGraphService;

fn server() -> McpServer {
    let service = MemoryGraphService::open_in_memory(PlasticityConfig::default()).unwrap();
    McpServer::new(service)
}

fn call(server: &mut McpServer, tool: &str, arguments: Value) -> Value {
    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        id: Some(Value::from(1)),
        method: "tools/call".to_string(),
        params: Some(json!({ "name": tool, "arguments": arguments })),
    };
    let response = server.handle_request(request).unwrap();
    let result = response.result.unwrap();
    let text = result["content"][0]["text"].as_str().unwrap();
    serde_json::from_str(text).unwrap()
}

#[test]
fn store_search_recall_over_the_wire() {
    let mut server = server();

    let stored = call(
        &mut server,
        "axons_store",
        json!({
            "content": "LadybugDB is embedded",
            "summary": "DB overview",
            "concepts": ["graph database"],
            "keywords": ["embedded"],
            "entities": [{ "name": "LadybugDB", "type": "technology" }]
        }),
    );
    let id = stored["id"].as_str().unwrap().to_string();

    let found = call(&mut server, "axons_search", json!({ "term": "embedded" }));
    assert!(found
        .as_array()
        .unwrap()
        .iter()
        .any(|r| r["id"] == id.as_str()));

    let recalled = call(&mut server, "axons_recall", json!({ "id": id }));
    assert_eq!(recalled["accessCount"], 1);

    let by_entity = call(
        &mut server,
        "axons_memories_by_entity",
        json!({ "name": "LadybugDB" }),
    );
    assert_eq!(by_entity.as_array().unwrap().len(), 1);
}

#[test]
fn plasticity_tools_adjust_edges() {
    let mut server = server();

    let a = call(
        &mut server,
        "axons_store",
        json!({ "content": "first finding", "summary": "first" }),
    )["id"]
        .as_str()
        .unwrap()
        .to_string();
    let b = call(
        &mut server,
        "axons_store",
        json!({ "content": "second finding", "summary": "second" }),
    )["id"]
        .as_str()
        .unwrap()
        .to_string();

    // No edge yet: strengthening writes nothing.
    let result = call(
        &mut server,
        "axons_strengthen",
        json!({ "memory_id_1": a, "memory_id_2": b, "amount": 0.2 }),
    );
    assert!(result["strength"].is_null());

    // Maintenance and statistics run cleanly over an edgeless graph.
    let maintenance = call(
        &mut server,
        "axons_run_maintenance",
        json!({ "cycles": 2 }),
    );
    assert_eq!(maintenance["cycles_run"], 2);
    assert_eq!(maintenance["total_cycles"], 2);

    let stats = call(&mut server, "axons_connection_stats", json!({}));
    assert_eq!(stats["count"], 0);
}

#[test]
fn compartment_flow_over_the_wire() {
    let mut server = server();

    let compartment = call(
        &mut server,
        "axons_create_compartment",
        json!({
            "name": "Shield",
            "permeability": "osmotic_inward",
            "allow_external_connections": true
        }),
    )["id"]
        .as_str()
        .unwrap()
        .to_string();

    call(
        &mut server,
        "axons_set_active_compartment",
        json!({ "compartment_id": compartment }),
    );
    let inside = call(
        &mut server,
        "axons_store",
        json!({ "content": "classified finding", "summary": "inside" }),
    )["id"]
        .as_str()
        .unwrap()
        .to_string();

    call(&mut server, "axons_set_active_compartment", json!({}));
    let outside = call(
        &mut server,
        "axons_store",
        json!({ "content": "public chatter", "summary": "outside" }),
    )["id"]
        .as_str()
        .unwrap()
        .to_string();

    let inward = call(
        &mut server,
        "axons_check_data_flow",
        json!({ "from": outside, "to": inside }),
    );
    assert_eq!(inward["allowed"], true);

    let outward = call(
        &mut server,
        "axons_check_data_flow",
        json!({ "from": inside, "to": outside }),
    );
    assert_eq!(outward["allowed"], false);

    // Sealing the outside memory flips the remaining direction too.
    call(
        &mut server,
        "axons_set_permeability",
        json!({ "memory_id": outside, "value": "closed" }),
    );
    let inward = call(
        &mut server,
        "axons_check_data_flow",
        json!({ "from": outside, "to": inside }),
    );
    assert_eq!(inward["allowed"], false);
}

#[test]
fn configure_tool_round_trip() {
    let mut server = server();

    let config = call(
        &mut server,
        "axons_configure",
        json!({ "preset": "high_decay" }),
    );
    assert_eq!(config["decay_all"], true);

    let config = call(
        &mut server,
        "axons_configure",
        json!({ "learning_rate": 0.5 }),
    );
    assert_eq!(config["learning_rate"], 0.5);
    // The earlier preset survives a rate-only adjustment.
    assert_eq!(config["decay_all"], true);

    let error = call(
        &mut server,
        "axons_configure",
        json!({ "preset": "warp_speed" }),
    );
    assert!(error["error"].as_str().unwrap().contains("warp_speed"));
}
