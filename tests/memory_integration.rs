//! End-to-end tests for storing, interning, and recalling memories.

use axons::models::{Concept, Entity, EntityKind, Keyword, Memory, Preference, Source, SourceKind};
use axons::plasticity::PlasticityConfig;
use axons::service::{MemoryGraphService, StoreRequest};
use axons::Error;

fn service() -> MemoryGraphService {
    MemoryGraphService::open_in_memory(PlasticityConfig::default()).unwrap()
}

#[test]
fn store_recall_search_round_trip() {
    let service = service();

    let id = service
        .quick_store_memory(&StoreRequest {
            content: "LadybugDB is embedded".to_string(),
            summary: "DB overview".to_string(),
            concepts: vec!["graph database".to_string()],
            keywords: vec!["ladybug".to_string(), "embedded".to_string()],
            ..Default::default()
        })
        .unwrap();

    let results = service.search_memories("embedded", 10).unwrap();
    assert!(results.iter().any(|r| r.id == id.as_str()));

    let recalled = service.get_memory(id.as_str(), true).unwrap().unwrap();
    assert_eq!(recalled.summary, "DB overview");
    assert_eq!(recalled.access_count, 1);
}

#[test]
fn access_count_increments_by_one_per_recall() {
    let service = service();
    let memory = Memory::new("counted content", "counted").unwrap();
    let id = service.create_memory(&memory, None).unwrap();

    for expected in 1..=3 {
        let record = service.get_memory(id.as_str(), false).unwrap().unwrap();
        assert_eq!(record.access_count, expected);
    }
}

#[test]
fn missing_memory_recalls_as_none() {
    let service = service();
    assert!(service.get_memory("no-such-id", true).unwrap().is_none());
}

#[test]
fn interned_types_return_existing_id() {
    let service = service();

    let first = service
        .create_concept(&Concept::new("architecture").unwrap())
        .unwrap();
    let second = service
        .create_concept(
            &Concept::new("architecture")
                .unwrap()
                .with_description("a different description"),
        )
        .unwrap();
    assert_eq!(first, second);

    let counts = service.get_node_counts().unwrap();
    assert_eq!(counts["Concept"], 1);

    // Interning key for entities is (name, kind): same name, different kind
    // is a distinct node.
    let person = service
        .create_entity(&Entity::new("Mercury", EntityKind::Person).unwrap())
        .unwrap();
    let place = service
        .create_entity(&Entity::new("Mercury", EntityKind::Place).unwrap())
        .unwrap();
    assert_ne!(person, place);

    // Sources intern by (reference, kind).
    let a = service
        .create_source(&Source::new(SourceKind::Url, "https://example.com").unwrap())
        .unwrap();
    let b = service
        .create_source(&Source::new(SourceKind::Url, "https://example.com").unwrap())
        .unwrap();
    assert_eq!(a, b);
}

#[test]
fn preference_running_average_on_repeat_create() {
    let service = service();

    let first = service
        .create_preference(
            &Preference::new("style", "concise")
                .unwrap()
                .with_strength(0.6)
                .unwrap(),
        )
        .unwrap();
    let second = service
        .create_preference(
            &Preference::new("style", "concise")
                .unwrap()
                .with_strength(1.0)
                .unwrap(),
        )
        .unwrap();
    assert_eq!(first, second);

    let prefs = service.get_preferences_by_category("style").unwrap();
    assert_eq!(prefs.len(), 1);
    assert_eq!(prefs[0].observations, 2);
    assert!((prefs[0].strength - 0.8).abs() < 1e-9);
}

#[test]
fn linking_twice_keeps_one_edge_with_original_properties() {
    let service = service();
    let a = service
        .create_memory(&Memory::new("a content", "a").unwrap(), None)
        .unwrap();
    let b = service
        .create_memory(&Memory::new("b content", "b").unwrap(), None)
        .unwrap();

    assert!(service
        .link_memories(a.as_str(), b.as_str(), 0.8, "context", None, false)
        .unwrap());
    // Relink with a different strength: the original edge wins.
    assert!(service
        .link_memories(a.as_str(), b.as_str(), 0.2, "context", None, false)
        .unwrap());

    let connections = service
        .get_strongest_connections(a.as_str(), 10, false)
        .unwrap();
    assert_eq!(connections.len(), 1);
    assert!((connections[0].strength - 0.8).abs() < 1e-9);
}

#[test]
fn quick_store_rolls_back_on_failure() {
    let service = service();

    let err = service
        .quick_store_memory(&StoreRequest {
            content: "doomed content".to_string(),
            summary: "doomed".to_string(),
            // Empty concept name fails validation after the memory insert.
            concepts: vec![String::new()],
            ..Default::default()
        })
        .unwrap_err();
    assert!(matches!(err, Error::MissingRequired("name")));

    let counts = service.get_node_counts().unwrap();
    assert_eq!(counts["Memory"], 0);
    assert!(service.search_memories("doomed", 10).unwrap().is_empty());
}

#[test]
fn explicit_transaction_rollback() {
    let service = service();
    service.begin_transaction().unwrap();
    service
        .create_memory(&Memory::new("tentative", "tentative").unwrap(), None)
        .unwrap();
    service.rollback().unwrap();

    assert_eq!(service.get_node_counts().unwrap()["Memory"], 0);
}

#[test]
fn validation_rejects_out_of_range_and_empty_inputs() {
    let service = service();
    let a = service
        .create_memory(&Memory::new("a content", "a").unwrap(), None)
        .unwrap();
    let b = service
        .create_memory(&Memory::new("b content", "b").unwrap(), None)
        .unwrap();

    let err = service
        .link_memories(a.as_str(), b.as_str(), 1.5, "", None, false)
        .unwrap_err();
    assert!(matches!(err, Error::OutOfRange { name: "strength", .. }));

    let err = service
        .link_memory_to_concept(a.as_str(), "c1", -0.1)
        .unwrap_err();
    assert!(matches!(err, Error::OutOfRange { name: "relevance", .. }));

    assert!(matches!(
        Memory::new("", "summary").unwrap_err(),
        Error::MissingRequired("content")
    ));

    // Nothing was written by the rejected link.
    assert!(service
        .get_memory_link_strength(a.as_str(), b.as_str())
        .unwrap()
        .is_none());
}

#[test]
fn related_memories_through_shared_concepts_and_keywords() {
    let service = service();
    let m1 = service
        .quick_store_memory(&StoreRequest {
            content: "embedded graph database overview".to_string(),
            summary: "db overview".to_string(),
            concepts: vec!["graph database".to_string()],
            keywords: vec!["embedded".to_string()],
            ..Default::default()
        })
        .unwrap();
    let m2 = service
        .quick_store_memory(&StoreRequest {
            content: "we chose an embedded database".to_string(),
            summary: "architecture decision".to_string(),
            concepts: vec!["graph database".to_string()],
            ..Default::default()
        })
        .unwrap();
    let m3 = service
        .quick_store_memory(&StoreRequest {
            content: "embedded tooling preference".to_string(),
            summary: "tooling".to_string(),
            concepts: vec!["tooling".to_string()],
            keywords: vec!["embedded".to_string()],
            ..Default::default()
        })
        .unwrap();

    let related = service
        .get_related_memories(m1.as_str(), 10, false)
        .unwrap();
    let ids: Vec<&str> = related.iter().map(|r| r.id.as_str()).collect();
    // m2 shares a concept; m3 arrives through the keyword top-up.
    assert!(ids.contains(&m2.as_str()));
    assert!(ids.contains(&m3.as_str()));
    assert!(!ids.contains(&m1.as_str()));
}

#[test]
fn delete_all_clears_every_table() {
    let service = service();
    service
        .quick_store_memory(&StoreRequest {
            content: "to be deleted".to_string(),
            summary: "gone".to_string(),
            concepts: vec!["cleanup".to_string()],
            entities: vec![("Sweeper".to_string(), EntityKind::Tool)],
            ..Default::default()
        })
        .unwrap();

    service.delete_all_data().unwrap();

    let counts = service.get_node_counts().unwrap();
    assert!(counts.values().all(|&count| count == 0));
}

#[test]
fn keyword_lookup_matches_exact_term() {
    let service = service();
    let id = service
        .quick_store_memory(&StoreRequest {
            content: "pipeline requires signed tags".to_string(),
            summary: "release rule".to_string(),
            keywords: vec!["release".to_string()],
            ..Default::default()
        })
        .unwrap();

    let hits = service.get_memories_by_keyword("release", 10).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, id.as_str());
    assert!(service
        .get_memories_by_keyword("unrelated", 10)
        .unwrap()
        .is_empty());

    // Keyword interning survives the composite path.
    service
        .create_keyword(&Keyword::new("release").unwrap())
        .unwrap();
    assert_eq!(service.get_node_counts().unwrap()["Keyword"], 1);
}
