//! End-to-end tests for the wider graph: contradictions, decisions, goals,
//! questions, topics, entities, and on-disk persistence.

use axons::models::{
    ChainRole, Compartment, Context, ContextKind, Contradiction, Decision, Entity, EntityKind,
    Goal, Memory, Permeability, Question, Source, SourceKind, TemporalKind, TemporalMarker, Topic,
};
use axons::plasticity::PlasticityConfig;
use axons::service::{MemoryGraphService, StoreRequest};

fn service() -> MemoryGraphService {
    MemoryGraphService::open_in_memory(PlasticityConfig::default()).unwrap()
}

#[test]
fn contradiction_resolution_records_superseding_memory() {
    let service = service();
    let old = service
        .create_memory(
            &Memory::new("The API uses version 1", "API v1").unwrap(),
            None,
        )
        .unwrap();
    let new = service
        .create_memory(
            &Memory::new("The API uses version 2", "API v2").unwrap(),
            None,
        )
        .unwrap();

    let contradiction_id = service
        .create_contradiction(&Contradiction::new("API version disagreement"))
        .unwrap();
    service
        .mark_contradiction(&contradiction_id, old.as_str(), new.as_str())
        .unwrap();

    let unresolved = service.get_unresolved_contradictions().unwrap();
    assert_eq!(unresolved.len(), 1);
    assert_eq!(unresolved[0].id, contradiction_id);
    assert_eq!(unresolved[0].memories.len(), 2);

    service
        .resolve_contradiction(&contradiction_id, new.as_str(), "v2 shipped in March")
        .unwrap();

    assert!(service.get_unresolved_contradictions().unwrap().is_empty());
    let superseding = service.get_superseded_memories(&contradiction_id).unwrap();
    assert_eq!(superseding.len(), 1);
    assert_eq!(superseding[0].id, new.as_str());
}

#[test]
fn decision_chain_walks_both_directions() {
    let service = service();
    let earlier = service
        .create_decision(&Decision::new("adopt an embedded store", "no server setup"))
        .unwrap();
    let middle = service
        .create_decision(&Decision::new("pick the storage engine", "evaluated options"))
        .unwrap();
    let later = service
        .create_decision(&Decision::new("bundle the engine", "single binary"))
        .unwrap();

    service.link_decisions(&earlier, &middle).unwrap();
    service.link_decisions(&middle, &later).unwrap();

    let chain = service.get_decision_chain(&middle).unwrap();
    assert_eq!(chain.len(), 2);
    let predecessor = chain
        .iter()
        .find(|entry| entry.relation == ChainRole::Predecessor)
        .unwrap();
    assert_eq!(predecessor.id, earlier);
    let successor = chain
        .iter()
        .find(|entry| entry.relation == ChainRole::Successor)
        .unwrap();
    assert_eq!(successor.id, later);
}

#[test]
fn active_goals_sort_by_priority_then_age() {
    let service = service();
    let urgent = service
        .create_goal(&Goal::new("fix the login outage").with_priority(1))
        .unwrap();
    let routine = service
        .create_goal(&Goal::new("refresh the docs").with_priority(7))
        .unwrap();
    let mut done = Goal::new("migrate the database");
    done.status = axons::models::GoalStatus::Achieved;
    service.create_goal(&done).unwrap();

    let goals = service.get_active_goals().unwrap();
    assert_eq!(goals.len(), 2);
    assert_eq!(goals[0].id, urgent);
    assert_eq!(goals[1].id, routine);
}

#[test]
fn open_questions_include_partial_but_not_answered() {
    let service = service();
    service
        .create_question(&Question::new("which cache policy?"))
        .unwrap();
    let mut partial = Question::new("how to shard?");
    partial.status = axons::models::QuestionStatus::Partial;
    service.create_question(&partial).unwrap();
    let mut answered = Question::new("which language?");
    answered.status = axons::models::QuestionStatus::Answered;
    service.create_question(&answered).unwrap();

    let open = service.get_open_questions().unwrap();
    assert_eq!(open.len(), 2);
    assert!(open.iter().all(|q| q.status != "answered"));
}

#[test]
fn topic_and_entity_lookups() {
    let service = service();
    let memory = service
        .quick_store_memory(&StoreRequest {
            content: "The crawler team chose a queue-based design".to_string(),
            summary: "crawler design".to_string(),
            topics: vec!["Architecture".to_string()],
            entities: vec![("Crawler Team".to_string(), EntityKind::Organization)],
            ..Default::default()
        })
        .unwrap();

    let by_topic = service.get_memories_by_topic("Architecture", 10).unwrap();
    assert_eq!(by_topic.len(), 1);
    assert_eq!(by_topic[0].id, memory.as_str());

    let by_entity = service.get_memories_by_entity("Crawler Team", 10).unwrap();
    assert_eq!(by_entity.len(), 1);

    assert!(service
        .get_memories_by_topic("Nonexistent", 10)
        .unwrap()
        .is_empty());
}

#[test]
fn source_context_and_temporal_links() {
    let service = service();
    let memory = service
        .create_memory(
            &Memory::new("noted during the standup", "standup note").unwrap(),
            None,
        )
        .unwrap();

    let source = service
        .create_source(
            &Source::new(SourceKind::Conversation, "standup-2026-07-30")
                .unwrap()
                .with_title("Standup")
                .with_reliability(0.9)
                .unwrap(),
        )
        .unwrap();
    service
        .link_memory_to_source(memory.as_str(), &source, "the deploy is blocked")
        .unwrap();

    let context = service
        .create_context(&Context::new("release-train", ContextKind::Project))
        .unwrap();
    service
        .link_memory_to_context(memory.as_str(), &context)
        .unwrap();

    let marker = service
        .create_temporal_marker(&TemporalMarker::new(TemporalKind::Point, "July standup"))
        .unwrap();
    service
        .link_memory_to_temporal(memory.as_str(), &marker)
        .unwrap();

    // Context hierarchies link child into parent.
    let parent = service
        .create_context(&Context::new("q3-plan", ContextKind::Project))
        .unwrap();
    service.link_contexts(&parent, &context).unwrap();

    let counts = service.get_node_counts().unwrap();
    assert_eq!(counts["Source"], 1);
    assert_eq!(counts["Context"], 2);
    assert_eq!(counts["TemporalMarker"], 1);
}

#[test]
fn goal_dependencies_and_concept_links() {
    let service = service();
    let build = service.create_goal(&Goal::new("build the index")).unwrap();
    let ship = service.create_goal(&Goal::new("ship search")).unwrap();
    service.link_goals(&ship, &build).unwrap();

    let db = service
        .create_concept(&axons::models::Concept::new("database").unwrap())
        .unwrap();
    let graph = service
        .create_concept(&axons::models::Concept::new("graph").unwrap())
        .unwrap();
    service.link_concepts(&db, &graph, "overlaps").unwrap();

    let counts = service.get_node_counts().unwrap();
    assert_eq!(counts["Goal"], 2);
    assert_eq!(counts["Concept"], 2);
}

#[test]
fn compartment_crud_and_membership_listing() {
    let service = service();
    let id = service
        .create_compartment(
            &Compartment::new("Project Q")
                .unwrap()
                .with_permeability(Permeability::OsmoticInward)
                .with_external_connections(false)
                .with_description("quarantined project"),
        )
        .unwrap();

    // Interned by name.
    let again = service
        .create_compartment(&Compartment::new("Project Q").unwrap())
        .unwrap();
    assert_eq!(id, again);

    let fetched = service.get_compartment(&id).unwrap().unwrap();
    assert_eq!(fetched.permeability, Permeability::OsmoticInward);
    assert!(!fetched.allow_external_connections);

    let by_name = service.get_compartment_by_name("Project Q").unwrap().unwrap();
    assert_eq!(by_name.id, id);

    service
        .update_compartment(&id, Some(Permeability::Open), Some(true), Some("opened up"))
        .unwrap();
    let updated = service.get_compartment(&id).unwrap().unwrap();
    assert_eq!(updated.permeability, Permeability::Open);
    assert!(updated.allow_external_connections);
    assert_eq!(updated.description, "opened up");

    let member = service
        .create_memory(
            &Memory::new("inside content", "inside").unwrap(),
            Some(id.as_str()),
        )
        .unwrap();
    let members = service.get_memories_in_compartment(&id, 10).unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].id, member.as_str());
}

#[test]
fn data_survives_reopen_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("axons.db");

    let stored_id = {
        let service = MemoryGraphService::open(&db_path, PlasticityConfig::default()).unwrap();
        service
            .quick_store_memory(&StoreRequest {
                content: "persistent fact".to_string(),
                summary: "persists".to_string(),
                keywords: vec!["persistent".to_string()],
                ..Default::default()
            })
            .unwrap()
    };

    let service = MemoryGraphService::open(&db_path, PlasticityConfig::default()).unwrap();
    let recalled = service
        .get_memory(stored_id.as_str(), false)
        .unwrap()
        .unwrap();
    assert_eq!(recalled.summary, "persists");

    let found = service.search_memories("persistent", 10).unwrap();
    assert!(found.iter().any(|r| r.id == stored_id.as_str()));
}

#[test]
fn entities_with_aliases_round_trip() {
    let service = service();
    let id = service
        .create_entity(
            &Entity::new("LadybugDB", EntityKind::Technology)
                .unwrap()
                .with_description("embedded graph database")
                .with_aliases(vec!["ladybug".to_string(), "lbdb".to_string()]),
        )
        .unwrap();

    // Interning key is (name, kind); aliases do not fork identity.
    let again = service
        .create_entity(&Entity::new("LadybugDB", EntityKind::Technology).unwrap())
        .unwrap();
    assert_eq!(id, again);

    let topic = service.create_topic(&Topic::new("Technology").unwrap()).unwrap();
    let memory = service
        .create_memory(&Memory::new("uses LadybugDB", "db usage").unwrap(), None)
        .unwrap();
    service
        .link_memory_to_entity(memory.as_str(), &id, "subject")
        .unwrap();
    service
        .link_memory_to_topic(memory.as_str(), &topic, true)
        .unwrap();

    assert_eq!(
        service.get_memories_by_entity("LadybugDB", 10).unwrap().len(),
        1
    );
}
