//! Response sessions driven through the engine.
mod common;
use common::FlakyResponseStore;
use dynaflow::session::transition;
use dynaflow::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::thread;

#[test]
fn test_linear_flow_round_trip() {
    let (engine, _, flow_id) = common::engine_with(common::linear_document());
    let session = engine.start(&flow_id, None).unwrap();
    assert_eq!(session.current_node_id.as_deref(), Some("name"));
    assert_eq!(session.status, SessionStatus::InProgress);

    assert_eq!(
        engine.submit_answer(&session.id, "name", "Ada").unwrap(),
        NextNode::Node("contact".to_string())
    );
    assert_eq!(
        engine
            .submit_answer(&session.id, "contact", "ada@example.com")
            .unwrap(),
        NextNode::Terminal
    );

    let finished = engine.session(&session.id).unwrap();
    assert!(finished.is_completed());
    assert_eq!(finished.current_node_id, None);
    assert_eq!(finished.answers.node_ids(), vec!["name", "contact"]);
    assert_eq!(finished.path, vec!["name", "contact"]);
}

#[test]
fn test_conditional_nodes_are_passed_through() {
    let (engine, _, flow_id) = common::engine_with(common::age_routing_document());

    for (age, expected) in [(12, "minor"), (30, "adult"), (80, "senior")] {
        let session = engine.start(&flow_id, None).unwrap();
        let next = engine.submit_answer(&session.id, "age", json!(age)).unwrap();
        assert_eq!(next, NextNode::Node(expected.to_string()));

        let state = engine.session(&session.id).unwrap();
        assert_eq!(state.path, vec!["age", "route", expected]);
        assert_eq!(state.current_node_id.as_deref(), Some(expected));
        // Routing nodes never hold answers.
        assert!(!state.answers.contains("route"));
    }
}

#[test]
fn test_skipping_an_optional_node_completes() {
    let (engine, _, flow_id) = common::engine_with(common::age_routing_document());
    let session = engine.start(&flow_id, None).unwrap();

    engine.submit_answer(&session.id, "age", 40i64).unwrap();
    assert_eq!(
        engine.submit_answer(&session.id, "adult", RawAnswer::Skip).unwrap(),
        NextNode::Terminal
    );

    let finished = engine.session(&session.id).unwrap();
    assert!(finished.is_completed());
    assert_eq!(
        finished.answers.get("adult").map(|a| &a.value),
        Some(&AnswerValue::Skipped)
    );
}

#[test]
fn test_rejected_answers_leave_the_session_untouched() {
    let (engine, _, flow_id) = common::engine_with(common::age_routing_document());
    let session = engine.start(&flow_id, None).unwrap();
    let before = engine.session(&session.id).unwrap();

    let invalid = engine.submit_answer(&session.id, "age", json!(-3));
    assert!(matches!(
        invalid,
        Err(SessionError::Validation(ValidationError::OutOfRange { .. }))
    ));

    let out_of_order = engine.submit_answer(&session.id, "minor", "guardian@example.com");
    assert_eq!(
        out_of_order,
        Err(SessionError::OutOfOrderSubmission {
            expected: "age".to_string(),
            submitted: "minor".to_string()
        })
    );

    assert_eq!(
        engine.submit_answer(&session.id, "route", "adult"),
        Err(SessionError::InvalidNodeForAnswer("route".to_string()))
    );
    assert_eq!(
        engine.submit_answer(&session.id, "nope", "x"),
        Err(SessionError::OutOfOrderSubmission {
            expected: "age".to_string(),
            submitted: "nope".to_string()
        })
    );

    assert_eq!(engine.session(&session.id).unwrap(), before);
}

#[test]
fn test_resubmitting_a_passed_node_is_out_of_order() {
    let (engine, _, flow_id) = common::engine_with(common::linear_document());
    let session = engine.start(&flow_id, None).unwrap();
    engine.submit_answer(&session.id, "name", "Ada").unwrap();

    assert_eq!(
        engine.submit_answer(&session.id, "name", "Grace"),
        Err(SessionError::OutOfOrderSubmission {
            expected: "contact".to_string(),
            submitted: "name".to_string()
        })
    );
    let state = engine.session(&session.id).unwrap();
    assert_eq!(
        state.answers.get("name").map(|a| &a.value),
        Some(&AnswerValue::Text("Ada".to_string()))
    );
}

#[test]
fn test_node_id_missing_from_the_flow_is_out_of_order() {
    let (engine, _, flow_id) = common::engine_with(common::linear_document());
    let session = engine.start(&flow_id, None).unwrap();
    let before = engine.session(&session.id).unwrap();

    assert_eq!(
        engine.submit_answer(&session.id, "nope", "hi"),
        Err(SessionError::OutOfOrderSubmission {
            expected: "name".to_string(),
            submitted: "nope".to_string()
        })
    );
    assert_eq!(engine.session(&session.id).unwrap(), before);
}

#[test]
fn test_unknown_and_closed_sessions_hold_no_lock() {
    let (engine, _, flow_id) = common::engine_with(common::linear_document());
    for i in 0..50 {
        let ghost = format!("ghost-{}", i);
        assert!(engine.submit_answer(&ghost, "name", "Ada").is_err());
        assert!(engine.abandon(&ghost).is_err());
    }
    assert_eq!(engine.active_locks(), 0);

    let session = engine.start(&flow_id, None).unwrap();
    engine.submit_answer(&session.id, "name", "Ada").unwrap();
    assert_eq!(engine.active_locks(), 1);
    engine
        .submit_answer(&session.id, "contact", "ada@example.com")
        .unwrap();
    assert_eq!(engine.active_locks(), 0);

    for _ in 0..10 {
        assert_eq!(
            engine.submit_answer(&session.id, "contact", "ada@example.com"),
            Err(SessionError::SessionClosed(SessionStatus::Completed))
        );
        assert!(engine.abandon(&session.id).is_err());
    }
    assert_eq!(engine.active_locks(), 0);
}

#[test]
fn test_closed_sessions_accept_nothing() {
    let (engine, _, flow_id) = common::engine_with(common::linear_document());
    let session = engine.start(&flow_id, None).unwrap();
    engine.submit_answer(&session.id, "name", "Ada").unwrap();
    engine
        .submit_answer(&session.id, "contact", "ada@example.com")
        .unwrap();

    assert_eq!(
        engine.submit_answer(&session.id, "contact", "other@example.com"),
        Err(SessionError::SessionClosed(SessionStatus::Completed))
    );
    assert_eq!(
        engine.abandon(&session.id),
        Err(SessionError::SessionClosed(SessionStatus::Completed))
    );
}

#[test]
fn test_abandon_closes_an_open_session() {
    let (engine, _, flow_id) = common::engine_with(common::linear_document());
    let session = engine.start(&flow_id, None).unwrap();

    let abandoned = engine.abandon(&session.id).unwrap();
    assert_eq!(abandoned.status, SessionStatus::Abandoned);
    assert_eq!(abandoned.current_node_id, None);
    assert_eq!(
        engine.submit_answer(&session.id, "name", "Ada"),
        Err(SessionError::SessionClosed(SessionStatus::Abandoned))
    );
}

#[test]
fn test_revisiting_a_node_abandons_the_session() {
    let (engine, _, flow_id) = common::engine_with(common::looping_document());
    let session = engine.start(&flow_id, None).unwrap();
    engine.submit_answer(&session.id, "first", "one").unwrap();

    let result = engine.submit_answer(&session.id, "second", "two");
    assert_eq!(result, Err(SessionError::CycleDetected("first".to_string())));

    let state = engine.session(&session.id).unwrap();
    assert_eq!(state.status, SessionStatus::Abandoned);
    assert_eq!(state.answers.node_ids(), vec!["first"]);
}

#[test]
fn test_unknown_session_and_flow() {
    let (engine, _, _) = common::engine_with(common::linear_document());

    assert!(matches!(
        engine.submit_answer("missing", "name", "Ada"),
        Err(SessionError::Persistence(StoreError::SessionNotFound(_)))
    ));
    assert!(matches!(
        engine.start("no-such-flow", None),
        Err(SessionError::Persistence(StoreError::FlowNotFound { .. }))
    ));
}

#[test]
fn test_sessions_stay_on_their_flow_version() {
    let (engine, flows, flow_id) = common::engine_with(common::linear_document());
    let session = engine.start(&flow_id, None).unwrap();
    assert_eq!(session.flow.version, 1);

    // Version 2 drops the email step.
    let shorter = FlowDocument {
        id: flow_id.clone(),
        name: "Contact details".to_string(),
        entry: "name".to_string(),
        ..Default::default()
    }
    .with_node("name", "text_input", "Your name", true, json!({}));
    let published = FlowCompiler::default()
        .publish(flows.as_ref(), shorter)
        .unwrap();
    assert_eq!(published.id.version, 2);
    assert_eq!(flows.versions(&flow_id).unwrap(), vec![1, 2]);

    assert_eq!(
        engine.submit_answer(&session.id, "name", "Ada").unwrap(),
        NextNode::Node("contact".to_string())
    );

    let newer = engine.start(&flow_id, None).unwrap();
    assert_eq!(newer.flow.version, 2);
    assert_eq!(
        engine.submit_answer(&newer.id, "name", "Ada").unwrap(),
        NextNode::Terminal
    );
}

#[test]
fn test_failed_append_changes_nothing_and_can_be_retried() {
    let flows = Arc::new(InMemoryFlowStore::new());
    let responses = Arc::new(FlakyResponseStore::default());
    let published = FlowCompiler::default()
        .publish(flows.as_ref(), common::linear_document())
        .unwrap();
    let engine = SessionEngine::builder(flows, responses.clone()).build();
    let session = engine.start(&published.id.flow_id, None).unwrap();

    responses.fail_appends(true);
    assert!(matches!(
        engine.submit_answer(&session.id, "name", "Ada"),
        Err(SessionError::Persistence(StoreError::Backend(_)))
    ));
    assert_eq!(engine.session(&session.id).unwrap(), session);
    assert!(responses.answers(&session.id).unwrap().is_empty());

    responses.fail_appends(false);
    assert_eq!(
        engine.submit_answer(&session.id, "name", "Ada").unwrap(),
        NextNode::Node("contact".to_string())
    );
}

#[test]
fn test_failed_save_after_append_is_replayable() {
    let flows = Arc::new(InMemoryFlowStore::new());
    let responses = Arc::new(FlakyResponseStore::default());
    let published = FlowCompiler::default()
        .publish(flows.as_ref(), common::linear_document())
        .unwrap();
    let engine = SessionEngine::builder(flows, responses.clone()).build();
    let session = engine.start(&published.id.flow_id, None).unwrap();

    responses.fail_saves(true);
    assert!(engine.submit_answer(&session.id, "name", "Ada").is_err());
    // The answer landed, the state did not.
    assert_eq!(responses.answers(&session.id).unwrap().len(), 1);
    assert_eq!(
        engine.session(&session.id).unwrap().current_node_id.as_deref(),
        Some("name")
    );

    responses.fail_saves(false);
    engine.submit_answer(&session.id, "name", "Ada Lovelace").unwrap();
    let answers = responses.answers(&session.id).unwrap();
    assert_eq!(answers.len(), 1);
    assert_eq!(answers[0].value, AnswerValue::Text("Ada Lovelace".to_string()));
}

#[test]
fn test_concurrent_submissions_to_one_session_apply_once() {
    let (engine, _, flow_id) = common::engine_with(common::linear_document());
    let engine = Arc::new(engine);
    let session = engine.start(&flow_id, None).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let engine = engine.clone();
            let session_id = session.id.clone();
            thread::spawn(move || {
                engine.submit_answer(&session_id, "name", format!("writer {}", i).as_str())
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, SessionError::OutOfOrderSubmission { .. }))
    );
    let state = engine.session(&session.id).unwrap();
    assert_eq!(state.current_node_id.as_deref(), Some("contact"));
    assert_eq!(state.answers.len(), 1);
}

#[test]
fn test_distinct_sessions_run_in_parallel() {
    let (engine, _, flow_id) = common::engine_with(common::age_routing_document());
    let engine = Arc::new(engine);

    let handles: Vec<_> = (0..16i64)
        .map(|i| {
            let engine = engine.clone();
            let flow_id = flow_id.clone();
            thread::spawn(move || -> Result<ResponseSession, SessionError> {
                let session = engine.start(&flow_id, None)?;
                engine.submit_answer(&session.id, "age", 20 + i)?;
                engine.submit_answer(&session.id, "adult", "engineer")?;
                engine.session(&session.id)
            })
        })
        .collect();

    for handle in handles {
        let session = handle.join().unwrap().unwrap();
        assert!(session.is_completed());
        assert_eq!(session.path, vec!["age", "route", "adult"]);
    }
}

#[test]
fn test_transitions_are_pure() {
    let flow = common::compile(common::linear_document());
    let registry = NodeTypeRegistry::default();
    let now = chrono::Utc::now();

    let session = transition::start(&flow, &registry, "s-1".to_string(), now).unwrap();
    let advance =
        transition::advance(&session, &flow, &registry, "name", &"Ada".into(), now).unwrap();

    assert_eq!(session.current_node_id.as_deref(), Some("name"));
    assert!(session.answers.is_empty());
    assert_eq!(advance.session.current_node_id.as_deref(), Some("contact"));
    assert_eq!(advance.answer.value, AnswerValue::Text("Ada".to_string()));
    assert_eq!(advance.next, NextNode::Node("contact".to_string()));
}

#[test]
fn test_two_step_flow_records_answers_in_order() {
    let (engine, _, flow_id) = common::engine_with(
        FlowDocument {
            id: "ab".to_string(),
            entry: "A".to_string(),
            ..Default::default()
        }
        .with_node("A", "text_input", "A", true, json!({}))
        .with_node("B", "email_input", "B", true, json!({}))
        .with_transition("A", "B"),
    );
    let session = engine.start(&flow_id, None).unwrap();
    engine.submit_answer(&session.id, "A", "hi").unwrap();
    engine.submit_answer(&session.id, "B", "x@y.com").unwrap();

    let finished = engine.session(&session.id).unwrap();
    assert_eq!(finished.status, SessionStatus::Completed);
    let values: Vec<String> = finished.answers.iter().map(|a| a.value.to_string()).collect();
    assert_eq!(values, vec!["hi", "x@y.com"]);
}

#[test]
fn test_replayed_append_never_duplicates() {
    let store = InMemoryResponseStore::new();
    let answer = |text: &str| Answer {
        node_id: "A".to_string(),
        value: AnswerValue::Text(text.to_string()),
        submitted_at: chrono::Utc::now(),
    };

    store.append_answer("s-1", &answer("first")).unwrap();
    store.append_answer("s-1", &answer("second")).unwrap();
    store.append_answer("s-2", &answer("other")).unwrap();

    let stored = store.answers("s-1").unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].value, AnswerValue::Text("second".to_string()));
    assert_eq!(store.answers("s-2").unwrap().len(), 1);
}
