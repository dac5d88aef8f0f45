// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use parking_lot::Mutex;

/// Subscriber that appends `(label, payload)` to a shared log.
fn recording_subscriber(
    label: &str,
    log: Arc<Mutex<Vec<(String, Value)>>>,
) -> SubscriberCallback {
    let label = label.to_string();
    Arc::new(move |envelope: Envelope| {
        let label = label.clone();
        let log = log.clone();
        Box::pin(async move {
            log.lock().push((label, envelope.data));
        })
    })
}

fn shared_log() -> Arc<Mutex<Vec<(String, Value)>>> {
    Arc::new(Mutex::new(Vec::new()))
}

#[tokio::test]
async fn publish_without_subscribers_fails() {
    let bus = MessageBus::new();
    match bus.publish("keywords", Value::from("x")).await {
        Err(BusError::NoSubscribers(topic)) => assert_eq!(topic, "keywords"),
        other => panic!("expected NoSubscribers, got {:?}", other),
    }
}

#[tokio::test]
async fn delivery_in_subscription_order() {
    let bus = MessageBus::new();
    let log = shared_log();
    for label in ["first", "second", "third"] {
        bus.subscribe("t", label, None, recording_subscriber(label, log.clone()))
            .unwrap();
    }

    bus.publish("t", Value::Int(1)).await.unwrap();

    let seen: Vec<String> = log.lock().iter().map(|(l, _)| l.clone()).collect();
    assert_eq!(seen, vec!["first", "second", "third"]);
}

#[tokio::test]
async fn duplicate_subscriptions_deliver_twice() {
    let bus = MessageBus::new();
    let log = shared_log();
    bus.subscribe("t", "dup", None, recording_subscriber("dup", log.clone()))
        .unwrap();
    bus.subscribe("t", "dup", None, recording_subscriber("dup", log.clone()))
        .unwrap();

    bus.publish("t", Value::Int(1)).await.unwrap();
    assert_eq!(log.lock().len(), 2);
}

#[tokio::test]
async fn declared_type_enforced_with_translation() {
    let bus = MessageBus::new();
    bus.register_output("n", TypeName::new("str"), None, "producer")
        .unwrap();
    let log = shared_log();
    bus.subscribe("n", "consumer", None, recording_subscriber("consumer", log.clone()))
        .unwrap();

    // Int published to a str topic is translated by the default rules.
    bus.publish("n", Value::Int(7)).await.unwrap();
    assert_eq!(log.lock()[0].1, Value::from("7"));
}

#[tokio::test]
async fn declared_type_mismatch_without_rule_fails() {
    let bus = MessageBus::new();
    bus.register_output("n", TypeName::new("int"), None, "producer")
        .unwrap();
    let log = shared_log();
    bus.subscribe("n", "consumer", None, recording_subscriber("consumer", log.clone()))
        .unwrap();

    let result = bus.publish("n", Value::Map(Default::default())).await;
    match result {
        Err(BusError::TypeMismatch { topic, expected, actual }) => {
            assert_eq!(topic, "n");
            assert_eq!(expected.as_str(), "int");
            assert_eq!(actual.as_str(), "dict");
        }
        other => panic!("expected TypeMismatch, got {:?}", other),
    }
    assert!(log.lock().is_empty());
}

#[tokio::test]
async fn per_subscriber_translation() {
    let bus = MessageBus::new();
    bus.register_output("n", TypeName::new("int"), None, "producer")
        .unwrap();
    let log = shared_log();
    bus.subscribe(
        "n",
        "stringly",
        Some(TypeName::new("str")),
        recording_subscriber("stringly", log.clone()),
    )
    .unwrap();

    bus.publish("n", Value::Int(7)).await.unwrap();
    assert_eq!(log.lock()[0].1, Value::from("7"));
}

#[tokio::test]
async fn empty_payload_still_delivered() {
    let bus = MessageBus::new();
    let log = shared_log();
    bus.subscribe("t", "c", None, recording_subscriber("c", log.clone()))
        .unwrap();

    bus.publish("t", Value::List(vec![])).await.unwrap();
    assert_eq!(log.lock().len(), 1);
}

#[test]
fn conflicting_output_types_rejected() {
    let bus = MessageBus::new();
    bus.register_output("t", TypeName::new("List[str]"), None, "a")
        .unwrap();
    // Same type from another module is fine.
    bus.register_output("t", TypeName::new("List[str]"), None, "b")
        .unwrap();

    match bus.register_output("t", TypeName::new("dict"), None, "c") {
        Err(BusError::OutputConflict { existing, module, .. }) => {
            assert_eq!(existing, "a");
            assert_eq!(module, "c");
        }
        other => panic!("expected OutputConflict, got {:?}", other),
    }
}

#[test]
fn conflicting_expected_types_rejected() {
    let bus = MessageBus::new();
    let log = shared_log();
    bus.subscribe(
        "t",
        "a",
        Some(TypeName::new("str")),
        recording_subscriber("a", log.clone()),
    )
    .unwrap();

    let result = bus.subscribe(
        "t",
        "b",
        Some(TypeName::new("dict")),
        recording_subscriber("b", log.clone()),
    );
    match result {
        Err(BusError::SubscriptionConflict { existing, requested, .. }) => {
            assert_eq!(existing.as_str(), "str");
            assert_eq!(requested.as_str(), "dict");
        }
        other => panic!("expected SubscriptionConflict, got {:?}", other),
    }
}

#[tokio::test]
async fn any_expectation_never_conflicts() {
    let bus = MessageBus::new();
    let log = shared_log();
    bus.subscribe(
        "t",
        "typed",
        Some(TypeName::new("str")),
        recording_subscriber("typed", log.clone()),
    )
    .unwrap();
    bus.subscribe(
        "t",
        "loose",
        Some(TypeName::any()),
        recording_subscriber("loose", log.clone()),
    )
    .unwrap();

    bus.publish("t", Value::from("x")).await.unwrap();
    assert_eq!(log.lock().len(), 2);
}

#[tokio::test]
async fn per_topic_fifo_per_subscriber() {
    let bus = MessageBus::new();
    let log = shared_log();
    bus.subscribe("t", "c", None, recording_subscriber("c", log.clone()))
        .unwrap();

    for n in 0..5 {
        bus.publish("t", Value::Int(n)).await.unwrap();
    }

    let seen: Vec<Value> = log.lock().iter().map(|(_, v)| v.clone()).collect();
    assert_eq!(
        seen,
        (0..5).map(Value::Int).collect::<Vec<_>>()
    );
}

#[test]
fn registration_lookups() {
    let bus = MessageBus::new();
    bus.register_output("t", TypeName::new("List[str]"), Some("keywords".into()), "p")
        .unwrap();
    bus.register_input("t", TypeName::new("List[str]"), "c");

    assert_eq!(bus.declared_type("t").map(|t| t.as_str().to_string()), Some("List[str]".to_string()));
    assert_eq!(bus.output_registration("t").map(|o| o.source), Some("p".to_string()));
    assert_eq!(bus.input_registrations("t").len(), 1);
    assert_eq!(bus.subscriber_count("t"), 0);
    assert!(!bus.has_subscribers("t"));
}
