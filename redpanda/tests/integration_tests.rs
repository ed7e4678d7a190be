//! Integration tests for [`RedpandaEventBus`] against a real Kafka broker.
//!
//! These tests are `#[ignore]`d by default: they need Docker (testcontainers)
//! and take a while to start the broker.
//!
//! ```bash
//! cargo test -p account-service-redpanda --test integration_tests -- --ignored
//! ```

#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use account_service_core::event::SerializedEvent;
use account_service_core::event_bus::EventBus;
use account_service_redpanda::RedpandaEventBus;
use futures::StreamExt;
use std::time::Duration;
use testcontainers::ImageExt;
use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;
use testcontainers_modules::kafka::{KAFKA_PORT, Kafka};

fn keyed(key: &str, json: &str) -> SerializedEvent {
    SerializedEvent::new(
        "AccountCreated.v1".to_string(),
        Some(key.to_string()),
        json.as_bytes().to_vec(),
    )
}

async fn start_kafka() -> (ContainerAsync<Kafka>, String) {
    let kafka = Kafka::default()
        .with_env_var("KAFKA_AUTO_CREATE_TOPICS_ENABLE", "true")
        .start()
        .await
        .expect("Failed to start Kafka container");
    let host = kafka.get_host().await.expect("Failed to get host");
    let port = kafka
        .get_host_port_ipv4(KAFKA_PORT)
        .await
        .expect("Failed to get port");
    (kafka, format!("{host}:{port}"))
}

/// Publish until the broker accepts, which also auto-creates the topic.
async fn warm_up(bus: &RedpandaEventBus, topic: &str) {
    let warmup = keyed("warmup", "{}");
    for attempt in 1..=60 {
        if bus.publish(topic, &warmup).await.is_ok() {
            tokio::time::sleep(Duration::from_secs(2)).await;
            return;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(attempt != 60, "Kafka never accepted a publish to {topic}");
    }
}

#[tokio::test]
#[ignore]
async fn test_publish_and_subscribe_round_trip() {
    let (_kafka, brokers) = start_kafka().await;
    let bus = RedpandaEventBus::builder()
        .brokers(&brokers)
        .consumer_group("round-trip")
        .build()
        .expect("Failed to create event bus");
    warm_up(&bus, "account-created").await;

    let mut stream = bus
        .subscribe(&["account-created"])
        .await
        .expect("Failed to subscribe");
    tokio::time::sleep(Duration::from_secs(2)).await;

    bus.publish("account-created", &keyed("acc-1", r#"{"id":"acc-1"}"#))
        .await
        .expect("Failed to publish");

    let received = tokio::time::timeout(Duration::from_secs(15), async {
        loop {
            let event = stream
                .next()
                .await
                .expect("stream ended")
                .expect("receive failed");
            if event.key.as_deref() == Some("acc-1") {
                return event;
            }
        }
    })
    .await
    .expect("Timeout waiting for event");

    assert_eq!(received.event_type, "account-created");
    assert_eq!(received.data, br#"{"id":"acc-1"}"#.to_vec());
}

#[tokio::test]
#[ignore]
async fn test_same_key_keeps_order() {
    let (_kafka, brokers) = start_kafka().await;
    let bus = RedpandaEventBus::builder()
        .brokers(&brokers)
        .consumer_group("ordering")
        .build()
        .expect("Failed to create event bus");
    warm_up(&bus, "account-updated").await;

    let mut stream = bus
        .subscribe(&["account-updated"])
        .await
        .expect("Failed to subscribe");
    tokio::time::sleep(Duration::from_secs(2)).await;

    for balance in 0..5 {
        let json = format!(r#"{{"id":"acc-7","balance":{balance}}}"#);
        bus.publish("account-updated", &keyed("acc-7", &json))
            .await
            .expect("Failed to publish");
    }

    let payloads = tokio::time::timeout(Duration::from_secs(15), async {
        let mut seen = Vec::new();
        while seen.len() < 5 {
            let event = stream
                .next()
                .await
                .expect("stream ended")
                .expect("receive failed");
            if event.key.as_deref() == Some("acc-7") {
                seen.push(String::from_utf8(event.data).expect("utf8"));
            }
        }
        seen
    })
    .await
    .expect("Timeout waiting for events");

    for (balance, payload) in payloads.iter().enumerate() {
        assert!(payload.ends_with(&format!(":{balance}}}")), "out of order: {payloads:?}");
    }
}
