//! Tests for the delivery processing pipeline.

use super::*;
use mockall::mock;
use std::collections::HashMap;

mock! {
    Store {}

    #[async_trait]
    impl store::EventStore for Store {
        async fn persist(&self, record: record::NormalizedRecord) -> Result<(), store::StoreError>;
    }
}

fn delivery(event_type: &str, body: serde_json::Value) -> Delivery {
    let mut headers = HashMap::new();
    headers.insert("X-Gitlab-Event".to_string(), event_type.to_string());
    let headers = DeliveryHeaders::from_http_headers(&headers).unwrap();
    Delivery::new(headers, Bytes::from(body.to_string()))
}

fn merge_request_body() -> serde_json::Value {
    json!({
        "object_kind": "merge_request",
        "user": {"id": 5, "name": "Ada", "username": "ada"},
        "project": {"id": 14, "name": "widgets"},
        "object_attributes": {
            "id": 99,
            "iid": 42,
            "title": "Add widgets",
            "state": "opened",
            "action": "open"
        }
    })
}

#[test]
fn test_headers_require_event_type() {
    let mut headers = HashMap::new();
    headers.insert("User-Agent".to_string(), "GitLab/17.0".to_string());

    let err = DeliveryHeaders::from_http_headers(&headers).unwrap_err();
    assert!(matches!(
        err,
        WebhookError::MissingHeader {
            header: "X-Gitlab-Event"
        }
    ));
}

#[test]
fn test_headers_accept_lowercase_names_and_optional_values() {
    let mut headers = HashMap::new();
    headers.insert("x-gitlab-event".to_string(), "Note Hook".to_string());
    headers.insert(
        "x-gitlab-instance".to_string(),
        "https://gitlab.example.com".to_string(),
    );
    headers.insert("x-gitlab-token".to_string(), "s3cret".to_string());

    let parsed = DeliveryHeaders::from_http_headers(&headers).unwrap();
    assert_eq!(parsed.event_type, "Note Hook");
    assert_eq!(
        parsed.instance_url.as_deref(),
        Some("https://gitlab.example.com")
    );
    assert_eq!(parsed.token.as_deref(), Some("s3cret"));
    assert_eq!(parsed.user_agent, None);

    // The token rides along for the external auth collaborator.
    let delivery = Delivery::new(parsed, Bytes::from_static(b"{}"));
    assert_eq!(delivery.event_type(), "Note Hook");
    assert_eq!(delivery.token(), Some("s3cret"));
}

#[test]
fn test_empty_event_type_header_is_missing() {
    let mut headers = HashMap::new();
    headers.insert("X-Gitlab-Event".to_string(), String::new());

    assert!(DeliveryHeaders::from_http_headers(&headers).is_err());
}

#[tokio::test]
async fn test_non_json_body_is_rejected_regardless_of_header() {
    let mut headers = HashMap::new();
    headers.insert(
        "X-Gitlab-Event".to_string(),
        "Merge Request Hook".to_string(),
    );
    let headers = DeliveryHeaders::from_http_headers(&headers).unwrap();
    let delivery = Delivery::new(headers, Bytes::from_static(b"not json"));

    let pipeline = DeliveryPipeline::new(None);
    let err = pipeline.process(delivery).await.unwrap_err();
    assert!(matches!(err, WebhookError::InvalidJson(_)));

    let ack = err.to_acknowledgement();
    assert_eq!(ack.status, AckStatus::Error);
}

#[tokio::test]
async fn test_merge_request_delivery_is_parsed_persisted_and_acknowledged() {
    let store = Arc::new(store::InMemoryEventStore::new());
    let pipeline = DeliveryPipeline::new(Some(store.clone()));

    let ack = pipeline
        .process(delivery("Merge Request Hook", merge_request_body()))
        .await
        .unwrap();

    assert_eq!(ack.status, AckStatus::Success);
    assert_eq!(ack.message, "Merge request event processed");
    assert_eq!(ack.event["mr_id"], json!(42));
    assert_eq!(ack.event["project"], json!("widgets"));
    assert_eq!(ack.event.get("source"), None);

    let records = store.records(record::MERGE_REQUESTS).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("mr_iid"), Some(&json!(42)));
}

#[tokio::test]
async fn test_system_hook_merge_request_is_tagged_with_origin() {
    let store = Arc::new(store::InMemoryEventStore::new());
    let pipeline = DeliveryPipeline::new(Some(store.clone()));

    let ack = pipeline
        .process(delivery("System Hook", merge_request_body()))
        .await
        .unwrap();

    assert_eq!(ack.status, AckStatus::Success);
    assert_eq!(ack.message, "System hook merge request event processed");
    assert_eq!(ack.event["source"], json!(record::SYSTEM_HOOK_SOURCE));

    let records = store.records(record::MERGE_REQUESTS).await;
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].get("event_source"),
        Some(&json!(record::SYSTEM_HOOK_SOURCE))
    );
}

#[tokio::test]
async fn test_legacy_flat_system_event_is_routed_by_event_name() {
    let store = Arc::new(store::InMemoryEventStore::new());
    let pipeline = DeliveryPipeline::new(Some(store.clone()));

    let body = json!({
        "event_name": "project_create",
        "name": "widgets",
        "path_with_namespace": "acme/widgets",
        "project_id": 14
    });
    let ack = pipeline
        .process(delivery("System Hook", body))
        .await
        .unwrap();

    assert_eq!(ack.status, AckStatus::Success);
    assert_eq!(ack.message, "Project system event processed");
    assert_eq!(store.records(record::PROJECT_SYSTEM_EVENTS).await.len(), 1);
}

#[tokio::test]
async fn test_unknown_event_type_header_is_acknowledged_not_rejected() {
    let pipeline = DeliveryPipeline::new(None);

    let ack = pipeline
        .process(delivery("Pipeline Hook", json!({})))
        .await
        .unwrap();

    assert_eq!(ack.status, AckStatus::Success);
    assert_eq!(ack.message, "Event received but not processed");
    assert_eq!(ack.event["event"], json!("Pipeline Hook"));
}

#[tokio::test]
async fn test_unknown_object_kind_is_acknowledged_and_not_persisted() {
    let store = Arc::new(store::InMemoryEventStore::new());
    let pipeline = DeliveryPipeline::new(Some(store.clone()));

    let body = json!({"object_kind": "something_unknown", "action": "open"});
    let ack = pipeline
        .process(delivery("System Hook", body))
        .await
        .unwrap();

    assert_eq!(ack.status, AckStatus::Success);
    assert_eq!(
        ack.message,
        "New format system event received but not processed"
    );
    assert_eq!(ack.event["object_kind"], json!("something_unknown"));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_unknown_legacy_event_name_is_acknowledged() {
    let pipeline = DeliveryPipeline::new(None);

    let body = json!({"event_name": "project_archive"});
    let ack = pipeline
        .process(delivery("System Hook", body))
        .await
        .unwrap();

    assert_eq!(ack.status, AckStatus::Success);
    assert_eq!(
        ack.message,
        "System hook event received but not processed"
    );
    assert_eq!(ack.event["event_name"], json!("project_archive"));
}

#[tokio::test]
async fn test_malformed_payload_is_a_client_error() {
    let pipeline = DeliveryPipeline::new(None);

    let body = json!({"object_attributes": "not-an-object"});
    let err = pipeline
        .process(delivery("Merge Request Hook", body))
        .await
        .unwrap_err();

    assert!(matches!(err, WebhookError::Payload(_)));
}

#[tokio::test]
async fn test_store_failure_degrades_to_parsed_but_not_persisted() {
    let mut failing_store = MockStore::new();
    failing_store.expect_persist().returning(|_| {
        Err(store::StoreError::MissingCollection {
            name: record::MERGE_REQUESTS.to_string(),
        })
    });
    let pipeline = DeliveryPipeline::new(Some(Arc::new(failing_store)));

    let ack = pipeline
        .process(delivery("Merge Request Hook", merge_request_body()))
        .await
        .unwrap();

    // A missing collection is the collaborator's problem, not the caller's.
    assert_eq!(ack.status, AckStatus::Success);
    assert_eq!(ack.message, "Merge request event processed");
}

#[tokio::test]
async fn test_processing_without_store_still_acknowledges() {
    let pipeline = DeliveryPipeline::new(None);

    let ack = pipeline
        .process(delivery("Merge Request Hook", merge_request_body()))
        .await
        .unwrap();

    assert_eq!(ack.status, AckStatus::Success);
}

#[test]
fn test_crate_root_reexports_resolve() {
    let classification = crate::EventClassification {
        category: crate::EventCategory::MergeRequest,
        dialect: crate::Dialect::SystemHook,
    };
    assert!(classification.is_supported());

    let event: Option<crate::TypedEvent> = None;
    assert!(event.is_none());
}

#[test]
fn test_acknowledgement_serializes_with_lowercase_status() {
    let ack = Acknowledgement::success("Note event processed", json!({"note_id": 300}));
    let encoded = serde_json::to_value(&ack).unwrap();

    assert_eq!(encoded["status"], json!("success"));
    assert_eq!(encoded["message"], json!("Note event processed"));
    assert_eq!(encoded["event"]["note_id"], json!(300));
}
