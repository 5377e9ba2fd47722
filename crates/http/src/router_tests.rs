use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use chrono::{TimeZone, Utc};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use mailtriage_core::{Email, EmailType, READ, UNREAD};
use mailtriage_service::EmailService;
use mailtriage_storage::{InMemoryStore, StorageBackend};

use crate::{AppState, create_router};

fn email(id: i64, to: &str, read_status: u8) -> Email {
    Email {
        id,
        from_address: "noreply@example.com".to_owned(),
        from_name: Some("Example".to_owned()),
        to_address: to.to_owned(),
        title: format!("Message {id}"),
        body_text: None,
        body_html: None,
        sent_at: Utc.timestamp_opt(1_700_000_000 + id, 0).unwrap(),
        read_status,
        email_type: EmailType::AuthCode,
        email_result: Some(format!("{id:04}")),
    }
}

fn router() -> axum::Router {
    let store = InMemoryStore::with_emails([
        email(1, "a@example.com", UNREAD),
        email(2, "b@example.com", READ),
        email(3, "a@example.com", UNREAD),
    ]);
    let service = EmailService::new(Arc::new(StorageBackend::from(store)), None);
    create_router(Arc::new(AppState { email_service: Arc::new(service) }))
}

async fn send(method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        },
        None => Body::empty(),
    };
    let response = router().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn list_returns_items_and_total() {
    let (status, body) = send(Method::GET, "/api/email/list?limit=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["meta"]["total"], 3);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"][0]["id"], 3);
}

#[tokio::test]
async fn list_filters_by_read_status_and_recipient() {
    let (status, body) =
        send(Method::GET, "/api/email/list?read_status=0&recipient=a@example.com", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 2);
}

#[tokio::test]
async fn list_rejects_limit_over_max() {
    let (status, body) = send(Method::GET, "/api/email/list?limit=150", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"success": false, "message": "Limit must be a number between 1 and 100", "status": 400})
    );
}

#[tokio::test]
async fn list_rejects_bad_read_status() {
    let (status, body) = send(Method::GET, "/api/email/list?read_status=2", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "read_status must be 0 (unread) or 1 (read)");
}

#[tokio::test]
async fn mark_validation_messages() {
    let (status, body) = send(Method::POST, "/api/email/mark?is_read=1", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email ID is required");

    let (status, body) = send(Method::POST, "/api/email/mark?id=1&is_read=2", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "is_read must be 0 (unread) or 1 (read)");
}

#[tokio::test]
async fn mark_succeeds_with_null_data() {
    let (status, body) = send(Method::POST, "/api/email/mark?id=1&is_read=1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "data": null, "status": 200}));
}

#[tokio::test]
async fn mark_unknown_id_is_not_found() {
    let (status, body) = send(Method::POST, "/api/email/mark?id=99&is_read=1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn wrong_method_is_405_envelope() {
    let (status, body) = send(Method::GET, "/api/email/mark?id=1&is_read=1", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, json!({"success": false, "message": "Method not allowed", "status": 405}));

    let (status, _) = send(Method::POST, "/api/email/list", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn recipients_are_distinct() {
    let (status, body) = send(Method::GET, "/api/email/recipients", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!(["a@example.com", "b@example.com"]));
}

#[tokio::test]
async fn batch_delete_reports_count_and_validates() {
    let (status, body) =
        send(Method::POST, "/api/email/batch-delete", Some(json!({"ids": [1, 2, 42]}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["deleted"], 2);

    let (status, body) = send(Method::POST, "/api/email/batch-delete", Some(json!({"ids": []}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "ids must be a non-empty array");
}

#[tokio::test]
async fn update_requires_result_for_typed_email() {
    let (status, body) = send(
        Method::POST,
        "/api/email/update",
        Some(json!({"id": 1, "emailResult": "  ", "emailType": "auth_link"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "emailResult is required unless emailType is none");

    let (status, _) = send(
        Method::POST,
        "/api/email/update",
        Some(json!({"id": 1, "emailResult": null, "emailType": "none"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn ingest_returns_created_email() {
    let (status, body) = send(
        Method::POST,
        "/api/email/ingest",
        Some(json!({
            "fromAddress": "noreply@example.com",
            "toAddress": "c@example.com",
            "title": "Your code",
            "emailType": "auth_code",
            "emailResult": "9911"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["id"], 4);
    assert_eq!(body["data"]["readStatus"], 0);
}
