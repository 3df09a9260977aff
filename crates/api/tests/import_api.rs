//! HTTP-level tests for the CSV import flow.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use vstack_core::notification::NotificationLevel;

use common::build_test_app;

const USERS_CSV: &[u8] = b"name,email\nAlice,a@x.com\nBob,b@x.com\nBadRow,\n";

#[tokio::test]
async fn import_form_lists_importable_columns() {
    let app = build_test_app();

    let (status, body) = app.get("/api/v1/resources/users/import").await;

    assert_eq!(status, StatusCode::OK);
    let resource = &body["data"]["resource"];
    assert_eq!(resource["label"], "Usuários");
    assert_eq!(resource["route"], "/api/v1/resources/users");
    assert_eq!(resource["icon"], "users");
    assert_eq!(
        resource["columns"],
        json!(["name", "email", "active", "category_id"])
    );
}

#[tokio::test]
async fn import_requires_permission() {
    let app = build_test_app();
    let (status, _) = app.get("/api/v1/resources/audits/import").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .post_multipart(
            "/api/v1/resources/audits/import/check_file",
            &[("file", USERS_CSV)],
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn check_file_returns_header_row() {
    let app = build_test_app();

    let (status, body) = app
        .post_multipart(
            "/api/v1/resources/users/import/check_file",
            &[("file", b"nome;e-mail\nAlice;a@x.com\n"), ("delimiter", b";")],
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "data": ["nome", "e-mail"]}));
}

#[tokio::test]
async fn check_file_rejects_oversized_upload() {
    let app = build_test_app();
    let mut big = b"name,email\n".to_vec();
    big.resize(137_073, b'a');

    let (status, body) = app
        .post_multipart(
            "/api/v1/resources/users/import/check_file",
            &[("file", &big), ("delimiter", b",")],
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(
        body["message"],
        json!({"type": "error", "text": "Arquivo maior do que o permitido..."})
    );
}

#[tokio::test]
async fn check_file_without_file_is_invalid() {
    let app = build_test_app();

    let (status, body) = app
        .post_multipart(
            "/api/v1/resources/users/import/check_file",
            &[("delimiter", b",")],
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"]["text"], "Arquivo inválido...");
}

#[tokio::test]
async fn submit_with_broken_config_is_rejected_in_band() {
    let app = build_test_app();

    let (status, body) = app
        .post_multipart(
            "/api/v1/resources/users/import/submit",
            &[("file", USERS_CSV), ("config", b"{not json")],
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert!(app.store.rows("users").await.is_empty());
}

#[tokio::test]
async fn submit_imports_in_background_and_notifies() {
    let app = build_test_app();
    let config = json!({
        "delimiter": ",",
        "data": {"csv_header": ["name", "email"]},
        "fieldlist": {"0": "name", "1": "email"},
    })
    .to_string();

    let (status, body) = app
        .post_multipart(
            "/api/v1/resources/users/import/submit",
            &[("file", USERS_CSV), ("config", config.as_bytes())],
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));

    let notifications = app.wait_for_notifications(7, 2).await;
    assert_eq!(notifications.len(), 2);

    let success = notifications
        .iter()
        .find(|n| n.level == NotificationLevel::Success)
        .expect("success summary");
    assert_eq!(success.message, "2 Usuários importados com sucesso !!");

    let failure = notifications
        .iter()
        .find(|n| n.level == NotificationLevel::Danger)
        .expect("failure summary");
    assert_eq!(failure.message, "1 Usuário não pôde ser importado !!");

    let names: Vec<_> = app
        .store
        .rows("users")
        .await
        .into_iter()
        .map(|r| r["name"].clone())
        .collect();
    assert_eq!(names, vec![json!("Alice"), json!("Bob")]);

    let (status, body) = app.get("/api/v1/notifications").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}
