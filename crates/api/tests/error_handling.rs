//! Tests for `AppError` → HTTP response mapping.
//!
//! These call `IntoResponse` directly; no router is involved.

use axum::response::IntoResponse;
use http_body_util::BodyExt;
use vstack_api::error::AppError;
use vstack_core::error::CoreError;
use vstack_core::validation::FieldViolation;
use vstack_db::StoreError;

/// Helper: convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (axum::http::StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn not_found_error_returns_404() {
    let err = AppError::Core(CoreError::not_found("Record", "U-9"));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, axum::http::StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Record with id U-9 not found");
}

#[tokio::test]
async fn forbidden_error_returns_403() {
    let err = AppError::Core(CoreError::Forbidden("Not allowed to list audits".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, axum::http::StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "FORBIDDEN");
}

#[tokio::test]
async fn invalid_fields_return_422_grouped_by_field() {
    let violation = |field: &str, message: &str| FieldViolation {
        field: field.into(),
        rule: "required".into(),
        message: message.into(),
        value: None,
    };
    let err = AppError::Core(CoreError::InvalidFields(vec![
        violation("name", "O campo name é obrigatório."),
        violation("email", "first"),
        violation("email", "second"),
    ]));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, axum::http::StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["errors"]["email"], serde_json::json!(["first", "second"]));
    assert_eq!(json["errors"]["name"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn upload_rejection_is_reported_in_band() {
    let err = AppError::Core(CoreError::UploadRejected("Arquivo inválido...".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, axum::http::StatusCode::OK);
    assert_eq!(
        json,
        serde_json::json!({
            "success": false,
            "message": {"type": "error", "text": "Arquivo inválido..."},
        })
    );
}

#[tokio::test]
async fn store_constraint_returns_409() {
    let err = AppError::Store(StoreError::Constraint("duplicate email".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, axum::http::StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
}

#[tokio::test]
async fn internal_error_returns_500_and_sanitizes_message() {
    let err = AppError::InternalError("secret database credentials leaked".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}

#[tokio::test]
async fn invalid_identifier_is_an_internal_error() {
    let err = AppError::Store(StoreError::InvalidIdentifier("bad name".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "An internal error occurred");
}
