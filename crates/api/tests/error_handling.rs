//! Tests for `AppError` → HTTP response mapping.
//!
//! These call `IntoResponse` directly on `AppError` values; no router needed.

use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use temu_api::error::AppError;
use temu_core::error::CoreError;

/// Convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn not_found_error_returns_404() {
    let err = AppError::Core(CoreError::NotFound {
        entity: "ProfileRecord",
        id: 42,
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "ProfileRecord with id 42 not found");
}

#[tokio::test]
async fn unknown_step_returns_404() {
    let (status, json) =
        error_to_response(AppError::Core(CoreError::UnknownStep("profil".into()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "UNKNOWN_STEP");
}

#[tokio::test]
async fn field_validation_returns_400_with_field_errors() {
    let mut fields = BTreeMap::new();
    fields.insert("city".to_string(), "This field is required".to_string());

    let (status, json) =
        error_to_response(AppError::Core(CoreError::ValidationFailed(fields))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_FAILED");
    assert_eq!(json["fieldErrors"]["city"], "This field is required");
}

#[tokio::test]
async fn unauthorized_carries_sign_in_redirect() {
    let err = AppError::Core(CoreError::Unauthorized {
        redirect_to: "/auth/signin?callbackUrl=%2Femployer%2Fonboarding".into(),
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");
    assert_eq!(
        json["redirectTo"],
        "/auth/signin?callbackUrl=%2Femployer%2Fonboarding"
    );
}

#[tokio::test]
async fn forbidden_redirects_home() {
    let err = AppError::Core(CoreError::Forbidden {
        redirect_to: "/".into(),
    });
    let (status, json) = error_to_response(err).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["redirectTo"], "/");
}

#[tokio::test]
async fn incomplete_onboarding_returns_409_with_step() {
    let err = AppError::Core(CoreError::CompletionPreconditionFailed {
        step: 4,
        redirect_to: "/job-seeker/onboarding/level-pengalaman".into(),
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "ONBOARDING_INCOMPLETE");
    assert_eq!(json["step"], 4);
    assert_eq!(json["redirectTo"], "/job-seeker/onboarding/level-pengalaman");
}

#[tokio::test]
async fn persistence_failure_is_retryable_and_sanitized() {
    let err = AppError::Core(CoreError::Persistence("connection reset by peer".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "PERSISTENCE_ERROR");
    assert_eq!(json["retryable"], true);
    assert!(!json["error"].as_str().unwrap().contains("connection reset"));
}

#[tokio::test]
async fn save_in_progress_returns_409() {
    let (status, json) = error_to_response(AppError::SaveInProgress).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "SAVE_IN_PROGRESS");
}

#[tokio::test]
async fn internal_error_hides_details() {
    let err = AppError::Core(CoreError::Internal("task panicked".into()));
    let (status, json) = error_to_response(err).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "An internal error occurred");
}

#[tokio::test]
async fn bad_request_error_returns_400() {
    let (status, json) = error_to_response(AppError::BadRequest("missing page".into())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
    assert_eq!(json["error"], "missing page");
}

#[tokio::test]
async fn draft_rides_along_with_the_wrapped_error() {
    let draft = serde_json::json!({ "city": "Bandung" });
    let err = AppError::Core(CoreError::Persistence("timeout".into()))
        .with_draft(draft.as_object().cloned().unwrap());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "PERSISTENCE_ERROR");
    assert_eq!(json["retryable"], true);
    assert_eq!(json["draft"], draft);
}
