//! Signup scenarios.

use axum::http::StatusCode;
use serde_json::json;

use crate::e2e_tests::helpers::*;

#[tokio::test]
async fn test_signup_returns_email_only() {
    let app = TestApp::new();

    let response = app.signup("a@b.com", "pw1").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({ "email": "a@b.com" }));
}

#[tokio::test]
async fn test_signup_duplicate_email() {
    let app = TestApp::new();
    assert_eq!(app.signup("a@b.com", "pw1").await.status, StatusCode::OK);

    let response = app.signup("a@b.com", "pw2").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body, json!({ "detail": "Email already registered" }));
}

#[tokio::test]
async fn test_duplicate_signup_keeps_original_password() {
    let app = TestApp::new();
    app.signup("a@b.com", "pw1").await;
    app.signup("a@b.com", "pw2").await;

    assert_eq!(app.login("a@b.com", "pw2").await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.login("a@b.com", "pw1").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_signup_invalid_email() {
    let app = TestApp::new();

    let response = app.signup("not-an-email", "pw1").await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        response.body,
        json!({ "detail": "email is not a valid address" })
    );
}

#[tokio::test]
async fn test_signup_empty_password() {
    let app = TestApp::new();

    let response = app.signup("a@b.com", "").await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        response.body,
        json!({ "detail": "password must not be empty" })
    );
}

#[tokio::test]
async fn test_signup_missing_field() {
    let app = TestApp::new();

    let response = app.post_json("/signup", &json!({ "email": "a@b.com" })).await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        response.body,
        json!({ "detail": "request body must contain an email and a password" })
    );
}

#[tokio::test]
async fn test_signup_malformed_json() {
    let app = TestApp::new();

    let response = app
        .post_raw("/signup", Some("application/json"), r#"{"email": "a@b.com", "#)
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        response.body,
        json!({ "detail": "request body is not valid JSON" })
    );
}

#[tokio::test]
async fn test_signup_without_content_type() {
    let app = TestApp::new();

    let response = app
        .post_raw("/signup", None, r#"{"email": "a@b.com", "password": "pw1"}"#)
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        response.body,
        json!({ "detail": "expected an application/json request body" })
    );
}

#[tokio::test]
async fn test_malformed_signup_is_distinct_from_duplicate() {
    let app = TestApp::new();
    app.signup("a@b.com", "pw1").await;

    let malformed = app
        .post_raw("/signup", Some("application/json"), "{")
        .await;
    let duplicate = app.signup("a@b.com", "pw2").await;

    assert_ne!(malformed.status, duplicate.status);
    assert_eq!(duplicate.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_signup_ignores_unknown_fields() {
    let app = TestApp::new();

    let response = app
        .post_json(
            "/signup",
            &json!({ "email": "a@b.com", "password": "pw1", "is_admin": true }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({ "email": "a@b.com" }));
}
