//! Login scenarios.

use axum::http::StatusCode;
use serde_json::json;

use crate::e2e_tests::helpers::*;

#[tokio::test]
async fn test_login_wrong_password() {
    let app = TestApp::new();
    app.signup("a@b.com", "pw1").await;

    let response = app.login("a@b.com", "wrongpw").await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body, json!({ "detail": "Invalid credentials" }));
    assert_eq!(response.www_authenticate.as_deref(), Some("Bearer"));
}

#[tokio::test]
async fn test_login_unknown_email_is_indistinguishable() {
    let app = TestApp::new();
    app.signup("a@b.com", "pw1").await;

    let unknown = app.login("nobody@b.com", "pw1").await;
    let wrong = app.login("a@b.com", "wrongpw").await;

    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status, wrong.status);
    assert_eq!(unknown.body, wrong.body);
}

#[tokio::test]
async fn test_login_returns_bearer_token() {
    let app = TestApp::new();
    app.signup("a@b.com", "pw1").await;

    let response = app.login("a@b.com", "pw1").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["token_type"], "bearer");
    let token = response.body["access_token"]
        .as_str()
        .expect("access_token is a string");
    assert_eq!(token.split('.').count(), 3);

    let me = app.me(token).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body, json!({ "email": "a@b.com" }));
}

#[tokio::test]
async fn test_login_before_signup() {
    let app = TestApp::new();

    let response = app.login("a@b.com", "pw1").await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_twice_gives_independent_tokens() {
    let app = TestApp::new();
    app.signup("a@b.com", "pw1").await;

    let first = app.login("a@b.com", "pw1").await;
    app.clock.advance(5);
    let second = app.login("a@b.com", "pw1").await;

    assert_ne!(first.body["access_token"], second.body["access_token"]);
    for response in [first, second] {
        let token = response.body["access_token"].as_str().expect("token");
        assert_eq!(app.me(token).await.status, StatusCode::OK);
    }
}

#[tokio::test]
async fn test_login_empty_password() {
    let app = TestApp::new();
    app.signup("a@b.com", "pw1").await;

    let response = app.login("a@b.com", "").await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body, json!({ "detail": "Invalid credentials" }));
}

#[tokio::test]
async fn test_login_malformed_json() {
    let app = TestApp::new();

    let response = app
        .post_raw("/login", Some("application/json"), r#"{"email": "a@b.com", "#)
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        response.body,
        json!({ "detail": "request body is not valid JSON" })
    );
}
