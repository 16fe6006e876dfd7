//! Authenticated access to `/users/me`.

use axum::http::StatusCode;
use serde_json::json;

use crate::e2e_tests::helpers::*;
use crate::testing::test_auth_config;

#[tokio::test]
async fn test_me_with_valid_token() {
    let app = TestApp::new();
    let token = app.signup_and_login("a@b.com", "pw1").await;

    let response = app.me(&token).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({ "email": "a@b.com" }));
}

#[tokio::test]
async fn test_me_without_authorization_header() {
    let app = TestApp::new();

    let response = app.get("/users/me", None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body, json!({ "detail": "Invalid token" }));
    assert_eq!(response.www_authenticate.as_deref(), Some("Bearer"));
}

#[tokio::test]
async fn test_me_with_wrong_scheme() {
    let app = TestApp::new();
    let token = app.signup_and_login("a@b.com", "pw1").await;

    let response = app.get("/users/me", Some(&format!("Basic {token}"))).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_with_garbage_token() {
    let app = TestApp::new();

    let response = app.me("not.a.token").await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body, json!({ "detail": "Invalid token" }));
}

#[tokio::test]
async fn test_me_after_token_expiry() {
    let app = TestApp::new();
    let token = app.signup_and_login("a@b.com", "pw1").await;
    let ttl = test_auth_config().token_ttl().as_secs();

    app.clock.advance(ttl - 1);
    assert_eq!(app.me(&token).await.status, StatusCode::OK);

    app.clock.advance(1);
    let response = app.me(&token).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body, json!({ "detail": "Invalid token" }));
}

#[tokio::test]
async fn test_me_with_token_from_other_deployment() {
    let app = TestApp::new();
    let other = TestApp::new();
    app.signup("a@b.com", "pw1").await;
    // Same secret, separate store: the subject does not exist here.
    let token = other.signup_and_login("ghost@b.com", "pw1").await;

    let response = app.me(&token).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body, json!({ "detail": "User not found" }));
}
