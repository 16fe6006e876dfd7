//! Common helpers for end-to-end tests.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::http::router;
use crate::testing::{ManualTimeSource, new_test_service};

/// Clock reading every test app starts at.
pub const START_SECS: u64 = 1_700_000_000;

/// A router over a fresh in-memory store, plus the clock driving it.
pub struct TestApp {
    router: Router,
    pub clock: Arc<ManualTimeSource>,
}

/// Status and decoded JSON body of a response.
pub struct TestResponse {
    pub status: StatusCode,
    pub www_authenticate: Option<String>,
    pub body: Value,
}

impl TestApp {
    /// Create a new test app with an empty user store.
    #[must_use]
    pub fn new() -> Self {
        let clock = Arc::new(ManualTimeSource::new(START_SECS));
        let service = Arc::new(new_test_service(Arc::clone(&clock)));
        Self {
            router: router(service),
            clock,
        }
    }

    /// Send a request through the router.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let www_authenticate = response
            .headers()
            .get(header::WWW_AUTHENTICATE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = serde_json::from_slice(&bytes).expect("response body is JSON");

        TestResponse {
            status,
            www_authenticate,
            body,
        }
    }

    /// POST a JSON body.
    pub async fn post_json(&self, path: &str, body: &Value) -> TestResponse {
        self.post_raw(path, Some("application/json"), body.to_string())
            .await
    }

    /// POST an arbitrary body with an optional `Content-Type`.
    pub async fn post_raw(
        &self,
        path: &str,
        content_type: Option<&str>,
        body: impl Into<String>,
    ) -> TestResponse {
        let mut builder = Request::builder().method("POST").uri(path);
        if let Some(value) = content_type {
            builder = builder.header(header::CONTENT_TYPE, value);
        }
        let request = builder
            .body(Body::from(body.into()))
            .expect("valid request");
        self.send(request).await
    }

    /// GET with an optional raw `Authorization` header value.
    pub async fn get(&self, path: &str, authorization: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method("GET").uri(path);
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let request = builder.body(Body::empty()).expect("valid request");
        self.send(request).await
    }

    pub async fn signup(&self, email: &str, password: &str) -> TestResponse {
        self.post_json("/signup", &json!({ "email": email, "password": password }))
            .await
    }

    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        self.post_json("/login", &json!({ "email": email, "password": password }))
            .await
    }

    /// Sign up and log in, returning the access token.
    pub async fn signup_and_login(&self, email: &str, password: &str) -> String {
        let signup = self.signup(email, password).await;
        assert_eq!(signup.status, StatusCode::OK);

        let login = self.login(email, password).await;
        assert_eq!(login.status, StatusCode::OK);

        login.body["access_token"]
            .as_str()
            .expect("access_token is a string")
            .to_string()
    }

    pub async fn me(&self, token: &str) -> TestResponse {
        self.get("/users/me", Some(&format!("Bearer {token}"))).await
    }
}
