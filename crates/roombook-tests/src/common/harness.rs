// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Harness
//!
//! [`TestApp`] owns a fully wired router together with handles to the
//! in-memory store and outbox, so tests can seed data and read the codes
//! that were mailed out.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use roombook_api::{ApiConfig, ApiServer, AppState};
use roombook_core::{MemoryCodeCache, MemoryMailSender, MemoryUserStore, UserStore};

use super::fixtures::{test_api_config, Account};

// =============================================================================
// TestResponse
// =============================================================================

/// Status and decoded JSON body of a response.
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status.
    pub status: StatusCode,
    /// JSON body, or `Value::Null` when the body is empty or not JSON.
    pub body: Value,
}

impl TestResponse {
    /// Asserts an error envelope with the given status and detail.
    pub fn assert_envelope(&self, status: StatusCode, data: &str) {
        assert_eq!(self.status, status, "unexpected status, body: {}", self.body);
        assert_eq!(self.body["code"], status.as_u16());
        assert_eq!(self.body["message"], "fail");
        assert_eq!(self.body["data"], data);
    }
}

// =============================================================================
// TestApp
// =============================================================================

/// In-process application with inspectable collaborators.
pub struct TestApp {
    router: Router,
    state: AppState,
    store: Arc<MemoryUserStore>,
    mail: Arc<MemoryMailSender>,
}

impl TestApp {
    /// Creates an app with the default test configuration.
    pub fn new() -> Self {
        Self::with_config(test_api_config())
    }

    /// Creates an app with the given configuration.
    pub fn with_config(config: ApiConfig) -> Self {
        super::init_test_logging();

        let store = Arc::new(MemoryUserStore::new());
        let mail = Arc::new(MemoryMailSender::new());

        let state = AppState::builder()
            .config(config)
            .store(store.clone())
            .cache(Arc::new(MemoryCodeCache::new()))
            .mail(mail.clone())
            .build()
            .expect("build app state");

        let router = ApiServer::new(state.clone()).router();

        Self {
            router,
            state,
            store,
            mail,
        }
    }

    /// Returns the application state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Returns the user store.
    pub fn store(&self) -> &dyn UserStore {
        self.store.as_ref()
    }

    /// Creates a fixture account.
    pub async fn create(&self, account: Account) -> roombook_core::User {
        account.create(self.store()).await
    }

    /// Sends a request through the router.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }

    /// Sends a GET request with an optional `Authorization` header value.
    pub async fn get(&self, uri: &str, authorization: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method(Method::GET).uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        self.send(builder.body(Body::empty()).expect("request"))
            .await
    }

    /// Sends a JSON POST request with an optional `Authorization` header value.
    pub async fn post_json(
        &self,
        uri: &str,
        body: Value,
        authorization: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        self.send(builder.body(Body::from(body.to_string())).expect("request"))
            .await
    }

    /// Logs in through `/user/login` and returns the response.
    pub async fn login(&self, username: &str, password: &str) -> TestResponse {
        self.post_json(
            "/user/login",
            serde_json::json!({ "username": username, "password": password }),
            None,
        )
        .await
    }

    /// Logs in and returns the `Authorization` header value for the access token.
    pub async fn bearer(&self, account: Account) -> String {
        let response = self.login(account.username, account.password).await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {}", response.body);
        let token = response.body["accessToken"]
            .as_str()
            .expect("access token");
        format!("Bearer {}", token)
    }

    /// Returns the digits of the last code mailed to `address`.
    pub fn last_code(&self, address: &str) -> Option<String> {
        self.mail.last_to(address).map(|message| {
            message
                .html
                .chars()
                .filter(char::is_ascii_digit)
                .collect()
        })
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
