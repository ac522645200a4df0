// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API server implementation.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, Method, StatusCode},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

use crate::auth::{AccessRegistry, AccessRule, RegistryError};
use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::handlers::{self, app, user};
use crate::middleware::{AuthLayer, RbacLayer, RecordLayer};
use crate::state::AppState;

// =============================================================================
// Access metadata
// =============================================================================

/// Builds the access registry for every route served by [`ApiServer`].
///
/// Neither controller declares a controller-wide rule, so each route's own
/// rule decides.
pub fn access_registry() -> Result<AccessRegistry, RegistryError> {
    AccessRegistry::builder()
        .controller("app", AccessRule::none())
        .controller("user", AccessRule::none())
        // app
        .route(Method::GET, "/", "app", "hello", AccessRule::none())
        .route(Method::GET, "/aaa", "app", "aaa", AccessRule::login().require(["ddd"]))
        .route(Method::GET, "/bbb", "app", "bbb", AccessRule::none())
        // user: sessions
        .route(Method::POST, "/user/login", "user", "login", AccessRule::none())
        .route(Method::POST, "/user/admin/login", "user", "admin_login", AccessRule::none())
        .route(Method::GET, "/user/refresh", "user", "refresh", AccessRule::none())
        .route(Method::GET, "/user/admin/refresh", "user", "admin_refresh", AccessRule::none())
        // user: registration
        .route(Method::POST, "/user/register", "user", "register", AccessRule::none())
        .route(Method::GET, "/user/register-captcha", "user", "register_captcha", AccessRule::none())
        .route(
            Method::GET,
            "/user/update_password/captcha",
            "user",
            "update_password_captcha",
            AccessRule::none(),
        )
        .route(Method::GET, "/user/update/captcha", "user", "update_captcha", AccessRule::none())
        // user: account updates
        .route(Method::POST, "/user/update_password", "user", "update_password", AccessRule::login())
        .route(
            Method::POST,
            "/user/admin/update_password",
            "user",
            "admin_update_password",
            AccessRule::login(),
        )
        .route(Method::POST, "/user/update", "user", "update", AccessRule::login())
        .route(Method::POST, "/user/admin/update", "user", "admin_update", AccessRule::login())
        // user: queries and administration
        .route(Method::GET, "/user/info", "user", "info", AccessRule::login())
        .route(Method::GET, "/user/freeze", "user", "freeze", AccessRule::login())
        .route(Method::GET, "/user/list", "user", "list", AccessRule::login())
        .route(Method::GET, "/user/init-data", "user", "init_data", AccessRule::none())
        .build()
}

// =============================================================================
// ApiServer
// =============================================================================

/// The API server.
///
/// This is the main entry point for creating and running the HTTP server.
pub struct ApiServer {
    state: AppState,
    config: Arc<ApiConfig>,
}

impl ApiServer {
    /// Creates a new API server with the given state.
    pub fn new(state: AppState) -> Self {
        let config = state.config.clone();
        Self { state, config }
    }

    /// Creates the router with all routes and middleware.
    ///
    /// The gates are attached with `route_layer` so they see the matched
    /// route template and never run for unknown paths.
    pub fn router(&self) -> Router {
        let gates = ServiceBuilder::new()
            .layer(AuthLayer::new(
                self.state.codec.clone(),
                self.state.registry.clone(),
            ))
            .layer(RbacLayer::new())
            .layer(RecordLayer::new(self.config.record.clone()));

        let outer = ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                self.config.request_timeout(),
            ))
            .layer(create_cors_layer(&self.config));

        Router::new()
            // app
            .route("/", get(app::hello))
            .route("/aaa", get(app::aaa))
            .route("/bbb", get(app::bbb))
            // user: sessions
            .route("/user/login", post(user::login))
            .route("/user/admin/login", post(user::admin_login))
            .route("/user/refresh", get(user::refresh))
            .route("/user/admin/refresh", get(user::admin_refresh))
            // user: registration
            .route("/user/register", post(user::register))
            .route("/user/register-captcha", get(user::register_captcha))
            .route("/user/update_password/captcha", get(user::update_password_captcha))
            .route("/user/update/captcha", get(user::update_captcha))
            // user: account updates
            .route("/user/update_password", post(user::update_password))
            .route("/user/admin/update_password", post(user::update_password))
            .route("/user/update", post(user::update))
            .route("/user/admin/update", post(user::update))
            // user: queries and administration
            .route("/user/info", get(user::info))
            .route("/user/freeze", get(user::freeze))
            .route("/user/list", get(user::list))
            .route("/user/init-data", get(user::init_data))
            .route_layer(gates)
            .fallback(handlers::not_found)
            .layer(outer)
            .with_state(self.state.clone())
    }

    /// Runs the server.
    pub async fn run(self) -> ApiResult<()> {
        self.run_with_shutdown(std::future::pending()).await
    }

    /// Runs the server with graceful shutdown.
    pub async fn run_with_shutdown(
        self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> ApiResult<()> {
        let addr = self.config.socket_addr();
        let router = self.router();

        info!("Starting API server on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to bind: {}", e)))?;

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| ApiError::internal(format!("Server error: {}", e)))?;

        info!("API server shutdown complete");

        Ok(())
    }

    /// Returns the server address.
    pub fn addr(&self) -> SocketAddr {
        self.config.socket_addr()
    }

    /// Returns the shared state.
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Builds the CORS layer. Credentials are only sent for an explicit origin list.
fn create_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = &config.cors;

    let mut layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT]);

    if cors.max_age_secs > 0 {
        layer = layer.max_age(Duration::from_secs(cors.max_age_secs));
    }

    if cors.allows_any_origin() {
        if cors.credentials {
            tracing::warn!("CORS credentials ignored while any origin is allowed");
        }
        return layer.allow_origin(Any);
    }

    layer
        .allow_origin(AllowOrigin::list(cors.origin_values()))
        .allow_credentials(cors.credentials)
}

// =============================================================================
// Tests
// =============================================================================
