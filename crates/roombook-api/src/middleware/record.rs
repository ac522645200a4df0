// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Invoke-record middleware.
//!
//! Logs every request that passed both gates: who called which handler, from
//! where, and how long it took. Requests rejected by a gate never reach this
//! layer.

use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Request},
    response::Response,
};
use tower::{Layer, Service};

use crate::auth::{AuthContext, RouteAccess};
use crate::config::RecordConfig;

// =============================================================================
// RecordLayer
// =============================================================================

/// Layer for invoke-record logging.
#[derive(Debug, Clone)]
pub struct RecordLayer {
    config: Arc<RecordConfig>,
}

impl RecordLayer {
    /// Creates a new record layer.
    pub fn new(config: RecordConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Creates a record layer that logs nothing.
    pub fn disabled() -> Self {
        Self::new(RecordConfig { enabled: false })
    }
}

impl<S> Layer<S> for RecordLayer {
    type Service = RecordMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RecordMiddleware {
            inner,
            config: self.config.clone(),
        }
    }
}

// =============================================================================
// RecordMiddleware
// =============================================================================

/// Middleware for invoke-record logging.
#[derive(Debug, Clone)]
pub struct RecordMiddleware<S> {
    inner: S,
    config: Arc<RecordConfig>,
}

impl<S> Service<Request<Body>> for RecordMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let mut inner = self.inner.clone();

        if !self.config.enabled {
            return Box::pin(async move { inner.call(req).await });
        }

        let entry = RecordEntry::from_request(&req);
        entry.log_start();

        Box::pin(async move {
            let start = Instant::now();
            let result = inner.call(req).await;

            if let Ok(response) = &result {
                tracing::debug!(
                    request_id = %entry.request_id,
                    status = response.status().as_u16(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "[{} {}] handled",
                    entry.method,
                    entry.path,
                );
            }

            result
        })
    }
}

// =============================================================================
// RecordEntry
// =============================================================================

/// What is known about an admitted request before it is handled.
#[derive(Debug, Clone)]
struct RecordEntry {
    method: String,
    path: String,
    client_ip: String,
    user_agent: String,
    controller: String,
    handler: String,
    user: Option<(i64, String)>,
    request_id: String,
}

impl RecordEntry {
    fn from_request(req: &Request<Body>) -> Self {
        let route = req.extensions().get::<Arc<RouteAccess>>();
        let ctx = req.extensions().get::<AuthContext>();

        let client_ip = ctx
            .and_then(|ctx| ctx.client_ip())
            .or_else(|| {
                req.extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ci| ci.0.ip())
            })
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let user_agent = req
            .headers()
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string();

        Self {
            method: req.method().to_string(),
            path: req.uri().path().to_string(),
            client_ip,
            user_agent,
            controller: route.map(|r| r.controller.clone()).unwrap_or_default(),
            handler: route.map(|r| r.handler.clone()).unwrap_or_default(),
            user: ctx.map(|ctx| (ctx.user_id(), ctx.username().to_string())),
            request_id: ctx
                .map(|ctx| ctx.request_id().to_string())
                .unwrap_or_else(|| "-".to_string()),
        }
    }

    fn log_start(&self) {
        tracing::debug!(
            request_id = %self.request_id,
            "[{} {} {} {}]: {} {} called",
            self.method,
            self.path,
            self.client_ip,
            self.user_agent,
            self.controller,
            self.handler,
        );

        if let Some((user_id, username)) = &self.user {
            tracing::debug!(
                request_id = %self.request_id,
                user_id = *user_id,
                username = %username,
                "caller"
            );
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
