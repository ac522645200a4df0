// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authorization gate.
//!
//! Runs after the authentication gate and compares the route's required
//! permissions with the permissions carried by the caller's token. Routes
//! without required permissions always pass.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use tower::{Layer, Service};

use crate::auth::{AccessRequirement, AuthContext};
use crate::error::{ApiError, ApiResult, INSUFFICIENT_PERMISSIONS};

// =============================================================================
// RbacLayer
// =============================================================================

/// Layer for the authorization gate.
#[derive(Debug, Clone, Default)]
pub struct RbacLayer;

impl RbacLayer {
    /// Creates a new authorization layer.
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for RbacLayer {
    type Service = RbacMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RbacMiddleware { inner }
    }
}

// =============================================================================
// RbacMiddleware
// =============================================================================

/// Middleware for the authorization gate.
#[derive(Debug, Clone)]
pub struct RbacMiddleware<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for RbacMiddleware<S>
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

        Box::pin(async move {
            let requirement = req
                .extensions()
                .get::<AccessRequirement>()
                .cloned()
                .unwrap_or_default();

            if let Err(e) = authorize(&requirement, req.extensions().get::<AuthContext>()) {
                return Ok(e.into_response());
            }

            inner.call(req).await
        })
    }
}

// =============================================================================
// Gate
// =============================================================================

/// Checks that the caller holds every permission the route requires.
///
/// A route with required permissions but no caller identity is rejected as
/// well; that only happens when the route was also marked public.
pub fn authorize(requirement: &AccessRequirement, ctx: Option<&AuthContext>) -> ApiResult<()> {
    let required = &requirement.required_permissions;
    if required.is_empty() {
        return Ok(());
    }

    let Some(ctx) = ctx else {
        tracing::warn!(required = %required, "Permission check without an identity");
        return Err(ApiError::forbidden(INSUFFICIENT_PERMISSIONS));
    };

    let missing = ctx.permissions().missing(required);
    if missing.is_empty() {
        return Ok(());
    }

    tracing::warn!(
        user_id = ctx.user_id(),
        username = %ctx.username(),
        missing = ?missing,
        "Insufficient permissions"
    );
    Err(ApiError::forbidden(INSUFFICIENT_PERMISSIONS))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Claims, Identity, PermissionSet};
    use axum::http::StatusCode;
    use std::convert::Infallible;
    use tower::ServiceExt;

    fn requiring(perms: &[&str]) -> AccessRequirement {
        AccessRequirement {
            requires_login: true,
            required_permissions: PermissionSet::from_names(perms.iter().copied()),
        }
    }

    fn ctx_with(perms: &[&str]) -> AuthContext {
        let identity = Identity::new(
            1,
            "alice",
            vec!["editor".to_string()],
            PermissionSet::from_names(perms.iter().copied()),
        );
        AuthContext::from_claims(&Claims::access(&identity, 0, 60), None)
    }

    #[test]
    fn test_no_required_permissions() {
        assert!(authorize(&requiring(&[]), None).is_ok());
        assert!(authorize(&requiring(&[]), Some(&ctx_with(&[]))).is_ok());
    }

    #[test]
    fn test_subset_passes() {
        let ctx = ctx_with(&["ccc", "ddd"]);
        assert!(authorize(&requiring(&["ddd"]), Some(&ctx)).is_ok());
        assert!(authorize(&requiring(&["ccc", "ddd"]), Some(&ctx)).is_ok());
    }

    #[test]
    fn test_missing_permission_forbidden() {
        let ctx = ctx_with(&["ddd"]);
        let err = authorize(&requiring(&["ccc"]), Some(&ctx)).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.detail(), INSUFFICIENT_PERMISSIONS);

        // All required permissions must be held, not just one.
        assert!(authorize(&requiring(&["ccc", "ddd"]), Some(&ctx)).is_err());
    }

    #[test]
    fn test_no_identity_forbidden() {
        let err = authorize(&requiring(&["ccc"]), None).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_middleware() {
        let service = RbacLayer::new().layer(tower::service_fn(|_req: Request<Body>| async {
            Ok::<_, Infallible>(StatusCode::OK.into_response())
        }));

        let mut req = Request::builder().uri("/ccc").body(Body::empty()).unwrap();
        req.extensions_mut().insert(requiring(&["ccc"]));
        req.extensions_mut().insert(ctx_with(&["ddd"]));
        let response = service.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let mut req = Request::builder().uri("/ddd").body(Body::empty()).unwrap();
        req.extensions_mut().insert(requiring(&["ddd"]));
        req.extensions_mut().insert(ctx_with(&["ddd"]));
        let response = service.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // No requirement attached means the route is unregistered.
        let req = Request::builder().uri("/other").body(Body::empty()).unwrap();
        let response = service.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
