// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication gate.
//!
//! For every routed request the gate:
//!
//! 1. Resolves the route's access requirement from the [`AccessRegistry`]
//!    and stores it in the request extensions for the later stages. A
//!    route with no entry is answered with 500.
//! 2. Passes public routes through without an identity.
//! 3. Otherwise requires `Authorization: Bearer <access token>`, verifies
//!    it, and attaches an [`AuthContext`].
//!
//! Verification failures are collapsed into one client-facing message; the
//! reason (signature, expiry, shape, kind) is only logged. No refresh is
//! attempted here.

use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    extract::{ConnectInfo, MatchedPath},
    http::{header, HeaderMap, HeaderValue, Request},
    response::{IntoResponse, Response},
};
use tower::{Layer, Service};

use crate::auth::{AccessRegistry, AccessRequirement, AuthContext, TokenCodec, TokenKind};
use crate::error::{ApiError, ApiResult, NOT_LOGGED_IN, SESSION_INVALID};

// =============================================================================
// AuthLayer
// =============================================================================

/// Layer for the authentication gate.
#[derive(Clone)]
pub struct AuthLayer {
    codec: TokenCodec,
    registry: Arc<AccessRegistry>,
}

impl AuthLayer {
    /// Creates a new auth layer.
    pub fn new(codec: TokenCodec, registry: Arc<AccessRegistry>) -> Self {
        Self { codec, registry }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            codec: self.codec.clone(),
            registry: self.registry.clone(),
        }
    }
}

// =============================================================================
// AuthMiddleware
// =============================================================================

/// Middleware for the authentication gate.
#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    codec: TokenCodec,
    registry: Arc<AccessRegistry>,
}

impl<S> Service<Request<Body>> for AuthMiddleware<S>
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

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let codec = self.codec.clone();
        let registry = self.registry.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            // Prefer the route template; fall back to the raw path when the
            // gate runs outside the router.
            let path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|p| p.as_str().to_string())
                .unwrap_or_else(|| req.uri().path().to_string());

            // A routed request without an access entry is a wiring mistake.
            // Refuse it rather than serve it unguarded.
            let Some(route) = registry.lookup(req.method(), &path) else {
                tracing::error!(method = %req.method(), path = %path, "Route has no access entry");
                return Ok(ApiError::internal(format!(
                    "no access entry for {} {}",
                    req.method(),
                    path
                ))
                .into_response());
            };
            let requirement = route.requirement.clone();

            let client_ip = req
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ci| ci.0.ip());

            let auth_ctx = match authenticate(&requirement, req.headers(), &codec, client_ip) {
                Ok(ctx) => ctx,
                Err(e) => return Ok(e.into_response()),
            };

            req.extensions_mut().insert(route);
            req.extensions_mut().insert(requirement);

            if let Some(ctx) = auth_ctx {
                if req.extensions().get::<AuthContext>().is_some() {
                    tracing::error!(path = %path, "Auth context attached twice");
                    return Ok(ApiError::internal("auth context attached twice").into_response());
                }
                req.extensions_mut().insert(ctx);
            }

            inner.call(req).await
        })
    }
}

// =============================================================================
// Gate
// =============================================================================

/// Decides whether a request may proceed to authorization.
///
/// Returns `Ok(None)` for routes that do not require login, `Ok(Some(ctx))`
/// for a verified access token, and an unauthenticated error otherwise.
pub fn authenticate(
    requirement: &AccessRequirement,
    headers: &HeaderMap,
    codec: &TokenCodec,
    client_ip: Option<IpAddr>,
) -> ApiResult<Option<AuthContext>> {
    if !requirement.requires_login {
        return Ok(None);
    }

    let value = match headers.get(header::AUTHORIZATION) {
        Some(value) if !value.as_bytes().iter().all(u8::is_ascii_whitespace) => value,
        _ => {
            tracing::debug!("No authorization header provided");
            return Err(ApiError::unauthenticated(NOT_LOGGED_IN));
        }
    };

    let token = bearer_token(value).ok_or_else(|| {
        tracing::debug!("Authorization header is not a bearer credential");
        ApiError::unauthenticated(SESSION_INVALID)
    })?;

    let claims = codec
        .verify_kind(token, TokenKind::Access)
        .map_err(|e| {
            tracing::debug!(error = %e, "Token verification failed");
            ApiError::from(e)
        })?;

    Ok(Some(AuthContext::from_claims(&claims, client_ip)))
}

/// Extracts the token from a `Bearer <token>` header value.
fn bearer_token(value: &HeaderValue) -> Option<&str> {
    let value = value.to_str().ok()?.trim();
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AccessRule, Identity, JwtConfig, PermissionSet};
    use axum::http::{Method, StatusCode};
    use std::convert::Infallible;
    use tower::ServiceExt;

    fn codec() -> TokenCodec {
        TokenCodec::new(JwtConfig::new("auth-gate-test-secret-long-enough-0000")).unwrap()
    }

    fn login_required() -> AccessRequirement {
        AccessRequirement {
            requires_login: true,
            required_permissions: PermissionSet::new(),
        }
    }

    fn alice() -> Identity {
        Identity::new(
            9,
            "alice",
            vec!["editor".to_string()],
            PermissionSet::from_names(["ddd"]),
        )
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn detail(err: ApiError) -> String {
        err.detail()
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&HeaderValue::from_static("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&HeaderValue::from_static("bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&HeaderValue::from_static("Basic abc")), None);
        assert_eq!(bearer_token(&HeaderValue::from_static("Bearer")), None);
        assert_eq!(bearer_token(&HeaderValue::from_static("Bearer   ")), None);
    }

    #[test]
    fn test_public_route_has_no_context() {
        let result = authenticate(&AccessRequirement::public(), &HeaderMap::new(), &codec(), None);
        assert!(result.unwrap().is_none());

        // A bad header on a public route is ignored.
        let result = authenticate(
            &AccessRequirement::public(),
            &headers_with("Bearer junk"),
            &codec(),
            None,
        );
        assert!(result.unwrap().is_none());
    }

    #[test]
    fn test_missing_header() {
        let err = authenticate(&login_required(), &HeaderMap::new(), &codec(), None).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(detail(err), NOT_LOGGED_IN);

        let err = authenticate(&login_required(), &headers_with(""), &codec(), None).unwrap_err();
        assert_eq!(detail(err), NOT_LOGGED_IN);
    }

    #[test]
    fn test_invalid_tokens_collapse() {
        let codec = codec();
        let other = TokenCodec::new(JwtConfig::new("some-other-secret-that-is-long-enough")).unwrap();
        let forged = other.issue_pair(&alice()).unwrap().access_token;
        let expired = codec
            .sign(&crate::auth::Claims::access(&alice(), 1_000, 60).with_issuer("roombook"))
            .unwrap();
        let refresh = codec.issue_pair(&alice()).unwrap().refresh_token;

        for header in [
            "Basic abc".to_string(),
            "Bearer not-a-token".to_string(),
            format!("Bearer {}", forged),
            format!("Bearer {}", expired),
            format!("Bearer {}", refresh),
        ] {
            let err = authenticate(&login_required(), &headers_with(&header), &codec, None)
                .unwrap_err();
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
            assert_eq!(detail(err), SESSION_INVALID, "header {:?}", header);
        }
    }

    #[test]
    fn test_valid_token_populates_context() {
        let codec = codec();
        let token = codec.issue_pair(&alice()).unwrap().access_token;
        let ip: IpAddr = "127.0.0.1".parse().unwrap();

        let ctx = authenticate(
            &login_required(),
            &headers_with(&format!("Bearer {}", token)),
            &codec,
            Some(ip),
        )
        .unwrap()
        .unwrap();

        assert_eq!(ctx.user_id(), 9);
        assert_eq!(ctx.username(), "alice");
        assert!(ctx.has_permission("ddd"));
        assert_eq!(ctx.client_ip(), Some(ip));
    }

    #[tokio::test]
    async fn test_middleware_rejects_before_handler() {
        let registry = Arc::new(
            AccessRegistry::builder()
                .controller("app", AccessRule::none())
                .route(Method::GET, "/private", "app", "private", AccessRule::login())
                .route(Method::GET, "/open", "app", "open", AccessRule::none())
                .build()
                .unwrap(),
        );
        let layer = AuthLayer::new(codec(), registry);

        let service = layer.layer(tower::service_fn(|req: Request<Body>| async move {
            // The handler sees a context only on the private route.
            let has_ctx = req.extensions().get::<AuthContext>().is_some();
            let status = if has_ctx { StatusCode::ACCEPTED } else { StatusCode::OK };
            Ok::<_, Infallible>((status, "").into_response())
        }));

        let req = Request::builder().uri("/private").body(Body::empty()).unwrap();
        let response = service.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let req = Request::builder().uri("/open").body(Body::empty()).unwrap();
        let response = service.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let token = codec().issue_pair(&alice()).unwrap().access_token;
        let req = Request::builder()
            .uri("/private")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        let response = service.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let req = Request::builder()
            .method(Method::HEAD)
            .uri("/private")
            .body(Body::empty())
            .unwrap();
        let response = service.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unregistered_route_refused() {
        let registry = Arc::new(
            AccessRegistry::builder()
                .controller("app", AccessRule::none())
                .route(Method::GET, "/open", "app", "open", AccessRule::none())
                .build()
                .unwrap(),
        );
        let service = AuthLayer::new(codec(), registry).layer(tower::service_fn(
            |_req: Request<Body>| async move {
                Ok::<_, Infallible>((StatusCode::OK, "").into_response())
            },
        ));

        for (method, uri) in [(Method::GET, "/unlisted"), (Method::POST, "/open")] {
            let req = Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap();
            let response = service.clone().oneshot(req).await.unwrap();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR, "{}", uri);
        }
    }
}
