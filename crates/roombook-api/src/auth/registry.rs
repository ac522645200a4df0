// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Route access metadata.
//!
//! Every route is registered under a controller and a handler name. Access
//! rules can be declared at both levels; for each key (`requires_login`,
//! `required_permissions`) the handler's declaration wins over the
//! controller's when present. Nothing is merged.
//!
//! ```text
//! controller rule   handler rule        resolved
//! ---------------   ------------        --------
//! login             (none)              login
//! login             public              public
//! perms [a]         perms [b]           perms [b]
//! (none)            (none)              public, no permissions
//! ```
//!
//! The registry is built once at startup and only read afterwards.

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::Method;
use thiserror::Error;

use super::permission::PermissionSet;

// =============================================================================
// RegistryError
// =============================================================================

/// Errors raised while building an [`AccessRegistry`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The same method and path were registered twice.
    #[error("Route {method} {path} is registered more than once")]
    DuplicateRoute {
        /// HTTP method.
        method: Method,
        /// Route path.
        path: String,
    },

    /// A route names a controller that was never declared.
    #[error("Route {method} {path} names undeclared controller '{controller}'")]
    UnknownController {
        /// HTTP method.
        method: Method,
        /// Route path.
        path: String,
        /// Controller name.
        controller: String,
    },
}

// =============================================================================
// AccessRule
// =============================================================================

/// Access metadata declared on a controller or a handler.
///
/// `None` means "not declared at this level".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessRule {
    /// Whether a valid session is required.
    pub requires_login: Option<bool>,
    /// Permissions the caller must hold.
    pub required_permissions: Option<PermissionSet>,
}

impl AccessRule {
    /// A rule that declares nothing.
    pub fn none() -> Self {
        Self::default()
    }

    /// A rule that requires login.
    pub fn login() -> Self {
        Self {
            requires_login: Some(true),
            required_permissions: None,
        }
    }

    /// A rule that explicitly marks the target public.
    pub fn public() -> Self {
        Self {
            requires_login: Some(false),
            required_permissions: None,
        }
    }

    /// Declares required permissions.
    pub fn require<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_permissions = Some(PermissionSet::from_names(permissions));
        self
    }

    /// Resolves a handler rule against its controller rule.
    pub fn resolve(handler: &AccessRule, controller: &AccessRule) -> AccessRequirement {
        AccessRequirement {
            requires_login: handler
                .requires_login
                .or(controller.requires_login)
                .unwrap_or(false),
            required_permissions: handler
                .required_permissions
                .as_ref()
                .or(controller.required_permissions.as_ref())
                .cloned()
                .unwrap_or_default(),
        }
    }
}

// =============================================================================
// AccessRequirement
// =============================================================================

/// The resolved access requirement of a route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessRequirement {
    /// Whether a valid session is required.
    pub requires_login: bool,
    /// Permissions the caller must hold. Empty means none.
    pub required_permissions: PermissionSet,
}

impl AccessRequirement {
    /// A public route.
    pub fn public() -> Self {
        Self::default()
    }

    /// Returns `true` if the route needs neither login nor permissions.
    pub fn is_public(&self) -> bool {
        !self.requires_login && self.required_permissions.is_empty()
    }
}

// =============================================================================
// RouteAccess
// =============================================================================

/// A registered route: where it dispatches and what it requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteAccess {
    /// Controller name.
    pub controller: String,
    /// Handler name.
    pub handler: String,
    /// Resolved requirement.
    pub requirement: AccessRequirement,
}

// =============================================================================
// AccessRegistry
// =============================================================================

#[derive(Debug, Clone)]
struct RouteEntry {
    method: Method,
    path: String,
    controller: String,
    handler: String,
}

/// Read-only mapping from routes to access requirements.
#[derive(Debug, Clone, Default)]
pub struct AccessRegistry {
    controllers: HashMap<String, AccessRule>,
    handlers: HashMap<(String, String), AccessRule>,
    routes: HashMap<(Method, String), Arc<RouteAccess>>,
}

impl AccessRegistry {
    /// Creates a registry builder.
    pub fn builder() -> AccessRegistryBuilder {
        AccessRegistryBuilder::default()
    }

    /// Resolves the requirement of a handler by controller and handler name.
    ///
    /// Unknown names resolve to a public requirement.
    pub fn resolve(&self, controller: &str, handler: &str) -> AccessRequirement {
        let none = AccessRule::none();
        let controller_rule = self.controllers.get(controller).unwrap_or(&none);
        let handler_rule = self
            .handlers
            .get(&(controller.to_string(), handler.to_string()))
            .unwrap_or(&none);

        AccessRule::resolve(handler_rule, controller_rule)
    }

    /// Looks up a route by method and path.
    ///
    /// `HEAD` falls back to the `GET` entry of the same path, since the
    /// router answers `HEAD` with the `GET` handler.
    pub fn lookup(&self, method: &Method, path: &str) -> Option<Arc<RouteAccess>> {
        let exact = self.routes.get(&(method.clone(), path.to_string()));
        match exact {
            None if *method == Method::HEAD => self.routes.get(&(Method::GET, path.to_string())),
            found => found,
        }
        .cloned()
    }

    /// Returns the requirement of a registered route.
    pub fn requirement(&self, method: &Method, path: &str) -> Option<AccessRequirement> {
        self.lookup(method, path).map(|route| route.requirement.clone())
    }

    /// Returns the number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if no route is registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

// =============================================================================
// AccessRegistryBuilder
// =============================================================================

/// Builder for [`AccessRegistry`].
#[derive(Debug, Default)]
pub struct AccessRegistryBuilder {
    controllers: HashMap<String, AccessRule>,
    handlers: HashMap<(String, String), AccessRule>,
    routes: Vec<RouteEntry>,
}

impl AccessRegistryBuilder {
    /// Declares a controller and its rule.
    pub fn controller(mut self, name: impl Into<String>, rule: AccessRule) -> Self {
        self.controllers.insert(name.into(), rule);
        self
    }

    /// Registers a route dispatching to `controller::handler` with a
    /// handler-level rule.
    pub fn route(
        mut self,
        method: Method,
        path: impl Into<String>,
        controller: impl Into<String>,
        handler: impl Into<String>,
        rule: AccessRule,
    ) -> Self {
        let controller = controller.into();
        let handler = handler.into();

        self.handlers
            .insert((controller.clone(), handler.clone()), rule);
        self.routes.push(RouteEntry {
            method,
            path: path.into(),
            controller,
            handler,
        });
        self
    }

    /// Validates the declarations and resolves every route.
    pub fn build(self) -> Result<AccessRegistry, RegistryError> {
        let mut registry = AccessRegistry {
            controllers: self.controllers,
            handlers: self.handlers,
            routes: HashMap::with_capacity(self.routes.len()),
        };

        for entry in self.routes {
            if !registry.controllers.contains_key(&entry.controller) {
                return Err(RegistryError::UnknownController {
                    method: entry.method,
                    path: entry.path,
                    controller: entry.controller,
                });
            }

            let key = (entry.method.clone(), entry.path.clone());
            if registry.routes.contains_key(&key) {
                return Err(RegistryError::DuplicateRoute {
                    method: entry.method,
                    path: entry.path,
                });
            }

            let requirement = registry.resolve(&entry.controller, &entry.handler);
            registry.routes.insert(
                key,
                Arc::new(RouteAccess {
                    controller: entry.controller,
                    handler: entry.handler,
                    requirement,
                }),
            );
        }

        tracing::debug!(routes = registry.routes.len(), "Access registry built");
        Ok(registry)
    }
}

// =============================================================================
// Tests
// =============================================================================
