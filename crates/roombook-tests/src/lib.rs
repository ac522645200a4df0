// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # roombook Integration Tests
//!
//! End-to-end tests that drive the full router (gates, handlers and the
//! in-memory collaborators) through `tower::ServiceExt::oneshot`.
//!
//! ## Module Structure
//!
//! - [`common`]: Shared test utilities
//!   - `fixtures`: Accounts, roles and configuration used across suites
//!   - `harness`: [`TestApp`](common::TestApp) wrapping a router and its stores
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p roombook-tests
//!
//! cargo test -p roombook-tests --test gate_scenarios
//! cargo test -p roombook-tests --test session_flows
//! ```

pub mod common;
