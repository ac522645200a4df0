// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Service runtime orchestration.
//!
//! Builds the collaborators, optionally seeds demo data, runs the API server
//! and enforces the shutdown timeout once a signal arrives.

use std::sync::Arc;

use roombook_api::{ApiServer, AppState};
use roombook_core::{seed_demo_data, LogMailSender, MemoryCodeCache, MemoryUserStore, UserStore};
use tracing::{info, warn};

use crate::config::RoombookConfig;
use crate::error::BinResult;
use crate::shutdown::ShutdownCoordinator;

// =============================================================================
// ServiceRuntime
// =============================================================================

/// The main service runtime.
pub struct ServiceRuntime {
    config: RoombookConfig,
    shutdown: ShutdownCoordinator,
}

impl ServiceRuntime {
    /// Creates a new runtime.
    pub fn new(config: RoombookConfig) -> Self {
        Self {
            config,
            shutdown: ShutdownCoordinator::new(),
        }
    }

    /// Returns the shutdown coordinator.
    pub fn shutdown(&self) -> &ShutdownCoordinator {
        &self.shutdown
    }

    /// Builds the application state with in-memory collaborators.
    pub async fn build_state(&self) -> BinResult<AppState> {
        let store: Arc<dyn UserStore> = Arc::new(MemoryUserStore::new());

        if self.config.seed_demo_data {
            let report = seed_demo_data(store.as_ref()).await?;
            info!(
                roles = report.roles,
                users = report.users_created,
                "Seeded demo data"
            );
        }

        let state = AppState::builder()
            .config(self.config.api.clone())
            .store(store)
            .cache(Arc::new(MemoryCodeCache::new()))
            .mail(Arc::new(LogMailSender))
            .build()?;

        Ok(state)
    }

    /// Runs the service until shutdown is signaled.
    pub async fn run(self) -> BinResult<()> {
        info!("Starting roombook v{}", crate::VERSION);

        let state = self.build_state().await?;
        let server = ApiServer::new(state);
        let signal = self.shutdown.shutdown_signal();

        let mut server_task = tokio::spawn(server.run_with_shutdown(signal.wait()));

        tokio::select! {
            result = &mut server_task => {
                return flatten(result);
            }
            _ = self.shutdown.wait_for_shutdown() => {}
        }

        let timeout = self.config.api.shutdown_timeout();
        let result = match tokio::time::timeout(timeout, server_task).await {
            Ok(result) => flatten(result),
            Err(_) => {
                warn!(timeout_secs = timeout.as_secs(), "Graceful shutdown timed out");
                Ok(())
            }
        };

        info!("roombook shutdown complete");
        result
    }
}

fn flatten(
    result: Result<roombook_api::ApiResult<()>, tokio::task::JoinError>,
) -> BinResult<()> {
    Ok(result??)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use roombook_api::JwtConfig;

    fn config(seed: bool) -> RoombookConfig {
        let mut config = RoombookConfig {
            seed_demo_data: seed,
            ..Default::default()
        };
        config.api.jwt = JwtConfig::new("runtime-test-secret-that-is-long-enough");
        config
    }

    #[tokio::test]
    async fn test_build_state_seeds_when_enabled() {
        let state = ServiceRuntime::new(config(true)).build_state().await.unwrap();
        let user = state.store().find_user_by_username("zhangsan").await.unwrap();
        assert!(user.is_some());

        let state = ServiceRuntime::new(config(false)).build_state().await.unwrap();
        let user = state.store().find_user_by_username("zhangsan").await.unwrap();
        assert!(user.is_none());
    }

    #[tokio::test]
    async fn test_build_state_rejects_invalid_config() {
        let runtime = ServiceRuntime::new(RoombookConfig::default());
        let err = runtime.build_state().await.unwrap_err();
        assert!(matches!(err, crate::BinError::Server(_)));
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let mut config = config(false);
        config.api.port = 0;
        config.api.host = "127.0.0.1".parse().unwrap();

        let runtime = ServiceRuntime::new(config);
        let shutdown = runtime.shutdown().clone();
        let handle = tokio::spawn(runtime.run());

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        shutdown.initiate_shutdown();

        let result = tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }
}
