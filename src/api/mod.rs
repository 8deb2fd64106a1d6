//! Remote resource contract for the governor server.
//!
//! Modules talk to the server only through the [`MonitorApi`] and
//! [`GovernorApi`] traits, so tests can swap in an in-memory fake.
//! [`HttpApi`] is the production implementation.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use govwatch::api::{GovernorApi, HttpApi};
//!
//! # tokio_test::block_on(async {
//! let api = HttpApi::builder()
//!     .endpoint("http://127.0.0.1:8080")
//!     .timeout(Duration::from_secs(5))
//!     .build()?;
//!
//! let status = api.status().await?;
//! println!("{}", status.status.label());
//! # Ok::<(), anyhow::Error>(())
//! # });
//! ```

mod http;
mod types;

pub use http::{HttpApi, HttpApiBuilder};
pub use types::{
    DayUsage, InterfaceHistory, InterfaceStats, LogEntry, LogTail, StatusPayload, ToggleResponse,
    UsageHistory,
};
pub(crate) use types::{RawInterfaceStats, ResetRequest};

use std::sync::Arc;

use async_trait::async_trait;

use crate::data::PolicyConfig;
use crate::error::ApiError;

/// Network interface telemetry.
#[async_trait]
pub trait MonitorApi: Send + Sync {
    async fn interfaces(&self) -> Result<Vec<String>, ApiError>;

    /// Current counters. A body carrying `error` is an [`ApiError::Remote`].
    async fn interface_stats(&self, id: &str) -> Result<InterfaceStats, ApiError>;

    /// Recent rate history, arrays guaranteed equal length.
    async fn interface_history(&self, id: &str) -> Result<InterfaceHistory, ApiError>;
}

/// The governor service and its stored policy.
#[async_trait]
pub trait GovernorApi: Send + Sync {
    async fn status(&self) -> Result<StatusPayload, ApiError>;

    async fn toggle(&self) -> Result<ToggleResponse, ApiError>;

    async fn usage_history(&self, month: u32) -> Result<UsageHistory, ApiError>;

    async fn logs(&self) -> Result<LogTail, ApiError>;

    async fn load_config(&self) -> Result<PolicyConfig, ApiError>;

    async fn save_config(&self, config: &PolicyConfig) -> Result<(), ApiError>;

    async fn reset_config(&self) -> Result<(), ApiError>;
}

pub type SharedMonitorApi = Arc<dyn MonitorApi>;
pub type SharedGovernorApi = Arc<dyn GovernorApi>;
