//! # govwatch
//!
//! A terminal dashboard and library for a bandwidth governor service and
//! the network interfaces of the host it runs on.
//!
//! The governor server exposes a small HTTP API: service status and a
//! start/stop toggle, daily usage per month, a log tail, its policy
//! (speed limit, daily quota range, schedule window, sleep range, URL
//! list) and per-interface throughput. This crate polls those resources
//! on independent cadences and renders them in a ratatui TUI.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Application                          │
//! │  ┌─────────┐    ┌───────────┐    ┌─────────┐    ┌──────────┐ │
//! │  │  app    │───▶│  modules  │───▶│   ui    │───▶│ Terminal │ │
//! │  │ (state) │    │ (polling) │    │(render) │    │          │ │
//! │  └─────────┘    └─────┬─────┘    └─────────┘    └──────────┘ │
//! │                       │ poll::PollScheduler                  │
//! │                       ▼                                      │
//! │                 ┌───────────┐                                │
//! │                 │    api    │◀── HttpApi (reqwest)           │
//! │                 └───────────┘                                │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`app`]**: Module ownership, boot order, navigation and user actions
//! - **[`modules`]**: One [`TelemetryModule`] per remote resource family,
//!   plus the [`PolicyEditor`]
//! - **[`poll`]**: Named periodic tasks with start/stop semantics
//! - **[`api`]**: The [`MonitorApi`]/[`GovernorApi`] contract and its HTTP client
//! - **[`data`]**: Formatting, rolling series, status mapping, policy validation
//! - **[`ui`]**: Terminal rendering with light/dark themes
//! - **[`config`]** and **[`logging`]**: Layered settings and tracing setup
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Watch a governor on the default endpoint
//! govwatch
//!
//! # Another server, logging to a file
//! govwatch --endpoint http://10.0.0.2:8080 --log-file govwatch.log
//!
//! # One-shot JSON export
//! govwatch --export state.json
//! ```
//!
//! ### As a library
//!
//! ```no_run
//! use std::sync::Arc;
//! use govwatch::{App, HttpApi, Settings, Theme};
//!
//! # tokio_test::block_on(async {
//! let settings = Settings::default();
//! let api = Arc::new(HttpApi::builder().endpoint(settings.endpoint.clone()).build()?);
//! let mut app = App::new(api.clone(), api, &settings, Theme::dark());
//! app.boot().await;
//! app.pump();
//! println!("{}", app.governor.view().badge.label);
//! app.destroy();
//! # Ok::<(), anyhow::Error>(())
//! # });
//! ```

pub mod api;
pub mod app;
pub mod config;
pub mod data;
pub mod error;
pub mod events;
pub mod logging;
pub mod modules;
pub mod poll;
pub mod ui;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types for convenience
pub use api::{GovernorApi, HttpApi, MonitorApi};
pub use app::{App, Command, View};
pub use config::Settings;
pub use data::{PolicyConfig, RollingBuffer, ServiceStatus, StatusView};
pub use error::{ApiError, PolicyError, ValidationError};
pub use modules::{GovernorDetail, GovernorSummary, MonitorModule, PolicyEditor, TelemetryModule};
pub use poll::PollScheduler;
pub use ui::Theme;
