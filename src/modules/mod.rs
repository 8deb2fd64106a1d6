//! Telemetry modules: each binds one remote resource family to the widgets
//! that show it.
//!
//! A module owns its state outright. Its poll tasks only perform remote
//! calls and post the results back over a channel; [`TelemetryModule::pump`]
//! applies them on the UI thread in arrival order, which is completion
//! order. Results carrying a stale request context are dropped there.
//!
//! - [`MonitorModule`]: per-interface throughput with a resync on selection change
//! - [`GovernorDetail`]: service status, speed chart, monthly usage and log tail
//! - [`GovernorSummary`]: compact status cards
//! - [`PolicyEditor`]: the governor policy form and URL list

mod governor;
mod monitor;
mod policy;
mod summary;

pub use governor::GovernorDetail;
pub use monitor::{FetchKey, MonitorModule, RECV, SENT};
pub use policy::PolicyEditor;
pub use summary::{GovernorSummary, SummaryCards};

use async_trait::async_trait;

/// Lifecycle shared by every telemetry surface.
#[async_trait]
pub trait TelemetryModule: Send {
    fn name(&self) -> &'static str;

    /// Initial fetches, buffer seeding and scheduler start.
    async fn init(&mut self);

    /// Apply every result posted since the last call. Returns how many were
    /// applied (stale ones excluded).
    fn pump(&mut self) -> usize;

    fn resize(&mut self, width: u16, height: u16);

    /// Stop polling and drop buffered state.
    fn destroy(&mut self);
}
