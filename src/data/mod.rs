//! Pure data layer: everything here is testable without a terminal or a
//! server.
//!
//! ## Submodules
//!
//! - [`format`]: Human units for byte counts, rates and uptimes
//! - [`buffer`]: Fixed-capacity rolling time series ([`RollingBuffer`])
//! - [`status`]: Remote status mapping and widget reconciliation ([`StatusView`])
//! - [`policy`]: Governor policy model and validation ([`PolicyConfig`])
//!
//! ## Data Flow
//!
//! ```text
//! StatusPayload (JSON)
//!        │
//!        ▼
//! StatusView::from_payload()  ──▶ toggle + badge + cards, swapped whole
//!        │
//!        └──▶ RollingBuffer::push() (speed chart)
//! ```

pub mod buffer;
pub mod format;
pub mod policy;
pub mod status;

pub use buffer::{RollingBuffer, Sample, SeriesSnapshot};
pub use policy::{PolicyConfig, PolicyField};
pub use status::{ServiceStatus, StatusView, VisualClass};
