#![forbid(unsafe_code)]

//! Runtime for progressive grids.
//!
//! The layout crate decides *where* rows go; this crate decides *which* rows
//! exist on the rendering surface and *when* their content arrives:
//!
//! - [`frame_coalescer`] collapses resize bursts into one frame.
//! - [`viewport`] tracks scroll direction and the asymmetric buffer window.
//! - [`visibility`] turns the window into load/hide decisions.
//! - [`lifecycle`] drives each row through Unloaded, Loading, and Loaded.
//! - [`deferred`] holds settle-delayed materialization tickets.
//! - [`mutation`] inserts, replaces, and deletes whole groups.
//! - [`grid`] ties it all to the host through [`ProgressiveGrid`].

pub mod deferred;
pub mod frame_coalescer;
pub mod grid;
pub mod handlers;
pub mod lifecycle;
pub mod mutation;
pub mod sequence;
pub mod stats;
pub mod viewport;
pub mod visibility;

pub use deferred::SettleQueue;
pub use frame_coalescer::{
    CoalescerStats, FrameCoalescer, FrameRequest, ListenerId, SourceChange,
};
pub use grid::{ProgressiveGrid, ResizeNotice};
pub use handlers::{GridHandlers, Retry};
pub use lifecycle::{Completion, LoadOutcome, Materialize, Phase, RowLifecycle};
pub use mutation::{MutationReport, Placement};
pub use sequence::{RowSequence, Slot};
pub use stats::GridStats;
pub use viewport::{BufferConfig, ScrollDirection, ViewportTracker};
pub use visibility::{Visibility, VisibilityPlan, VisibilityScheduler};
