#![forbid(unsafe_code)]

//! Headless harness for progressive grids.
//!
//! - [`fakes`] provides a host, a rendering backend, and a transport that
//!   record everything the engine asks of them.
//! - [`replay`] drives a grid over those fakes with a manual clock, either
//!   step by step from tests or from a JSON script (`progrid-replay`).
//!
//! # Quick Start
//!
//! ```
//! use progrid_core::{ContainerMetrics, GridConfig, MediaRecord};
//! use progrid_harness::replay::Driver;
//! use progrid_runtime::GridHandlers;
//!
//! let records = vec![MediaRecord::new("s1", 1, "a.mp3")];
//! let mut driver = Driver::new(
//!     &records,
//!     GridConfig::default(),
//!     GridHandlers::default(),
//!     ContainerMetrics::new(0, 800),
//!     600,
//! )
//! .unwrap();
//! driver.enable().unwrap();
//! driver.advance(100);
//! assert_eq!(driver.resolve_pending(0), 1);
//! assert_eq!(driver.summary().loaded_rows, 2);
//! ```

pub mod fakes;
pub mod replay;

pub use fakes::{BackendOp, HeadlessHost, RecordingBackend, ScriptedTransport, SurfaceRecord};
pub use replay::{Driver, HeadlessGrid, ReplayScript, ReplaySummary, Step, run_script};
