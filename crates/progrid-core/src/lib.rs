#![forbid(unsafe_code)]

//! Core: row model, configuration, geometry, errors, and host contracts.
//!
//! Nothing in this crate performs I/O or keeps time. It defines the data the
//! layout and runtime crates operate on and the traits through which the
//! runtime talks to a rendering environment.

pub mod config;
pub mod error;
pub mod geometry;
pub mod host;
pub mod row;

pub use config::GridConfig;
pub use error::{FetchError, GridError};
pub use geometry::{ContainerMetrics, Span};
pub use host::{
    ClickEvent, Content, ContentId, FetchRequest, HostSurface, RenderBackend, ResolvedMedia,
    RowTicket, SurfaceFlags, SurfaceId, SurfaceSpec, Transport,
};
#[cfg(feature = "serde")]
pub use row::records_from_json;
pub use row::{
    MediaRecord, Row, RowBody, RowId, RowIdAllocator, RowKind, RowLayout, Transition,
    parse_records,
};
