#![forbid(unsafe_code)]

//! Progrid public facade crate.
//!
//! A virtualized, progressively loaded list of grouped media rows. This
//! crate re-exports the stable surface of the internal crates and offers a
//! prelude for embedding a grid in a host environment.
//!
//! A host implements three traits and forwards its events:
//!
//! - [`HostSurface`] locates the container, reports scroll and size, and
//!   schedules frames.
//! - [`RenderBackend`] creates, positions, and removes row surfaces.
//! - [`Transport`] fetches media bytes and hands them back through
//!   [`ProgressiveGrid::complete_fetch`].
//!
//! ```
//! use progrid::prelude::*;
//!
//! let config = GridConfig::default().with_class_prefix("gallery");
//! assert_eq!(config.figure_class(), "gallery-figure");
//! assert!(config.validate().is_ok());
//! ```

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use progrid_core::{
    ClickEvent, ContainerMetrics, Content, ContentId, FetchError, FetchRequest, GridConfig,
    GridError, HostSurface, MediaRecord, RenderBackend, ResolvedMedia, Row, RowId, RowKind,
    RowLayout, RowTicket, Span, SurfaceFlags, SurfaceId, SurfaceSpec, Transition, Transport,
};
#[cfg(feature = "serde")]
pub use progrid_core::records_from_json;

// --- Layout re-exports -----------------------------------------------------

pub use progrid_layout::{LayoutEngine, LayoutParams, measure_extent};

// --- Runtime re-exports ----------------------------------------------------

pub use progrid_runtime::{
    GridHandlers, GridStats, ListenerId, MutationReport, Phase, Placement, ProgressiveGrid,
    ResizeNotice, Retry, ScrollDirection,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for progrid hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Binding, configuration, or mutation failure.
    Grid(GridError),
    /// A media fetch failed.
    Fetch(FetchError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Grid(err) => write!(f, "{err}"),
            Self::Fetch(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Grid(err) => Some(err),
            Self::Fetch(err) => Some(err),
        }
    }
}

impl From<GridError> for Error {
    fn from(err: GridError) -> Self {
        Self::Grid(err)
    }
}

impl From<FetchError> for Error {
    fn from(err: FetchError) -> Self {
        Self::Fetch(err)
    }
}

/// Standard result type for progrid APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        ClickEvent, Content, ContainerMetrics, Error, FetchError, FetchRequest, GridConfig,
        GridHandlers, HostSurface, MediaRecord, ProgressiveGrid, RenderBackend, Result, Retry,
        RowTicket, SurfaceFlags, SurfaceSpec, Transport,
    };

    pub use crate::{core, layout, runtime};
}

pub use progrid_core as core;
pub use progrid_layout as layout;
pub use progrid_runtime as runtime;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_convert_and_display() {
        let err: Error = GridError::EmptyGroup.into();
        assert_eq!(err.to_string(), "group upsert contained no records");
        let err: Error = FetchError::status(404, "gone").into();
        assert!(matches!(err, Error::Fetch(FetchError { status: Some(404), .. })));
        assert!(std::error::Error::source(&err).is_some());
    }

    fn bind(config: GridConfig) -> Result<GridConfig> {
        config.validate()?;
        Ok(config)
    }

    #[test]
    fn question_mark_lifts_grid_errors() {
        assert!(bind(GridConfig::default()).is_ok());
        let err = bind(GridConfig::default().with_heights(0, 50)).unwrap_err();
        assert!(matches!(err, Error::Grid(GridError::InvalidConfig(_))));
    }
}
