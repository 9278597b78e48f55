#![forbid(unsafe_code)]

//! Contracts for the engine's external collaborators.
//!
//! The engine never touches a real rendering environment. Everything it needs
//! from the outside world goes through three traits:
//!
//! - [`HostSurface`] - scroll position, viewport size, container lookup, and
//!   animation-frame requests (the "window" of a browser host).
//! - [`RenderBackend`] - creation and teardown of row surfaces and their
//!   content nodes.
//! - [`Transport`] - asynchronous media fetches. Completions are fed back to
//!   the engine by the host, in any order.

use std::sync::Arc;

use bitflags::bitflags;

use crate::config::GridConfig;
use crate::geometry::ContainerMetrics;
use crate::row::{RowId, RowKind, RowLayout};

/// Handle to a surface created by a [`RenderBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

/// Handle to a content node attached to a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentId(pub u64);

bitflags! {
    /// Style state of a surface.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SurfaceFlags: u8 {
        /// Surface hosts a group header.
        const TITLE = 0b0000_0001;
        /// Content is attached and interactive (the "loaded" class).
        const READY = 0b0000_0010;
    }
}

impl SurfaceFlags {
    /// Space-separated class list for these flags.
    #[must_use]
    pub fn class_names(self, config: &GridConfig) -> String {
        let mut classes = config.figure_class();
        if self.contains(Self::TITLE) {
            classes.push(' ');
            classes.push_str(&config.title_class());
        }
        if self.contains(Self::READY) {
            classes.push(' ');
            classes.push_str(&config.loaded_class());
        }
        classes
    }
}

/// Everything a backend needs to create a row surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceSpec {
    /// Row the surface belongs to.
    pub row: RowId,
    /// Kind of that row.
    pub kind: RowKind,
    /// Initial style flags.
    pub flags: SurfaceFlags,
    /// Class list derived from `flags`.
    pub class_name: String,
}

/// Media content after a successful fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMedia {
    /// URL the bytes were fetched from.
    pub url: String,
    /// Fetched payload.
    pub bytes: Arc<[u8]>,
}

/// A content node to attach to a surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// Synthesized header title.
    Title(String),
    /// Fetched media item.
    Media(ResolvedMedia),
}

/// Identifies one materialization attempt of one row.
///
/// The generation changes every time the row is loaded or hidden, so a
/// completion carrying an old ticket is recognisably stale even if the row
/// is back on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowTicket {
    /// Row the continuation belongs to.
    pub row: RowId,
    /// Lifecycle generation at the time the work was scheduled.
    pub generation: u64,
}

/// A fetch the transport should start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Ticket to hand back with the completion.
    pub ticket: RowTicket,
    /// Resolved URL.
    pub url: String,
}

/// Pointer interaction on a row surface, as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClickEvent {
    /// Cross-axis position relative to the surface.
    pub x: i64,
    /// Scroll-axis position relative to the surface.
    pub y: i64,
}

/// The environment hosting the scroll container.
pub trait HostSurface {
    /// Bind to the container with the given identity.
    ///
    /// Returns `None` when no such container exists.
    fn locate_container(&mut self, container_id: &str) -> Option<ContainerMetrics>;

    /// Current container measurements.
    fn container_metrics(&self) -> ContainerMetrics;

    /// Current document scroll offset.
    fn scroll_offset(&self) -> i64;

    /// Length of the visible window along the scroll axis.
    fn viewport_extent(&self) -> u32;

    /// Resize the container to hold `extent` pixels of rows.
    fn set_content_extent(&mut self, extent: i64);

    /// Ask for one animation-frame callback.
    fn request_frame(&mut self);

    /// Start or stop delivering scroll notifications.
    fn set_scroll_observed(&mut self, observed: bool);

    /// Start or stop delivering resize notifications.
    fn set_resize_observed(&mut self, observed: bool);
}

/// Creates, styles, and removes row surfaces.
pub trait RenderBackend {
    /// Create a surface and append it to the container.
    fn create_surface(&mut self, spec: &SurfaceSpec) -> SurfaceId;

    /// Position a surface.
    fn apply_layout(&mut self, surface: SurfaceId, layout: &RowLayout);

    /// Attach a content node to a surface.
    fn attach_content(&mut self, surface: SurfaceId, content: Content) -> ContentId;

    /// Detach and discard a content node.
    fn detach_content(&mut self, surface: SurfaceId, content: ContentId);

    /// Replace the surface's style flags.
    fn set_flags(&mut self, surface: SurfaceId, flags: SurfaceFlags);

    /// Remove a surface from the container.
    fn remove_surface(&mut self, surface: SurfaceId);
}

/// Fetches media bytes.
pub trait Transport {
    /// Start a fetch. The host reports the result later.
    fn fetch(&mut self, request: FetchRequest);
}
