#![forbid(unsafe_code)]

//! Viewport tracking and the asymmetric buffer window.
//!
//! The tracker records the two most recent scroll offsets and derives the
//! scroll direction from them. The buffer window it exposes over-provisions
//! rows in the direction of travel (the *primary* buffer) and keeps only a
//! small margin behind it (the *secondary* buffer):
//!
//! ```text
//!            Forward                      Backward
//!   start ─┬─ secondary            start ─┬─ primary
//!          │  [ viewport ]                │  [ viewport ]
//!   end   ─┴─ primary              end   ─┴─ secondary
//! ```
//!
//! All window coordinates are container-relative.

use progrid_core::{GridConfig, Span};

/// Direction of the most recent scroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollDirection {
    /// Offset grew (content moves up, the user reads further down).
    #[default]
    Forward,
    /// Offset shrank or stayed put.
    Backward,
}

impl ScrollDirection {
    /// Stable string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Backward => "backward",
        }
    }
}

/// Leading/trailing buffer sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferConfig {
    /// Buffer ahead of travel.
    pub primary_px: u32,
    /// Buffer behind travel.
    pub secondary_px: u32,
}

impl BufferConfig {
    /// Extract buffer sizes from a grid configuration.
    #[must_use]
    pub fn from_config(config: &GridConfig) -> Self {
        Self {
            primary_px: config.primary_buffer_px,
            secondary_px: config.secondary_buffer_px,
        }
    }

    /// `(before, after)` margins for a direction.
    #[inline]
    #[must_use]
    pub const fn margins(&self, direction: ScrollDirection) -> (u32, u32) {
        match direction {
            ScrollDirection::Forward => (self.secondary_px, self.primary_px),
            ScrollDirection::Backward => (self.primary_px, self.secondary_px),
        }
    }
}

/// Owns scroll offsets, direction, and container placement.
#[derive(Debug, Clone)]
pub struct ViewportTracker {
    current: i64,
    previous: i64,
    observed: bool,
    direction: ScrollDirection,
    container_offset: i64,
    viewport_extent: u32,
    buffers: BufferConfig,
}

impl ViewportTracker {
    /// Create a tracker with no observations yet.
    #[must_use]
    pub fn new(buffers: BufferConfig) -> Self {
        Self {
            current: 0,
            previous: 0,
            observed: false,
            direction: ScrollDirection::Forward,
            container_offset: 0,
            viewport_extent: 0,
            buffers,
        }
    }

    /// Record a scroll notification and return the derived direction.
    ///
    /// On the first observation the previous offset is taken to be the new
    /// one, which yields `Backward` (no forward motion yet).
    pub fn observe_scroll(&mut self, offset: i64) -> ScrollDirection {
        self.previous = if self.observed { self.current } else { offset };
        self.current = offset;
        self.observed = true;
        self.direction = if self.current > self.previous {
            ScrollDirection::Forward
        } else {
            ScrollDirection::Backward
        };
        self.direction
    }

    /// Update container placement and visible window length.
    pub fn set_frame(&mut self, container_offset: i64, viewport_extent: u32) {
        self.container_offset = container_offset;
        self.viewport_extent = viewport_extent;
    }

    #[inline]
    #[must_use]
    pub fn current_offset(&self) -> i64 {
        self.current
    }

    #[inline]
    #[must_use]
    pub fn previous_offset(&self) -> i64 {
        self.previous
    }

    #[inline]
    #[must_use]
    pub fn direction(&self) -> ScrollDirection {
        self.direction
    }

    #[inline]
    #[must_use]
    pub fn has_observed(&self) -> bool {
        self.observed
    }

    #[inline]
    #[must_use]
    pub fn viewport_extent(&self) -> u32 {
        self.viewport_extent
    }

    #[inline]
    #[must_use]
    pub fn buffers(&self) -> BufferConfig {
        self.buffers
    }

    /// Current offset translated into container coordinates.
    #[inline]
    #[must_use]
    pub fn anchor(&self) -> i64 {
        self.current - self.container_offset
    }

    /// The un-buffered visible window in container coordinates.
    #[must_use]
    pub fn visible_window(&self) -> Span {
        Span::from_len(self.anchor(), self.viewport_extent)
    }

    /// The visible window grown by the direction-dependent buffers.
    #[must_use]
    pub fn buffer_window(&self) -> Span {
        let (before, after) = self.buffers.margins(self.direction);
        self.visible_window().expand(before, after)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> ViewportTracker {
        let mut t = ViewportTracker::new(BufferConfig {
            primary_px: 1000,
            secondary_px: 300,
        });
        t.set_frame(0, 800);
        t
    }

    #[test]
    fn first_observation_uses_new_offset_as_previous() {
        let mut t = tracker();
        assert_eq!(t.observe_scroll(500), ScrollDirection::Backward);
        assert_eq!(t.previous_offset(), 500);
        assert_eq!(t.current_offset(), 500);
    }

    #[test]
    fn first_observation_at_zero_is_still_first() {
        let mut t = tracker();
        t.observe_scroll(0);
        assert_eq!(t.previous_offset(), 0);
        assert_eq!(t.observe_scroll(1000), ScrollDirection::Forward);
        assert_eq!(t.previous_offset(), 0);
    }

    #[test]
    fn forward_window_leads_with_primary() {
        let mut t = tracker();
        t.observe_scroll(0);
        t.observe_scroll(1000);
        assert_eq!(t.direction(), ScrollDirection::Forward);
        assert_eq!(t.buffer_window(), Span::new(1000 - 300, 1000 + 800 + 1000));
    }

    #[test]
    fn backward_window_leads_with_primary_above() {
        let mut t = tracker();
        t.observe_scroll(2000);
        t.observe_scroll(1500);
        assert_eq!(t.direction(), ScrollDirection::Backward);
        assert_eq!(t.buffer_window(), Span::new(1500 - 1000, 1500 + 800 + 300));
    }

    #[test]
    fn unchanged_offset_counts_as_backward() {
        let mut t = tracker();
        t.observe_scroll(10);
        t.observe_scroll(20);
        assert_eq!(t.observe_scroll(20), ScrollDirection::Backward);
    }

    #[test]
    fn container_offset_shifts_window() {
        let mut t = tracker();
        t.set_frame(200, 600);
        t.observe_scroll(1000);
        assert_eq!(t.anchor(), 800);
        assert_eq!(t.visible_window(), Span::new(800, 1400));
    }
}
