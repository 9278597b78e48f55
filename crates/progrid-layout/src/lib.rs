#![forbid(unsafe_code)]

//! Vertical layout for progressive grids.
//!
//! The layout is a single forward pass over the row sequence. Each row is
//! placed at a running `y` cursor and the cursor advances by the row's size
//! class plus the configured spacing:
//!
//! ```text
//!  y=0    +--------------------+  header (group_title_height)
//!         |                    |
//!  y=108  +--------------------+  media (row_height)
//!  y=166  +--------------------+  media
//!  ...
//! ```
//!
//! The total extent is the final cursor minus one spacing unit, so there is
//! no gap below the last row.
//!
//! # Transition window
//!
//! Every pass opens a transition window of `transition_speed_ms * 1.5` unless
//! one is already open. Rows are tagged [`Transition::Animated`] only while a
//! window is open *before* the pass starts, which keeps the first layout from
//! animating every row into place while still smoothing the bursts of
//! re-layouts a resize storm produces.
//!
//! # Invariants
//!
//! - For adjacent rows: `y[i] + height[i] + spacing == y[i + 1]`.
//! - `total_extent == sum(heights) + spacing * (n - 1)`, and 0 for no rows.
//! - Identical input (rows, cross extent, window state) gives identical output.

use std::time::{Duration, Instant};

pub use progrid_core::geometry::{ContainerMetrics, Span};
use progrid_core::{GridConfig, Row, RowKind, RowLayout, Transition};

/// Size classes and spacing used by a layout pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutParams {
    /// Header row height.
    pub header_height: u32,
    /// Media row height.
    pub row_height: u32,
    /// Gap between rows.
    pub spacing: u32,
    /// Animation length applied to animated rows.
    pub transition_speed_ms: u64,
    /// How long a pass keeps the transition window open.
    pub window_ms: u64,
}

impl LayoutParams {
    /// Extract layout parameters from a grid configuration.
    #[must_use]
    pub fn from_config(config: &GridConfig) -> Self {
        Self {
            header_height: config.group_title_height,
            row_height: config.row_height,
            spacing: config.space_between_rows,
            transition_speed_ms: config.transition_speed_ms,
            window_ms: config.transition_window_ms(),
        }
    }

    /// Fixed height for a row kind.
    #[inline]
    #[must_use]
    pub const fn size_of(&self, kind: RowKind) -> u32 {
        match kind {
            RowKind::Header => self.header_height,
            RowKind::Media => self.row_height,
        }
    }
}

/// Debounce window during which re-layouts animate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransitionWindow {
    open_until: Option<Instant>,
}

impl TransitionWindow {
    /// A closed window.
    #[must_use]
    pub const fn new() -> Self {
        Self { open_until: None }
    }

    /// Check if the window is open at `now`.
    #[inline]
    #[must_use]
    pub fn is_open(&self, now: Instant) -> bool {
        self.open_until.is_some_and(|until| now < until)
    }

    /// Open the window for `duration` unless it is already open.
    ///
    /// Returns `true` if this call opened it.
    pub fn open(&mut self, now: Instant, duration: Duration) -> bool {
        if self.is_open(now) {
            return false;
        }
        self.open_until = Some(now + duration);
        true
    }

    /// When the currently open window closes, if any.
    #[must_use]
    pub fn closes_at(&self) -> Option<Instant> {
        self.open_until
    }
}

/// Summary of one layout pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutPass {
    /// Extent of the whole sequence (no trailing gap).
    pub total_extent: i64,
    /// Rows placed.
    pub rows: usize,
    /// Descriptor applied to every row of this pass.
    pub transition: Transition,
    /// Whether this pass opened a new transition window.
    pub opened_window: bool,
}

/// Assigns absolute positions to rows.
#[derive(Debug, Clone)]
pub struct LayoutEngine {
    params: LayoutParams,
    window: TransitionWindow,
    passes: u64,
}

impl LayoutEngine {
    /// Create an engine for the given configuration.
    #[must_use]
    pub fn new(config: &GridConfig) -> Self {
        Self::with_params(LayoutParams::from_config(config))
    }

    /// Create an engine from explicit parameters.
    #[must_use]
    pub fn with_params(params: LayoutParams) -> Self {
        Self {
            params,
            window: TransitionWindow::new(),
            passes: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn params(&self) -> &LayoutParams {
        &self.params
    }

    #[inline]
    #[must_use]
    pub fn transition_window(&self) -> &TransitionWindow {
        &self.window
    }

    /// Number of passes run so far.
    #[inline]
    #[must_use]
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Descriptor a pass starting at `now` would use.
    #[must_use]
    pub fn transition_at(&self, now: Instant) -> Transition {
        if self.window.is_open(now) {
            Transition::Animated {
                duration_ms: self.params.transition_speed_ms,
            }
        } else {
            Transition::None
        }
    }

    /// Lay out `rows` across `cross_extent` and return the pass summary.
    pub fn compute<'a, I>(&mut self, rows: I, cross_extent: u32, now: Instant) -> LayoutPass
    where
        I: IntoIterator<Item = &'a mut Row>,
    {
        let transition = self.transition_at(now);
        let opened_window = self
            .window
            .open(now, Duration::from_millis(self.params.window_ms));
        let (total_extent, count) = place(rows, &self.params, cross_extent, transition);
        self.passes += 1;
        LayoutPass {
            total_extent,
            rows: count,
            transition,
            opened_window,
        }
    }
}

/// Place rows without touching any transition state.
///
/// Returns `(total_extent, rows_placed)`.
pub fn place<'a, I>(
    rows: I,
    params: &LayoutParams,
    cross_extent: u32,
    transition: Transition,
) -> (i64, usize)
where
    I: IntoIterator<Item = &'a mut Row>,
{
    let mut cursor: i64 = 0;
    let mut count = 0usize;
    for row in rows {
        let height = params.size_of(row.kind());
        row.set_layout(RowLayout {
            x: 0,
            y: cursor,
            width: cross_extent,
            height,
            transition,
        });
        cursor += i64::from(height) + i64::from(params.spacing);
        count += 1;
    }
    (trim_trailing_gap(cursor, count, params.spacing), count)
}

/// Total extent of `rows` without assigning positions.
#[must_use]
pub fn measure_extent<'a, I>(rows: I, params: &LayoutParams) -> i64
where
    I: IntoIterator<Item = &'a Row>,
{
    let mut cursor: i64 = 0;
    let mut count = 0usize;
    for row in rows {
        cursor += i64::from(params.size_of(row.kind())) + i64::from(params.spacing);
        count += 1;
    }
    trim_trailing_gap(cursor, count, params.spacing)
}

#[inline]
fn trim_trailing_gap(cursor: i64, count: usize, spacing: u32) -> i64 {
    if count == 0 {
        0
    } else {
        cursor - i64::from(spacing)
    }
}
