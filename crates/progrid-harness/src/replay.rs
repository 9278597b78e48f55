#![forbid(unsafe_code)]

//! Deterministic driver and JSON replay scripts.
//!
//! [`Driver`] owns a grid wired to the headless fakes and a manual clock.
//! Every step advances time explicitly, delivers host notifications, flushes
//! the requested frame, and runs due settle steps, so a script always
//! produces the same surfaces and the same [`ReplaySummary`].
//!
//! # Script schema
//!
//! ```json
//! {
//!   "config": {"row_height": 50},
//!   "cross_extent": 800,
//!   "viewport_extent": 600,
//!   "steps": [
//!     {"op": "scroll", "offset": 1000},
//!     {"op": "advance", "ms": 100},
//!     {"op": "resolve", "fail_every": 0},
//!     {"op": "resize", "cross_extent": 640, "viewport_extent": 600},
//!     {"op": "upsert", "records": [{"group_key": "s9", "sort_key": 90, "media_ref": "x"}]},
//!     {"op": "delete", "group_key": "s1"}
//!   ]
//! }
//! ```

use std::time::{Duration, Instant};

use progrid_core::{ContainerMetrics, FetchError, GridConfig, GridError, MediaRecord};
use progrid_layout::{LayoutParams, measure_extent};
use progrid_runtime::{GridHandlers, GridStats, MutationReport, ProgressiveGrid};
use serde::{Deserialize, Serialize};

use crate::fakes::{HeadlessHost, RecordingBackend, ScriptedTransport};

/// Grid type driven by the harness.
pub type HeadlessGrid = ProgressiveGrid<HeadlessHost, RecordingBackend, ScriptedTransport>;

/// One scripted action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Scroll to an absolute offset and flush the frame.
    Scroll { offset: i64 },
    /// Resize the container and flush the frame.
    Resize { cross_extent: u32, viewport_extent: u32 },
    /// Advance the clock and run due settle steps.
    Advance { ms: u64 },
    /// Complete every pending fetch; every `fail_every`-th one fails (0 = none).
    Resolve {
        #[serde(default)]
        fail_every: usize,
    },
    /// Upsert one group.
    Upsert { records: Vec<MediaRecord> },
    /// Delete one group.
    Delete { group_key: String },
}

/// A replay scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayScript {
    pub config: GridConfig,
    pub container_offset: i64,
    pub cross_extent: u32,
    pub viewport_extent: u32,
    pub steps: Vec<Step>,
}

impl Default for ReplayScript {
    fn default() -> Self {
        Self {
            config: GridConfig::default(),
            container_offset: 0,
            cross_extent: 800,
            viewport_extent: 600,
            steps: Vec::new(),
        }
    }
}

impl ReplayScript {
    /// Parse a script from JSON.
    pub fn from_json(json: &str) -> Result<Self, GridError> {
        let script: Self =
            serde_json::from_str(json).map_err(|e| GridError::InvalidInput(e.to_string()))?;
        script.config.validate()?;
        Ok(script)
    }
}

/// End state of a replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    pub rows: usize,
    pub total_extent: i64,
    pub measured_extent: i64,
    pub live_surfaces: usize,
    pub loaded_rows: usize,
    pub active_group: Option<String>,
    pub fetches_issued: u64,
    pub layout_passes: u64,
    pub visibility_passes: u64,
    pub frames_requested: u64,
    pub frames_coalesced: u64,
    pub stale_discarded: u64,
    pub violations: Vec<String>,
}

/// A grid on headless fakes with a manual clock.
#[derive(Debug)]
pub struct Driver {
    grid: HeadlessGrid,
    now: Instant,
}

impl Driver {
    /// Build a grid for `records`. The grid is not enabled yet.
    pub fn new(
        records: &[MediaRecord],
        config: GridConfig,
        handlers: GridHandlers,
        metrics: ContainerMetrics,
        viewport_extent: u32,
    ) -> Result<Self, GridError> {
        let host = HeadlessHost::new(config.container_id.clone(), metrics, viewport_extent);
        let grid = ProgressiveGrid::new(
            records,
            config,
            handlers,
            host,
            RecordingBackend::new(),
            ScriptedTransport::new(),
        )?;
        Ok(Self {
            grid,
            now: Instant::now(),
        })
    }

    /// Build a driver from a script's geometry and configuration.
    pub fn for_script(records: &[MediaRecord], script: &ReplayScript) -> Result<Self, GridError> {
        Self::new(
            records,
            script.config.clone(),
            GridHandlers::default(),
            ContainerMetrics::new(script.container_offset, script.cross_extent),
            script.viewport_extent,
        )
    }

    #[must_use]
    pub fn grid(&self) -> &HeadlessGrid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut HeadlessGrid {
        &mut self.grid
    }

    #[must_use]
    pub fn now(&self) -> Instant {
        self.now
    }

    pub fn enable(&mut self) -> Result<(), GridError> {
        self.grid.enable_at(self.now)
    }

    /// Run the host frame if one was requested. Returns whether it ran.
    pub fn flush_frame(&mut self) -> bool {
        if !self.grid.host_mut().take_frame_request() {
            return false;
        }
        self.grid.on_frame_at(self.now);
        true
    }

    /// Scroll to `offset` and flush the frame.
    pub fn scroll_to(&mut self, offset: i64) {
        self.grid.host_mut().scroll_to(offset);
        self.grid.handle_scroll();
        self.flush_frame();
    }

    /// Deliver a burst of scroll notifications inside one frame.
    pub fn scroll_burst(&mut self, offsets: &[i64]) {
        for &offset in offsets {
            self.grid.host_mut().scroll_to(offset);
            self.grid.handle_scroll();
        }
        self.flush_frame();
    }

    /// Resize the container, deliver `notifications` resize events, and flush.
    pub fn resize(&mut self, cross_extent: u32, viewport_extent: u32, notifications: usize) {
        self.grid.host_mut().resize(cross_extent, viewport_extent);
        for _ in 0..notifications {
            self.grid.handle_resize();
        }
        self.flush_frame();
    }

    /// Advance the clock and run every settle step that became due.
    pub fn advance(&mut self, ms: u64) -> usize {
        self.now += Duration::from_millis(ms);
        self.grid.on_timer_at(self.now)
    }

    /// Advance to the next settle deadline, if any.
    pub fn advance_to_deadline(&mut self) -> usize {
        match self.grid.next_deadline() {
            Some(deadline) if deadline > self.now => {
                self.now = deadline;
                self.grid.on_timer_at(self.now)
            }
            Some(_) => self.grid.on_timer_at(self.now),
            None => 0,
        }
    }

    /// Complete pending fetches. Every `fail_every`-th fails (0 = none).
    /// Returns how many attached content.
    pub fn resolve_pending(&mut self, fail_every: usize) -> usize {
        let requests = self.grid.transport_mut().drain();
        let mut attached = 0;
        for (i, request) in requests.into_iter().enumerate() {
            let result = if fail_every > 0 && (i + 1) % fail_every == 0 {
                Err(FetchError::status(503, format!("unavailable: {}", request.url)))
            } else {
                Ok(request.url.clone().into_bytes())
            };
            if self.grid.complete_fetch(request.ticket, result) {
                attached += 1;
            }
        }
        attached
    }

    pub fn upsert(&mut self, records: &[MediaRecord]) -> Result<MutationReport, GridError> {
        self.grid.upsert_group_at(records, self.now)
    }

    pub fn delete(&mut self, group_key: &str) -> MutationReport {
        self.grid.delete_group_at(group_key, self.now)
    }

    /// Apply one scripted step.
    pub fn apply(&mut self, step: &Step) -> Result<(), GridError> {
        tracing::debug!(target: "progrid.grid", step = ?step, "replay step");
        match step {
            Step::Scroll { offset } => self.scroll_to(*offset),
            Step::Resize {
                cross_extent,
                viewport_extent,
            } => self.resize(*cross_extent, *viewport_extent, 1),
            Step::Advance { ms } => {
                self.advance(*ms);
            }
            Step::Resolve { fail_every } => {
                self.resolve_pending(*fail_every);
            }
            Step::Upsert { records } => {
                self.upsert(records)?;
            }
            Step::Delete { group_key } => {
                self.delete(group_key);
            }
        }
        Ok(())
    }

    /// Snapshot the grid state.
    #[must_use]
    pub fn summary(&self) -> ReplaySummary {
        let grid = &self.grid;
        let stats: GridStats = grid.stats();
        let params = LayoutParams::from_config(grid.config());
        let loaded_rows = grid
            .rows()
            .filter(|row| grid.phase(row.id()) == Some(progrid_runtime::Phase::Loaded))
            .count();
        ReplaySummary {
            rows: grid.len(),
            total_extent: grid.total_extent(),
            measured_extent: measure_extent(grid.rows(), &params),
            live_surfaces: grid.backend().surfaces().len(),
            loaded_rows,
            active_group: grid.active_group().map(str::to_string),
            fetches_issued: grid.transport().issued(),
            layout_passes: stats.layout_passes,
            visibility_passes: stats.visibility_passes,
            frames_requested: stats.frames_requested,
            frames_coalesced: stats.frames_coalesced,
            stale_discarded: stats.stale_discarded,
            violations: grid.backend().violations().to_vec(),
        }
    }
}

/// Enable a grid for `records` and run `script` against it.
pub fn run_script(records: &[MediaRecord], script: &ReplayScript) -> Result<ReplaySummary, GridError> {
    let mut driver = Driver::for_script(records, script)?;
    driver.enable()?;
    for step in &script.steps {
        driver.apply(step)?;
    }
    Ok(driver.summary())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_parses_with_defaults() {
        let script = ReplayScript::from_json(
            r#"{"steps":[{"op":"scroll","offset":500},{"op":"resolve"},{"op":"delete","group_key":"a"}]}"#,
        )
        .unwrap();
        assert_eq!(script.cross_extent, 800);
        assert_eq!(script.steps[0], Step::Scroll { offset: 500 });
        assert_eq!(script.steps[1], Step::Resolve { fail_every: 0 });
        assert!(ReplayScript::from_json(r#"{"config":{"row_height":0}}"#).is_err());
    }

    #[test]
    fn empty_script_on_empty_records() {
        let summary = run_script(&[], &ReplayScript::default()).unwrap();
        assert_eq!(summary.rows, 0);
        assert_eq!(summary.total_extent, 0);
        assert_eq!(summary.live_surfaces, 0);
        assert!(summary.violations.is_empty());
    }
}
