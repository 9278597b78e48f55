#![forbid(unsafe_code)]

//! The progressive grid engine.
//!
//! [`ProgressiveGrid`] owns the row sequence and wires the layout engine,
//! viewport tracker, visibility scheduler, row lifecycles, and the settle
//! queue to the host collaborators.
//!
//! # Event flow
//!
//! ```text
//!  host scroll ──▶ handle_scroll ──▶ viewport updated, frame requested (once)
//!  host resize ──▶ handle_resize ──▶ FrameCoalescer (one frame per burst)
//!  host frame  ──▶ on_frame_at   ──▶ [resize: layout] ─▶ visibility pass
//!  host timer  ──▶ on_timer_at   ──▶ settle steps ─▶ titles / fetches
//!  transport   ──▶ complete_fetch ─▶ attach or on_error(Retry)
//! ```
//!
//! Every entry point takes `&mut self`, so mutations are serialized against
//! layout and visibility by construction. Methods suffixed `_at` take the
//! current instant explicitly for deterministic tests; the unsuffixed forms
//! use [`Instant::now`].

use std::cell::Cell;
use std::ops::Range;
use std::rc::Rc;
use std::time::{Duration, Instant};

use progrid_core::{
    ClickEvent, ContainerMetrics, FetchError, GridConfig, GridError, HostSurface, MediaRecord,
    RenderBackend, Row, RowId, RowIdAllocator, RowTicket, Transport, parse_records,
};
use progrid_layout::LayoutEngine;

use crate::frame_coalescer::{CoalescerStats, FrameCoalescer, FrameRequest, ListenerId, SourceChange};
use crate::handlers::{GridHandlers, Retry};
use crate::lifecycle::{Completion, LoadOutcome, Materialize, Phase, RowLifecycle};
use crate::mutation::{self, MutationReport};
use crate::sequence::RowSequence;
use crate::stats::GridStats;
use crate::viewport::{BufferConfig, ViewportTracker};
use crate::visibility::{self, VisibilityScheduler};

/// Measurements delivered to resize listeners inside a coalesced frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeNotice {
    /// Container measurements at frame time.
    pub container: ContainerMetrics,
    /// Visible window length at frame time.
    pub viewport_extent: u32,
}

/// Virtualized, progressively loaded list of grouped media rows.
pub struct ProgressiveGrid<H, B, T> {
    config: GridConfig,
    handlers: GridHandlers,
    host: H,
    backend: B,
    transport: T,
    ids: RowIdAllocator,
    sequence: RowSequence,
    layout: LayoutEngine,
    viewport: ViewportTracker,
    visibility: VisibilityScheduler,
    settle: crate::deferred::SettleQueue,
    resize: FrameCoalescer<ResizeNotice>,
    relayout_requested: Rc<Cell<bool>>,
    engine_listener: Option<ListenerId>,
    container: ContainerMetrics,
    total_extent: i64,
    active_group: Option<String>,
    enabled: bool,
    scroll_frame_pending: bool,
    frame_requested: bool,
    stats: GridStats,
}

impl<H, B, T> std::fmt::Debug for ProgressiveGrid<H, B, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressiveGrid")
            .field("rows", &self.sequence.len())
            .field("enabled", &self.enabled)
            .field("total_extent", &self.total_extent)
            .field("active_group", &self.active_group)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl<H, B, T> ProgressiveGrid<H, B, T>
where
    H: HostSurface,
    B: RenderBackend,
    T: Transport,
{
    /// Build a grid from ordered records. Nothing is laid out or observed
    /// until [`enable`](Self::enable).
    pub fn new(
        records: &[MediaRecord],
        config: GridConfig,
        handlers: GridHandlers,
        host: H,
        backend: B,
        transport: T,
    ) -> Result<Self, GridError> {
        config.validate()?;
        let mut ids = RowIdAllocator::new();
        let sequence = RowSequence::from_rows(parse_records(records, &mut ids));
        let mut resize = FrameCoalescer::new();
        resize.disable();
        tracing::debug!(
            target: "progrid.grid",
            rows = sequence.len(),
            container_id = %config.container_id,
            "grid created"
        );
        Ok(Self {
            layout: LayoutEngine::new(&config),
            viewport: ViewportTracker::new(BufferConfig::from_config(&config)),
            config,
            handlers,
            host,
            backend,
            transport,
            ids,
            sequence,
            visibility: VisibilityScheduler::new(),
            settle: crate::deferred::SettleQueue::new(),
            resize,
            relayout_requested: Rc::new(Cell::new(false)),
            engine_listener: None,
            container: ContainerMetrics::default(),
            total_extent: 0,
            active_group: None,
            enabled: false,
            scroll_frame_pending: false,
            frame_requested: false,
            stats: GridStats::default(),
        })
    }

    // --- lifecycle -------------------------------------------------------

    /// Bind to the container, run the first layout, and start observing.
    pub fn enable(&mut self) -> Result<(), GridError> {
        self.enable_at(Instant::now())
    }

    /// [`enable`](Self::enable) at an explicit instant.
    pub fn enable_at(&mut self, now: Instant) -> Result<(), GridError> {
        if self.enabled {
            return Ok(());
        }
        let Some(container) = self.host.locate_container(&self.config.container_id) else {
            tracing::error!(
                target: "progrid.grid",
                container_id = %self.config.container_id,
                "could not find container"
            );
            return Err(GridError::ContainerNotFound {
                container_id: self.config.container_id.clone(),
            });
        };
        self.container = container;
        self.enabled = true;
        self.host.set_scroll_observed(true);
        self.viewport.observe_scroll(self.host.scroll_offset());

        if self.engine_listener.is_none() {
            let flag = Rc::clone(&self.relayout_requested);
            let (id, change) = self.resize.add(move |_| flag.set(true));
            self.engine_listener = Some(id);
            self.apply_source_change(change);
        }
        let change = self.resize.re_enable();
        self.apply_source_change(change);

        self.visibility.invalidate();
        self.relayout(now);
        self.refresh_visibility(now);
        tracing::debug!(
            target: "progrid.grid",
            container_id = %self.config.container_id,
            cross_extent = container.cross_extent,
            "grid enabled"
        );
        Ok(())
    }

    /// Stop observing scroll and resize. Surfaces stay as they are.
    pub fn disable(&mut self) {
        if !self.enabled {
            return;
        }
        self.enabled = false;
        self.host.set_scroll_observed(false);
        let change = self.resize.disable();
        self.apply_source_change(change);
        self.scroll_frame_pending = false;
        self.relayout_requested.set(false);
        tracing::debug!(target: "progrid.grid", "grid disabled");
    }

    // --- host notifications ----------------------------------------------

    /// The host reported a scroll.
    pub fn handle_scroll(&mut self) {
        if !self.enabled {
            return;
        }
        let offset = self.host.scroll_offset();
        let direction = self.viewport.observe_scroll(offset);
        tracing::trace!(
            target: "progrid.visibility",
            offset,
            direction = direction.as_str(),
            "scroll observed"
        );
        if self.scroll_frame_pending {
            self.stats.frames_coalesced += 1;
            return;
        }
        self.scroll_frame_pending = true;
        self.request_frame();
    }

    /// The host reported a resize.
    pub fn handle_resize(&mut self) {
        match self.resize.notify() {
            FrameRequest::Schedule => self.request_frame(),
            FrameRequest::Coalesced => self.stats.frames_coalesced += 1,
            FrameRequest::Detached => {}
        }
    }

    /// The host's animation frame fired.
    pub fn on_frame(&mut self) {
        self.on_frame_at(Instant::now());
    }

    /// [`on_frame`](Self::on_frame) at an explicit instant.
    pub fn on_frame_at(&mut self, now: Instant) {
        self.frame_requested = false;
        if !self.enabled {
            return;
        }
        let mut refreshed = false;
        if self.resize.is_pending() {
            let notice = ResizeNotice {
                container: self.host.container_metrics(),
                viewport_extent: self.host.viewport_extent(),
            };
            let listeners = self.resize.run_frame(&notice);
            tracing::trace!(target: "progrid.grid", listeners, "resize frame");
            if self.relayout_requested.replace(false) {
                self.container = notice.container;
                self.relayout(now);
                self.refresh_visibility(now);
                refreshed = true;
            }
        }
        if std::mem::take(&mut self.scroll_frame_pending) && !refreshed {
            self.refresh_visibility(now);
        }
    }

    /// Run every settle step due at `now`. Returns the number processed.
    pub fn on_timer(&mut self) -> usize {
        self.on_timer_at(Instant::now())
    }

    /// [`on_timer`](Self::on_timer) at an explicit instant.
    pub fn on_timer_at(&mut self, now: Instant) -> usize {
        let mut processed = 0;
        while let Some(ticket) = self.settle.pop_due(now) {
            self.materialize(ticket);
            processed += 1;
        }
        processed
    }

    /// When the host should call [`on_timer_at`](Self::on_timer_at) next.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.settle.next_deadline()
    }

    /// Feed back the result of a transport fetch.
    ///
    /// Returns `true` if content was attached. Completions for rows that
    /// were hidden, removed, or reloaded since the fetch started are dropped.
    pub fn complete_fetch(&mut self, ticket: RowTicket, result: Result<Vec<u8>, FetchError>) -> bool {
        let Some(slot) = self.sequence.slot_mut(ticket.row) else {
            self.stats.stale_discarded += 1;
            tracing::trace!(target: "progrid.lifecycle", row = %ticket.row, "completion for removed row discarded");
            return false;
        };
        match slot.lifecycle.complete(ticket, result, &mut self.backend) {
            Completion::Attached => {
                tracing::trace!(target: "progrid.lifecycle", row = %ticket.row, "media attached");
                true
            }
            Completion::Discarded => {
                self.stats.stale_discarded += 1;
                tracing::trace!(
                    target: "progrid.lifecycle",
                    row = %ticket.row,
                    generation = ticket.generation,
                    "stale completion discarded"
                );
                false
            }
            Completion::Failed(err) => {
                self.stats.fetches_failed += 1;
                tracing::warn!(
                    target: "progrid.lifecycle",
                    row = %ticket.row,
                    error = %err,
                    "media fetch failed"
                );
                self.handlers.error(&err, Retry::new(ticket));
                false
            }
        }
    }

    /// Re-issue a failed fetch. Returns `false` if the row moved on.
    pub fn retry(&mut self, retry: Retry) -> bool {
        let ticket = retry.ticket();
        let Some(slot) = self.sequence.slot_mut(ticket.row) else {
            return false;
        };
        match slot.lifecycle.retry(ticket) {
            Some(request) => {
                self.stats.fetches_started += 1;
                tracing::debug!(target: "progrid.lifecycle", row = %ticket.row, url = %request.url, "retrying fetch");
                self.transport.fetch(request);
                true
            }
            None => {
                tracing::trace!(target: "progrid.lifecycle", row = %ticket.row, "retry refused");
                false
            }
        }
    }

    /// Deliver a click on `row`. Only loaded media rows react.
    pub fn click(&mut self, row: RowId, event: ClickEvent) -> bool {
        let Some(slot) = self.sequence.position(row).and_then(|i| self.sequence.get(i)) else {
            return false;
        };
        let Some(media) = slot.lifecycle.resolved() else {
            return false;
        };
        self.handlers.click(&event, media, slot.row.group_key())
    }

    /// Register an extra listener on the coalesced resize frame.
    pub fn add_resize_listener<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&ResizeNotice) + 'static,
    {
        let (id, change) = self.resize.add(listener);
        self.apply_source_change(change);
        id
    }

    /// Remove a listener added with [`add_resize_listener`](Self::add_resize_listener).
    pub fn remove_resize_listener(&mut self, id: ListenerId) {
        if Some(id) == self.engine_listener {
            return;
        }
        let change = self.resize.remove(id);
        self.apply_source_change(change);
    }

    // --- mutation --------------------------------------------------------

    /// Insert or replace one group.
    pub fn upsert_group(&mut self, records: &[MediaRecord]) -> Result<MutationReport, GridError> {
        self.upsert_group_at(records, Instant::now())
    }

    /// [`upsert_group`](Self::upsert_group) at an explicit instant.
    pub fn upsert_group_at(
        &mut self,
        records: &[MediaRecord],
        now: Instant,
    ) -> Result<MutationReport, GridError> {
        let rows = mutation::build_group(records, &mut self.ids)?;
        let mut report = mutation::upsert(&mut self.sequence, rows, &mut self.backend);
        self.after_mutation(&mut report, now);
        Ok(report)
    }

    /// Remove one group. Unknown keys are a no-op without relayout.
    pub fn delete_group(&mut self, group_key: &str) -> MutationReport {
        self.delete_group_at(group_key, Instant::now())
    }

    /// [`delete_group`](Self::delete_group) at an explicit instant.
    pub fn delete_group_at(&mut self, group_key: &str, now: Instant) -> MutationReport {
        let mut report = mutation::delete(&mut self.sequence, group_key, &mut self.backend);
        if report.changed() {
            self.after_mutation(&mut report, now);
        }
        report
    }

    // --- accessors -------------------------------------------------------

    #[must_use]
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = &Row> + '_ {
        self.sequence.rows()
    }

    #[must_use]
    pub fn row(&self, id: RowId) -> Option<&Row> {
        self.sequence
            .position(id)
            .and_then(|i| self.sequence.get(i))
            .map(|slot| &slot.row)
    }

    #[must_use]
    pub fn lifecycle(&self, id: RowId) -> Option<&RowLifecycle> {
        self.sequence
            .position(id)
            .and_then(|i| self.sequence.get(i))
            .map(|slot| &slot.lifecycle)
    }

    #[must_use]
    pub fn phase(&self, id: RowId) -> Option<Phase> {
        self.lifecycle(id).map(RowLifecycle::phase)
    }

    /// Total extent of the last layout pass.
    #[must_use]
    pub fn total_extent(&self) -> i64 {
        self.total_extent
    }

    #[must_use]
    pub fn active_group(&self) -> Option<&str> {
        self.active_group.as_deref()
    }

    #[must_use]
    pub fn viewport(&self) -> &ViewportTracker {
        &self.viewport
    }

    #[must_use]
    pub fn layout_engine(&self) -> &LayoutEngine {
        &self.layout
    }

    /// Index range of rows the last visibility pass kept on surface.
    #[must_use]
    pub fn live_range(&self) -> Range<usize> {
        self.visibility.live()
    }

    /// Settle steps not yet run.
    #[must_use]
    pub fn pending_settles(&self) -> usize {
        self.settle.len()
    }

    #[must_use]
    pub fn stats(&self) -> GridStats {
        self.stats
    }

    #[must_use]
    pub fn resize_stats(&self) -> CoalescerStats {
        self.resize.stats()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    // --- internals -------------------------------------------------------

    fn request_frame(&mut self) {
        if self.frame_requested {
            return;
        }
        self.frame_requested = true;
        self.stats.frames_requested += 1;
        self.host.request_frame();
    }

    fn apply_source_change(&mut self, change: SourceChange) {
        match change {
            SourceChange::Attach => self.host.set_resize_observed(true),
            SourceChange::Detach => self.host.set_resize_observed(false),
            SourceChange::Unchanged => {}
        }
    }

    fn after_mutation(&mut self, report: &mut MutationReport, now: Instant) {
        self.stats.hides += report.hidden as u64;
        self.visibility.invalidate();
        report.relayout = self.enabled;
        if self.enabled {
            self.relayout(now);
            self.refresh_visibility(now);
        } else if self
            .active_group
            .as_deref()
            .is_some_and(|key| !self.sequence.contains_group(key))
        {
            // Positions are stale until the next enable; only drop the
            // reported group.
            tracing::debug!(target: "progrid.visibility", "active group cleared");
            self.active_group = None;
            self.handlers.active_group(None);
        }
    }

    fn relayout(&mut self, now: Instant) {
        let _span = tracing::debug_span!("progrid.layout.pass", rows = self.sequence.len()).entered();
        let pass = self
            .layout
            .compute(self.sequence.rows_mut(), self.container.cross_extent, now);
        self.total_extent = pass.total_extent;
        self.stats.layout_passes += 1;
        tracing::debug!(
            target: "progrid.layout",
            total_extent = pass.total_extent,
            rows = pass.rows,
            cross_extent = self.container.cross_extent,
            animated = pass.transition.is_animated(),
            opened_window = pass.opened_window,
            "layout pass"
        );
    }

    fn refresh_visibility(&mut self, now: Instant) {
        let _span = tracing::debug_span!("progrid.visibility.pass").entered();
        self.host.set_content_extent(self.total_extent);
        let metrics = self.host.container_metrics();
        self.viewport.set_frame(metrics.offset, self.host.viewport_extent());
        let window = self.viewport.buffer_window();

        let seq = &self.sequence;
        let plan = self.visibility.plan(seq.len(), |i| seq.span_at(i), window);

        let mut hidden = 0u64;
        for i in plan.hides() {
            if let Some(slot) = self.sequence.get_mut(i)
                && slot.lifecycle.hide(&mut self.backend)
            {
                tracing::trace!(target: "progrid.lifecycle", row = %slot.row.id(), "row hidden");
                hidden += 1;
            }
        }

        let settle = Duration::from_millis(self.config.settle_delay_ms);
        let (mut created, mut restyled) = (0u64, 0u64);
        for i in plan.load.clone() {
            let Some(slot) = self.sequence.get_mut(i) else {
                continue;
            };
            match slot.lifecycle.load(&slot.row, &self.config, &mut self.backend) {
                LoadOutcome::Created(ticket) => {
                    tracing::trace!(
                        target: "progrid.lifecycle",
                        row = %ticket.row,
                        generation = ticket.generation,
                        "row loading"
                    );
                    self.settle.schedule(now + settle, ticket);
                    created += 1;
                }
                LoadOutcome::Restyled => restyled += 1,
                LoadOutcome::Unchanged => {}
            }
        }

        self.stats.loads += created;
        self.stats.hides += hidden;
        self.stats.visibility_passes += 1;
        tracing::debug!(
            target: "progrid.visibility",
            window_start = window.start,
            window_end = window.end,
            direction = self.viewport.direction().as_str(),
            live = ?plan.load,
            created,
            restyled,
            hidden,
            full_sweep = plan.full_sweep,
            "visibility pass"
        );
        self.update_active_group();
    }

    fn update_active_group(&mut self) {
        let anchor = self.viewport.anchor();
        let seq = &self.sequence;
        let span_at = |i: usize| seq.span_at(i);
        let index = match visibility::active_index(seq.len(), span_at, anchor) {
            Some(index) => Some(index),
            // In a gap the previous group stays, unless it has been removed.
            None => match self.active_group.as_deref() {
                Some(key) if !seq.contains_group(key) => {
                    visibility::preceding_index(seq.len(), span_at, anchor)
                }
                _ => return,
            },
        };
        let key = index.and_then(|i| seq.get(i)).map(|slot| slot.row.group_key());
        if self.active_group.as_deref() == key {
            return;
        }
        tracing::debug!(target: "progrid.visibility", group = ?key, "active group changed");
        self.active_group = key.map(str::to_string);
        self.handlers.active_group(key);
    }

    fn materialize(&mut self, ticket: RowTicket) {
        let Some(slot) = self.sequence.slot_mut(ticket.row) else {
            self.stats.stale_discarded += 1;
            tracing::trace!(target: "progrid.lifecycle", row = %ticket.row, "settle step for removed row discarded");
            return;
        };
        let handlers = &self.handlers;
        match slot
            .lifecycle
            .materialize(ticket, &slot.row, &mut self.backend, |r| handlers.resolve_url(r))
        {
            Materialize::Stale => {
                self.stats.stale_discarded += 1;
                tracing::trace!(
                    target: "progrid.lifecycle",
                    row = %ticket.row,
                    generation = ticket.generation,
                    "stale settle step discarded"
                );
            }
            Materialize::Titled => {
                tracing::trace!(target: "progrid.lifecycle", row = %ticket.row, "title attached");
            }
            Materialize::Fetch(request) => {
                self.stats.fetches_started += 1;
                tracing::trace!(target: "progrid.lifecycle", row = %ticket.row, url = %request.url, "fetch started");
                self.transport.fetch(request);
            }
        }
    }
}
