#![forbid(unsafe_code)]

//! Headless collaborators.
//!
//! [`HeadlessHost`], [`RecordingBackend`], and [`ScriptedTransport`] stand in
//! for a real rendering environment. They never fail on misuse; they record
//! it, so tests can assert on the full history afterwards.

use std::collections::{BTreeMap, VecDeque};

use progrid_core::{
    Content, ContentId, ContainerMetrics, FetchRequest, HostSurface, RenderBackend, RowId,
    RowKind, RowLayout, SurfaceFlags, SurfaceId, SurfaceSpec, Transport,
};

// ============================================================================
// Host
// ============================================================================

/// A scroll container with a manually driven scroll position.
#[derive(Debug, Clone)]
pub struct HeadlessHost {
    container_id: String,
    present: bool,
    metrics: ContainerMetrics,
    scroll_offset: i64,
    viewport_extent: u32,
    content_extent: i64,
    frame_pending: bool,
    frames_requested: u64,
    scroll_observed: bool,
    resize_observed: bool,
}

impl HeadlessHost {
    /// A host whose container `container_id` exists.
    #[must_use]
    pub fn new(container_id: impl Into<String>, metrics: ContainerMetrics, viewport_extent: u32) -> Self {
        Self {
            container_id: container_id.into(),
            present: true,
            metrics,
            scroll_offset: 0,
            viewport_extent,
            content_extent: 0,
            frame_pending: false,
            frames_requested: 0,
            scroll_observed: false,
            resize_observed: false,
        }
    }

    /// A host with no container at all.
    #[must_use]
    pub fn without_container() -> Self {
        Self {
            present: false,
            ..Self::new("", ContainerMetrics::default(), 0)
        }
    }

    /// Move the scroll position. The caller notifies the grid.
    pub fn scroll_to(&mut self, offset: i64) {
        self.scroll_offset = offset;
    }

    /// Change container width and viewport length. The caller notifies the grid.
    pub fn resize(&mut self, cross_extent: u32, viewport_extent: u32) {
        self.metrics.cross_extent = cross_extent;
        self.viewport_extent = viewport_extent;
    }

    /// Consume an outstanding frame request.
    pub fn take_frame_request(&mut self) -> bool {
        std::mem::take(&mut self.frame_pending)
    }

    #[must_use]
    pub fn content_extent(&self) -> i64 {
        self.content_extent
    }

    #[must_use]
    pub fn frames_requested(&self) -> u64 {
        self.frames_requested
    }

    #[must_use]
    pub fn scroll_observed(&self) -> bool {
        self.scroll_observed
    }

    #[must_use]
    pub fn resize_observed(&self) -> bool {
        self.resize_observed
    }
}

impl HostSurface for HeadlessHost {
    fn locate_container(&mut self, container_id: &str) -> Option<ContainerMetrics> {
        (self.present && self.container_id == container_id).then_some(self.metrics)
    }

    fn container_metrics(&self) -> ContainerMetrics {
        self.metrics
    }

    fn scroll_offset(&self) -> i64 {
        self.scroll_offset
    }

    fn viewport_extent(&self) -> u32 {
        self.viewport_extent
    }

    fn set_content_extent(&mut self, extent: i64) {
        self.content_extent = extent;
    }

    fn request_frame(&mut self) {
        self.frame_pending = true;
        self.frames_requested += 1;
    }

    fn set_scroll_observed(&mut self, observed: bool) {
        self.scroll_observed = observed;
    }

    fn set_resize_observed(&mut self, observed: bool) {
        self.resize_observed = observed;
    }
}

// ============================================================================
// Backend
// ============================================================================

/// State of one live surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceRecord {
    pub row: RowId,
    pub kind: RowKind,
    pub class_name: String,
    pub flags: SurfaceFlags,
    pub layout: Option<RowLayout>,
    pub content: Option<(ContentId, Content)>,
    pub layouts_applied: u32,
}

/// One backend call, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendOp {
    Create { surface: SurfaceId, row: RowId },
    Layout { surface: SurfaceId, y: i64 },
    Attach { surface: SurfaceId, content: ContentId },
    Detach { surface: SurfaceId, content: ContentId },
    Flags { surface: SurfaceId, flags: SurfaceFlags },
    Remove { surface: SurfaceId },
}

/// Keeps every live surface and the full call history.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    next: u64,
    surfaces: BTreeMap<SurfaceId, SurfaceRecord>,
    ops: Vec<BackendOp>,
    violations: Vec<String>,
}

impl RecordingBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Live surfaces keyed by id.
    #[must_use]
    pub fn surfaces(&self) -> &BTreeMap<SurfaceId, SurfaceRecord> {
        &self.surfaces
    }

    /// The live surface of `row`, if any.
    #[must_use]
    pub fn surface_for(&self, row: RowId) -> Option<&SurfaceRecord> {
        self.surfaces.values().find(|s| s.row == row)
    }

    /// Number of live surfaces belonging to `row`.
    #[must_use]
    pub fn surfaces_for(&self, row: RowId) -> usize {
        self.surfaces.values().filter(|s| s.row == row).count()
    }

    #[must_use]
    pub fn ops(&self) -> &[BackendOp] {
        &self.ops
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    /// Calls that referenced missing surfaces or content.
    #[must_use]
    pub fn violations(&self) -> &[String] {
        &self.violations
    }

    fn live(&mut self, surface: SurfaceId, op: &str) -> Option<&mut SurfaceRecord> {
        if !self.surfaces.contains_key(&surface) {
            self.violations.push(format!("{op} on missing surface {surface:?}"));
        }
        self.surfaces.get_mut(&surface)
    }
}

impl RenderBackend for RecordingBackend {
    fn create_surface(&mut self, spec: &SurfaceSpec) -> SurfaceId {
        self.next += 1;
        let surface = SurfaceId(self.next);
        self.surfaces.insert(
            surface,
            SurfaceRecord {
                row: spec.row,
                kind: spec.kind,
                class_name: spec.class_name.clone(),
                flags: spec.flags,
                layout: None,
                content: None,
                layouts_applied: 0,
            },
        );
        self.ops.push(BackendOp::Create {
            surface,
            row: spec.row,
        });
        surface
    }

    fn apply_layout(&mut self, surface: SurfaceId, layout: &RowLayout) {
        if let Some(record) = self.live(surface, "apply_layout") {
            record.layout = Some(*layout);
            record.layouts_applied += 1;
        }
        self.ops.push(BackendOp::Layout {
            surface,
            y: layout.y,
        });
    }

    fn attach_content(&mut self, surface: SurfaceId, content: Content) -> ContentId {
        self.next += 1;
        let id = ContentId(self.next);
        match self.surfaces.get_mut(&surface) {
            None => self
                .violations
                .push(format!("attach_content on missing surface {surface:?}")),
            Some(record) if record.content.is_some() => self
                .violations
                .push(format!("second content on {surface:?}")),
            Some(record) => record.content = Some((id, content)),
        }
        self.ops.push(BackendOp::Attach {
            surface,
            content: id,
        });
        id
    }

    fn detach_content(&mut self, surface: SurfaceId, content: ContentId) {
        match self.surfaces.get_mut(&surface) {
            Some(record) if record.content.as_ref().is_some_and(|(id, _)| *id == content) => {
                record.content = None;
            }
            Some(_) => self
                .violations
                .push(format!("detach of unknown content {content:?}")),
            None => self
                .violations
                .push(format!("detach_content on missing surface {surface:?}")),
        }
        self.ops.push(BackendOp::Detach { surface, content });
    }

    fn set_flags(&mut self, surface: SurfaceId, flags: SurfaceFlags) {
        if let Some(record) = self.live(surface, "set_flags") {
            record.flags = flags;
        }
        self.ops.push(BackendOp::Flags { surface, flags });
    }

    fn remove_surface(&mut self, surface: SurfaceId) {
        match self.surfaces.remove(&surface) {
            Some(record) if record.content.is_some() => {
                self.violations
                    .push(format!("{surface:?} removed with content attached"));
            }
            Some(_) => {}
            None => self
                .violations
                .push(format!("remove_surface on missing surface {surface:?}")),
        }
        self.ops.push(BackendOp::Remove { surface });
    }
}

// ============================================================================
// Transport
// ============================================================================

/// Queues fetch requests until the test resolves them.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    pending: VecDeque<FetchRequest>,
    issued: u64,
}

impl ScriptedTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests not yet resolved, oldest first.
    #[must_use]
    pub fn pending(&self) -> &VecDeque<FetchRequest> {
        &self.pending
    }

    /// Remove and return every pending request.
    pub fn drain(&mut self) -> Vec<FetchRequest> {
        self.pending.drain(..).collect()
    }

    /// Total requests ever issued.
    #[must_use]
    pub fn issued(&self) -> u64 {
        self.issued
    }
}

impl Transport for ScriptedTransport {
    fn fetch(&mut self, request: FetchRequest) {
        self.issued += 1;
        self.pending.push_back(request);
    }
}
