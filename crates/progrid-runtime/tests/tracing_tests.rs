#![forbid(unsafe_code)]

//! Tracing integration tests.
//!
//! Verifies that layout and visibility passes open their spans and that
//! configuration errors, fetch failures, and stale continuations are
//! reported on the documented targets and levels.
//!
//!   cargo test -p progrid-runtime --test tracing_tests

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use progrid_core::{
    Content, ContentId, ContainerMetrics, FetchError, FetchRequest, GridConfig, HostSurface,
    MediaRecord, RenderBackend, RowLayout, SurfaceFlags, SurfaceId, SurfaceSpec, Transport,
};
use progrid_runtime::{GridHandlers, ProgressiveGrid};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

// ============================================================================
// Test Infrastructure
// ============================================================================

#[derive(Debug, Clone)]
struct CapturedEvent {
    target: String,
    level: tracing::Level,
    message: String,
}

#[derive(Default, Clone)]
struct CaptureHandle {
    spans: Arc<Mutex<Vec<String>>>,
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl CaptureHandle {
    fn spans(&self) -> Vec<String> {
        self.spans.lock().unwrap().clone()
    }

    fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().unwrap().clone()
    }

    fn has_event(&self, target: &str, level: tracing::Level, message: &str) -> bool {
        self.events()
            .iter()
            .any(|e| e.target == target && e.level == level && e.message == message)
    }
}

struct Capture(CaptureHandle);

struct MessageVisitor(String);

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.0 = value.to_string();
        }
    }
}

impl<S> tracing_subscriber::Layer<S> for Capture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::span::Id,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        self.0
            .spans
            .lock()
            .unwrap()
            .push(attrs.metadata().name().to_string());
    }

    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);
        self.0.events.lock().unwrap().push(CapturedEvent {
            target: event.metadata().target().to_string(),
            level: *event.metadata().level(),
            message: visitor.0,
        });
    }
}

fn with_capture<F>(f: F) -> CaptureHandle
where
    F: FnOnce(),
{
    let handle = CaptureHandle::default();
    let subscriber = tracing_subscriber::registry().with(Capture(handle.clone()));
    tracing::subscriber::with_default(subscriber, f);
    handle
}

// ============================================================================
// Minimal collaborators
// ============================================================================

struct Host {
    present: bool,
    offset: i64,
}

impl HostSurface for Host {
    fn locate_container(&mut self, _container_id: &str) -> Option<ContainerMetrics> {
        self.present.then(|| ContainerMetrics::new(0, 800))
    }
    fn container_metrics(&self) -> ContainerMetrics {
        ContainerMetrics::new(0, 800)
    }
    fn scroll_offset(&self) -> i64 {
        self.offset
    }
    fn viewport_extent(&self) -> u32 {
        600
    }
    fn set_content_extent(&mut self, _extent: i64) {}
    fn request_frame(&mut self) {}
    fn set_scroll_observed(&mut self, _observed: bool) {}
    fn set_resize_observed(&mut self, _observed: bool) {}
}

#[derive(Default)]
struct Backend {
    next: u64,
}

impl RenderBackend for Backend {
    fn create_surface(&mut self, _spec: &SurfaceSpec) -> SurfaceId {
        self.next += 1;
        SurfaceId(self.next)
    }
    fn apply_layout(&mut self, _surface: SurfaceId, _layout: &RowLayout) {}
    fn attach_content(&mut self, _surface: SurfaceId, _content: Content) -> ContentId {
        self.next += 1;
        ContentId(self.next)
    }
    fn detach_content(&mut self, _surface: SurfaceId, _content: ContentId) {}
    fn set_flags(&mut self, _surface: SurfaceId, _flags: SurfaceFlags) {}
    fn remove_surface(&mut self, _surface: SurfaceId) {}
}

#[derive(Default)]
struct Outbox(Vec<FetchRequest>);

impl Transport for Outbox {
    fn fetch(&mut self, request: FetchRequest) {
        self.0.push(request);
    }
}

fn records() -> Vec<MediaRecord> {
    (0..20)
        .map(|i| MediaRecord::new(format!("s{}", i / 5), i, format!("{i}.mp3")))
        .collect()
}

fn grid(present: bool) -> ProgressiveGrid<Host, Backend, Outbox> {
    ProgressiveGrid::new(
        &records(),
        GridConfig::default(),
        GridHandlers::default(),
        Host { present, offset: 0 },
        Backend::default(),
        Outbox::default(),
    )
    .unwrap()
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn enable_opens_layout_and_visibility_spans() {
    let handle = with_capture(|| {
        let mut grid = grid(true);
        grid.enable_at(Instant::now()).unwrap();
    });
    let spans = handle.spans();
    assert!(spans.iter().any(|s| s == "progrid.layout.pass"), "spans: {spans:?}");
    assert!(spans.iter().any(|s| s == "progrid.visibility.pass"), "spans: {spans:?}");
    assert!(handle.has_event("progrid.layout", tracing::Level::DEBUG, "layout pass"));
    assert!(handle.has_event("progrid.visibility", tracing::Level::DEBUG, "visibility pass"));
}

#[test]
fn missing_container_logs_error() {
    let handle = with_capture(|| {
        let mut grid = grid(false);
        assert!(grid.enable_at(Instant::now()).is_err());
    });
    assert!(handle.has_event("progrid.grid", tracing::Level::ERROR, "could not find container"));
}

#[test]
fn fetch_failure_logs_warning() {
    let handle = with_capture(|| {
        let t0 = Instant::now();
        let mut grid = grid(true);
        grid.enable_at(t0).unwrap();
        grid.on_timer_at(t0 + Duration::from_millis(100));
        let request = grid.transport().0[0].clone();
        grid.complete_fetch(request.ticket, Err(FetchError::status(500, "boom")));
    });
    assert!(handle.has_event("progrid.lifecycle", tracing::Level::WARN, "media fetch failed"));
}

#[test]
fn stale_completion_traced() {
    let handle = with_capture(|| {
        let t0 = Instant::now();
        let mut grid = grid(true);
        grid.enable_at(t0).unwrap();
        grid.on_timer_at(t0 + Duration::from_millis(100));
        let request = grid.transport().0[0].clone();
        grid.delete_group_at("s0", t0);
        assert!(!grid.complete_fetch(request.ticket, Ok(vec![1])));
    });
    assert!(handle.events().iter().any(|e| e.target == "progrid.lifecycle"
        && e.level == tracing::Level::TRACE
        && e.message.contains("discarded")));
}
