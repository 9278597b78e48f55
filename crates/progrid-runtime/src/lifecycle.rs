#![forbid(unsafe_code)]

//! Per-row surface lifecycle.
//!
//! ```text
//!             load()                settle + attach
//!  Unloaded ─────────▶ Loading ──────────────────────▶ Loaded
//!     ▲                   │                               │
//!     └───── hide() ──────┴────────── hide() ─────────────┘
//! ```
//!
//! `load()` creates the surface and positions it synchronously; content is
//! materialized only after the settle delay, through a [`RowTicket`] that
//! captures the lifecycle generation. Every `load()` that creates a surface
//! and every `hide()` that removes one bumps the generation, so a
//! continuation scheduled before a hide can never touch the row again even
//! if the row has since been reloaded.

use std::sync::Arc;

use progrid_core::{
    Content, ContentId, FetchError, FetchRequest, GridConfig, RenderBackend, ResolvedMedia, Row,
    RowBody, RowId, RowLayout, RowTicket, SurfaceFlags, SurfaceId, SurfaceSpec,
};

/// Lifecycle state of one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// No surface.
    #[default]
    Unloaded,
    /// Surface exists, content pending.
    Loading,
    /// Surface exists with content attached.
    Loaded,
}

impl Phase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unloaded => "unloaded",
            Self::Loading => "loading",
            Self::Loaded => "loaded",
        }
    }
}

/// Result of [`RowLifecycle::load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A surface was created; materialize with this ticket after the settle delay.
    Created(RowTicket),
    /// The surface existed and its layout was re-applied.
    Restyled,
    /// The surface existed with an up-to-date layout.
    Unchanged,
}

/// Result of [`RowLifecycle::materialize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Materialize {
    /// The ticket no longer matches the row; nothing happened.
    Stale,
    /// A header title was attached; the row is Loaded.
    Titled,
    /// The caller must hand this request to the transport.
    Fetch(FetchRequest),
}

/// Result of [`RowLifecycle::complete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Content attached; the row is Loaded.
    Attached,
    /// The fetch failed; the row stays Loading.
    Failed(FetchError),
    /// The completion was stale and has been dropped.
    Discarded,
}

/// Surface and content bookkeeping for one row.
#[derive(Debug, Clone, Default)]
pub struct RowLifecycle {
    phase: Phase,
    surface: Option<SurfaceId>,
    content: Option<ContentId>,
    flags: SurfaceFlags,
    applied: Option<RowLayout>,
    pending_url: Option<String>,
    fetch_in_flight: bool,
    resolved: Option<ResolvedMedia>,
    generation: u64,
}

impl RowLifecycle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[inline]
    #[must_use]
    pub fn surface(&self) -> Option<SurfaceId> {
        self.surface
    }

    #[inline]
    #[must_use]
    pub fn is_on_surface(&self) -> bool {
        self.surface.is_some()
    }

    #[inline]
    #[must_use]
    pub fn has_content(&self) -> bool {
        self.content.is_some()
    }

    #[inline]
    #[must_use]
    pub fn flags(&self) -> SurfaceFlags {
        self.flags
    }

    #[inline]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    #[must_use]
    pub fn fetch_in_flight(&self) -> bool {
        self.fetch_in_flight
    }

    /// Media bound to the row's click interaction, once loaded.
    #[inline]
    #[must_use]
    pub fn resolved(&self) -> Option<&ResolvedMedia> {
        self.resolved.as_ref()
    }

    /// Ticket for the current generation.
    #[inline]
    #[must_use]
    pub fn ticket(&self, row: RowId) -> RowTicket {
        RowTicket {
            row,
            generation: self.generation,
        }
    }

    /// Check if `ticket` still refers to this row's live surface.
    #[inline]
    #[must_use]
    pub fn is_current(&self, ticket: RowTicket) -> bool {
        self.surface.is_some() && ticket.generation == self.generation
    }

    /// Put the row on surface, or refresh its layout if it already is.
    pub fn load<B>(&mut self, row: &Row, config: &GridConfig, backend: &mut B) -> LoadOutcome
    where
        B: RenderBackend + ?Sized,
    {
        let layout = *row.layout();
        if let Some(surface) = self.surface {
            if self.applied == Some(layout) {
                return LoadOutcome::Unchanged;
            }
            backend.apply_layout(surface, &layout);
            self.applied = Some(layout);
            return LoadOutcome::Restyled;
        }

        let flags = if row.is_header() {
            SurfaceFlags::TITLE
        } else {
            SurfaceFlags::empty()
        };
        let spec = SurfaceSpec {
            row: row.id(),
            kind: row.kind(),
            flags,
            class_name: flags.class_names(config),
        };
        let surface = backend.create_surface(&spec);
        backend.apply_layout(surface, &layout);
        self.surface = Some(surface);
        self.flags = flags;
        self.applied = Some(layout);
        self.phase = Phase::Loading;
        self.generation += 1;
        LoadOutcome::Created(self.ticket(row.id()))
    }

    /// Run the settle-delayed step for `ticket`.
    ///
    /// Headers get their title synchronously. Media rows resolve their URL
    /// and return the fetch the caller must start.
    pub fn materialize<B, R>(
        &mut self,
        ticket: RowTicket,
        row: &Row,
        backend: &mut B,
        resolve_url: R,
    ) -> Materialize
    where
        B: RenderBackend + ?Sized,
        R: FnOnce(&str) -> String,
    {
        if !self.is_current(ticket)
            || self.phase != Phase::Loading
            || self.content.is_some()
            || self.fetch_in_flight
        {
            return Materialize::Stale;
        }
        let Some(surface) = self.surface else {
            return Materialize::Stale;
        };
        match row.body() {
            RowBody::Header { title } => {
                let content = backend.attach_content(surface, Content::Title(title.clone()));
                self.content = Some(content);
                self.mark_ready(surface, backend);
                Materialize::Titled
            }
            RowBody::Media { media_ref } => {
                let url = resolve_url(media_ref);
                self.pending_url = Some(url.clone());
                self.fetch_in_flight = true;
                Materialize::Fetch(FetchRequest { ticket, url })
            }
        }
    }

    /// Apply a fetch result.
    pub fn complete<B>(
        &mut self,
        ticket: RowTicket,
        result: Result<Vec<u8>, FetchError>,
        backend: &mut B,
    ) -> Completion
    where
        B: RenderBackend + ?Sized,
    {
        if !self.is_current(ticket) || !self.fetch_in_flight {
            return Completion::Discarded;
        }
        let (Some(surface), Some(url)) = (self.surface, self.pending_url.clone()) else {
            return Completion::Discarded;
        };
        self.fetch_in_flight = false;
        match result {
            Ok(bytes) => {
                let media = ResolvedMedia {
                    url,
                    bytes: Arc::from(bytes),
                };
                let content = backend.attach_content(surface, Content::Media(media.clone()));
                self.content = Some(content);
                self.resolved = Some(media);
                self.pending_url = None;
                self.mark_ready(surface, backend);
                Completion::Attached
            }
            Err(err) => Completion::Failed(err),
        }
    }

    /// Re-issue the failed fetch for `ticket` if the row is still current.
    pub fn retry(&mut self, ticket: RowTicket) -> Option<FetchRequest> {
        if !self.is_current(ticket) || self.phase != Phase::Loading || self.fetch_in_flight {
            return None;
        }
        let url = self.pending_url.clone()?;
        self.fetch_in_flight = true;
        Some(FetchRequest { ticket, url })
    }

    /// Tear the row's surface down. Returns `false` if it was not on surface.
    pub fn hide<B>(&mut self, backend: &mut B) -> bool
    where
        B: RenderBackend + ?Sized,
    {
        let Some(surface) = self.surface.take() else {
            return false;
        };
        if let Some(content) = self.content.take() {
            backend.detach_content(surface, content);
        }
        backend.remove_surface(surface);
        self.phase = Phase::Unloaded;
        self.flags = SurfaceFlags::empty();
        self.applied = None;
        self.pending_url = None;
        self.fetch_in_flight = false;
        self.resolved = None;
        self.generation += 1;
        true
    }

    fn mark_ready<B>(&mut self, surface: SurfaceId, backend: &mut B)
    where
        B: RenderBackend + ?Sized,
    {
        self.flags |= SurfaceFlags::READY;
        backend.set_flags(surface, self.flags);
        self.phase = Phase::Loaded;
    }
}
