#![forbid(unsafe_code)]

//! Frame-coalesced fan-out for bursty notifications.
//!
//! A resize source can fire dozens of notifications between two animation
//! frames. [`FrameCoalescer`] keeps a single subscription on that source and
//! collapses every burst into at most one scheduled frame, inside which all
//! registered listeners run once.
//!
//! # Usage
//!
//! ```
//! use progrid_runtime::frame_coalescer::{FrameCoalescer, FrameRequest, SourceChange};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let hits = Rc::new(Cell::new(0));
//! let mut coalescer: FrameCoalescer<u32> = FrameCoalescer::new();
//! let counter = hits.clone();
//! let (_id, change) = coalescer.add(move |_width| counter.set(counter.get() + 1));
//! assert_eq!(change, SourceChange::Attach);
//!
//! assert_eq!(coalescer.notify(), FrameRequest::Schedule);
//! assert_eq!(coalescer.notify(), FrameRequest::Coalesced);
//! assert_eq!(coalescer.run_frame(&1280), 1);
//! assert_eq!(hits.get(), 1);
//! ```
//!
//! # Invariants
//!
//! - At most one frame is pending at any time.
//! - The source is attached iff observation is enabled and at least one
//!   listener exists.
//! - A frame runs every listener exactly once, in registration order.

use std::fmt;

/// Identifies a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// What the caller must do with the underlying source subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceChange {
    /// Start listening on the source.
    Attach,
    /// Stop listening on the source.
    Detach,
    /// Nothing to do.
    Unchanged,
}

/// Outcome of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameRequest {
    /// Request an animation frame now.
    Schedule,
    /// A frame is already pending; nothing to do.
    Coalesced,
    /// Observation is disabled; the notification was dropped.
    Detached,
}

/// Counters for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoalescerStats {
    /// Notifications received while attached.
    pub notifications: u64,
    /// Frames requested.
    pub frames_scheduled: u64,
    /// Notifications folded into an already pending frame.
    pub coalesced: u64,
    /// Frames run.
    pub frames_run: u64,
}

type Callback<E> = Box<dyn FnMut(&E)>;

/// Collapses notification bursts into one fan-out per frame.
pub struct FrameCoalescer<E> {
    listeners: Vec<(ListenerId, Callback<E>)>,
    next_id: u64,
    attached: bool,
    enabled: bool,
    pending: bool,
    stats: CoalescerStats,
}

impl<E> fmt::Debug for FrameCoalescer<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameCoalescer")
            .field("listeners", &self.listeners.len())
            .field("attached", &self.attached)
            .field("enabled", &self.enabled)
            .field("pending", &self.pending)
            .field("stats", &self.stats)
            .finish()
    }
}

impl<E> Default for FrameCoalescer<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> FrameCoalescer<E> {
    /// Create an empty coalescer. Observation starts enabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
            next_id: 0,
            attached: false,
            enabled: true,
            pending: false,
            stats: CoalescerStats::default(),
        }
    }

    /// Register a listener to run on every coalesced frame.
    ///
    /// The first listener attaches the source.
    pub fn add<F>(&mut self, callback: F) -> (ListenerId, SourceChange)
    where
        F: FnMut(&E) + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(callback)));
        (id, self.sync_source())
    }

    /// Unregister a listener. Removing the last one detaches the source.
    pub fn remove(&mut self, id: ListenerId) -> SourceChange {
        self.listeners.retain(|(lid, _)| *lid != id);
        if self.listeners.is_empty() {
            self.pending = false;
        }
        self.sync_source()
    }

    /// Stop observing the source, keeping listeners registered.
    pub fn disable(&mut self) -> SourceChange {
        self.enabled = false;
        self.pending = false;
        self.sync_source()
    }

    /// Resume observing after [`disable`](Self::disable).
    pub fn re_enable(&mut self) -> SourceChange {
        self.enabled = true;
        self.sync_source()
    }

    /// Record a notification from the source.
    pub fn notify(&mut self) -> FrameRequest {
        if !self.attached {
            return FrameRequest::Detached;
        }
        self.stats.notifications += 1;
        if self.pending {
            self.stats.coalesced += 1;
            return FrameRequest::Coalesced;
        }
        self.pending = true;
        self.stats.frames_scheduled += 1;
        FrameRequest::Schedule
    }

    /// Run the pending frame, fanning `event` out to every listener.
    ///
    /// Returns the number of listeners invoked (0 if no frame was pending).
    pub fn run_frame(&mut self, event: &E) -> usize {
        if !self.pending {
            return 0;
        }
        self.pending = false;
        self.stats.frames_run += 1;
        for (_, callback) in &mut self.listeners {
            callback(event);
        }
        self.listeners.len()
    }

    #[inline]
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    #[inline]
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn stats(&self) -> CoalescerStats {
        self.stats
    }

    fn sync_source(&mut self) -> SourceChange {
        let want = self.enabled && !self.listeners.is_empty();
        match (self.attached, want) {
            (false, true) => {
                self.attached = true;
                SourceChange::Attach
            }
            (true, false) => {
                self.attached = false;
                SourceChange::Detach
            }
            _ => SourceChange::Unchanged,
        }
    }
}
