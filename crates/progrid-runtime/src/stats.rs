#![forbid(unsafe_code)]

//! Engine counters.

/// Counters accumulated over the lifetime of a grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GridStats {
    /// Layout passes run.
    pub layout_passes: u64,
    /// Visibility passes run.
    pub visibility_passes: u64,
    /// Animation frames requested from the host.
    pub frames_requested: u64,
    /// Scroll or resize notifications folded into a pending frame.
    pub frames_coalesced: u64,
    /// Surfaces created.
    pub loads: u64,
    /// Surfaces removed.
    pub hides: u64,
    /// Fetches handed to the transport (retries included).
    pub fetches_started: u64,
    /// Fetches that reported an error.
    pub fetches_failed: u64,
    /// Settle steps and fetch completions dropped as stale.
    pub stale_discarded: u64,
}

impl GridStats {
    /// Surfaces currently expected to exist.
    #[must_use]
    pub fn live_surfaces(&self) -> u64 {
        self.loads.saturating_sub(self.hides)
    }
}
