#![forbid(unsafe_code)]

//! Deadline queue for settle-delayed materialization.
//!
//! Each freshly created surface waits `settle_delay_ms` before its content is
//! materialized. Instead of owning timers, the engine parks a [`RowTicket`]
//! here and the host drives it with `on_timer(now)` / `next_deadline()`.
//! Entries due at the same instant pop in scheduling order.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Instant;

use progrid_core::RowTicket;

#[derive(Debug, Clone, Copy)]
struct Entry {
    due: Instant,
    seq: u64,
    ticket: RowTicket,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due
            .cmp(&other.due)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Min-heap of tickets keyed by due instant.
#[derive(Debug, Default)]
pub struct SettleQueue {
    heap: BinaryHeap<Reverse<Entry>>,
    seq: u64,
}

impl SettleQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Park `ticket` until `due`.
    pub fn schedule(&mut self, due: Instant, ticket: RowTicket) {
        let seq = self.seq;
        self.seq += 1;
        self.heap.push(Reverse(Entry { due, seq, ticket }));
    }

    /// Pop the earliest ticket whose deadline is `<= now`.
    pub fn pop_due(&mut self, now: Instant) -> Option<RowTicket> {
        match self.heap.peek() {
            Some(Reverse(entry)) if entry.due <= now => self.heap.pop().map(|Reverse(e)| e.ticket),
            _ => None,
        }
    }

    /// Earliest pending deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.heap.peek().map(|Reverse(entry)| entry.due)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use progrid_core::RowIdAllocator;
    use std::time::Duration;

    fn tickets(n: usize) -> Vec<RowTicket> {
        let mut ids = RowIdAllocator::new();
        (0..n)
            .map(|_| RowTicket {
                row: ids.allocate(),
                generation: 1,
            })
            .collect()
    }

    #[test]
    fn nothing_due_before_deadline() {
        let t0 = Instant::now();
        let a = tickets(1)[0];
        let mut q = SettleQueue::new();
        q.schedule(t0 + Duration::from_millis(100), a);
        assert_eq!(q.pop_due(t0 + Duration::from_millis(99)), None);
        assert_eq!(q.next_deadline(), Some(t0 + Duration::from_millis(100)));
        assert_eq!(q.pop_due(t0 + Duration::from_millis(100)), Some(a));
        assert!(q.is_empty());
        assert_eq!(q.next_deadline(), None);
    }

    #[test]
    fn pops_in_deadline_then_fifo_order() {
        let t0 = Instant::now();
        let ts = tickets(3);
        let mut q = SettleQueue::new();
        q.schedule(t0 + Duration::from_millis(50), ts[0]);
        q.schedule(t0 + Duration::from_millis(10), ts[1]);
        q.schedule(t0 + Duration::from_millis(50), ts[2]);
        let late = t0 + Duration::from_secs(1);
        let order: Vec<_> = std::iter::from_fn(|| q.pop_due(late)).collect();
        assert_eq!(order, vec![ts[1], ts[0], ts[2]]);
    }
}
