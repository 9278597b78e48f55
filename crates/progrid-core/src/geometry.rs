#![forbid(unsafe_code)]

//! Geometric primitives.
//!
//! All positions are container-relative pixels along the scroll axis. Offsets
//! are signed because a buffered window may start above the container.

/// A closed interval `[start, end]` on the scroll axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Span {
    /// First pixel covered (inclusive).
    pub start: i64,
    /// Last pixel covered (inclusive).
    pub end: i64,
}

impl Span {
    /// Create a new span.
    #[inline]
    pub const fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Create a span from an origin and a length.
    #[inline]
    pub const fn from_len(start: i64, len: u32) -> Self {
        Self::new(start, start + len as i64)
    }

    /// Length of the span.
    #[inline]
    pub const fn len(&self) -> i64 {
        self.end - self.start
    }

    /// Check if the span is degenerate (end before start).
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.end < self.start
    }

    /// Check if a point lies inside the span (both edges inclusive).
    #[inline]
    pub const fn contains(&self, at: i64) -> bool {
        self.start <= at && at <= self.end
    }

    /// Check if this span shares at least one point with `other`.
    #[inline]
    pub const fn overlaps(&self, other: &Span) -> bool {
        !(self.end < other.start || self.start > other.end)
    }

    /// Check if this span lies completely inside `other`.
    #[inline]
    pub const fn within(&self, other: &Span) -> bool {
        other.start <= self.start && self.end <= other.end
    }

    /// Grow the span by `before` pixels at the start and `after` at the end.
    #[inline]
    pub const fn expand(&self, before: u32, after: u32) -> Span {
        Span::new(self.start - before as i64, self.end + after as i64)
    }
}

/// Measurements of the scroll container reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContainerMetrics {
    /// Distance from the top of the scrollable document to the container.
    pub offset: i64,
    /// Width available to rows (the cross axis).
    pub cross_extent: u32,
}

impl ContainerMetrics {
    /// Create container metrics.
    #[inline]
    pub const fn new(offset: i64, cross_extent: u32) -> Self {
        Self {
            offset,
            cross_extent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_from_len() {
        let s = Span::from_len(100, 50);
        assert_eq!(s, Span::new(100, 150));
        assert_eq!(s.len(), 50);
        assert!(!s.is_empty());
    }

    #[test]
    fn contains_is_inclusive() {
        let s = Span::new(10, 20);
        assert!(s.contains(10));
        assert!(s.contains(20));
        assert!(!s.contains(9));
        assert!(!s.contains(21));
    }

    #[test]
    fn overlap_touching_edges() {
        let a = Span::new(0, 10);
        assert!(a.overlaps(&Span::new(10, 20)));
        assert!(!a.overlaps(&Span::new(11, 20)));
        assert!(a.overlaps(&Span::new(-5, 0)));
        assert!(!a.overlaps(&Span::new(-5, -1)));
    }

    #[test]
    fn expand_goes_negative() {
        let s = Span::new(100, 200).expand(300, 1000);
        assert_eq!(s, Span::new(-200, 1200));
    }

    #[test]
    fn within_requires_both_edges() {
        let outer = Span::new(0, 100);
        assert!(Span::new(0, 100).within(&outer));
        assert!(Span::new(10, 20).within(&outer));
        assert!(!Span::new(-1, 20).within(&outer));
        assert!(!Span::new(90, 101).within(&outer));
    }
}
