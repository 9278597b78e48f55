#![forbid(unsafe_code)]

//! Row model: the ordered, heterogeneous elements of a progressive grid.
//!
//! Input arrives as a flat list of [`MediaRecord`]s already ordered by group
//! and sort key. [`parse_records`] turns it into [`Row`]s, synthesizing one
//! header row at every group boundary:
//!
//! ```
//! use progrid_core::row::{MediaRecord, RowIdAllocator, parse_records};
//!
//! let records = vec![
//!     MediaRecord::new("s1", 1, "a.mp3"),
//!     MediaRecord::new("s1", 2, "b.mp3"),
//!     MediaRecord::new("s2", 3, "c.mp3"),
//! ];
//! let mut ids = RowIdAllocator::new();
//! let rows = parse_records(&records, &mut ids);
//! assert_eq!(rows.len(), 5); // two headers, three media rows
//! assert!(rows[0].is_header());
//! assert!(rows[3].is_header());
//! ```

use std::fmt;

use crate::geometry::Span;

/// Stable handle to a row, unique for the lifetime of an engine.
///
/// Ids are never reused, so a handle that outlives its row (for example in
/// a deferred callback) can be detected instead of aliasing a newer row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId(u64);

impl RowId {
    /// Raw numeric value.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row#{}", self.0)
    }
}

/// Monotonic [`RowId`] source.
#[derive(Debug, Clone, Default)]
pub struct RowIdAllocator {
    next: u64,
}

impl RowIdAllocator {
    /// Create an allocator starting at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out the next id.
    pub fn allocate(&mut self) -> RowId {
        let id = RowId(self.next);
        self.next += 1;
        id
    }
}

/// One input record: a media item belonging to a group.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MediaRecord {
    /// Identity of the logical group (session, album, day, ...).
    pub group_key: String,
    /// Ordering key; groups are ordered by their first record's key.
    pub sort_key: u64,
    /// Media reference handed to `resolve_media_url` (filename, URL fragment).
    pub media_ref: String,
}

impl MediaRecord {
    /// Create a record.
    pub fn new(group_key: impl Into<String>, sort_key: u64, media_ref: impl Into<String>) -> Self {
        Self {
            group_key: group_key.into(),
            sort_key,
            media_ref: media_ref.into(),
        }
    }
}

/// Parse records from a JSON array.
#[cfg(feature = "serde")]
pub fn records_from_json(json: &str) -> Result<Vec<MediaRecord>, crate::error::GridError> {
    serde_json::from_str(json).map_err(|e| crate::error::GridError::InvalidInput(e.to_string()))
}

/// Discriminant of a row, used for size classes and surface classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowKind {
    /// Group title row.
    Header,
    /// Media item row.
    Media,
}

impl RowKind {
    /// Stable string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Media => "media",
        }
    }
}

/// Kind-specific payload of a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowBody {
    /// Group title; content is synthesized, never fetched.
    Header {
        /// Text shown in the title node.
        title: String,
    },
    /// Media item; content is fetched through the transport.
    Media {
        /// Unresolved media reference.
        media_ref: String,
    },
}

/// Transition descriptor attached to a laid-out row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transition {
    /// Jump straight to the new position.
    #[default]
    None,
    /// Animate the transform over `duration_ms`.
    Animated {
        /// Animation length in milliseconds.
        duration_ms: u64,
    },
}

impl Transition {
    /// Check if the descriptor animates.
    #[inline]
    pub const fn is_animated(self) -> bool {
        matches!(self, Self::Animated { .. })
    }
}

/// Absolute placement of a row inside the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowLayout {
    /// Cross-axis offset.
    pub x: i64,
    /// Scroll-axis offset.
    pub y: i64,
    /// Cross-axis extent.
    pub width: u32,
    /// Scroll-axis extent.
    pub height: u32,
    /// How the backend should move the surface to this placement.
    pub transition: Transition,
}

impl RowLayout {
    /// Bounds along the scroll axis.
    #[inline]
    pub const fn span(&self) -> Span {
        Span::from_len(self.y, self.height)
    }
}

/// One positioned element of the sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    id: RowId,
    group_key: String,
    sort_key: u64,
    body: RowBody,
    layout: RowLayout,
}

impl Row {
    /// Create a header row for `group_key`.
    pub fn header(id: RowId, group_key: impl Into<String>, sort_key: u64) -> Self {
        let group_key = group_key.into();
        Self {
            id,
            body: RowBody::Header {
                title: group_key.clone(),
            },
            group_key,
            sort_key,
            layout: RowLayout::default(),
        }
    }

    /// Create a media row from an input record.
    pub fn media(id: RowId, record: &MediaRecord) -> Self {
        Self {
            id,
            group_key: record.group_key.clone(),
            sort_key: record.sort_key,
            body: RowBody::Media {
                media_ref: record.media_ref.clone(),
            },
            layout: RowLayout::default(),
        }
    }

    #[inline]
    pub fn id(&self) -> RowId {
        self.id
    }

    #[inline]
    pub fn group_key(&self) -> &str {
        &self.group_key
    }

    #[inline]
    pub fn sort_key(&self) -> u64 {
        self.sort_key
    }

    #[inline]
    pub fn body(&self) -> &RowBody {
        &self.body
    }

    #[inline]
    pub fn kind(&self) -> RowKind {
        match self.body {
            RowBody::Header { .. } => RowKind::Header,
            RowBody::Media { .. } => RowKind::Media,
        }
    }

    #[inline]
    pub fn is_header(&self) -> bool {
        self.kind() == RowKind::Header
    }

    /// Current placement. Only meaningful after a layout pass.
    #[inline]
    pub fn layout(&self) -> &RowLayout {
        &self.layout
    }

    /// Overwrite the placement. Reserved for the layout engine.
    #[inline]
    pub fn set_layout(&mut self, layout: RowLayout) {
        self.layout = layout;
    }
}

/// Build rows from records, inserting a header before each new group.
///
/// The header takes the sort key of the first record of its group, so a
/// group's leading key is always `rows[header].sort_key()`.
pub fn parse_records(records: &[MediaRecord], ids: &mut RowIdAllocator) -> Vec<Row> {
    let mut rows = Vec::with_capacity(records.len() + records.len() / 4 + 1);
    let mut current_group: Option<&str> = None;
    for record in records {
        if current_group != Some(record.group_key.as_str()) {
            rows.push(Row::header(ids.allocate(), &record.group_key, record.sort_key));
            current_group = Some(record.group_key.as_str());
        }
        rows.push(Row::media(ids.allocate(), record));
    }
    rows
}
