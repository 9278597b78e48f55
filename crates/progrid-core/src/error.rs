#![forbid(unsafe_code)]

//! Error types.

use std::fmt;

/// Errors surfaced by grid construction, binding, and mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// The host could not locate the configured container.
    ContainerNotFound {
        /// Identity that was looked up.
        container_id: String,
    },
    /// Configuration values the layout cannot honour.
    InvalidConfig(String),
    /// Input records could not be decoded.
    InvalidInput(String),
    /// A group upsert carried no records.
    EmptyGroup,
    /// A group upsert mixed records from different groups.
    MixedGroupKeys {
        /// Group key of the first record.
        expected: String,
        /// First conflicting key.
        found: String,
    },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContainerNotFound { container_id } => {
                write!(f, "could not find container with id {container_id:?}")
            }
            Self::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
            Self::InvalidInput(msg) => write!(f, "invalid input records: {msg}"),
            Self::EmptyGroup => write!(f, "group upsert contained no records"),
            Self::MixedGroupKeys { expected, found } => write!(
                f,
                "group upsert mixed group keys: expected {expected:?}, found {found:?}"
            ),
        }
    }
}

impl std::error::Error for GridError {}

/// A failed content fetch, as reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    /// Response status, when the transport got that far.
    pub status: Option<u16>,
    /// Human-readable reason.
    pub message: String,
}

impl FetchError {
    /// Failure with an HTTP-like status.
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Failure before any response (network down, aborted).
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "fetch failed with status {status}: {}", self.message),
            None => write!(f, "fetch failed: {}", self.message),
        }
    }
}

impl std::error::Error for FetchError {}
