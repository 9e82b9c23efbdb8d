//! Error types for `docvec`.
//!
//! A single error enum covers every index operation. Each variant carries a
//! stable `DOCVEC-XXX` code so callers (CLI, services embedding the library)
//! can map failures without matching on message text.

use thiserror::Error;

/// Result type alias for `docvec` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in `docvec` operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid caller-supplied argument (DOCVEC-001).
    ///
    /// Bad `k`, bad `ef`, empty ids or texts, out-of-range graph parameters.
    #[error("[DOCVEC-001] Invalid argument: {0}")]
    InvalidArgument(String),

    /// Search attempted on an index holding no documents (DOCVEC-002).
    #[error("[DOCVEC-002] Index is empty: no documents indexed")]
    EmptyIndex,

    /// Vector length disagrees with the index dimension (DOCVEC-003).
    #[error("[DOCVEC-003] Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        actual: usize,
    },

    /// Persisted artifacts are unreadable, malformed or out of sync (DOCVEC-004).
    #[error("[DOCVEC-004] Corrupt persisted state: {0}")]
    CorruptPersistedState(String),

    /// Allocation failed while growing index structures (DOCVEC-005).
    #[error("[DOCVEC-005] Resource exhausted: {0}")]
    ResourceExhausted(String),

    /// The embedding provider failed to encode a text (DOCVEC-006).
    #[error("[DOCVEC-006] Embedding error: {0}")]
    Embedding(String),

    /// Configuration could not be loaded or is invalid (DOCVEC-007).
    #[error("[DOCVEC-007] Configuration error: {0}")]
    Config(String),

    /// IO error (DOCVEC-008).
    #[error("[DOCVEC-008] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization of a side artifact failed (DOCVEC-009).
    #[error("[DOCVEC-009] Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Returns the error code (e.g., "DOCVEC-001").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "DOCVEC-001",
            Self::EmptyIndex => "DOCVEC-002",
            Self::DimensionMismatch { .. } => "DOCVEC-003",
            Self::CorruptPersistedState(_) => "DOCVEC-004",
            Self::ResourceExhausted(_) => "DOCVEC-005",
            Self::Embedding(_) => "DOCVEC-006",
            Self::Config(_) => "DOCVEC-007",
            Self::Io(_) => "DOCVEC-008",
            Self::Serialization(_) => "DOCVEC-009",
        }
    }

    /// Returns true if the index can keep serving after this error.
    ///
    /// Corruption aborts startup and exhaustion aborts the batch in flight.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::CorruptPersistedState(_) | Self::ResourceExhausted(_)
        )
    }

    /// Shorthand used by the decoders.
    pub(crate) fn corrupt(msg: impl Into<String>) -> Self {
        Self::CorruptPersistedState(msg.into())
    }
}

impl From<std::collections::TryReserveError> for Error {
    fn from(err: std::collections::TryReserveError) -> Self {
        Self::ResourceExhausted(err.to_string())
    }
}

impl From<crate::config::ConfigError> for Error {
    fn from(err: crate::config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
