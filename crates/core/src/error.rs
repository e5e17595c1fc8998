// Central error type for the job state store (§7)

use thiserror::Error;

/// Errors raised by [`crate::JobStateCore`] and the `KeyCodec`.
///
/// `DanglingIndex` is deliberately absent: per §7 it is "not an error", a
/// logged, silently repaired condition encountered during iteration.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Empty job type, or a non-positive deadline where a positive one is
    /// required. The operation aborts before any mutation reaches the
    /// transaction.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A stored key could not be decoded - truncated or malformed.
    #[error("corrupt key: {0}")]
    CorruptKey(String),

    /// A stored value could not be decoded.
    #[error("corrupt value: {0}")]
    CorruptValue(String),

    /// The engine could not be opened, or column-family registration failed.
    /// Unrecoverable for the partition.
    #[error("store open failed: {0}")]
    StoreOpenError(String),

    /// Any underlying engine failure (I/O, commit conflict). The caller
    /// decides whether to retry.
    #[error("engine error: {0}")]
    EngineError(String),
}

/// Result type alias using [`StoreError`].
pub type Result<T> = std::result::Result<T, StoreError>;
