//! Error types for the engine runner.

use std::time::Duration;
use thiserror::Error;

/// Errors raised while driving an engine invocation.
///
/// Every variant is fatal to the invocation that raised it: there is no
/// retry or partial-result path, and buffers owned by the invocation are
/// released before the error propagates.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The engine reported a binding set that cannot be driven safely
    /// (zero bindings, or a malformed shape on some binding).
    #[error("engine introspection failed: {0}")]
    EngineIntrospection(String),

    /// Host or device allocation failed for one binding.
    #[error("allocation of {bytes} bytes for binding {binding} failed: {reason}")]
    Allocation {
        /// Index of the binding whose allocation failed.
        binding: usize,
        /// Requested size in bytes.
        bytes: u64,
        /// Backend-reported cause.
        reason: String,
    },

    /// The caller-supplied input does not match binding 0's element count.
    #[error("input has {actual} elements but binding 0 expects {expected}")]
    ShapeMismatch {
        /// Element count declared by binding 0 (per-sample volume times batch).
        expected: usize,
        /// Element count of the supplied input.
        actual: usize,
    },

    /// The caller supplied a name list that does not cover the output bindings.
    #[error("{provided} output names supplied for {expected} output bindings")]
    BindingNameMismatch {
        /// Number of output bindings the engine exposes.
        expected: usize,
        /// Number of names the caller supplied.
        provided: usize,
    },

    /// Stream synchronization did not complete within the configured bound.
    #[error("engine execution did not complete within {waited:?}")]
    EngineTimeout {
        /// How long the invocation waited before giving up.
        waited: Duration,
    },

    /// Batch size must be at least 1.
    #[error("invalid batch size {0}")]
    InvalidBatchSize(usize),

    /// Device backend fault (initialization, copy, or readback failure).
    #[error("device error: {0}")]
    Device(String),

    /// The engine rejected or failed an enqueued execution.
    #[error("engine execution failed: {0}")]
    Execution(String),

    /// Writing a diagnostic image or persisting a tensor failed.
    #[error("export failed: {0}")]
    Export(String),
}

/// Specialized `Result` for runner operations.
pub type Result<T> = std::result::Result<T, RunnerError>;
