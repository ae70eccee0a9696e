// SPDX-FileCopyrightText: 2026 Strata Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Strata session layer.

use thiserror::Error;

use crate::value::SqlValue;

/// The primary error type used across all Strata operations.
///
/// The taxonomy drives retry policy: only [`StrataError::TransientLock`] is
/// ever retried; everything else surfaces to the caller on first occurrence.
#[derive(Debug, Clone, Error)]
pub enum StrataError {
    /// Input rejected before any I/O (e.g. update with neither key nor where).
    #[error("validation error: {0}")]
    Validation(String),

    /// Transient lock contention (deadlock, lock-wait timeout). Retryable.
    #[error("transient lock error: {code}")]
    TransientLock { code: String },

    /// Any other database failure, with the statement attached for diagnosis.
    #[error("driver error [{}]: {message} (sql: {sql})", .code.as_deref().unwrap_or("unknown"))]
    Driver {
        code: Option<String>,
        message: String,
        sql: String,
        params: Vec<SqlValue>,
    },

    /// A hi-lo refill call failed; delivered to every queued requester.
    #[error("allocation error: {0}")]
    Allocation(String),

    /// Connection acquisition failed or the pool is unavailable.
    #[error("pool error: {0}")]
    Pool(String),

    /// Configuration errors (invalid TOML, unknown keys, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl StrataError {
    /// Whether this error belongs to the transient lock-contention class
    /// that the deadlock-retry wrapper is allowed to re-execute.
    pub fn is_transient(&self) -> bool {
        matches!(self, StrataError::TransientLock { .. })
    }
}
