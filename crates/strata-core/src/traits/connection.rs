// SPDX-FileCopyrightText: 2026 Strata Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection capability traits.

use async_trait::async_trait;

use crate::error::StrataError;
use crate::types::ExecResult;
use crate::value::SqlValue;

/// A live database connection borrowed from a [`ConnectionSource`].
///
/// Release is `Drop`: dropping the boxed handle returns it to its pool, so
/// every exit path (success, error, unwind) releases. Implementations must
/// make `Drop` infallible.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Execute one SQL statement with bound parameters.
    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<ExecResult, StrataError>;
}

/// Hands out live connections, or fails.
///
/// `target` names a cluster node for routed acquisition; `None` uses the
/// source's default policy. Acquisition may queue when the pool is
/// saturated.
#[async_trait]
pub trait ConnectionSource: Send + Sync {
    async fn acquire(&self, target: Option<&str>) -> Result<Box<dyn Connection>, StrataError>;
}
