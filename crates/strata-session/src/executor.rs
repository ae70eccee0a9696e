// SPDX-FileCopyrightText: 2026 Strata Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query execution over a borrowed connection.
//!
//! The executor owns the acquire/execute/release discipline: unless the
//! caller supplies its own handle (an in-progress transaction), a connection
//! is acquired per statement and returned to the pool when the boxed handle
//! drops, on every exit path.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use strata_config::SessionConfig;
use strata_core::{Connection, ConnectionSource, ExecResult, Row, SqlValue, StrataError};

/// Per-call execution options.
#[derive(Default)]
pub struct QueryOptions<'a> {
    /// Execute on this handle instead of acquiring one; the handle is not
    /// released afterwards.
    pub connection: Option<&'a dyn Connection>,
    /// Named cluster node to acquire from. Overrides the configured default.
    pub target: Option<&'a str>,
}

/// Executes statements against connections from a [`ConnectionSource`].
pub struct Executor {
    source: Arc<dyn ConnectionSource>,
    slow_query: Duration,
    default_target: Option<String>,
}

impl Executor {
    pub fn new(source: Arc<dyn ConnectionSource>, config: &SessionConfig) -> Self {
        Self {
            source,
            slow_query: Duration::from_millis(config.slow_query_ms),
            default_target: config.default_target.clone(),
        }
    }

    /// Execute one statement.
    ///
    /// The empty-result driver case comes back as an [`ExecResult`] with an
    /// empty row vec, never an absent value. Driver errors carry the SQL
    /// text and parameters for diagnostics.
    pub async fn query(
        &self,
        sql: &str,
        params: &[SqlValue],
        opts: QueryOptions<'_>,
    ) -> Result<ExecResult, StrataError> {
        match opts.connection {
            Some(conn) => self.run(conn, sql, params).await,
            None => {
                let target = opts.target.or(self.default_target.as_deref());
                let conn = self.source.acquire(target).await?;
                // Handle drops (and releases) here regardless of outcome.
                self.run(conn.as_ref(), sql, params).await
            }
        }
    }

    /// Execute one statement and resolve to its first row, `None` on empty.
    pub async fn query_one(
        &self,
        sql: &str,
        params: &[SqlValue],
        opts: QueryOptions<'_>,
    ) -> Result<Option<Row>, StrataError> {
        let result = self.query(sql, params, opts).await?;
        Ok(result.rows.into_iter().next())
    }

    async fn run(
        &self,
        conn: &dyn Connection,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<ExecResult, StrataError> {
        let started = Instant::now();
        let result = conn.execute(sql, params).await;
        let elapsed = started.elapsed();

        if elapsed > self.slow_query {
            warn!(?elapsed, sql, "slow query");
        } else {
            debug!(?elapsed, sql, "query executed");
        }

        result.map_err(|err| attach_statement(err, sql, params))
    }
}

/// Ensure driver errors carry the statement that produced them.
fn attach_statement(err: StrataError, sql: &str, params: &[SqlValue]) -> StrataError {
    match err {
        StrataError::Driver {
            code,
            message,
            sql: existing,
            params: existing_params,
        } => {
            let (sql, params) = if existing.is_empty() {
                (sql.to_string(), params.to_vec())
            } else {
                (existing, existing_params)
            };
            StrataError::Driver {
                code,
                message,
                sql,
                params,
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_test_utils::MockConnectionSource;

    fn executor_for(source: &MockConnectionSource) -> Executor {
        Executor::new(Arc::new(source.clone()), &SessionConfig::default())
    }

    #[tokio::test]
    async fn acquires_and_releases_per_statement() {
        let source = MockConnectionSource::new();
        let executor = executor_for(&source);

        executor
            .query("SELECT 1", &[], QueryOptions::default())
            .await
            .unwrap();
        executor
            .query("SELECT 2", &[], QueryOptions::default())
            .await
            .unwrap();

        assert_eq!(source.acquire_count(), 2);
        assert_eq!(source.release_count(), 2);
    }

    #[tokio::test]
    async fn releases_on_driver_error() {
        let source = MockConnectionSource::new();
        source.inject_error(StrataError::Driver {
            code: Some("ER_PARSE_ERROR".into()),
            message: "syntax".into(),
            sql: String::new(),
            params: vec![],
        });
        let executor = executor_for(&source);

        let err = executor
            .query("SELECT bad", &[SqlValue::Int(1)], QueryOptions::default())
            .await
            .unwrap_err();

        assert_eq!(source.release_count(), 1);
        match err {
            StrataError::Driver { sql, params, .. } => {
                // Diagnostics filled in by the executor.
                assert_eq!(sql, "SELECT bad");
                assert_eq!(params, vec![SqlValue::Int(1)]);
            }
            other => panic!("expected driver error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn supplied_connection_is_not_released() {
        let source = MockConnectionSource::new();
        let executor = executor_for(&source);

        let conn = source.acquire(None).await.unwrap();
        executor
            .query(
                "SELECT 1",
                &[],
                QueryOptions {
                    connection: Some(conn.as_ref()),
                    target: None,
                },
            )
            .await
            .unwrap();

        // Only the test's own acquire happened, and nothing was released yet.
        assert_eq!(source.acquire_count(), 1);
        assert_eq!(source.release_count(), 0);
        drop(conn);
        assert_eq!(source.release_count(), 1);
    }

    #[tokio::test]
    async fn target_routing_prefers_explicit_over_default() {
        let source = MockConnectionSource::new();
        let config = SessionConfig {
            default_target: Some("primary".into()),
            ..SessionConfig::default()
        };
        let executor = Executor::new(Arc::new(source.clone()), &config);

        executor
            .query("SELECT 1", &[], QueryOptions::default())
            .await
            .unwrap();
        executor
            .query(
                "SELECT 2",
                &[],
                QueryOptions {
                    connection: None,
                    target: Some("replica-2"),
                },
            )
            .await
            .unwrap();

        assert_eq!(
            source.acquired_targets(),
            vec![Some("primary".into()), Some("replica-2".into())]
        );
    }

    #[tokio::test]
    async fn query_one_resolves_first_row_or_none() {
        let source = MockConnectionSource::new();
        source.respond_ok(
            "SELECT id",
            ExecResult {
                rows: vec![
                    Row(vec![("id".into(), SqlValue::Int(1))]),
                    Row(vec![("id".into(), SqlValue::Int(2))]),
                ],
                rows_affected: 0,
                last_insert_id: 0,
            },
        );
        let executor = executor_for(&source);

        let row = executor
            .query_one("SELECT id FROM t", &[], QueryOptions::default())
            .await
            .unwrap();
        assert_eq!(row.unwrap().int("id"), Some(1));

        let none = executor
            .query_one("UPDATE t SET a = 1", &[], QueryOptions::default())
            .await
            .unwrap();
        assert!(none.is_none());
    }
}
