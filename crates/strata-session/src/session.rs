// SPDX-FileCopyrightText: 2026 Strata Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The session: batched writes over the executor and allocator.
//!
//! `insert_many` slices large item sets into fixed-size chunks, assigns keys
//! through the hi-lo allocator where the insert mode asks for them, executes
//! one bulk statement per chunk, and reassembles per-item results in input
//! order. Chunks run strictly sequentially; there is no cross-chunk
//! atomicity, so a failed chunk leaves earlier chunks committed.
//!
//! Retried statements are re-applied verbatim. Whether that is safe for a
//! non-idempotent statement (a plain multi-row INSERT without ignore/upsert)
//! is a caller obligation.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt, TryStreamExt};

use strata_config::SessionConfig;
use strata_core::{
    Connection, ConnectionSource, ExecResult, InsertMode, Row, SqlValue, StrataError, WriteItem,
};

use crate::builders::{
    build_bulk_insert, build_insert, build_update, BulkInsertOptions, InsertOptions,
    MutationRule, Statement, UpdateOptions,
};
use crate::executor::{Executor, QueryOptions};
use crate::hilo::HiLoAllocator;
use crate::retry::with_deadlock_retry;

/// Per-call write options. Unset fields fall back to the session config.
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    pub insert_mode: Option<InsertMode>,
    pub ignore: bool,
    /// `REPLACE` instead of `INSERT`; single-row, non-upsert only.
    pub replace: bool,
    pub upsert: bool,
    pub enforce_rules: Option<bool>,
    /// Named cluster node the statements are routed to.
    pub target: Option<String>,
}

/// An open session against one connection source.
pub struct Session {
    source: Arc<dyn ConnectionSource>,
    executor: Arc<Executor>,
    allocator: HiLoAllocator,
    config: SessionConfig,
    insert_rules: Vec<Arc<dyn MutationRule>>,
    update_rules: Vec<Arc<dyn MutationRule>>,
}

impl Session {
    pub fn new(source: Arc<dyn ConnectionSource>, config: SessionConfig) -> Self {
        let executor = Arc::new(Executor::new(Arc::clone(&source), &config));
        let allocator = HiLoAllocator::new(Arc::clone(&executor), &config);
        Self {
            source,
            executor,
            allocator,
            config,
            insert_rules: Vec::new(),
            update_rules: Vec::new(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    pub fn allocator(&self) -> &HiLoAllocator {
        &self.allocator
    }

    /// Register an insert rule; rules run in registration order.
    pub fn add_insert_rule(&mut self, rule: Arc<dyn MutationRule>) {
        self.insert_rules.push(rule);
    }

    /// Register an update rule; rules run in registration order.
    pub fn add_update_rule(&mut self, rule: Arc<dyn MutationRule>) {
        self.update_rules.push(rule);
    }

    /// Borrow a connection for a sequence of statements (transactions).
    /// Dropping the handle releases it.
    pub async fn connection(
        &self,
        target: Option<&str>,
    ) -> Result<Box<dyn Connection>, StrataError> {
        self.source
            .acquire(target.or(self.config.default_target.as_deref()))
            .await
    }

    /// Execute one statement with default options.
    pub async fn query(
        &self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<ExecResult, StrataError> {
        self.executor.query(sql, params, QueryOptions::default()).await
    }

    /// Execute one statement and resolve to its first row.
    pub async fn query_one(
        &self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<Option<Row>, StrataError> {
        self.executor
            .query_one(sql, params, QueryOptions::default())
            .await
    }

    /// Execute one statement under the session's deadlock-retry policy.
    pub async fn query_with_retry(
        &self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<ExecResult, StrataError> {
        let stmt = Statement {
            sql: sql.to_string(),
            values: params.to_vec(),
        };
        self.execute_with_retry(&stmt, None).await
    }

    /// Insert `items` into `table`, returning them annotated with their
    /// final persisted ids, in input order.
    ///
    /// Items are processed in sequential chunks of `bulk.chunk_size`. In
    /// hi-lo mode each item's key is allocated and stamped into the
    /// configured key column before building; in identity mode ids derive
    /// from the statement's reported starting auto-increment value plus the
    /// item's position in its chunk, which the engine guarantees to be
    /// sequential within one bulk statement.
    pub async fn insert_many(
        &self,
        table: &str,
        mut items: Vec<WriteItem>,
        opts: WriteOptions,
    ) -> Result<Vec<WriteItem>, StrataError> {
        if items.is_empty() {
            return Ok(items);
        }
        if opts.replace && (items.len() > 1 || opts.upsert) {
            return Err(StrataError::Validation(
                "replace mode supports a single non-upsert item".into(),
            ));
        }

        let mode = opts.insert_mode.unwrap_or(self.config.default_insert_mode);
        let enforce = opts.enforce_rules.unwrap_or(self.config.enforce_rules);
        let chunk_size = self.config.bulk.chunk_size.max(1);
        let key_column = self.config.default_key_column.as_str();

        let mut inserted = Vec::with_capacity(items.len());
        while !items.is_empty() {
            let rest = if items.len() > chunk_size {
                items.split_off(chunk_size)
            } else {
                Vec::new()
            };
            let mut chunk = std::mem::replace(&mut items, rest);

            if mode == InsertMode::HiLo {
                for item in &mut chunk {
                    let key = self.allocator.next_key().await?;
                    item.set(key_column, key);
                    item.set_insert_id(key);
                }
            }

            let insert_rules = enforce.then(|| self.insert_rules.as_slice());
            let update_rules = enforce.then(|| self.update_rules.as_slice());
            let stmt = if chunk.len() == 1 && !opts.upsert {
                build_insert(
                    table,
                    &mut chunk[0],
                    &InsertOptions {
                        ignore: opts.ignore,
                        replace: opts.replace,
                        rules: insert_rules,
                    },
                )?
            } else {
                build_bulk_insert(
                    table,
                    &mut chunk,
                    &BulkInsertOptions {
                        ignore: opts.ignore,
                        upsert: opts.upsert,
                        insert_rules,
                        update_rules,
                    },
                )?
            };

            let result = self
                .execute_with_retry(&stmt, opts.target.as_deref())
                .await?;

            if mode == InsertMode::Identity {
                let start = result.last_insert_id;
                for (pos, item) in chunk.iter_mut().enumerate() {
                    item.set_insert_id(start + pos as i64);
                }
            }
            inserted.append(&mut chunk);
        }
        Ok(inserted)
    }

    /// Insert-or-update: `insert_many` with upsert mode forced on.
    pub async fn upsert(
        &self,
        table: &str,
        items: Vec<WriteItem>,
        mut opts: WriteOptions,
    ) -> Result<Vec<WriteItem>, StrataError> {
        opts.upsert = true;
        self.insert_many(table, items, opts).await
    }

    /// Update each item, executing in parallel up to `update_concurrency`.
    ///
    /// Every statement is validated and built before anything executes, so
    /// a validation failure touches nothing. Results arrive in completion
    /// order; no cross-item ordering is guaranteed.
    pub async fn update(
        &self,
        table: &str,
        items: Vec<WriteItem>,
        opts: WriteOptions,
    ) -> Result<Vec<ExecResult>, StrataError> {
        let enforce = opts.enforce_rules.unwrap_or(self.config.enforce_rules);
        let rules = enforce.then(|| self.update_rules.as_slice());
        let update_opts = UpdateOptions {
            default_key_column: &self.config.default_key_column,
            rules,
        };

        let mut statements = Vec::with_capacity(items.len());
        for mut item in items {
            statements.push(build_update(table, &mut item, &update_opts)?);
        }

        let limit = self.config.update_concurrency.max(1);
        let target = opts.target.as_deref();
        stream::iter(
            statements
                .iter()
                .map(|stmt| self.execute_with_retry(stmt, target)),
        )
        .buffer_unordered(limit)
        .try_collect()
        .await
    }

    /// Start a transaction on a caller-held connection.
    pub async fn begin(&self, conn: &dyn Connection) -> Result<(), StrataError> {
        self.on_connection(conn, "START TRANSACTION").await
    }

    pub async fn commit(&self, conn: &dyn Connection) -> Result<(), StrataError> {
        self.on_connection(conn, "COMMIT").await
    }

    pub async fn rollback(&self, conn: &dyn Connection) -> Result<(), StrataError> {
        self.on_connection(conn, "ROLLBACK").await
    }

    /// Toggle unique and foreign key checks on a caller-held connection
    /// (bulk load optimization; scoped to that connection).
    pub async fn set_key_checks(
        &self,
        conn: &dyn Connection,
        enabled: bool,
    ) -> Result<(), StrataError> {
        let flag = if enabled { 1 } else { 0 };
        self.on_connection(conn, &format!("SET unique_checks={flag};"))
            .await?;
        self.on_connection(conn, &format!("SET foreign_key_checks={flag};"))
            .await
    }

    async fn on_connection(&self, conn: &dyn Connection, sql: &str) -> Result<(), StrataError> {
        self.executor
            .query(
                sql,
                &[],
                QueryOptions {
                    connection: Some(conn),
                    target: None,
                },
            )
            .await
            .map(drop)
    }

    async fn execute_with_retry(
        &self,
        stmt: &Statement,
        target: Option<&str>,
    ) -> Result<ExecResult, StrataError> {
        let executor = self.executor.as_ref();
        with_deadlock_retry(
            self.config.retry.budget,
            Duration::from_millis(self.config.retry.delay_ms),
            || async move {
                executor
                    .query(
                        &stmt.sql,
                        &stmt.values,
                        QueryOptions {
                            connection: None,
                            target,
                        },
                    )
                    .await
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_test_utils::MockConnectionSource;

    fn session(source: &MockConnectionSource) -> Session {
        let source: Arc<dyn ConnectionSource> = Arc::new(source.clone());
        Session::new(source, SessionConfig::default())
    }

    #[tokio::test]
    async fn single_item_uses_single_row_builder() {
        let source = MockConnectionSource::new();
        source.install_hilo_counter("CALL", 0);
        let session = session(&source);

        let items = vec![WriteItem::new().with("name", "only")];
        let inserted = session
            .insert_many("test", items, WriteOptions::default())
            .await
            .unwrap();

        let inserts = source.executed_matching("INSERT");
        assert_eq!(inserts.len(), 1);
        assert_eq!(
            inserts[0].0,
            "INSERT INTO test (name, id) VALUES (?, ?)"
        );
        assert_eq!(inserted[0].insert_id(), Some(1));
    }

    #[tokio::test]
    async fn replace_rejects_multi_row_and_upsert() {
        let source = MockConnectionSource::new();
        let session = session(&source);

        let multi = vec![WriteItem::new().with("a", 1i64); 2];
        let result = session
            .insert_many(
                "test",
                multi,
                WriteOptions {
                    replace: true,
                    ..WriteOptions::default()
                },
            )
            .await;
        assert!(matches!(result, Err(StrataError::Validation(_))));
        assert!(source.executed().is_empty());
    }

    #[tokio::test]
    async fn empty_item_list_is_a_no_op() {
        let source = MockConnectionSource::new();
        let session = session(&source);
        let inserted = session
            .insert_many("test", Vec::new(), WriteOptions::default())
            .await
            .unwrap();
        assert!(inserted.is_empty());
        assert!(source.executed().is_empty());
    }

    #[tokio::test]
    async fn transaction_helpers_reuse_the_supplied_connection() {
        let source = MockConnectionSource::new();
        let session = session(&source);

        let conn = session.connection(None).await.unwrap();
        session.begin(conn.as_ref()).await.unwrap();
        session.commit(conn.as_ref()).await.unwrap();

        let sqls: Vec<String> = source.executed().into_iter().map(|(sql, _)| sql).collect();
        assert_eq!(sqls, ["START TRANSACTION", "COMMIT"]);
        // One acquire (the test's), nothing released while it is held.
        assert_eq!(source.acquire_count(), 1);
        assert_eq!(source.release_count(), 0);
    }

    #[tokio::test]
    async fn key_check_toggles_issue_both_statements() {
        let source = MockConnectionSource::new();
        let session = session(&source);

        let conn = session.connection(None).await.unwrap();
        session.set_key_checks(conn.as_ref(), false).await.unwrap();
        session.set_key_checks(conn.as_ref(), true).await.unwrap();

        let sqls: Vec<String> = source.executed().into_iter().map(|(sql, _)| sql).collect();
        assert_eq!(
            sqls,
            [
                "SET unique_checks=0;",
                "SET foreign_key_checks=0;",
                "SET unique_checks=1;",
                "SET foreign_key_checks=1;"
            ]
        );
    }
}
