// SPDX-FileCopyrightText: 2026 Strata Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock connection source for deterministic testing.
//!
//! `MockConnectionSource` implements [`ConnectionSource`] with responders
//! keyed by SQL prefix and a full capture of every executed statement for
//! assertion in tests. Acquire/release pairing is tracked so tests can
//! verify the executor releases on every exit path.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use strata_core::{Connection, ConnectionSource, ExecResult, Row, SqlValue, StrataError};

type Responder = Box<dyn Fn(&str, &[SqlValue]) -> Result<ExecResult, StrataError> + Send + Sync>;

#[derive(Default)]
struct MockState {
    responders: Mutex<Vec<(String, Responder)>>,
    injected_errors: Mutex<VecDeque<StrataError>>,
    executed: Mutex<Vec<(String, Vec<SqlValue>)>>,
    targets: Mutex<Vec<Option<String>>>,
    acquires: AtomicUsize,
    releases: AtomicUsize,
}

/// A scripted connection source.
///
/// Statements are matched against registered responders in registration
/// order by SQL prefix; unmatched statements succeed with an empty result.
/// Errors pushed via [`inject_error`](Self::inject_error) preempt responders,
/// one per execution, FIFO.
#[derive(Clone, Default)]
pub struct MockConnectionSource {
    state: Arc<MockState>,
}

impl MockConnectionSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a responder for statements starting with `prefix`.
    pub fn respond_with<F>(&self, prefix: &str, responder: F)
    where
        F: Fn(&str, &[SqlValue]) -> Result<ExecResult, StrataError> + Send + Sync + 'static,
    {
        self.state
            .responders
            .lock()
            .unwrap()
            .push((prefix.to_string(), Box::new(responder)));
    }

    /// Register a fixed successful result for statements starting with `prefix`.
    pub fn respond_ok(&self, prefix: &str, result: ExecResult) {
        self.respond_with(prefix, move |_, _| Ok(result.clone()));
    }

    /// Queue an error returned by the next execution, ahead of any responder.
    pub fn inject_error(&self, error: StrataError) {
        self.state
            .injected_errors
            .lock()
            .unwrap()
            .push_back(error);
    }

    /// Install a hi-lo counter behind the given stored-procedure prefix.
    ///
    /// Models the atomic reserve-next-blocks operation: each call reads the
    /// requested block count from its first parameter, advances the counter
    /// by that much, and returns the prior value as a one-row result.
    pub fn install_hilo_counter(&self, proc_prefix: &str, initial_block: i64) {
        let counter = Arc::new(AtomicI64::new(initial_block));
        self.respond_with(proc_prefix, move |sql, params| {
            let blocks = params
                .first()
                .and_then(SqlValue::as_int)
                .ok_or_else(|| StrataError::Driver {
                    code: None,
                    message: "block count parameter missing".into(),
                    sql: sql.to_string(),
                    params: params.to_vec(),
                })?;
            let prior = counter.fetch_add(blocks, Ordering::SeqCst);
            Ok(ExecResult {
                rows: vec![Row(vec![("next_hi".into(), SqlValue::Int(prior))])],
                rows_affected: 0,
                last_insert_id: 0,
            })
        });
    }

    /// Every executed `(sql, params)` pair, in execution order.
    pub fn executed(&self) -> Vec<(String, Vec<SqlValue>)> {
        self.state.executed.lock().unwrap().clone()
    }

    /// Executed statements whose SQL starts with `prefix`.
    pub fn executed_matching(&self, prefix: &str) -> Vec<(String, Vec<SqlValue>)> {
        self.executed()
            .into_iter()
            .filter(|(sql, _)| sql.starts_with(prefix))
            .collect()
    }

    /// Targets passed to `acquire`, in acquisition order.
    pub fn acquired_targets(&self) -> Vec<Option<String>> {
        self.state.targets.lock().unwrap().clone()
    }

    pub fn acquire_count(&self) -> usize {
        self.state.acquires.load(Ordering::SeqCst)
    }

    pub fn release_count(&self) -> usize {
        self.state.releases.load(Ordering::SeqCst)
    }
}

/// A borrowed mock connection; `Drop` counts as release.
pub struct MockConnection {
    state: Arc<MockState>,
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        self.state.releases.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Connection for MockConnection {
    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<ExecResult, StrataError> {
        // Model the statement as a real suspension point so concurrently
        // scheduled callers interleave the way they would around live I/O.
        tokio::task::yield_now().await;

        self.state
            .executed
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));

        if let Some(err) = self.state.injected_errors.lock().unwrap().pop_front() {
            return Err(err);
        }

        let responders = self.state.responders.lock().unwrap();
        for (prefix, responder) in responders.iter() {
            if sql.starts_with(prefix.as_str()) {
                return responder(sql, params);
            }
        }
        Ok(ExecResult::empty())
    }
}

#[async_trait]
impl ConnectionSource for MockConnectionSource {
    async fn acquire(&self, target: Option<&str>) -> Result<Box<dyn Connection>, StrataError> {
        self.state.acquires.fetch_add(1, Ordering::SeqCst);
        self.state
            .targets
            .lock()
            .unwrap()
            .push(target.map(str::to_string));
        Ok(Box::new(MockConnection {
            state: Arc::clone(&self.state),
        }))
    }
}
