// SPDX-FileCopyrightText: 2026 Strata Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hi-lo primary key allocation.
//!
//! A durable counter reserves coarse blocks of identifiers; this allocator
//! expands its reserved blocks into individual keys in memory, so the common
//! case hands out a key with no I/O at all. When the in-memory range runs
//! out, concurrent requesters coalesce around exactly one refill call to the
//! counter's stored procedure and are served in FIFO order once the new
//! range lands.
//!
//! Two allocator instances configured against the same counter row require
//! external coordination; nothing in-process prevents it.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, Mutex};
use tracing::{debug, error, info};

use strata_config::SessionConfig;
use strata_core::{SqlValue, StrataError};

use crate::executor::{Executor, QueryOptions};
use crate::retry::with_deadlock_retry;

/// An exclusive-use window of keys: `[low, high)` are available, everything
/// below `low` has been issued.
#[derive(Debug, Clone, Copy)]
struct AllocationRange {
    low: i64,
    high: i64,
}

impl AllocationRange {
    const EMPTY: Self = Self { low: 0, high: 0 };

    fn is_empty(&self) -> bool {
        self.low >= self.high
    }
}

struct AllocState {
    range: AllocationRange,
    /// A refill call is outstanding; new exhausted callers must queue, not
    /// issue a second call.
    refilling: bool,
    /// Requesters waiting for the in-flight refill, FIFO.
    waiters: VecDeque<oneshot::Sender<Result<i64, StrataError>>>,
}

/// Batched key allocator backed by a database counter.
///
/// Owned instance: construct one per logical key sequence and share it by
/// reference (or `Arc`). Keys issued by one instance are pairwise distinct
/// and strictly increasing; key `0` is never issued.
pub struct HiLoAllocator {
    inner: Arc<AllocInner>,
}

struct AllocInner {
    executor: Arc<Executor>,
    block_size: i64,
    blocks_per_refill: i64,
    refill_sql: String,
    retry_budget: u32,
    retry_delay: Duration,
    state: Mutex<AllocState>,
}

impl HiLoAllocator {
    pub fn new(executor: Arc<Executor>, config: &SessionConfig) -> Self {
        Self {
            inner: Arc::new(AllocInner {
                executor,
                block_size: config.hilo.block_size,
                blocks_per_refill: config.hilo.blocks_per_refill,
                refill_sql: format!("CALL {}(?)", config.hilo.proc_name),
                retry_budget: config.retry.budget,
                retry_delay: Duration::from_millis(config.retry.delay_ms),
                state: Mutex::new(AllocState {
                    range: AllocationRange::EMPTY,
                    refilling: false,
                    waiters: VecDeque::new(),
                }),
            }),
        }
    }

    /// Hand out the next key.
    ///
    /// Fast path is pure in-memory bookkeeping. On exhaustion the caller
    /// that finds no refill in flight starts one on a detached task and
    /// queues like everyone else. A refill failure is delivered to every
    /// queued requester and the allocator returns to a retryable state.
    ///
    /// A caller that drops this future while queued is skipped during the
    /// drain; its slot is discarded when the in-flight refill resolves. The
    /// refill itself runs detached, so dropping any caller, including the
    /// one that started it, never leaves the allocator stuck refilling.
    pub async fn next_key(&self) -> Result<i64, StrataError> {
        let rx = {
            let mut state = self.inner.state.lock().await;
            if !state.range.is_empty() {
                let key = state.range.low;
                state.range.low += 1;
                debug!(key, "handing out hi-lo key");
                return Ok(key);
            }

            let (tx, rx) = oneshot::channel();
            state.waiters.push_back(tx);
            if state.refilling {
                debug!(queued = state.waiters.len(), "refill in flight, deferring");
            } else {
                state.refilling = true;
                tokio::spawn(Arc::clone(&self.inner).drive_refills());
            }
            rx
        };

        match rx.await {
            Ok(result) => result,
            // The drain half never drops a live sender without sending.
            Err(_) => Err(StrataError::Internal(
                "allocator dropped a pending key request".into(),
            )),
        }
    }

    /// Reserve a span of at least `amount` keys directly from the counter,
    /// bypassing the in-memory range. Returns the starting id of the span.
    pub async fn reserve_ids(&self, amount: i64) -> Result<i64, StrataError> {
        if amount <= 0 {
            return Err(StrataError::Validation(
                "reserve_ids requires a positive amount".into(),
            ));
        }
        let blocks = (amount + self.inner.block_size - 1) / self.inner.block_size;
        let range = self.inner.reserve_blocks(blocks).await?;
        Ok(range.low)
    }
}

impl AllocInner {
    /// Issue refill calls and drain the waiter queue until it is empty or a
    /// refill fails. Runs on a task of its own so that a requester dropping
    /// its `next_key` future cannot abandon an in-flight refill; every
    /// exhausted caller is parked on its oneshot.
    async fn drive_refills(self: Arc<Self>) {
        loop {
            let refill = self.reserve_blocks(self.blocks_per_refill).await;
            let mut state = self.state.lock().await;
            match refill {
                Ok(range) => {
                    info!(low = range.low, high = range.high, "installed hi-lo range");
                    state.range = range;
                    let mut served = 0usize;
                    while let Some(tx) = state.waiters.pop_front() {
                        if state.range.is_empty() {
                            state.waiters.push_front(tx);
                            break;
                        }
                        let key = state.range.low;
                        // An abandoned waiter does not consume a key.
                        if tx.send(Ok(key)).is_ok() {
                            state.range.low += 1;
                            served += 1;
                        }
                    }
                    debug!(served, still_queued = state.waiters.len(), "drained waiters");
                    if state.waiters.is_empty() {
                        state.refilling = false;
                        return;
                    }
                    // Queue outlasted the block: keep refilling, still as
                    // the single coalesced refill driver.
                }
                Err(err) => {
                    error!(error = %err, "hi-lo refill failed, failing queued requesters");
                    let waiters = std::mem::take(&mut state.waiters);
                    state.refilling = false;
                    drop(state);
                    for tx in waiters {
                        let _ = tx.send(Err(StrataError::Allocation(err.to_string())));
                    }
                    return;
                }
            }
        }
    }

    /// One round-trip to the counter: atomically reserve `blocks` blocks and
    /// map the returned prior block number onto a key range.
    async fn reserve_blocks(&self, blocks: i64) -> Result<AllocationRange, StrataError> {
        let sql = self.refill_sql.as_str();
        let params = [SqlValue::Int(blocks)];
        let params: &[SqlValue] = &params;
        let executor = self.executor.as_ref();

        let row = with_deadlock_retry(self.retry_budget, self.retry_delay, || async move {
            executor.query_one(sql, params, QueryOptions::default()).await
        })
        .await?
        .ok_or_else(|| StrataError::Allocation("refill returned no rows".into()))?;

        let block = row
            .0
            .first()
            .and_then(|(_, value)| value.as_int())
            .ok_or_else(|| {
                StrataError::Allocation("refill returned no block number".into())
            })?;

        let mut low = block * self.block_size;
        let high = (block + blocks) * self.block_size;
        if low == 0 {
            // Key 0 is reserved as "unassigned" by convention.
            low = 1;
        }
        Ok(AllocationRange { low, high })
    }
}
