// SPDX-FileCopyrightText: 2026 Strata Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Strata session layer.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at load time.

use serde::{Deserialize, Serialize};

use strata_core::InsertMode;

/// Top-level session configuration.
///
/// Every section and field is optional; absent values take the built-in
/// defaults below.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Hi-lo key allocation settings.
    #[serde(default)]
    pub hilo: HiLoConfig,

    /// Bulk insert chunking settings.
    #[serde(default)]
    pub bulk: BulkConfig,

    /// Deadlock retry settings.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Maximum in-flight update statements per `update()` call.
    #[serde(default = "default_update_concurrency")]
    pub update_concurrency: usize,

    /// Key column used when an item carries a key directive but no
    /// where-clause.
    #[serde(default = "default_key_column")]
    pub default_key_column: String,

    /// Key assignment mode used when an insert supplies none.
    #[serde(default)]
    pub default_insert_mode: InsertMode,

    /// Whether registered mutation rules run during statement building.
    #[serde(default = "default_enforce_rules")]
    pub enforce_rules: bool,

    /// Queries slower than this are logged at WARN.
    #[serde(default = "default_slow_query_ms")]
    pub slow_query_ms: u64,

    /// Named cluster node to acquire connections from by default.
    #[serde(default)]
    pub default_target: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            hilo: HiLoConfig::default(),
            bulk: BulkConfig::default(),
            retry: RetryConfig::default(),
            update_concurrency: default_update_concurrency(),
            default_key_column: default_key_column(),
            default_insert_mode: InsertMode::default(),
            enforce_rules: default_enforce_rules(),
            slow_query_ms: default_slow_query_ms(),
            default_target: None,
        }
    }
}

/// Hi-lo allocator configuration.
///
/// The counter store reserves `blocks_per_refill` blocks of `block_size`
/// keys per round-trip; both are fixed for the allocator's lifetime.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HiLoConfig {
    #[serde(default = "default_block_size")]
    pub block_size: i64,

    #[serde(default = "default_blocks_per_refill")]
    pub blocks_per_refill: i64,

    /// Stored procedure that atomically reserves the next blocks and
    /// returns the prior block number.
    #[serde(default = "default_proc_name")]
    pub proc_name: String,
}

impl Default for HiLoConfig {
    fn default() -> Self {
        Self {
            block_size: default_block_size(),
            blocks_per_refill: default_blocks_per_refill(),
            proc_name: default_proc_name(),
        }
    }
}

/// Bulk insert configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BulkConfig {
    /// Items per bulk INSERT statement.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
        }
    }
}

/// Deadlock retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Total invocation budget for a transiently failing statement.
    #[serde(default = "default_retry_budget")]
    pub budget: u32,

    /// Fixed delay between retries, in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            budget: default_retry_budget(),
            delay_ms: default_retry_delay_ms(),
        }
    }
}

fn default_block_size() -> i64 {
    101
}

fn default_blocks_per_refill() -> i64 {
    100
}

fn default_proc_name() -> String {
    "get_next_hi".to_string()
}

fn default_chunk_size() -> usize {
    1000
}

fn default_retry_budget() -> u32 {
    5
}

fn default_retry_delay_ms() -> u64 {
    10
}

fn default_update_concurrency() -> usize {
    10
}

fn default_key_column() -> String {
    "id".to_string()
}

fn default_enforce_rules() -> bool {
    true
}

fn default_slow_query_ms() -> u64 {
    1000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = SessionConfig::default();
        assert_eq!(config.hilo.block_size, 101);
        assert_eq!(config.hilo.blocks_per_refill, 100);
        assert_eq!(config.hilo.proc_name, "get_next_hi");
        assert_eq!(config.bulk.chunk_size, 1000);
        assert_eq!(config.retry.budget, 5);
        assert_eq!(config.retry.delay_ms, 10);
        assert_eq!(config.update_concurrency, 10);
        assert_eq!(config.default_key_column, "id");
        assert_eq!(config.default_insert_mode, InsertMode::HiLo);
        assert!(config.enforce_rules);
        assert!(config.default_target.is_none());
    }
}
