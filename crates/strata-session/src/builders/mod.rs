// SPDX-FileCopyrightText: 2026 Strata Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Statement builders.
//!
//! Pure, synchronous transforms from records plus an ordered rule pipeline
//! to `(sql, parameter values)`. Builders never execute SQL and are
//! deterministic given identical inputs and rules.

pub mod bulk;
pub mod insert;
pub mod rules;
pub mod update;

pub use bulk::{build_bulk_insert, BulkInsertOptions};
pub use insert::{build_insert, InsertOptions};
pub use rules::{MutationRule, RuleContext, RuleTarget, TouchTimestamp};
pub use update::{build_update, UpdateOptions};

use strata_core::SqlValue;

/// A built statement ready for the executor.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub values: Vec<SqlValue>,
}
