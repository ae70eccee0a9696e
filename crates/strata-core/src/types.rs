// SPDX-FileCopyrightText: 2026 Strata Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Result and mode types shared across the session layer.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::value::SqlValue;

/// A single result row: column name to value, in select order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row(pub Vec<(String, SqlValue)>);

impl Row {
    /// Look up a column by name.
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.0
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Look up an integer column by name.
    pub fn int(&self, column: &str) -> Option<i64> {
        self.get(column).and_then(SqlValue::as_int)
    }
}

/// Normalized outcome of one statement execution.
///
/// The "no rows / no columns" driver case is represented as an empty `rows`
/// vec, never an absent value. `last_insert_id` is the engine-reported
/// auto-increment value of the *first* row inserted by the statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecResult {
    pub rows: Vec<Row>,
    pub rows_affected: u64,
    pub last_insert_id: i64,
}

impl ExecResult {
    /// Result of a statement that touched nothing and returned nothing.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// How primary keys are assigned during inserts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize, Default,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InsertMode {
    /// Keys come from the in-process hi-lo allocator.
    #[default]
    HiLo,
    /// Keys come from the engine's auto-increment column.
    Identity,
}
