// SPDX-FileCopyrightText: 2026 Strata Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mutation rules applied during statement building.
//!
//! Rules run in registration order and may add or alter fields before SQL is
//! emitted (the canonical example stamps a modification timestamp). Rules
//! must not assume they run exactly once per logical write: a retried
//! statement re-applies its already-built parameter set, but a rebuilt
//! statement re-runs the pipeline.

use chrono::Utc;

use strata_core::{SqlValue, WriteItem};

/// Context shared by every rule invocation.
pub struct RuleContext<'a> {
    pub table: &'a str,
}

/// What a rule is allowed to mutate.
///
/// Single-row builders expose the parallel field/value/placeholder lists
/// that become the statement; the bulk builder derives values from the items
/// themselves, so bulk rules mutate the shared field list and the items.
pub enum RuleTarget<'a> {
    Single {
        item: &'a mut WriteItem,
        fields: &'a mut Vec<String>,
        values: &'a mut Vec<SqlValue>,
        expressions: &'a mut Vec<String>,
    },
    Bulk {
        items: &'a mut [WriteItem],
        fields: &'a mut Vec<String>,
    },
}

/// A field-mutation step in the build pipeline.
pub trait MutationRule: Send + Sync {
    fn apply(&self, target: RuleTarget<'_>, ctx: &RuleContext<'_>);
}

/// Stamps a UTC timestamp column (`yyyy-mm-dd HH:MM:ss`) on every write.
pub struct TouchTimestamp {
    column: String,
}

impl TouchTimestamp {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

/// UTC now, formatted the way the engine expects DATETIME literals.
pub fn utc_now() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

impl MutationRule for TouchTimestamp {
    fn apply(&self, target: RuleTarget<'_>, _ctx: &RuleContext<'_>) {
        let stamp = utc_now();
        match target {
            RuleTarget::Single {
                item,
                fields,
                values,
                expressions,
            } => {
                if let Some(pos) = fields.iter().position(|f| f == &self.column) {
                    values[pos] = stamp.clone().into();
                } else {
                    fields.push(self.column.clone());
                    expressions.push("?".into());
                    values.push(stamp.clone().into());
                }
                item.set(self.column.clone(), stamp);
            }
            RuleTarget::Bulk { items, fields } => {
                if !fields.iter().any(|f| f == &self.column) {
                    fields.push(self.column.clone());
                }
                for item in items.iter_mut() {
                    item.set(self.column.clone(), stamp.clone());
                }
            }
        }
    }
}
