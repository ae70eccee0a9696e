// SPDX-FileCopyrightText: 2026 Strata Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Multi-row INSERT builder.
//!
//! Emits a single `INSERT ... VALUES ?` whose one placeholder binds a 2-D
//! parameter array ([`SqlValue::Rows`]). The field set is derived from the
//! first record; all records are assumed to share it. Upsert mode appends
//! `ON DUPLICATE KEY UPDATE col = VALUES(col)` for every column.

use std::sync::Arc;

use strata_core::{SqlValue, StrataError, WriteItem};

use super::rules::{MutationRule, RuleContext, RuleTarget};
use super::Statement;

/// Options for [`build_bulk_insert`].
#[derive(Default)]
pub struct BulkInsertOptions<'a> {
    /// Emit `INSERT IGNORE`.
    pub ignore: bool,
    /// Append the `ON DUPLICATE KEY UPDATE` clause.
    pub upsert: bool,
    /// Insert rules, applied to the shared field list and every item.
    pub insert_rules: Option<&'a [Arc<dyn MutationRule>]>,
    /// Update rules, applied only to the upsert clause's column list.
    pub update_rules: Option<&'a [Arc<dyn MutationRule>]>,
}

/// Build one multi-row insert statement for `items`.
pub fn build_bulk_insert(
    table: &str,
    items: &mut [WriteItem],
    opts: &BulkInsertOptions<'_>,
) -> Result<Statement, StrataError> {
    if items.is_empty() {
        return Err(StrataError::Validation(
            "bulk insert requires at least one item".into(),
        ));
    }

    // The first item defines the emitted field set.
    let mut fields: Vec<String> = items[0].columns().map(|(name, _)| name.clone()).collect();

    let ctx = RuleContext { table };
    if let Some(rules) = opts.insert_rules {
        for rule in rules {
            rule.apply(
                RuleTarget::Bulk {
                    items,
                    fields: &mut fields,
                },
                &ctx,
            );
        }
    }

    if fields.is_empty() {
        return Err(StrataError::Validation(
            "bulk insert requires at least one field".into(),
        ));
    }

    // Missing fields on later items bind NULL rather than skewing the grid.
    let rows: Vec<Vec<SqlValue>> = items
        .iter()
        .map(|item| {
            fields
                .iter()
                .map(|field| item.get(field).cloned().unwrap_or(SqlValue::Null))
                .collect()
        })
        .collect();

    let verb = if opts.ignore { "INSERT IGNORE" } else { "INSERT" };
    let mut sql = format!("{verb} INTO {table} ({}) VALUES ?", fields.join(", "));

    if opts.upsert {
        let mut update_fields = fields.clone();
        if let Some(rules) = opts.update_rules {
            for rule in rules {
                rule.apply(
                    RuleTarget::Bulk {
                        items,
                        fields: &mut update_fields,
                    },
                    &ctx,
                );
            }
        }
        let assignments: Vec<String> = update_fields
            .iter()
            .map(|field| format!("{field} = VALUES({field})"))
            .collect();
        sql.push_str(" ON DUPLICATE KEY UPDATE ");
        sql.push_str(&assignments.join(", "));
    }

    Ok(Statement {
        sql,
        values: vec![SqlValue::Rows(rows)],
    })
}
