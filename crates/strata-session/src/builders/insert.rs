// SPDX-FileCopyrightText: 2026 Strata Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-row INSERT / REPLACE builder.

use std::sync::Arc;

use strata_core::{StrataError, WriteItem};

use super::rules::{MutationRule, RuleContext, RuleTarget};
use super::Statement;

/// Options for [`build_insert`].
#[derive(Default)]
pub struct InsertOptions<'a> {
    /// Emit `INSERT IGNORE`.
    pub ignore: bool,
    /// Emit `REPLACE` instead of `INSERT`. Wins over `ignore`.
    pub replace: bool,
    /// Rules applied in registration order before emission; `None` skips
    /// rule enforcement entirely.
    pub rules: Option<&'a [Arc<dyn MutationRule>]>,
}

/// Build `INSERT [IGNORE] INTO <table> (<fields>) VALUES (<placeholders>)`
/// for one record.
pub fn build_insert(
    table: &str,
    item: &mut WriteItem,
    opts: &InsertOptions<'_>,
) -> Result<Statement, StrataError> {
    let mut fields = Vec::new();
    let mut values = Vec::new();
    let mut expressions = Vec::new();
    for (name, value) in item.columns() {
        fields.push(name.clone());
        expressions.push("?".to_string());
        values.push(value.clone());
    }

    if let Some(rules) = opts.rules {
        let ctx = RuleContext { table };
        for rule in rules {
            rule.apply(
                RuleTarget::Single {
                    item,
                    fields: &mut fields,
                    values: &mut values,
                    expressions: &mut expressions,
                },
                &ctx,
            );
        }
    }

    if fields.is_empty() {
        return Err(StrataError::Validation(
            "insert requires at least one field".into(),
        ));
    }

    let verb = if opts.replace {
        "REPLACE"
    } else if opts.ignore {
        "INSERT IGNORE"
    } else {
        "INSERT"
    };
    let sql = format!(
        "{verb} INTO {table} ({}) VALUES ({})",
        fields.join(", "),
        expressions.join(", ")
    );

    Ok(Statement { sql, values })
}
