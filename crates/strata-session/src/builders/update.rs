// SPDX-FileCopyrightText: 2026 Strata Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-row UPDATE builder.

use std::sync::Arc;

use strata_core::{StrataError, WhereClause, WriteItem};

use super::rules::{MutationRule, RuleContext, RuleTarget};
use super::Statement;

/// Options for [`build_update`].
#[derive(Default)]
pub struct UpdateOptions<'a> {
    /// Column the key directive maps onto when no where-clause is given.
    pub default_key_column: &'a str,
    /// Rules applied in registration order before emission.
    pub rules: Option<&'a [Arc<dyn MutationRule>]>,
}

/// Build `UPDATE <table> SET col = ?, ... WHERE <clause>;` for one record.
///
/// The record must carry either a key directive or a where directive;
/// carrying neither is a validation error, raised before any SQL is
/// assembled.
pub fn build_update(
    table: &str,
    item: &mut WriteItem,
    opts: &UpdateOptions<'_>,
) -> Result<Statement, StrataError> {
    if item.key().is_none() && item.where_clause().is_none() {
        return Err(StrataError::Validation(
            "either a key or a where clause is required on each update item".into(),
        ));
    }
    if item.key().is_some() && opts.default_key_column.is_empty() {
        return Err(StrataError::Validation(
            "a default key column is required when a key directive is used".into(),
        ));
    }

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
            "update requires at least one field".into(),
        ));
    }

    let assignments: Vec<String> = fields
        .iter()
        .zip(expressions.iter())
        .map(|(field, expr)| format!("{field} = {expr}"))
        .collect();

    let clause = match item.where_clause() {
        None => {
            // Key directive mapped through the default key column.
            values.push(item.key().cloned().unwrap_or(strata_core::SqlValue::Null));
            format!("{} = ?", opts.default_key_column)
        }
        Some(WhereClause::Text(text)) => text.clone(),
        Some(WhereClause::Parameterized(text, params)) => {
            values.extend(params.iter().cloned());
            text.clone()
        }
    };

    let sql = format!(
        "UPDATE {table} SET {} WHERE {clause};",
        assignments.join(", ")
    );

    Ok(Statement { sql, values })
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::SqlValue;

    fn opts<'a>() -> UpdateOptions<'a> {
        UpdateOptions {
            default_key_column: "id",
            rules: None,
        }
    }

    #[test]
    fn where_directive_round_trip() {
        let mut item = WriteItem::new().with("name", "Test").with_where("id = 1");
        let stmt = build_update("test", &mut item, &opts()).unwrap();
        assert_eq!(stmt.sql, "UPDATE test SET name = ? WHERE id = 1;");
        assert_eq!(stmt.values, vec![SqlValue::Text("Test".into())]);
    }

    #[test]
    fn key_directive_maps_through_default_key_column() {
        let mut item = WriteItem::new().with("name", "Test").with_key(7i64);
        let stmt = build_update("test", &mut item, &opts()).unwrap();
        assert_eq!(stmt.sql, "UPDATE test SET name = ? WHERE id = ?;");
        assert_eq!(
            stmt.values,
            vec![SqlValue::Text("Test".into()), SqlValue::Int(7)]
        );
    }

    #[test]
    fn parameterized_where_appends_its_params() {
        let mut item = WriteItem::new().with("name", "Test").with_where_params(
            "id = ? AND tenant = ?",
            vec![SqlValue::Int(3), SqlValue::Text("acme".into())],
        );
        let stmt = build_update("test", &mut item, &opts()).unwrap();
        assert_eq!(
            stmt.sql,
            "UPDATE test SET name = ? WHERE id = ? AND tenant = ?;"
        );
        assert_eq!(
            stmt.values,
            vec![
                SqlValue::Text("Test".into()),
                SqlValue::Int(3),
                SqlValue::Text("acme".into())
            ]
        );
    }

    #[test]
    fn missing_key_and_where_is_a_validation_error() {
        let mut item = WriteItem::new().with("name", "Test");
        assert!(matches!(
            build_update("test", &mut item, &opts()),
            Err(StrataError::Validation(_))
        ));
    }

    #[test]
    fn key_without_default_key_column_is_rejected() {
        let mut item = WriteItem::new().with("name", "Test").with_key(1i64);
        let result = build_update(
            "test",
            &mut item,
            &UpdateOptions {
                default_key_column: "",
                rules: None,
            },
        );
        assert!(matches!(result, Err(StrataError::Validation(_))));
    }

    #[test]
    fn no_updatable_fields_is_rejected() {
        let mut item = WriteItem::new().with_key(1i64);
        assert!(matches!(
            build_update("test", &mut item, &opts()),
            Err(StrataError::Validation(_))
        ));
    }
}
