// SPDX-FileCopyrightText: 2026 Strata Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Write records and their directives.
//!
//! A [`WriteItem`] is a plain field map plus typed directives: a key hint,
//! a where-clause override, and the assigned insert id the session stamps on
//! the way out. Directives ride alongside the fields instead of being mixed
//! in as `$`-prefixed entries; field names that do start with the `$` prefix
//! are still excluded from emitted column lists as a guard against untyped
//! construction.

use crate::value::SqlValue;

/// Reserved prefix for directive-like field names excluded from SQL emission.
pub const DIRECTIVE_PREFIX: char = '$';

/// A where-clause directive on an update.
#[derive(Debug, Clone, PartialEq)]
pub enum WhereClause {
    /// A literal clause body, e.g. `id = 1`.
    Text(String),
    /// A parameterized clause body plus its bound values, e.g.
    /// `("id = ? AND tenant = ?", [1, "acme"])`.
    Parameterized(String, Vec<SqlValue>),
}

/// An application record destined for an INSERT, UPDATE, or UPSERT.
///
/// Field order is insertion order and is preserved into the emitted column
/// list. Setting an existing field overwrites its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteItem {
    fields: Vec<(String, SqlValue)>,
    key: Option<SqlValue>,
    where_clause: Option<WhereClause>,
    insert_id: Option<i64>,
}

impl WriteItem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, preserving its position if it already exists.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<SqlValue>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// All fields in insertion order, including any `$`-prefixed ones.
    pub fn fields(&self) -> &[(String, SqlValue)] {
        &self.fields
    }

    /// Fields eligible for SQL emission (directive-prefixed names excluded).
    pub fn columns(&self) -> impl Iterator<Item = &(String, SqlValue)> {
        self.fields
            .iter()
            .filter(|(name, _)| !name.starts_with(DIRECTIVE_PREFIX))
    }

    /// The explicit key directive, matched against the configured default
    /// key column by the update builder.
    pub fn key(&self) -> Option<&SqlValue> {
        self.key.as_ref()
    }

    pub fn with_key(mut self, key: impl Into<SqlValue>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn where_clause(&self) -> Option<&WhereClause> {
        self.where_clause.as_ref()
    }

    pub fn with_where(mut self, clause: impl Into<String>) -> Self {
        self.where_clause = Some(WhereClause::Text(clause.into()));
        self
    }

    pub fn with_where_params(
        mut self,
        clause: impl Into<String>,
        params: Vec<SqlValue>,
    ) -> Self {
        self.where_clause = Some(WhereClause::Parameterized(clause.into(), params));
        self
    }

    /// The id persisted for this item, stamped by the session after a
    /// successful insert.
    pub fn insert_id(&self) -> Option<i64> {
        self.insert_id
    }

    pub fn set_insert_id(&mut self, id: i64) {
        self.insert_id = Some(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_preserves_field_order_and_overwrites_in_place() {
        let mut item = WriteItem::new().with("id", 1i64).with("name", "first");
        item.set("name", "second");
        item.set("color", "blue");
        let names: Vec<&str> = item.fields().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["id", "name", "color"]);
        assert_eq!(item.get("name").and_then(SqlValue::as_text), Some("second"));
    }

    #[test]
    fn directive_prefixed_fields_are_not_columns() {
        let item = WriteItem::new().with("name", "x").with("$shadow", 1i64);
        let cols: Vec<&str> = item.columns().map(|(n, _)| n.as_str()).collect();
        assert_eq!(cols, ["name"]);
    }

    #[test]
    fn directives_are_typed_not_fields() {
        let item = WriteItem::new()
            .with("name", "x")
            .with_key(9i64)
            .with_where("id = 9");
        assert_eq!(item.key().and_then(SqlValue::as_int), Some(9));
        assert!(matches!(item.where_clause(), Some(WhereClause::Text(c)) if c == "id = 9"));
        assert_eq!(item.fields().len(), 1);
    }
}
