// SPDX-FileCopyrightText: 2026 Strata Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Strata session layer.
//!
//! This crate provides the error taxonomy, SQL value and record types, and
//! the connection capability traits the session layer is written against.
//! It performs no I/O of its own.

pub mod error;
pub mod item;
pub mod traits;
pub mod types;
pub mod value;

// Re-export key items at crate root for ergonomic imports.
pub use error::StrataError;
pub use item::{WriteItem, WhereClause, DIRECTIVE_PREFIX};
pub use traits::{Connection, ConnectionSource};
pub use types::{ExecResult, InsertMode, Row};
pub use value::SqlValue;
