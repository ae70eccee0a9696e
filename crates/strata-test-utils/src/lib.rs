// SPDX-FileCopyrightText: 2026 Strata Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for the Strata session layer.
//!
//! Provides a scripted mock connection source for deterministic tests that
//! exercise the executor, allocator, and orchestrator without a database.

pub mod mock_db;

pub use mock_db::{MockConnection, MockConnectionSource};
