// SPDX-FileCopyrightText: 2026 Strata Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capability trait definitions consumed by the session layer.
//!
//! The database engine and its pool are external collaborators; the session
//! layer only ever sees these traits.

pub mod connection;

pub use connection::{Connection, ConnectionSource};
