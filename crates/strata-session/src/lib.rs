// SPDX-FileCopyrightText: 2026 Strata Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Async SQL session layer.
//!
//! Sits between application code and a relational engine reached through a
//! [`strata_core::ConnectionSource`]: builds parameterized INSERT / UPDATE /
//! UPSERT statements from plain records, retries transient lock-contention
//! failures, and allocates primary keys with a batched hi-lo scheme that
//! avoids a counter round-trip per row.
//!
//! # Usage
//!
//! ```no_run
//! # async fn example(source: std::sync::Arc<dyn strata_core::ConnectionSource>) {
//! use strata_session::{Session, WriteOptions};
//! use strata_core::WriteItem;
//!
//! let session = Session::new(source, strata_config::SessionConfig::default());
//! let items = vec![WriteItem::new().with("name", "Test").with("color", "Blue")];
//! let inserted = session
//!     .insert_many("test", items, WriteOptions::default())
//!     .await
//!     .unwrap();
//! assert!(inserted[0].insert_id().is_some());
//! # }
//! ```

pub mod builders;
pub mod executor;
pub mod hilo;
pub mod retry;
pub mod session;

pub use builders::{MutationRule, RuleContext, RuleTarget, Statement, TouchTimestamp};
pub use executor::{Executor, QueryOptions};
pub use hilo::HiLoAllocator;
pub use retry::with_deadlock_retry;
pub use session::{Session, WriteOptions};
