// SPDX-FileCopyrightText: 2026 Strata Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Strata session layer.
//!
//! Provides TOML configuration parsing with strict validation
//! (`deny_unknown_fields`) and environment variable overrides.
//!
//! # Usage
//!
//! ```no_run
//! let config = strata_config::load_config().expect("config errors");
//! println!("chunk size: {}", config.bulk.chunk_size);
//! ```

pub mod loader;
pub mod model;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{BulkConfig, HiLoConfig, RetryConfig, SessionConfig};
