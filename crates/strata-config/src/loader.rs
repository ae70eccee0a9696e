// SPDX-FileCopyrightText: 2026 Strata Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Merge order (later overrides earlier): compiled defaults, then
//! `./strata.toml`, then `STRATA_*` environment variables.

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use strata_core::StrataError;

use crate::model::SessionConfig;

/// Load configuration from `./strata.toml` with env var overrides.
pub fn load_config() -> Result<SessionConfig, StrataError> {
    extract(
        Figment::new()
            .merge(Serialized::defaults(SessionConfig::default()))
            .merge(Toml::file("strata.toml"))
            .merge(env_provider()),
    )
}

/// Load configuration from a TOML string (no file lookup, no env).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<SessionConfig, StrataError> {
    extract(
        Figment::new()
            .merge(Serialized::defaults(SessionConfig::default()))
            .merge(Toml::string(toml_content)),
    )
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<SessionConfig, StrataError> {
    extract(
        Figment::new()
            .merge(Serialized::defaults(SessionConfig::default()))
            .merge(Toml::file(path))
            .merge(env_provider()),
    )
}

fn extract(figment: Figment) -> Result<SessionConfig, StrataError> {
    figment
        .extract()
        .map_err(|err| StrataError::Config(err.to_string()))
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping. `Env::split("_")` would misparse keys that
/// themselves contain underscores, e.g. `STRATA_BULK_CHUNK_SIZE` must map
/// to `bulk.chunk_size`, not `bulk.chunk.size`.
fn env_provider() -> Env {
    Env::prefixed("STRATA_").map(|key| {
        let mapped = key
            .as_str()
            .replacen("hilo_", "hilo.", 1)
            .replacen("bulk_", "bulk.", 1)
            .replacen("retry_", "retry.", 1);
        mapped.into()
    })
}
