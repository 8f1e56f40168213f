// SPDX-FileCopyrightText: 2026 Flock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./flock.toml` > `~/.config/flock/flock.toml` >
//! `/etc/flock/flock.toml` with environment variable overrides via the
//! `FLOCK_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::FlockConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/flock/flock.toml` (system-wide)
/// 3. `~/.config/flock/flock.toml` (user XDG config)
/// 4. `./flock.toml` (local directory)
/// 5. `FLOCK_*` environment variables
pub fn load_config() -> Result<FlockConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FlockConfig::default()))
        .merge(Toml::file("/etc/flock/flock.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("flock/flock.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("flock.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit config files.
pub fn load_config_from_str(toml_content: &str) -> Result<FlockConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FlockConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<FlockConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FlockConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `FLOCK_SERVICE_QUEUE_LIMIT` must map to
/// `service.queue_limit`, not `service.queue.limit`.
fn env_provider() -> Env {
    Env::prefixed("FLOCK_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("service_", "service.", 1)
            .replacen("openai_", "openai.", 1)
            .replacen("signal_", "signal.", 1)
            .replacen("content_", "content.", 1)
            .replacen("storage_", "storage.", 1);
        mapped.into()
    })
}
