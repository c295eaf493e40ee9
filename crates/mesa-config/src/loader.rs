// SPDX-FileCopyrightText: 2026 Mesa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./mesa.toml` > `~/.config/mesa/mesa.toml` >
//! `/etc/mesa/mesa.toml` with environment variable overrides via the
//! `MESA_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::MesaConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/mesa/mesa.toml` (system-wide)
/// 3. `~/.config/mesa/mesa.toml` (user XDG config)
/// 4. `./mesa.toml` (local directory)
/// 5. `MESA_*` environment variables
pub fn load_config() -> Result<MesaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MesaConfig::default()))
        .merge(Toml::file("/etc/mesa/mesa.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("mesa/mesa.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("mesa.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<MesaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MesaConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<MesaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MesaConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider with explicit section mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` so underscore-containing
/// key names stay unambiguous: `MESA_STORAGE_DATABASE_PATH` must map to
/// `storage.database_path`, not `storage.database.path`. The key arrives in
/// its original environment casing, so lowercase it before matching the
/// section prefixes.
fn env_provider() -> Env {
    Env::prefixed("MESA_").map(|key| {
        let lowered = key.as_str().to_ascii_lowercase();
        let mapped = lowered
            .replacen("service_", "service.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("events_", "events.", 1);
        mapped.into()
    })
}
