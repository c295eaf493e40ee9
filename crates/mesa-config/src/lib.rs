// SPDX-FileCopyrightText: 2026 Mesa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Mesa helpdesk core.
//!
//! Layered TOML configuration with environment variable overrides, following
//! the XDG hierarchy. Unknown keys are rejected at load time.

pub mod loader;
pub mod model;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{EventsConfig, MesaConfig, ServiceConfig, StorageConfig};
