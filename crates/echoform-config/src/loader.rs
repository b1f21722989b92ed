// SPDX-FileCopyrightText: 2026 Echoform Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./echoform.toml` > `~/.config/echoform/echoform.toml`
//! > `/etc/echoform/echoform.toml` with environment variable overrides via
//! `ECHOFORM_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::EchoformConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/echoform/echoform.toml` (system-wide)
/// 3. `~/.config/echoform/echoform.toml` (user XDG config)
/// 4. `./echoform.toml` (local directory)
/// 5. `ECHOFORM_*` environment variables
pub fn load_config() -> Result<EchoformConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(EchoformConfig::default()))
        .merge(Toml::file("/etc/echoform/echoform.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("echoform/echoform.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("echoform.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<EchoformConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(EchoformConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<EchoformConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(EchoformConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. `ECHOFORM_OLLAMA_BASE_MODEL` must map to
/// `ollama.base_model`, not `ollama.base.model`.
fn env_provider() -> Env {
    Env::prefixed("ECHOFORM_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: ECHOFORM_OLLAMA_BASE_MODEL -> "ollama_base_model"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("ollama_", "ollama.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("session_", "session.", 1)
            .replacen("response_", "response.", 1)
            .replacen("corpus_", "corpus.", 1)
            .replacen("retention_", "retention.", 1);
        mapped.into()
    })
}
