// SPDX-FileCopyrightText: 2026 Echoform Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Echoform pipeline.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Echoform configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EchoformConfig {
    /// Service identity and logging settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Ollama inference backend settings.
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Echo session limits.
    #[serde(default)]
    pub session: SessionConfig,

    /// Autonomous response behavior.
    #[serde(default)]
    pub response: ResponseConfig,

    /// Corpus collection window.
    #[serde(default)]
    pub corpus: CorpusConfig,

    /// Retention horizons for background sweeps.
    #[serde(default)]
    pub retention: RetentionConfig,
}

/// Service identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the service.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "echoform".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Ollama inference backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OllamaConfig {
    /// Base URL of the Ollama HTTP API.
    #[serde(default = "default_ollama_host")]
    pub host: String,

    /// Base model every persona model is derived from.
    #[serde(default = "default_base_model")]
    pub base_model: String,

    /// Training epochs recorded in the persona spec metadata.
    #[serde(default = "default_training_epochs")]
    pub training_epochs: u32,

    /// Training batch size recorded in the persona spec metadata.
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: default_ollama_host(),
            base_model: default_base_model(),
            training_epochs: default_training_epochs(),
            batch_size: default_batch_size(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_ollama_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_base_model() -> String {
    "dolphin3:latest".to_string()
}

fn default_training_epochs() -> u32 {
    10
}

fn default_batch_size() -> u32 {
    4
}

fn default_request_timeout_secs() -> u64 {
    120
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Directory where training dataset artifacts are written.
    #[serde(default = "default_dataset_dir")]
    pub dataset_dir: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            dataset_dir: default_dataset_dir(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("echoform").join("echoform.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("echoform.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_dataset_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("echoform").join("datasets"))
        .unwrap_or_else(|| std::path::PathBuf::from("datasets"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Echo session limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Maximum concurrently active sessions per server.
    #[serde(default = "default_max_active_per_server")]
    pub max_active_per_server: usize,

    /// Sessions idle longer than this many hours are expired by the
    /// liveness sweep.
    #[serde(default = "default_idle_horizon_hours")]
    pub idle_horizon_hours: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_active_per_server: default_max_active_per_server(),
            idle_horizon_hours: default_idle_horizon_hours(),
        }
    }
}

fn default_max_active_per_server() -> usize {
    5
}

fn default_idle_horizon_hours() -> u64 {
    24
}

/// Autonomous response behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ResponseConfig {
    /// Hard cap on response length in characters.
    #[serde(default = "default_max_length")]
    pub max_length: usize,

    /// Minimum simulated thinking delay in seconds.
    #[serde(default = "default_thinking_delay_min_secs")]
    pub thinking_delay_min_secs: u64,

    /// Maximum simulated thinking delay in seconds.
    #[serde(default = "default_thinking_delay_max_secs")]
    pub thinking_delay_max_secs: u64,

    /// Minimum simulated typing delay in seconds.
    #[serde(default = "default_typing_delay_min_secs")]
    pub typing_delay_min_secs: u64,

    /// Maximum simulated typing delay in seconds.
    #[serde(default = "default_typing_delay_max_secs")]
    pub typing_delay_max_secs: u64,

    /// Probability of initiating a conversation unprompted (0.0-1.0).
    #[serde(default = "default_initiation_chance")]
    pub initiation_chance: f64,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            max_length: default_max_length(),
            thinking_delay_min_secs: default_thinking_delay_min_secs(),
            thinking_delay_max_secs: default_thinking_delay_max_secs(),
            typing_delay_min_secs: default_typing_delay_min_secs(),
            typing_delay_max_secs: default_typing_delay_max_secs(),
            initiation_chance: default_initiation_chance(),
        }
    }
}

fn default_max_length() -> usize {
    2000
}

fn default_thinking_delay_min_secs() -> u64 {
    2
}

fn default_thinking_delay_max_secs() -> u64 {
    8
}

fn default_typing_delay_min_secs() -> u64 {
    1
}

fn default_typing_delay_max_secs() -> u64 {
    4
}

fn default_initiation_chance() -> f64 {
    0.05
}

/// Corpus collection window.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CorpusConfig {
    /// Minimum messages required for a usable dataset.
    #[serde(default = "default_min_messages")]
    pub min_messages: usize,

    /// Collection stops once this many messages are gathered.
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            min_messages: default_min_messages(),
            max_messages: default_max_messages(),
        }
    }
}

fn default_min_messages() -> usize {
    50
}

fn default_max_messages() -> usize {
    10_000
}

/// Retention horizons for background sweeps.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetentionConfig {
    /// Corpus entries and response events older than this are deleted.
    #[serde(default = "default_data_days")]
    pub data_days: u32,

    /// Persona models older than this are deleted from the backend.
    #[serde(default = "default_model_days")]
    pub model_days: u32,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            data_days: default_data_days(),
            model_days: default_model_days(),
        }
    }
}

fn default_data_days() -> u32 {
    30
}

fn default_model_days() -> u32 {
    7
}
