// SPDX-FileCopyrightText: 2026 Echoform Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as ordered delay ranges and a coherent corpus window.

use crate::diagnostic::ConfigError;
use crate::model::EchoformConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &EchoformConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.storage.dataset_dir.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.dataset_dir must not be empty".to_string(),
        });
    }

    let host = config.ollama.host.trim();
    if !host.starts_with("http://") && !host.starts_with("https://") {
        errors.push(ConfigError::Validation {
            message: format!("ollama.host `{host}` must be an http(s) URL"),
        });
    }

    if config.ollama.base_model.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "ollama.base_model must not be empty".to_string(),
        });
    }

    if config.session.max_active_per_server == 0 {
        errors.push(ConfigError::Validation {
            message: "session.max_active_per_server must be at least 1".to_string(),
        });
    }

    if config.corpus.min_messages == 0 {
        errors.push(ConfigError::Validation {
            message: "corpus.min_messages must be at least 1".to_string(),
        });
    }

    if config.corpus.min_messages > config.corpus.max_messages {
        errors.push(ConfigError::Validation {
            message: format!(
                "corpus.min_messages ({}) must not exceed corpus.max_messages ({})",
                config.corpus.min_messages, config.corpus.max_messages
            ),
        });
    }

    if config.response.max_length == 0 {
        errors.push(ConfigError::Validation {
            message: "response.max_length must be at least 1".to_string(),
        });
    }

    if config.response.thinking_delay_min_secs > config.response.thinking_delay_max_secs {
        errors.push(ConfigError::Validation {
            message: format!(
                "response.thinking_delay_min_secs ({}) must not exceed thinking_delay_max_secs ({})",
                config.response.thinking_delay_min_secs, config.response.thinking_delay_max_secs
            ),
        });
    }

    if config.response.typing_delay_min_secs > config.response.typing_delay_max_secs {
        errors.push(ConfigError::Validation {
            message: format!(
                "response.typing_delay_min_secs ({}) must not exceed typing_delay_max_secs ({})",
                config.response.typing_delay_min_secs, config.response.typing_delay_max_secs
            ),
        });
    }

    if !(0.0..=1.0).contains(&config.response.initiation_chance) {
        errors.push(ConfigError::Validation {
            message: format!(
                "response.initiation_chance must be between 0.0 and 1.0, got {}",
                config.response.initiation_chance
            ),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
