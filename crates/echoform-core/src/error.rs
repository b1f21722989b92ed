// SPDX-FileCopyrightText: 2026 Echoform Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Echoform pipeline.

use thiserror::Error;

/// The primary error type used across all Echoform adapter traits and
/// pipeline operations.
#[derive(Debug, Error)]
pub enum EchoformError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Caller-supplied input was rejected (bad cutoff date, malformed identifier).
    #[error("validation error: {0}")]
    Validation(String),

    /// A server-wide ceiling (active session limit) would be exceeded.
    #[error("capacity error: {0}")]
    Capacity(String),

    /// A required entity (profile, session, model) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Collected data violates a dataset constraint.
    #[error("data integrity error: {0}")]
    DataIntegrity(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// External service errors (inference backend unreachable, chat platform failure).
    #[error("external service error: {message}")]
    ExternalService {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// A newer job for the same profile key replaced this one mid-flight.
    #[error("job superseded by a newer request for the same profile")]
    Superseded,

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
