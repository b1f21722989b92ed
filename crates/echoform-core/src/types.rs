// SPDX-FileCopyrightText: 2026 Echoform Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Echoform pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Identifies one profile: the (member, server) pair the echo is derived from.
///
/// Identifiers are opaque strings supplied by the chat platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProfileKey {
    pub user_id: String,
    pub server_id: String,
}

impl ProfileKey {
    pub fn new(user_id: impl Into<String>, server_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            server_id: server_id.into(),
        }
    }
}

impl std::fmt::Display for ProfileKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.user_id, self.server_id)
    }
}

/// Lifecycle state of a profile's training pipeline.
///
/// `Completed` and `Failed` are restartable: a fresh analysis request moves
/// the profile back to `Collecting`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize, Default,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TrainingStatus {
    #[default]
    NotStarted,
    Collecting,
    AnalysisCompleted,
    Training,
    Completed,
    Failed,
}

/// A persisted echo profile row.
///
/// Timestamps are RFC 3339 strings as stored in SQLite TEXT columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: String,
    pub server_id: String,
    pub training_status: TrainingStatus,
    /// Advisory progress percentage (0-100); never used for control flow.
    pub training_progress: i64,
    pub cutoff_date: String,
    pub dataset_ref: Option<String>,
    pub model_ref: Option<String>,
    pub error_message: Option<String>,
    pub requester_id: String,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub last_updated: String,
}

impl Profile {
    pub fn key(&self) -> ProfileKey {
        ProfileKey::new(self.user_id.clone(), self.server_id.clone())
    }

    /// A profile is usable for sessions once training finished and a model
    /// reference was recorded.
    pub fn is_ready(&self) -> bool {
        self.training_status == TrainingStatus::Completed && self.model_ref.is_some()
    }
}

/// One collected source message, persisted for preprocessing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusEntry {
    pub id: String,
    pub user_id: String,
    pub server_id: String,
    pub channel_id: String,
    pub content: String,
    pub posted_at: String,
}

/// A persisted echo session row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EchoSession {
    pub id: String,
    pub user_id: String,
    pub server_id: String,
    pub channel_id: String,
    pub requester_id: String,
    pub is_active: bool,
    pub messages_generated: i64,
    pub conversations_started: i64,
    pub started_at: String,
    pub stopped_at: Option<String>,
    pub last_activity: String,
}

/// Audit record for one autonomous response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEvent {
    pub id: String,
    pub session_id: String,
    pub content: String,
    /// JSON snapshot of the channel context the response was generated from.
    pub context_snapshot: Option<String>,
    pub latency_ms: i64,
    pub created_at: String,
}

/// A message observed on the chat platform, as returned by a [`ChatAdapter`].
///
/// [`ChatAdapter`]: crate::traits::ChatAdapter
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: String,
    pub author_id: String,
    pub channel_id: String,
    pub content: String,
    pub posted_at: DateTime<Utc>,
    pub author_is_bot: bool,
}

/// A channel visible to the service account on a server.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelInfo {
    pub id: String,
    pub name: String,
}

/// Per-channel permissions granted to the service account.
///
/// Collection and response both require the full set; channels missing any
/// capability are skipped rather than failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelCapabilities {
    pub read_messages: bool,
    pub read_history: bool,
    pub send_messages: bool,
    pub embed_links: bool,
}

impl ChannelCapabilities {
    pub fn all() -> Self {
        Self {
            read_messages: true,
            read_history: true,
            send_messages: true,
            embed_links: true,
        }
    }

    pub fn has_all(&self) -> bool {
        self.read_messages && self.read_history && self.send_messages && self.embed_links
    }
}

/// One prompt/response exemplar in a training dataset artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingPair {
    pub prompt: String,
    pub response: String,
    pub metadata: PairMetadata,
}

/// Provenance for a training pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairMetadata {
    pub timestamp: String,
    pub channel_id: String,
    pub message_index: usize,
}

/// A chat-completion message sent to an inference backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceMessage {
    pub role: String,
    pub content: String,
}

impl InferenceMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Sampling options for a chat-completion request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationOptions {
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<u32>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.8,
            top_p: 0.9,
            top_k: 40,
            num_predict: Some(200),
        }
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter in the plugin registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
pub enum AdapterType {
    Chat,
    Inference,
    Storage,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn training_status_round_trips_through_strings() {
        let variants = [
            TrainingStatus::NotStarted,
            TrainingStatus::Collecting,
            TrainingStatus::AnalysisCompleted,
            TrainingStatus::Training,
            TrainingStatus::Completed,
            TrainingStatus::Failed,
        ];
        for variant in &variants {
            let s = variant.to_string();
            let parsed = TrainingStatus::from_str(&s).expect("should parse back");
            assert_eq!(*variant, parsed);
        }
        assert_eq!(TrainingStatus::NotStarted.to_string(), "not_started");
        assert_eq!(
            TrainingStatus::AnalysisCompleted.to_string(),
            "analysis_completed"
        );
    }

    #[test]
    fn profile_readiness_requires_completed_status_and_model_ref() {
        let mut profile = Profile {
            user_id: "u1".into(),
            server_id: "s1".into(),
            training_status: TrainingStatus::Completed,
            training_progress: 100,
            cutoff_date: "2025-06-01T00:00:00Z".into(),
            dataset_ref: Some("/data/set.json".into()),
            model_ref: Some("echo_user_u1_server_s1_20250601_120000".into()),
            error_message: None,
            requester_id: "r1".into(),
            started_at: "2025-06-01T00:00:00Z".into(),
            completed_at: Some("2025-06-01T01:00:00Z".into()),
            last_updated: "2025-06-01T01:00:00Z".into(),
        };
        assert!(profile.is_ready());

        profile.model_ref = None;
        assert!(!profile.is_ready());

        profile.model_ref = Some("m".into());
        profile.training_status = TrainingStatus::Training;
        assert!(!profile.is_ready());
    }

    #[test]
    fn capabilities_has_all_requires_every_flag() {
        assert!(ChannelCapabilities::all().has_all());

        let partial = ChannelCapabilities {
            read_messages: true,
            read_history: true,
            send_messages: true,
            embed_links: false,
        };
        assert!(!partial.has_all());
        assert!(!ChannelCapabilities::default().has_all());
    }

    #[test]
    fn profile_key_display() {
        let key = ProfileKey::new("42", "99");
        assert_eq!(key.to_string(), "42/99");
    }
}
