// SPDX-FileCopyrightText: 2026 Echoform Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock chat platform adapter for deterministic testing.
//!
//! `MockChat` implements `ChatAdapter` over in-memory channel and message
//! fixtures. Sent messages and typing calls are recorded so tests can assert
//! on outbound behavior.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use echoform_core::EchoformError;
use echoform_core::traits::adapter::PluginAdapter;
use echoform_core::traits::chat::ChatAdapter;
use echoform_core::types::{
    AdapterType, ChannelCapabilities, ChannelInfo, ChatMessage, HealthStatus,
};

/// A mock chat platform backed by in-memory fixtures.
pub struct MockChat {
    channels: Arc<Mutex<HashMap<String, Vec<ChannelInfo>>>>,
    capabilities: Arc<Mutex<HashMap<String, ChannelCapabilities>>>,
    history: Arc<Mutex<HashMap<String, Vec<ChatMessage>>>>,
    sent: Arc<Mutex<Vec<(String, String)>>>,
    typing_calls: Arc<Mutex<Vec<String>>>,
}

impl MockChat {
    pub fn new() -> Self {
        Self {
            channels: Arc::new(Mutex::new(HashMap::new())),
            capabilities: Arc::new(Mutex::new(HashMap::new())),
            history: Arc::new(Mutex::new(HashMap::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            typing_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Register a channel on a server with full capabilities.
    pub async fn add_channel(&self, server_id: &str, channel_id: &str, name: &str) {
        self.channels
            .lock()
            .await
            .entry(server_id.to_string())
            .or_default()
            .push(ChannelInfo {
                id: channel_id.to_string(),
                name: name.to_string(),
            });
        self.capabilities
            .lock()
            .await
            .insert(channel_id.to_string(), ChannelCapabilities::all());
    }

    /// Override the capabilities reported for a channel.
    pub async fn set_capabilities(&self, channel_id: &str, caps: ChannelCapabilities) {
        self.capabilities
            .lock()
            .await
            .insert(channel_id.to_string(), caps);
    }

    /// Seed the message history of a channel.
    pub async fn add_history(&self, channel_id: &str, messages: Vec<ChatMessage>) {
        self.history
            .lock()
            .await
            .entry(channel_id.to_string())
            .or_default()
            .extend(messages);
    }

    /// Messages sent through the adapter, as (channel_id, text) pairs.
    pub async fn sent_messages(&self) -> Vec<(String, String)> {
        self.sent.lock().await.clone()
    }

    /// Channels a typing indicator was shown in, in call order.
    pub async fn typing_channels(&self) -> Vec<String> {
        self.typing_calls.lock().await.clone()
    }
}

impl Default for MockChat {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChat {
    fn name(&self) -> &str {
        "mock-chat"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Chat
    }

    async fn health_check(&self) -> Result<HealthStatus, EchoformError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), EchoformError> {
        Ok(())
    }
}

#[async_trait]
impl ChatAdapter for MockChat {
    async fn list_channels(&self, server_id: &str) -> Result<Vec<ChannelInfo>, EchoformError> {
        Ok(self
            .channels
            .lock()
            .await
            .get(server_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn capabilities_in(
        &self,
        channel_id: &str,
    ) -> Result<ChannelCapabilities, EchoformError> {
        Ok(self
            .capabilities
            .lock()
            .await
            .get(channel_id)
            .copied()
            .unwrap_or_default())
    }

    async fn history_before(
        &self,
        channel_id: &str,
        cutoff: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, EchoformError> {
        let history = self.history.lock().await;
        let mut messages: Vec<ChatMessage> = history
            .get(channel_id)
            .map(|msgs| {
                msgs.iter()
                    .filter(|m| m.posted_at < cutoff)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        // Newest first, matching real platform pagination.
        messages.sort_by(|a, b| b.posted_at.cmp(&a.posted_at));
        messages.truncate(limit);
        Ok(messages)
    }

    async fn send(&self, channel_id: &str, text: &str) -> Result<(), EchoformError> {
        self.sent
            .lock()
            .await
            .push((channel_id.to_string(), text.to_string()));
        Ok(())
    }

    async fn typing(&self, channel_id: &str) -> Result<(), EchoformError> {
        self.typing_calls.lock().await.push(channel_id.to_string());
        Ok(())
    }
}

/// Build a chat message fixture with sane defaults.
pub fn message(
    id: &str,
    author_id: &str,
    channel_id: &str,
    content: &str,
    posted_at: DateTime<Utc>,
) -> ChatMessage {
    ChatMessage {
        id: id.to_string(),
        author_id: author_id.to_string(),
        channel_id: channel_id.to_string(),
        content: content.to_string(),
        posted_at,
        author_is_bot: false,
    }
}
