// SPDX-FileCopyrightText: 2026 Echoform Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat adapter trait for the platform the echoes live on.
//!
//! The transport itself (gateway connection, slash commands, rate limiting)
//! is out of scope; the pipeline consumes the platform purely through this
//! capability surface.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::EchoformError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChannelCapabilities, ChannelInfo, ChatMessage};

/// Adapter for the chat platform hosting the analyzed members.
#[async_trait]
pub trait ChatAdapter: PluginAdapter {
    /// Lists the text channels visible on a server.
    async fn list_channels(&self, server_id: &str) -> Result<Vec<ChannelInfo>, EchoformError>;

    /// Returns the service account's permissions in a channel.
    async fn capabilities_in(
        &self,
        channel_id: &str,
    ) -> Result<ChannelCapabilities, EchoformError>;

    /// Returns up to `limit` messages posted strictly before `cutoff`,
    /// newest first.
    async fn history_before(
        &self,
        channel_id: &str,
        cutoff: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, EchoformError>;

    /// Sends a message to a channel.
    async fn send(&self, channel_id: &str, text: &str) -> Result<(), EchoformError>;

    /// Shows a typing indicator in a channel.
    async fn typing(&self, channel_id: &str) -> Result<(), EchoformError>;
}
