// SPDX-FileCopyrightText: 2026 Echoform Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message collection across a server's channels.
//!
//! Walks every channel the service account can fully access and gathers the
//! target member's messages posted before the cutoff, up to a hard cap.
//! Channels with missing capabilities are skipped, not failed.

use chrono::{DateTime, Utc};
use echoform_core::traits::ChatAdapter;
use echoform_core::{EchoformError, ProfileKey};
use echoform_core::types::ChatMessage;
use tracing::{debug, info};

use crate::text;

/// Messages fetched per history page while walking a channel backwards.
const HISTORY_PAGE: usize = 200;

/// Collect up to `max_messages` of the target member's usable messages
/// across all accessible channels on the server, oldest unbounded, newest
/// before `cutoff`.
///
/// Only the target's own non-bot messages that pass the training-validity
/// check count against the cap; other members' traffic is paged past, so a
/// busy channel cannot crowd the target's history out of the window.
pub async fn collect_messages(
    chat: &dyn ChatAdapter,
    key: &ProfileKey,
    cutoff: DateTime<Utc>,
    max_messages: usize,
) -> Result<Vec<ChatMessage>, EchoformError> {
    let channels = chat.list_channels(&key.server_id).await?;
    let mut collected = Vec::new();

    for channel in &channels {
        if collected.len() >= max_messages {
            info!(
                key = %key,
                cap = max_messages,
                "collection cap reached, stopping channel walk"
            );
            break;
        }

        let caps = chat.capabilities_in(&channel.id).await?;
        if !caps.has_all() {
            debug!(channel = %channel.name, "skipping channel with missing capabilities");
            continue;
        }

        let before = collected.len();
        let mut page_cursor = cutoff;
        loop {
            let page = chat
                .history_before(&channel.id, page_cursor, HISTORY_PAGE)
                .await?;
            let exhausted = page.len() < HISTORY_PAGE;
            // Pages are newest first; the oldest entry anchors the next page.
            let Some(oldest) = page.last().map(|m| m.posted_at) else {
                break;
            };

            for message in page {
                if message.author_id == key.user_id
                    && !message.author_is_bot
                    && text::is_valid_for_training(&message.content)
                {
                    collected.push(message);
                    if collected.len() >= max_messages {
                        break;
                    }
                }
            }

            if exhausted || collected.len() >= max_messages {
                break;
            }
            page_cursor = oldest;
        }
        debug!(
            channel = %channel.name,
            gathered = collected.len() - before,
            "channel collected"
        );
    }

    info!(key = %key, total = collected.len(), "collection complete");
    Ok(collected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use echoform_core::types::ChannelCapabilities;
    use echoform_test_utils::{MockChat, message};

    fn t(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, day, hour, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn collects_only_target_author_before_cutoff() {
        let chat = MockChat::new();
        chat.add_channel("srv", "chan", "general").await;
        chat.add_history(
            "chan",
            vec![
                message("m1", "target", "chan", "mine, old enough", t(1, 0)),
                message("m2", "other", "chan", "not mine", t(1, 1)),
                message("m3", "target", "chan", "mine, after cutoff", t(10, 0)),
            ],
        )
        .await;

        let key = ProfileKey::new("target", "srv");
        let collected = collect_messages(&chat, &key, t(5, 0), 100).await.unwrap();
        assert_eq!(collected.len(), 1);
        assert_eq!(collected[0].id, "m1");
    }

    #[tokio::test]
    async fn skips_channels_without_full_capabilities() {
        let chat = MockChat::new();
        chat.add_channel("srv", "open", "open").await;
        chat.add_channel("srv", "locked", "locked").await;
        chat.set_capabilities(
            "locked",
            ChannelCapabilities {
                read_messages: true,
                read_history: false,
                send_messages: true,
                embed_links: true,
            },
        )
        .await;

        chat.add_history("open", vec![message("m1", "u", "open", "visible", t(1, 0))])
            .await;
        chat.add_history(
            "locked",
            vec![message("m2", "u", "locked", "hidden", t(1, 0))],
        )
        .await;

        let key = ProfileKey::new("u", "srv");
        let collected = collect_messages(&chat, &key, t(5, 0), 100).await.unwrap();
        assert_eq!(collected.len(), 1);
        assert_eq!(collected[0].id, "m1");
    }

    #[tokio::test]
    async fn collection_stops_at_the_cap() {
        let chat = MockChat::new();
        chat.add_channel("srv", "chan-a", "a").await;
        chat.add_channel("srv", "chan-b", "b").await;

        let many: Vec<_> = (0..8)
            .map(|i| {
                message(
                    &format!("a{i}"),
                    "u",
                    "chan-a",
                    "hello there",
                    t(1, i as u32),
                )
            })
            .collect();
        chat.add_history("chan-a", many).await;
        chat.add_history("chan-b", vec![message("b0", "u", "chan-b", "more", t(1, 0))])
            .await;

        let key = ProfileKey::new("u", "srv");
        let collected = collect_messages(&chat, &key, t(5, 0), 5).await.unwrap();
        assert_eq!(collected.len(), 5);
    }

    #[tokio::test]
    async fn busy_channel_traffic_does_not_crowd_out_the_target() {
        let chat = MockChat::new();
        chat.add_channel("srv", "chan", "general").await;

        // One target message buried under newer chatter from others.
        let mut history = vec![message("mine", "target", "chan", "the one that matters", t(1, 0))];
        for i in 0..5 {
            history.push(message(
                &format!("o{i}"),
                "other",
                "chan",
                "unrelated chatter",
                t(2, i),
            ));
        }
        chat.add_history("chan", history).await;

        let key = ProfileKey::new("target", "srv");
        let collected = collect_messages(&chat, &key, t(5, 0), 5).await.unwrap();
        assert_eq!(collected.len(), 1);
        assert_eq!(collected[0].id, "mine");
    }

    #[tokio::test]
    async fn collection_pages_past_one_history_window() {
        let chat = MockChat::new();
        chat.add_channel("srv", "chan", "general").await;

        // The target's message sits beyond the first page of other traffic.
        let mut history = vec![message("mine", "target", "chan", "buried deep down", t(1, 0))];
        for i in 0..(HISTORY_PAGE + 20) {
            history.push(message(
                &format!("o{i}"),
                "other",
                "chan",
                "page filler text",
                t(2, 0) + chrono::Duration::seconds(i as i64),
            ));
        }
        chat.add_history("chan", history).await;

        let key = ProfileKey::new("target", "srv");
        let collected = collect_messages(&chat, &key, t(5, 0), 100).await.unwrap();
        assert_eq!(collected.len(), 1);
        assert_eq!(collected[0].id, "mine");
    }

    #[tokio::test]
    async fn unusable_messages_do_not_consume_the_cap() {
        let chat = MockChat::new();
        chat.add_channel("srv", "chan", "general").await;
        chat.add_history(
            "chan",
            vec![
                message("m1", "u", "chan", "a proper keeper", t(1, 0)),
                message("m2", "u", "chan", "!rank check", t(1, 1)),
                message("m3", "u", "chan", "ok", t(1, 2)),
                message("m4", "u", "chan", "another proper keeper", t(1, 3)),
            ],
        )
        .await;

        let key = ProfileKey::new("u", "srv");
        let collected = collect_messages(&chat, &key, t(5, 0), 2).await.unwrap();
        let ids: Vec<&str> = collected.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m4", "m1"]);
    }

    #[tokio::test]
    async fn bot_messages_are_excluded() {
        let chat = MockChat::new();
        chat.add_channel("srv", "chan", "general").await;
        let mut bot_msg = message("m1", "u", "chan", "beep boop", t(1, 0));
        bot_msg.author_is_bot = true;
        chat.add_history(
            "chan",
            vec![bot_msg, message("m2", "u", "chan", "human words", t(1, 1))],
        )
        .await;

        let key = ProfileKey::new("u", "srv");
        let collected = collect_messages(&chat, &key, t(5, 0), 100).await.unwrap();
        assert_eq!(collected.len(), 1);
        assert_eq!(collected[0].id, "m2");
    }
}
