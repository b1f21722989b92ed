// SPDX-FileCopyrightText: 2026 Echoform Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The response decision: whether an echo should speak.
//!
//! `decide` is pure over the channel context so every branch is directly
//! testable; the Bernoulli sampling step is separate. Probabilities are
//! deliberately conservative: an echo that speaks too often is worse than
//! one that speaks too rarely.

use chrono::{DateTime, Duration, Utc};
use echoform_core::types::ChatMessage;
use rand::Rng;

/// Fixed probability for responding into an active conversation.
const ACTIVE_CONVERSATION_PROBABILITY: f64 = 0.25;

/// Scale factor for the activity-based probability in quiet channels.
const QUIET_CHANNEL_SCALE: f64 = 0.15;

/// Outcome of the pure decision step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    /// Never respond (echo spoke last, message too fresh, empty channel).
    Veto,
    /// Respond unconditionally (the target was mentioned).
    Respond,
    /// Respond with the given probability.
    Sample(f64),
}

/// Decide whether the echo of `target_user_id` should respond to the channel
/// state in `recent` (oldest first, newest last).
pub fn decide(target_user_id: &str, recent: &[ChatMessage], now: DateTime<Utc>) -> Decision {
    let Some(last) = recent.last() else {
        return Decision::Veto;
    };

    // Never reply to the person being echoed or to another bot: both paths
    // loop.
    if last.author_id == target_user_id || last.author_is_bot {
        return Decision::Veto;
    }

    if mentions(&last.content, target_user_id) {
        return Decision::Respond;
    }

    let age = now.signed_duration_since(last.posted_at);
    if age < Duration::seconds(10) {
        // Let humans finish typing their follow-ups.
        return Decision::Veto;
    }
    if age < Duration::minutes(5) {
        return Decision::Sample(ACTIVE_CONVERSATION_PROBABILITY);
    }

    let recent_count = recent
        .iter()
        .filter(|m| now.signed_duration_since(m.posted_at) < Duration::hours(1))
        .count();
    let activity = recent_count.min(10) as f64 / 10.0;
    Decision::Sample(activity * QUIET_CHANNEL_SCALE)
}

/// Whether `content` mentions the user via platform mention markup.
fn mentions(content: &str, user_id: &str) -> bool {
    content.contains(&format!("<@{user_id}>")) || content.contains(&format!("<@!{user_id}>"))
}

/// Bernoulli sample against a decision probability.
pub fn sample(probability: f64, rng: &mut impl Rng) -> bool {
    rng.gen_bool(probability.clamp(0.0, 1.0))
}

/// Simulated (thinking, typing) pauses before a response is sent.
///
/// The thinking pause runs before the typing indicator is shown, the typing
/// pause after. Purely pacing; no correctness implication.
pub fn response_delay(
    thinking_range: (u64, u64),
    typing_range: (u64, u64),
    rng: &mut impl Rng,
) -> (std::time::Duration, std::time::Duration) {
    let thinking = rng.gen_range(thinking_range.0..=thinking_range.1);
    let typing = rng.gen_range(typing_range.0..=typing_range.1);
    (
        std::time::Duration::from_secs(thinking),
        std::time::Duration::from_secs(typing),
    )
}
