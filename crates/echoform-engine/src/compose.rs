// SPDX-FileCopyrightText: 2026 Echoform Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt composition and response post-processing.

use echoform_core::types::ChatMessage;

/// Share of the length limit a sentence boundary must reach for truncation
/// to prefer it over a hard cut.
const SENTENCE_BOUNDARY_RATIO: f64 = 0.7;

/// Build the generation prompt from channel history and the immediate
/// conversation context.
///
/// Uses up to the last three history lines followed by up to the last two
/// context turns; with neither, falls back to a generic continuation
/// instruction.
pub fn build_prompt(history: &[ChatMessage], context: &[ChatMessage]) -> String {
    if history.is_empty() && context.is_empty() {
        return "Continue the conversation naturally, in your usual style.".to_string();
    }

    let mut lines: Vec<String> = history
        .iter()
        .rev()
        .take(3)
        .rev()
        .map(|m| m.content.clone())
        .collect();
    lines.extend(
        context
            .iter()
            .rev()
            .take(2)
            .rev()
            .map(|m| m.content.clone()),
    );
    format!(
        "Recent conversation:\n{}\n\nRespond naturally, in your usual style.",
        lines.join("\n")
    )
}

/// Clean a raw model response for sending.
///
/// Strips leaked role prefixes, normalizes whitespace, and truncates to
/// `max_length` preferring a sentence boundary.
pub fn postprocess(raw: &str, max_length: usize) -> String {
    let mut text = raw.trim().to_string();

    for prefix in ["User:", "Assistant:", "AI:"] {
        if let Some(stripped) = text.strip_prefix(prefix) {
            text = stripped.trim_start().to_string();
        }
    }

    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_at_sentence(&text, max_length)
}

/// Truncate to `max_length` characters, cutting at the last sentence
/// boundary when one lands in the final 30% of the window; otherwise hard
/// cut with an ellipsis.
pub fn truncate_at_sentence(text: &str, max_length: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_length {
        return text.to_string();
    }

    let window: String = chars[..max_length].iter().collect();
    let boundary = window
        .char_indices()
        .filter(|(_, c)| matches!(c, '.' | '!' | '?'))
        .map(|(i, c)| i + c.len_utf8())
        .next_back();

    let threshold = (max_length as f64 * SENTENCE_BOUNDARY_RATIO) as usize;
    match boundary {
        Some(end) if window[..end].chars().count() >= threshold => window[..end].to_string(),
        _ => {
            let keep: String = chars[..max_length.saturating_sub(3)].iter().collect();
            format!("{}...", keep.trim_end())
        }
    }
}
