// SPDX-FileCopyrightText: 2026 Echoform Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Content cleaning and training-validity rules.
//!
//! Raw platform messages carry mention markup, custom emoji, and URLs that
//! would poison a style corpus. Cleaning replaces them with stable
//! placeholder tokens so sentence structure survives while identifiers and
//! links do not.

use std::sync::LazyLock;

use regex::Regex;

static USER_MENTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<@!?\d+>").unwrap());
static ROLE_MENTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<@&\d+>").unwrap());
static CHANNEL_MENTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<#\d+>").unwrap());
static CUSTOM_EMOJI: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<a?:\w+:\d+>").unwrap());
static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+|www\.\S+").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Command prefixes used by common bots; messages starting with one are
/// commands, not conversation.
const COMMAND_PREFIXES: [char; 9] = ['!', '/', '.', '?', '$', '+', '-', '>', '<'];

/// Minimum share of word and whitespace characters a message must retain to
/// count as natural language rather than symbol noise.
const MIN_WORD_RATIO: f64 = 0.3;

/// Replace platform markup with placeholder tokens and normalize whitespace.
pub fn clean_content(raw: &str) -> String {
    let text = ROLE_MENTION.replace_all(raw, "[ROLE]");
    let text = USER_MENTION.replace_all(&text, "[USER]");
    let text = CHANNEL_MENTION.replace_all(&text, "[CHANNEL]");
    let text = CUSTOM_EMOJI.replace_all(&text, "[EMOJI]");
    let text = URL.replace_all(&text, "[URL]");
    let text = WHITESPACE.replace_all(&text, " ");
    text.trim().to_string()
}

/// Whether a cleaned message is usable as a training exemplar.
///
/// Rejects messages that are too short, look like bot commands, or are
/// mostly symbols.
pub fn is_valid_for_training(content: &str) -> bool {
    let trimmed = content.trim();
    let char_count = trimmed.chars().count();
    if char_count < 3 {
        return false;
    }

    if let Some(first) = trimmed.chars().next()
        && COMMAND_PREFIXES.contains(&first)
    {
        return false;
    }

    let word_chars = trimmed
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .count();
    word_chars as f64 >= char_count as f64 * MIN_WORD_RATIO
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mentions_become_placeholders() {
        assert_eq!(clean_content("hey <@123456> look"), "hey [USER] look");
        assert_eq!(clean_content("hey <@!123456> look"), "hey [USER] look");
        assert_eq!(clean_content("ping <@&98765>"), "ping [ROLE]");
        assert_eq!(clean_content("see <#424242>"), "see [CHANNEL]");
    }

    #[test]
    fn custom_emoji_become_placeholders() {
        assert_eq!(clean_content("nice <:pog:112233>"), "nice [EMOJI]");
        assert_eq!(clean_content("lol <a:spin:445566>"), "lol [EMOJI]");
    }

    #[test]
    fn urls_become_placeholders() {
        assert_eq!(
            clean_content("check https://example.com/page out"),
            "check [URL] out"
        );
        assert_eq!(clean_content("see www.example.com now"), "see [URL] now");
    }

    #[test]
    fn whitespace_is_collapsed_and_trimmed() {
        assert_eq!(clean_content("  so   many\n\nspaces\t "), "so many spaces");
    }

    #[test]
    fn short_messages_are_invalid() {
        assert!(!is_valid_for_training(""));
        assert!(!is_valid_for_training("ok"));
        assert!(is_valid_for_training("okay"));
    }

    #[test]
    fn command_prefixed_messages_are_invalid() {
        assert!(!is_valid_for_training("!play despacito"));
        assert!(!is_valid_for_training("/help me out"));
        assert!(!is_valid_for_training(".rank check"));
        assert!(!is_valid_for_training("?define word"));
        assert!(!is_valid_for_training("$balance now"));
        assert!(!is_valid_for_training("+rep friend"));
        assert!(!is_valid_for_training("-rep enemy"));
        assert!(!is_valid_for_training("> quoted text"));
        assert!(!is_valid_for_training("<some tag>"));
    }

    #[test]
    fn symbol_noise_is_invalid() {
        assert!(!is_valid_for_training("@#%^&*()@#%^"));
        assert!(is_valid_for_training("this is a normal sentence!"));
    }

    #[test]
    fn cleaned_message_pipeline_end_to_end() {
        let raw = "yo <@!42>   check https://cats.example  <:cat:777>\n\nso cool";
        let cleaned = clean_content(raw);
        assert_eq!(cleaned, "yo [USER] check [URL] [EMOJI] so cool");
        assert!(is_valid_for_training(&cleaned));
    }
}
