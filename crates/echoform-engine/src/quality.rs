// SPDX-FileCopyrightText: 2026 Echoform Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Quality gate for generated responses.
//!
//! A rejected response is never sent: the caller abstains or re-samples.
//! The gate also screens smoke-test output after model creation, so a
//! persona that leaks assistant boilerplate is deleted before it is ever
//! registered.

/// Substrings that mark assistant boilerplate or template leakage. A persona
/// echoing a human never says these.
const ARTIFACT_MARKERS: [&str; 5] = ["As an AI", "I cannot", "as an AI language model", "{{", "}}"];

/// Minimum distinct-word share for a response to count as non-degenerate.
const MIN_UNIQUE_WORD_RATIO: f64 = 0.3;

/// Why a response was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QualityIssue {
    TooShort,
    TooLong,
    Degenerate,
    Artifact(String),
}

impl std::fmt::Display for QualityIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QualityIssue::TooShort => write!(f, "response too short"),
            QualityIssue::TooLong => write!(f, "response exceeds length limit"),
            QualityIssue::Degenerate => write!(f, "response is repetitive"),
            QualityIssue::Artifact(marker) => {
                write!(f, "response contains assistant artifact `{marker}`")
            }
        }
    }
}

/// Check a candidate response against the quality rules.
pub fn check(text: &str, max_length: usize) -> Result<(), QualityIssue> {
    let trimmed = text.trim();
    if trimmed.chars().count() < 2 {
        return Err(QualityIssue::TooShort);
    }
    if trimmed.chars().count() > max_length {
        return Err(QualityIssue::TooLong);
    }

    for marker in ARTIFACT_MARKERS {
        if trimmed.contains(marker) {
            return Err(QualityIssue::Artifact(marker.to_string()));
        }
    }

    let words: Vec<&str> = trimmed.split_whitespace().collect();
    if words.len() >= 5 {
        let unique: std::collections::HashSet<String> =
            words.iter().map(|w| w.to_lowercase()).collect();
        let ratio = unique.len() as f64 / words.len() as f64;
        if ratio < MIN_UNIQUE_WORD_RATIO {
            return Err(QualityIssue::Degenerate);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_responses_pass() {
        assert!(check("yeah that sounds about right to me", 2000).is_ok());
        assert!(check("lol", 2000).is_ok());
    }

    #[test]
    fn too_short_and_too_long_are_rejected() {
        assert_eq!(check("k", 2000), Err(QualityIssue::TooShort));
        assert_eq!(check("  ", 2000), Err(QualityIssue::TooShort));
        let long = "word ".repeat(500);
        assert_eq!(check(&long, 100), Err(QualityIssue::TooLong));
    }

    #[test]
    fn assistant_boilerplate_is_rejected() {
        assert!(matches!(
            check("As an AI, I find that interesting", 2000),
            Err(QualityIssue::Artifact(_))
        ));
        assert!(matches!(
            check("I cannot help with that request", 2000),
            Err(QualityIssue::Artifact(_))
        ));
        assert!(matches!(
            check("hello {{ .Prompt }} world", 2000),
            Err(QualityIssue::Artifact(_))
        ));
    }

    #[test]
    fn degenerate_repetition_is_rejected() {
        assert_eq!(
            check("spam spam spam spam spam spam spam spam", 2000),
            Err(QualityIssue::Degenerate)
        );
        // Short messages skip the ratio check; "ha ha" is normal chat.
        assert!(check("ha ha ha", 2000).is_ok());
    }
}
