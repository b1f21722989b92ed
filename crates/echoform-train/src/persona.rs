// SPDX-FileCopyrightText: 2026 Echoform Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persona specification (Modelfile) construction.

use chrono::{DateTime, Utc};
use echoform_core::ProfileKey;
use echoform_core::types::TrainingPair;

/// At most this many exemplar pairs are embedded in the persona spec.
const MAX_EXEMPLARS: usize = 100;

/// Style-mimicry instruction baked into every persona model.
const SYSTEM_PROMPT: &str = "You are an AI assistant that mimics the communication style and \
personality of a specific chat user based on their historical messages. You should:

1. Match their typical response length and tone
2. Use similar vocabulary and expressions
3. Maintain their level of formality/informality
4. Reflect their interests and topics they commonly discuss
5. Respond in a way that feels natural and consistent with their personality

Be conversational and engaging, but stay true to the personality you're emulating.";

/// Derive the backend model name for a profile.
///
/// The trailing `YYYYmmdd_HHMMSS` timestamp makes names unique per training
/// run and lets the stale-model sweep age them out.
pub fn model_name(key: &ProfileKey, created_at: DateTime<Utc>) -> String {
    format!(
        "echo_user_{}_server_{}_{}",
        key.user_id,
        key.server_id,
        created_at.format("%Y%m%d_%H%M%S")
    )
}

/// Build the Modelfile text for a persona model.
///
/// Embeds the fixed sampling parameters, the style-mimicry system prompt,
/// and up to [`MAX_EXEMPLARS`] prompt/response pairs as message exemplars.
pub fn build_modelfile(base_model: &str, pairs: &[TrainingPair]) -> String {
    let mut modelfile = format!(
        "FROM {base_model}

PARAMETER temperature 0.8
PARAMETER top_p 0.9
PARAMETER top_k 40
PARAMETER num_ctx 2048

SYSTEM \"\"\"{SYSTEM_PROMPT}\"\"\"
"
    );

    for pair in pairs.iter().take(MAX_EXEMPLARS) {
        if pair.prompt.is_empty() || pair.response.is_empty() {
            continue;
        }
        let prompt = escape(&pair.prompt);
        let response = escape(&pair.response);
        modelfile.push_str(&format!(
            "\nMESSAGE user \"{prompt}\"\nMESSAGE assistant \"{response}\"\n"
        ));
    }

    modelfile
}

fn escape(text: &str) -> String {
    text.replace('"', "\\\"").replace('\n', "\\n")
}
