// SPDX-FileCopyrightText: 2026 Echoform Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The respond-once driver: decision, pacing, generation, delivery, audit.

use std::sync::Arc;

use chrono::Utc;
use echoform_config::model::ResponseConfig;
use echoform_core::traits::{ChatAdapter, InferenceAdapter, StorageAdapter};
use echoform_core::types::{
    ChatMessage, EchoSession, GenerationOptions, InferenceMessage, ResponseEvent,
};
use echoform_core::EchoformError;
use tracing::{debug, info};

use crate::compose;
use crate::decision::{self, Decision};
use crate::quality;

/// Drives a single autonomous response attempt for an active session.
pub struct ResponseDriver {
    chat: Arc<dyn ChatAdapter>,
    inference: Arc<dyn InferenceAdapter>,
    storage: Arc<dyn StorageAdapter>,
    config: ResponseConfig,
}

impl ResponseDriver {
    pub fn new(
        chat: Arc<dyn ChatAdapter>,
        inference: Arc<dyn InferenceAdapter>,
        storage: Arc<dyn StorageAdapter>,
        config: ResponseConfig,
    ) -> Self {
        Self {
            chat,
            inference,
            storage,
            config,
        }
    }

    /// Run one decision/generate/send cycle for a session against the
    /// channel state in `recent` and the immediate conversation turns in
    /// `context` (both oldest first).
    ///
    /// Returns the sent text, or `None` when the engine decided to stay
    /// quiet (veto, lost sample, or quality-gated output).
    pub async fn respond_once(
        &self,
        session: &EchoSession,
        model_ref: &str,
        recent: &[ChatMessage],
        context: &[ChatMessage],
    ) -> Result<Option<String>, EchoformError> {
        // The rng must not live across await points.
        let (go, thinking, typing) = {
            let mut rng = rand::thread_rng();
            let go = match decision::decide(&session.user_id, recent, Utc::now()) {
                Decision::Veto => false,
                Decision::Respond => true,
                Decision::Sample(p) => decision::sample(p, &mut rng),
            };
            let (thinking, typing) = decision::response_delay(
                (
                    self.config.thinking_delay_min_secs,
                    self.config.thinking_delay_max_secs,
                ),
                (
                    self.config.typing_delay_min_secs,
                    self.config.typing_delay_max_secs,
                ),
                &mut rng,
            );
            (go, thinking, typing)
        };

        if !go {
            return Ok(None);
        }

        tokio::time::sleep(thinking).await;
        self.chat.typing(&session.channel_id).await?;
        tokio::time::sleep(typing).await;

        let prompt = compose::build_prompt(recent, context);
        let started = std::time::Instant::now();

        let Some(text) = self.generate_gated(model_ref, &prompt).await? else {
            debug!(session = %session.id, "response abstained after quality gate");
            return Ok(None);
        };
        let latency_ms = started.elapsed().as_millis() as i64;

        self.chat.send(&session.channel_id, &text).await?;
        self.storage.record_session_message(&session.id).await?;

        let snapshot = serde_json::to_string(
            &recent
                .iter()
                .chain(context.iter())
                .map(|m| m.content.as_str())
                .collect::<Vec<_>>(),
        )
        .ok();
        let event = ResponseEvent {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session.id.clone(),
            content: text.clone(),
            context_snapshot: snapshot,
            latency_ms,
            created_at: Utc::now().to_rfc3339(),
        };
        self.storage.insert_response_event(&event).await?;

        info!(session = %session.id, latency_ms, "autonomous response sent");
        Ok(Some(text))
    }

    /// Generate a response, applying the quality gate with one re-sample.
    async fn generate_gated(
        &self,
        model_ref: &str,
        prompt: &str,
    ) -> Result<Option<String>, EchoformError> {
        for attempt in 0..2 {
            let raw = self
                .inference
                .chat(
                    model_ref,
                    &[InferenceMessage::user(prompt)],
                    &GenerationOptions::default(),
                )
                .await?;
            let text = compose::postprocess(&raw, self.config.max_length);
            match quality::check(&text, self.config.max_length) {
                Ok(()) => return Ok(Some(text)),
                Err(issue) => {
                    debug!(attempt, %issue, "generated response rejected");
                }
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use echoform_config::model::StorageConfig;
    use echoform_storage::SqliteStorage;
    use echoform_test_utils::{MockChat, MockInference, message};

    fn instant_config() -> ResponseConfig {
        ResponseConfig {
            max_length: 2000,
            thinking_delay_min_secs: 0,
            thinking_delay_max_secs: 0,
            typing_delay_min_secs: 0,
            typing_delay_max_secs: 0,
            initiation_chance: 0.05,
        }
    }

    async fn setup(dir: &tempfile::TempDir) -> (ResponseDriver, Arc<MockChat>, Arc<MockInference>, Arc<SqliteStorage>) {
        let storage = Arc::new(SqliteStorage::new(StorageConfig {
            database_path: dir.path().join("echo.db").to_string_lossy().into_owned(),
            dataset_dir: dir.path().join("datasets").to_string_lossy().into_owned(),
            wal_mode: true,
        }));
        storage.initialize().await.unwrap();

        let chat = Arc::new(MockChat::new());
        let inference = Arc::new(MockInference::new());
        let driver = ResponseDriver::new(
            chat.clone(),
            inference.clone(),
            storage.clone(),
            instant_config(),
        );
        (driver, chat, inference, storage)
    }

    async fn seed_session(storage: &SqliteStorage) -> EchoSession {
        let session = EchoSession {
            id: "sess-1".to_string(),
            user_id: "target".to_string(),
            server_id: "srv".to_string(),
            channel_id: "chan".to_string(),
            requester_id: "req".to_string(),
            is_active: true,
            messages_generated: 0,
            conversations_started: 0,
            started_at: Utc::now().to_rfc3339(),
            stopped_at: None,
            last_activity: Utc::now().to_rfc3339(),
        };
        storage.insert_session_superseding(&session).await.unwrap();
        session
    }

    fn mention_context() -> Vec<ChatMessage> {
        vec![message(
            "m1",
            "someone",
            "chan",
            "hey <@target> what do you think?",
            Utc::now() - ChronoDuration::seconds(60),
        )]
    }

    #[tokio::test]
    async fn mention_produces_sent_response_and_audit_row() {
        let dir = tempfile::tempdir().unwrap();
        let (driver, chat, inference, storage) = setup(&dir).await;
        let session = seed_session(&storage).await;
        inference.add_response("honestly not a bad idea").await;

        let sent = driver
            .respond_once(&session, "echo-model", &mention_context(), &[])
            .await
            .unwrap();
        assert_eq!(sent.as_deref(), Some("honestly not a bad idea"));

        assert_eq!(chat.typing_channels().await, vec!["chan"]);
        assert_eq!(
            chat.sent_messages().await,
            vec![("chan".to_string(), "honestly not a bad idea".to_string())]
        );

        let stored = storage
            .active_session_in_channel("chan")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.messages_generated, 1);
    }

    #[tokio::test]
    async fn veto_sends_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (driver, chat, _inference, storage) = setup(&dir).await;
        let session = seed_session(&storage).await;

        // Target spoke last: always vetoed.
        let recent = vec![message(
            "m1",
            "target",
            "chan",
            "talking to myself",
            Utc::now() - ChronoDuration::seconds(60),
        )];
        let sent = driver
            .respond_once(&session, "echo-model", &recent, &[])
            .await
            .unwrap();
        assert!(sent.is_none());
        assert!(chat.sent_messages().await.is_empty());
        assert!(chat.typing_channels().await.is_empty());
    }

    #[tokio::test]
    async fn quality_gate_resamples_once_then_abstains() {
        let dir = tempfile::tempdir().unwrap();
        let (driver, chat, inference, storage) = setup(&dir).await;
        let session = seed_session(&storage).await;

        // First output rejected, second passes.
        inference.add_response("As an AI, I think that's neat").await;
        inference.add_response("that's actually pretty neat").await;
        let sent = driver
            .respond_once(&session, "echo-model", &mention_context(), &[])
            .await
            .unwrap();
        assert_eq!(sent.as_deref(), Some("that's actually pretty neat"));

        // Both outputs rejected: abstain, nothing sent.
        inference.add_response("I cannot do that").await;
        inference.add_response("As an AI I must decline").await;
        let sent = driver
            .respond_once(&session, "echo-model", &mention_context(), &[])
            .await
            .unwrap();
        assert!(sent.is_none());
        assert_eq!(chat.sent_messages().await.len(), 1);
    }

    #[tokio::test]
    async fn context_turns_reach_the_generation_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let (driver, _chat, inference, storage) = setup(&dir).await;
        let session = seed_session(&storage).await;
        inference.add_response("right, like we said earlier").await;

        let context = vec![
            message(
                "c1",
                "someone",
                "chan",
                "remember the plan from before",
                Utc::now() - ChronoDuration::seconds(300),
            ),
            message(
                "c2",
                "target",
                "chan",
                "the plan with the boats",
                Utc::now() - ChronoDuration::seconds(240),
            ),
        ];
        driver
            .respond_once(&session, "echo-model", &mention_context(), &context)
            .await
            .unwrap();

        let calls = inference.chat_calls().await;
        assert_eq!(calls.len(), 1);
        let prompt = &calls[0].1;
        assert!(prompt.contains("hey <@target> what do you think?"));
        assert!(prompt.contains("remember the plan from before\nthe plan with the boats"));
    }

    #[tokio::test]
    async fn role_prefix_is_stripped_before_sending() {
        let dir = tempfile::tempdir().unwrap();
        let (driver, _chat, inference, storage) = setup(&dir).await;
        let session = seed_session(&storage).await;
        inference.add_response("Assistant: sounds good to me").await;

        let sent = driver
            .respond_once(&session, "echo-model", &mention_context(), &[])
            .await
            .unwrap();
        assert_eq!(sent.as_deref(), Some("sounds good to me"));
    }
}
