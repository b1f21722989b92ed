// SPDX-FileCopyrightText: 2026 Echoform Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-profile job registry with supersede semantics.
//!
//! At most one analysis/training job may be live per profile key. Starting a
//! new job cancels the previous one via its `CancellationToken` and bumps a
//! generation counter; the superseded job observes the cancellation at its
//! next checkpoint and unwinds without writing terminal state.

use dashmap::DashMap;
use echoform_core::{EchoformError, ProfileKey};
use tokio_util::sync::CancellationToken;

struct JobEntry {
    generation: u64,
    token: CancellationToken,
}

/// Ticket held by a running job. Carries the generation it was started at,
/// so terminal writes can verify the job is still current.
#[derive(Debug, Clone)]
pub struct JobTicket {
    pub key: ProfileKey,
    generation: u64,
    token: CancellationToken,
}

impl JobTicket {
    /// Returns `Err(Superseded)` if a newer job for the same key has started.
    ///
    /// Call between pipeline stages; a superseded job must stop doing work
    /// and must not write terminal state.
    pub fn checkpoint(&self) -> Result<(), EchoformError> {
        if self.token.is_cancelled() {
            Err(EchoformError::Superseded)
        } else {
            Ok(())
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The cancellation token, for use in `tokio::select!` arms.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

/// Registry of live jobs keyed by profile.
#[derive(Default)]
pub struct JobRegistry {
    jobs: DashMap<ProfileKey, JobEntry>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self {
            jobs: DashMap::new(),
        }
    }

    /// Begin a job for `key`, superseding any live job for the same key.
    pub fn begin(&self, key: &ProfileKey) -> JobTicket {
        let mut entry = self.jobs.entry(key.clone()).or_insert_with(|| JobEntry {
            generation: 0,
            token: CancellationToken::new(),
        });
        if entry.generation > 0 {
            entry.token.cancel();
            entry.token = CancellationToken::new();
        }
        entry.generation += 1;
        JobTicket {
            key: key.clone(),
            generation: entry.generation,
            token: entry.token.clone(),
        }
    }

    /// Whether the ticket still names the live job for its key.
    pub fn is_current(&self, ticket: &JobTicket) -> bool {
        self.jobs
            .get(&ticket.key)
            .map(|entry| entry.generation == ticket.generation)
            .unwrap_or(false)
    }

    /// Remove the registry entry if the ticket is still current.
    ///
    /// A stale ticket must not clear the entry of the job that superseded it.
    pub fn finish(&self, ticket: &JobTicket) {
        self.jobs
            .remove_if(&ticket.key, |_, entry| entry.generation == ticket.generation);
    }

    /// Number of live jobs (for status reporting).
    pub fn live_jobs(&self) -> usize {
        self.jobs.len()
    }
}
