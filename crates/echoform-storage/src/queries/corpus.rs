// SPDX-FileCopyrightText: 2026 Echoform Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collected corpus operations.

use echoform_core::EchoformError;
use rusqlite::params;

use crate::database::Database;
use crate::models::{CorpusEntry, ProfileKey};

/// Atomically replace the collected corpus for a profile key.
///
/// A re-run of collection always produces a complete snapshot; stale entries
/// from an earlier run must not leak into the new corpus.
pub async fn replace_corpus(
    db: &Database,
    key: &ProfileKey,
    entries: &[CorpusEntry],
) -> Result<(), EchoformError> {
    let key = key.clone();
    let entries = entries.to_vec();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM corpus_entries WHERE user_id = ?1 AND server_id = ?2",
                params![key.user_id, key.server_id],
            )?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO corpus_entries (id, user_id, server_id, channel_id, content, posted_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                )?;
                for entry in &entries {
                    stmt.execute(params![
                        entry.id,
                        entry.user_id,
                        entry.server_id,
                        entry.channel_id,
                        entry.content,
                        entry.posted_at,
                    ])?;
                }
            }
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Load the corpus for a profile key, oldest message first.
pub async fn load_corpus(
    db: &Database,
    key: &ProfileKey,
) -> Result<Vec<CorpusEntry>, EchoformError> {
    let key = key.clone();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, server_id, channel_id, content, posted_at
                 FROM corpus_entries WHERE user_id = ?1 AND server_id = ?2
                 ORDER BY posted_at ASC",
            )?;
            let rows = stmt.query_map(params![key.user_id, key.server_id], |row| {
                Ok(CorpusEntry {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    server_id: row.get(2)?,
                    channel_id: row.get(3)?,
                    content: row.get(4)?,
                    posted_at: row.get(5)?,
                })
            })?;
            let mut entries = Vec::new();
            for row in rows {
                entries.push(row?);
            }
            Ok(entries)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Delete corpus entries older than the retention horizon.
/// Returns the number of rows removed.
pub async fn delete_older_than(db: &Database, days: u32) -> Result<u64, EchoformError> {
    db.connection()
        .call(move |conn| {
            let removed = conn.execute(
                "DELETE FROM corpus_entries
                 WHERE created_at < strftime('%Y-%m-%dT%H:%M:%fZ', 'now', ?1)",
                params![format!("-{days} days")],
            )?;
            Ok(removed as u64)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
