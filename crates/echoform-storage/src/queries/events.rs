// SPDX-FileCopyrightText: 2026 Echoform Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Response audit event operations.

use echoform_core::EchoformError;
use rusqlite::params;

use crate::database::Database;
use crate::models::ResponseEvent;

/// Insert a response audit event.
pub async fn insert_event(db: &Database, event: &ResponseEvent) -> Result<(), EchoformError> {
    let event = event.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO response_events (id, session_id, content, context_snapshot,
                     latency_ms, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    event.id,
                    event.session_id,
                    event.content,
                    event.context_snapshot,
                    event.latency_ms,
                    event.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List events for a session, oldest first.
pub async fn events_for_session(
    db: &Database,
    session_id: &str,
) -> Result<Vec<ResponseEvent>, EchoformError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, session_id, content, context_snapshot, latency_ms, created_at
                 FROM response_events WHERE session_id = ?1 ORDER BY created_at ASC",
            )?;
            let rows = stmt.query_map(params![session_id], |row| {
                Ok(ResponseEvent {
                    id: row.get(0)?,
                    session_id: row.get(1)?,
                    content: row.get(2)?,
                    context_snapshot: row.get(3)?,
                    latency_ms: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })?;
            let mut events = Vec::new();
            for row in rows {
                events.push(row?);
            }
            Ok(events)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Delete events older than the retention horizon.
/// Returns the number of rows removed.
pub async fn delete_older_than(db: &Database, days: u32) -> Result<u64, EchoformError> {
    db.connection()
        .call(move |conn| {
            let removed = conn.execute(
                "DELETE FROM response_events
                 WHERE created_at < strftime('%Y-%m-%dT%H:%M:%fZ', 'now', ?1)",
                params![format!("-{days} days")],
            )?;
            Ok(removed as u64)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
