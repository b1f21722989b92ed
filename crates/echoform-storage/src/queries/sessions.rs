// SPDX-FileCopyrightText: 2026 Echoform Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Echo session row operations.
//!
//! The persisted store is the source of truth for session activity. The
//! one-active-session-per-channel invariant is enforced here by running
//! supersede-and-insert inside a single transaction.

use echoform_core::EchoformError;
use rusqlite::params;

use crate::database::Database;
use crate::models::EchoSession;

const SESSION_COLUMNS: &str = "id, user_id, server_id, channel_id, requester_id, is_active, \
     messages_generated, conversations_started, started_at, stopped_at, last_activity";

fn row_to_session(row: &rusqlite::Row<'_>) -> Result<EchoSession, rusqlite::Error> {
    Ok(EchoSession {
        id: row.get(0)?,
        user_id: row.get(1)?,
        server_id: row.get(2)?,
        channel_id: row.get(3)?,
        requester_id: row.get(4)?,
        is_active: row.get(5)?,
        messages_generated: row.get(6)?,
        conversations_started: row.get(7)?,
        started_at: row.get(8)?,
        stopped_at: row.get(9)?,
        last_activity: row.get(10)?,
    })
}

/// Insert a new active session, deactivating any session currently active in
/// the same channel, in one transaction. Returns the number of sessions
/// superseded (0 or 1).
pub async fn insert_superseding(
    db: &Database,
    session: &EchoSession,
) -> Result<u64, EchoformError> {
    let session = session.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let superseded = tx.execute(
                "UPDATE echo_sessions
                 SET is_active = 0, stopped_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE channel_id = ?1 AND is_active = 1",
                params![session.channel_id],
            )?;
            tx.execute(
                "INSERT INTO echo_sessions (id, user_id, server_id, channel_id, requester_id,
                     is_active, messages_generated, conversations_started,
                     started_at, stopped_at, last_activity)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    session.id,
                    session.user_id,
                    session.server_id,
                    session.channel_id,
                    session.requester_id,
                    session.is_active,
                    session.messages_generated,
                    session.conversations_started,
                    session.started_at,
                    session.stopped_at,
                    session.last_activity,
                ],
            )?;
            tx.commit()?;
            Ok(superseded as u64)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get the active session in a channel, if any.
pub async fn active_in_channel(
    db: &Database,
    channel_id: &str,
) -> Result<Option<EchoSession>, EchoformError> {
    let channel_id = channel_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM echo_sessions
                 WHERE channel_id = ?1 AND is_active = 1"
            ))?;
            let result = stmt.query_row(params![channel_id], row_to_session);
            match result {
                Ok(session) => Ok(Some(session)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List every active session across all servers (startup reconciliation).
pub async fn list_active(db: &Database) -> Result<Vec<EchoSession>, EchoformError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM echo_sessions
                 WHERE is_active = 1 ORDER BY started_at ASC"
            ))?;
            let rows = stmt.query_map([], row_to_session)?;
            let mut sessions = Vec::new();
            for row in rows {
                sessions.push(row?);
            }
            Ok(sessions)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Count active sessions on a server.
pub async fn count_active(db: &Database, server_id: &str) -> Result<i64, EchoformError> {
    let server_id = server_id.to_string();
    db.connection()
        .call(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM echo_sessions WHERE server_id = ?1 AND is_active = 1",
                params![server_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Deactivate the active session in a channel, if any. Returns the stopped
/// session with its final counters.
pub async fn stop_active_in_channel(
    db: &Database,
    channel_id: &str,
) -> Result<Option<EchoSession>, EchoformError> {
    let channel_id = channel_id.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE echo_sessions
                 SET is_active = 0, stopped_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE channel_id = ?1 AND is_active = 1",
                params![channel_id],
            )?;
            let stopped = if changed > 0 {
                let mut stmt = tx.prepare(&format!(
                    "SELECT {SESSION_COLUMNS} FROM echo_sessions
                     WHERE channel_id = ?1 AND stopped_at IS NOT NULL
                     ORDER BY stopped_at DESC LIMIT 1"
                ))?;
                Some(stmt.query_row(params![channel_id], row_to_session)?)
            } else {
                None
            };
            tx.commit()?;
            Ok(stopped)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Bump `messages_generated` and `last_activity` for a session.
pub async fn record_message(db: &Database, session_id: &str) -> Result<(), EchoformError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE echo_sessions
                 SET messages_generated = messages_generated + 1,
                     last_activity = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1",
                params![session_id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Bump `conversations_started` and `last_activity` for a session.
pub async fn record_conversation(db: &Database, session_id: &str) -> Result<(), EchoformError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE echo_sessions
                 SET conversations_started = conversations_started + 1,
                     last_activity = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1",
                params![session_id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Deactivate sessions whose `last_activity` is older than the idle horizon.
/// Returns the number of sessions expired.
pub async fn expire_idle(db: &Database, max_idle_hours: u64) -> Result<u64, EchoformError> {
    db.connection()
        .call(move |conn| {
            let expired = conn.execute(
                "UPDATE echo_sessions
                 SET is_active = 0, stopped_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE is_active = 1
                   AND last_activity < strftime('%Y-%m-%dT%H:%M:%fZ', 'now', ?1)",
                params![format!("-{max_idle_hours} hours")],
            )?;
            Ok(expired as u64)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
