// SPDX-FileCopyrightText: 2026 Echoform Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `echoform status` command implementation.
//!
//! Reads the local database directly to display active echo sessions and
//! their activity counters. Falls back gracefully when no database exists
//! yet.

use std::io::IsTerminal;

use echoform_config::model::EchoformConfig;
use echoform_core::EchoformError;
use echoform_core::traits::StorageAdapter;
use echoform_core::types::EchoSession;
use echoform_storage::SqliteStorage;
use serde::Serialize;

/// One active session in `--json` output.
#[derive(Debug, Serialize)]
pub struct SessionSummary {
    pub user_id: String,
    pub server_id: String,
    pub channel_id: String,
    pub messages_generated: i64,
    pub conversations_started: i64,
    pub started_at: String,
}

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub database_path: String,
    pub database_present: bool,
    pub active_sessions: usize,
    pub sessions: Vec<SessionSummary>,
}

/// Run the `echoform status` command.
pub async fn run_status(
    config: &EchoformConfig,
    json: bool,
    plain: bool,
) -> Result<(), EchoformError> {
    let db_path = &config.storage.database_path;
    let use_color = !plain && std::io::stdout().is_terminal();

    if !std::path::Path::new(db_path).exists() {
        if json {
            let resp = StatusResponse {
                database_path: db_path.clone(),
                database_present: false,
                active_sessions: 0,
                sessions: Vec::new(),
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&resp).unwrap_or_else(|_| "{}".to_string())
            );
        } else {
            print_no_database(db_path, use_color);
        }
        return Ok(());
    }

    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    let sessions = storage.list_active_sessions().await?;
    storage.close().await?;

    if json {
        let resp = StatusResponse {
            database_path: db_path.clone(),
            database_present: true,
            active_sessions: sessions.len(),
            sessions: sessions.iter().map(summarize).collect(),
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&resp).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        print_sessions(&sessions, use_color);
    }

    Ok(())
}

fn summarize(session: &EchoSession) -> SessionSummary {
    SessionSummary {
        user_id: session.user_id.clone(),
        server_id: session.server_id.clone(),
        channel_id: session.channel_id.clone(),
        messages_generated: session.messages_generated,
        conversations_started: session.conversations_started,
        started_at: session.started_at.clone(),
    }
}

fn print_sessions(sessions: &[EchoSession], use_color: bool) {
    println!();
    println!("  echoform status");
    println!("  {}", "-".repeat(50));

    if sessions.is_empty() {
        println!("    No active echo sessions.");
    } else if use_color {
        use colored::Colorize;
        println!(
            "    {} {} active session(s)",
            "✓".green(),
            sessions.len().to_string().green()
        );
        for s in sessions {
            println!(
                "      user {} in channel {} ({} messages, {} conversations)",
                s.user_id, s.channel_id, s.messages_generated, s.conversations_started
            );
        }
    } else {
        println!("    [OK] {} active session(s)", sessions.len());
        for s in sessions {
            println!(
                "      user {} in channel {} ({} messages, {} conversations)",
                s.user_id, s.channel_id, s.messages_generated, s.conversations_started
            );
        }
    }

    println!();
}

fn print_no_database(db_path: &str, use_color: bool) {
    println!();
    println!("  echoform status");
    println!("  {}", "-".repeat(50));

    if use_color {
        use colored::Colorize;
        println!("    State:    {} {}", "!".yellow(), "no database".yellow());
    } else {
        println!("    State:    [WARN] no database");
    }

    println!("    Path:     {db_path}");
    println!();
}
