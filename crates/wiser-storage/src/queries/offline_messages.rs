// SPDX-FileCopyrightText: 2026 Wiser Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Offline queue operations.

use rusqlite::params;
use wiser_core::WiserError;

use crate::database::Database;
use crate::models::StoredMessage;

/// Insert a row, replacing every column of an existing row with the same id.
pub async fn enqueue(db: &Database, row: StoredMessage) -> Result<(), WiserError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO offline_messages (id, chat_id, content, role, mode, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(id) DO UPDATE SET
                    chat_id = excluded.chat_id,
                    content = excluded.content,
                    role = excluded.role,
                    mode = excluded.mode,
                    created_at = excluded.created_at,
                    queued_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![
                    row.id,
                    row.chat_id,
                    row.content,
                    row.role,
                    row.mode,
                    row.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Every queued row. No ordering is promised to callers.
pub async fn list_all(db: &Database) -> Result<Vec<StoredMessage>, WiserError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, chat_id, content, role, mode, created_at FROM offline_messages",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(StoredMessage {
                    id: row.get(0)?,
                    chat_id: row.get(1)?,
                    content: row.get(2)?,
                    role: row.get(3)?,
                    mode: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Delete a row by id. Returns whether a row was deleted.
pub async fn remove(db: &Database, id: &str) -> Result<bool, WiserError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let affected = conn.execute("DELETE FROM offline_messages WHERE id = ?1", params![id])?;
            Ok(affected > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Number of queued rows.
pub async fn count(db: &Database) -> Result<i64, WiserError> {
    db.connection()
        .call(|conn| conn.query_row("SELECT COUNT(*) FROM offline_messages", [], |row| row.get(0)))
        .await
        .map_err(crate::database::map_tr_err)
}

/// Delete every queued row. Returns how many were removed.
pub async fn clear(db: &Database) -> Result<usize, WiserError> {
    db.connection()
        .call(|conn| conn.execute("DELETE FROM offline_messages", []))
        .await
        .map_err(crate::database::map_tr_err)
}
