// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-agent load counters.
//!
//! The counter tracks sessions this service believes it has assigned to an
//! agent and not yet resolved. It is a cheap pre-filter: the authoritative
//! capacity check is the room store's HANDLED count. Values never go
//! negative; a decrement that would underflow is clamped to 0 and logged
//! as a consistency correction.

use parlor_core::ParlorError;
use rusqlite::{OptionalExtension, params};
use tracing::warn;

use crate::database::Database;

/// Increment the agent's counter, creating it at zero first if absent.
/// Returns the new value.
pub async fn increment(db: &Database, agent_id: i64) -> Result<i64, ParlorError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO agent_load (agent_id, value) VALUES (?1, 1)
                 ON CONFLICT (agent_id) DO UPDATE SET
                   value = value + 1,
                   updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![agent_id],
            )?;
            let value = conn.query_row(
                "SELECT value FROM agent_load WHERE agent_id = ?1",
                params![agent_id],
                |row| row.get(0),
            )?;
            Ok(value)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Decrement the agent's counter, clamped at zero. Returns the new value.
///
/// A clamp means a resolution event arrived for an assignment the counter
/// never saw (duplicate delivery, restart, or divergence from the store);
/// it is absorbed and logged, never propagated.
pub async fn decrement(db: &Database, agent_id: i64) -> Result<i64, ParlorError> {
    let (value, clamped) = db
        .connection()
        .call(move |conn| {
            let prev: Option<i64> = conn
                .query_row(
                    "SELECT value FROM agent_load WHERE agent_id = ?1",
                    params![agent_id],
                    |row| row.get(0),
                )
                .optional()?;

            match prev {
                None => {
                    conn.execute(
                        "INSERT OR IGNORE INTO agent_load (agent_id, value) VALUES (?1, 0)",
                        params![agent_id],
                    )?;
                    Ok((0, true))
                }
                Some(prev) => {
                    conn.execute(
                        "UPDATE agent_load SET value = MAX(0, value - 1),
                         updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                         WHERE agent_id = ?1",
                        params![agent_id],
                    )?;
                    Ok(((prev - 1).max(0), prev == 0))
                }
            }
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    if clamped {
        warn!(agent_id, "load counter decrement clamped at zero");
    }
    Ok(value)
}

/// Current counter value; zero when the agent has no entry.
pub async fn get(db: &Database, agent_id: i64) -> Result<i64, ParlorError> {
    db.connection()
        .call(move |conn| {
            let value: Option<i64> = conn
                .query_row(
                    "SELECT value FROM agent_load WHERE agent_id = ?1",
                    params![agent_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(value.unwrap_or(0))
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Reset the agent's counter to zero.
///
/// Invoked when an agent goes offline so stale load cannot block future
/// assignments once the agent returns.
pub async fn reset(db: &Database, agent_id: i64) -> Result<(), ParlorError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO agent_load (agent_id, value) VALUES (?1, 0)
                 ON CONFLICT (agent_id) DO UPDATE SET
                   value = 0,
                   updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![agent_id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn increment_returns_new_value() {
        let (db, _dir) = setup_db().await;

        assert_eq!(increment(&db, 500).await.unwrap(), 1);
        assert_eq!(increment(&db, 500).await.unwrap(), 2);
        assert_eq!(get(&db, 500).await.unwrap(), 2);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn get_unknown_agent_is_zero() {
        let (db, _dir) = setup_db().await;
        assert_eq!(get(&db, 999).await.unwrap(), 0);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn decrement_clamps_at_zero() {
        let (db, _dir) = setup_db().await;

        increment(&db, 500).await.unwrap();
        assert_eq!(decrement(&db, 500).await.unwrap(), 0);
        // Duplicate resolution event: still zero, never negative.
        assert_eq!(decrement(&db, 500).await.unwrap(), 0);
        assert_eq!(get(&db, 500).await.unwrap(), 0);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn decrement_unknown_agent_clamps_at_zero() {
        let (db, _dir) = setup_db().await;
        assert_eq!(decrement(&db, 777).await.unwrap(), 0);
        assert_eq!(get(&db, 777).await.unwrap(), 0);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn reset_zeroes_counter() {
        let (db, _dir) = setup_db().await;

        increment(&db, 500).await.unwrap();
        increment(&db, 500).await.unwrap();
        reset(&db, 500).await.unwrap();
        assert_eq!(get(&db, 500).await.unwrap(), 0);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn counters_are_independent_per_agent() {
        let (db, _dir) = setup_db().await;

        increment(&db, 1).await.unwrap();
        increment(&db, 2).await.unwrap();
        increment(&db, 2).await.unwrap();

        assert_eq!(get(&db, 1).await.unwrap(), 1);
        assert_eq!(get(&db, 2).await.unwrap(), 2);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_increments_are_all_counted() {
        let (db, _dir) = setup_db().await;

        let mut handles = Vec::new();
        for _ in 0..20 {
            let db = db.clone();
            handles.push(tokio::spawn(async move { increment(&db, 500).await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(get(&db, 500).await.unwrap(), 20);
        db.close().await.unwrap();
    }
}
