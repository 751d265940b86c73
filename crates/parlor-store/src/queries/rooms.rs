// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Room lifecycle operations.
//!
//! Every function here is one atomic unit on the single writer thread.
//! `try_assign` is the check-then-claim transaction: it recounts the
//! agent's HANDLED rooms and claims the target room with a conditioned
//! single-row update, so two racing callers can never both land in the
//! agent's last free slot, and a room can never be claimed twice.

use std::str::FromStr;

use parlor_core::{ParlorError, Room, RoomStatus};
use rusqlite::{TransactionBehavior, params};

use crate::database::Database;

const ROOM_COLUMNS: &str = "room_id, channel_id, agent_id, status, created_at, updated_at";

fn room_from_row(row: &rusqlite::Row<'_>) -> Result<Room, rusqlite::Error> {
    let status_str: String = row.get(3)?;
    let status = RoomStatus::from_str(&status_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Room {
        room_id: row.get(0)?,
        channel_id: row.get(1)?,
        agent_id: row.get(2)?,
        status,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

/// Insert a room in QUEUE state if the `(room_id, channel_id)` key does
/// not exist yet. Returns whether a new row was created.
///
/// Safe under concurrent duplicate deliveries: only one insert wins, the
/// others observe "already exists" and return `false`.
pub async fn create_if_absent(
    db: &Database,
    room_id: i64,
    channel_id: i64,
) -> Result<bool, ParlorError> {
    db.connection()
        .call(move |conn| {
            let inserted = conn.execute(
                "INSERT INTO rooms (room_id, channel_id) VALUES (?1, ?2)
                 ON CONFLICT (room_id, channel_id) DO NOTHING",
                params![room_id, channel_id],
            )?;
            Ok(inserted == 1)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch a room by its composite key.
pub async fn get_room(
    db: &Database,
    room_id: i64,
    channel_id: i64,
) -> Result<Option<Room>, ParlorError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ROOM_COLUMNS} FROM rooms WHERE room_id = ?1 AND channel_id = ?2"
            ))?;
            let result = stmt.query_row(params![room_id, channel_id], room_from_row);
            match result {
                Ok(room) => Ok(Some(room)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List queued rooms for a channel, oldest first.
///
/// `room_id` breaks `created_at` ties so scan order is deterministic.
pub async fn list_queued(db: &Database, channel_id: i64) -> Result<Vec<Room>, ParlorError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ROOM_COLUMNS} FROM rooms
                 WHERE channel_id = ?1 AND status = 'QUEUE'
                 ORDER BY created_at ASC, room_id ASC"
            ))?;
            let rows = stmt.query_map(params![channel_id], room_from_row)?;
            let mut rooms = Vec::new();
            for row in rows {
                rooms.push(row?);
            }
            Ok(rooms)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List every room (admin surface).
pub async fn list_rooms(db: &Database) -> Result<Vec<Room>, ParlorError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ROOM_COLUMNS} FROM rooms ORDER BY created_at ASC, room_id ASC"
            ))?;
            let rows = stmt.query_map([], room_from_row)?;
            let mut rooms = Vec::new();
            for row in rows {
                rooms.push(row?);
            }
            Ok(rooms)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List rooms that are not yet resolved (QUEUE or HANDLED), for the bulk
/// resolution sweep.
pub async fn list_unresolved(db: &Database) -> Result<Vec<Room>, ParlorError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ROOM_COLUMNS} FROM rooms
                 WHERE status IN ('QUEUE', 'HANDLED')
                 ORDER BY created_at ASC, room_id ASC"
            ))?;
            let rows = stmt.query_map([], room_from_row)?;
            let mut rooms = Vec::new();
            for row in rows {
                rooms.push(row?);
            }
            Ok(rooms)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Authoritative count of rooms an agent currently holds in HANDLED state.
pub async fn count_handled(db: &Database, agent_id: i64) -> Result<i64, ParlorError> {
    db.connection()
        .call(move |conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM rooms WHERE agent_id = ?1 AND status = 'HANDLED'",
                params![agent_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Atomically claim a queued room for an agent, re-verifying capacity
/// inside the transaction.
///
/// One IMMEDIATE transaction: the write lock is taken up front, which
/// serializes concurrent check-then-claim attempts across connections.
/// Within it: recount HANDLED rooms for the agent, abort when the agent is
/// at `capacity_limit`, then claim the room with an update conditioned on
/// `status = 'QUEUE' AND agent_id IS NULL`. Returns `true` iff exactly one
/// row changed, so at most one caller ever wins a given room.
pub async fn try_assign(
    db: &Database,
    room_id: i64,
    channel_id: i64,
    agent_id: i64,
    capacity_limit: i64,
) -> Result<bool, ParlorError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let handled: i64 = tx.query_row(
                "SELECT COUNT(*) FROM rooms WHERE agent_id = ?1 AND status = 'HANDLED'",
                params![agent_id],
                |row| row.get(0),
            )?;
            if handled >= capacity_limit {
                tx.rollback()?;
                return Ok(false);
            }

            let updated = tx.execute(
                "UPDATE rooms SET agent_id = ?1, status = 'HANDLED',
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE room_id = ?2 AND channel_id = ?3
                   AND status = 'QUEUE' AND agent_id IS NULL",
                params![agent_id, room_id, channel_id],
            )?;
            tx.commit()?;
            Ok(updated == 1)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Mark a room resolved, recording the resolving agent when known.
///
/// Conditioned on `status <> 'RESOLVED'` so redelivered resolution events
/// are absorbed: returns `true` only for the first delivery. `None` keeps
/// whatever agent the row already carries (bulk sweeps resolve queued
/// rooms that never had one).
pub async fn mark_resolved(
    db: &Database,
    room_id: i64,
    channel_id: i64,
    agent_id: Option<i64>,
) -> Result<bool, ParlorError> {
    db.connection()
        .call(move |conn| {
            let updated = conn.execute(
                "UPDATE rooms SET status = 'RESOLVED',
                 agent_id = COALESCE(?1, agent_id),
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE room_id = ?2 AND channel_id = ?3 AND status <> 'RESOLVED'",
                params![agent_id, room_id, channel_id],
            )?;
            Ok(updated == 1)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
