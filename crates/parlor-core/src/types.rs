// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Parlor workspace.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Routing state of a room.
///
/// Rooms move `Queue -> Handled -> Resolved`; no transition skips a state
/// and `Resolved` is terminal. The string forms match the persisted
/// `status` column and the upstream webhook vocabulary.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomStatus {
    Queue,
    Handled,
    Resolved,
}

/// One customer chat session requiring agent handling.
///
/// Identity is the composite `(room_id, channel_id)` key. A `Queue` room
/// always has `agent_id = None`; a `Handled` room always has an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub room_id: i64,
    pub channel_id: i64,
    pub agent_id: Option<i64>,
    pub status: RoomStatus,
    /// ISO 8601 timestamp with millisecond precision.
    pub created_at: String,
    pub updated_at: String,
}

/// A human support agent as reported by the external directory.
///
/// This is a read-only view valid for one allocation attempt; it is never
/// persisted. `current_customer_count` is the directory's externally-known
/// load and may be stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub is_available: bool,
    #[serde(default)]
    pub current_customer_count: i64,
}
