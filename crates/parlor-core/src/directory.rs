// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agent directory trait: the external system of record for agent
//! presence and for the authoritative assign action.

use async_trait::async_trait;

use crate::error::ParlorError;
use crate::types::Agent;

/// Contract the allocation engine requires from the external agent
/// directory.
///
/// Implementations are expected to be unreliable: slow, stale, or failing
/// outright. Every call must carry a bounded timeout. The engine never
/// caches results beyond a single allocation attempt.
#[async_trait]
pub trait AgentDirectory: Send + Sync {
    /// Lists all agents serving the given channel, with presence flags and
    /// the directory's externally-known session counts.
    async fn list_agents(&self, channel_id: i64) -> Result<Vec<Agent>, ParlorError>;

    /// Performs the authoritative assignment of an agent to a room.
    ///
    /// A capacity conflict on the directory side surfaces as
    /// [`ParlorError::Directory`] with the structured error message.
    async fn assign(&self, room_id: i64, agent_id: i64) -> Result<(), ParlorError>;

    /// Marks a room resolved on the directory side. Used by the bulk
    /// resolution sweep.
    async fn mark_resolved(&self, room_id: i64) -> Result<(), ParlorError>;
}
