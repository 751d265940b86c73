// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The allocation engine.
//!
//! Orchestrates the room lifecycle `QUEUE -> HANDLED -> RESOLVED` across
//! the room store, the per-agent load counters, the coalescing guard, and
//! the external agent directory. The store is the final arbiter of
//! capacity: the directory listing and the load counter only pre-filter
//! candidates, and `try_assign` re-verifies the authoritative count inside
//! its transaction.

use std::sync::Arc;
use std::time::Duration;

use parlor_config::model::AllocationConfig;
use parlor_core::{Agent, AgentDirectory, ParlorError};
use parlor_directory::available_candidates;
use parlor_store::Database;
use parlor_store::queries::{guard, load, rooms};
use tracing::{debug, error, info, warn};

use crate::backoff::RetryPolicy;

/// Guard key for queue re-scan triggers. One key per trigger class: the
/// guard throttles re-scans, it does not serialize room access.
pub const RESCAN_LOCK_ID: &str = "queue_rescan";

/// Outcome of processing a new-session trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationOutcome {
    /// The room was created and immediately assigned.
    Assigned { agent_id: i64 },
    /// The room was created and waits in the queue.
    Queued,
    /// The room already existed; the duplicate delivery was absorbed.
    Duplicate,
}

/// Outcome of processing a resolution trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionOutcome {
    /// This trigger ran the queue re-scan.
    Rescanned { assigned: usize },
    /// Another trigger within the window owns the re-scan.
    Debounced,
}

/// Tunables for the engine, derived from `[allocation]` config.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum rooms one agent may hold in HANDLED state.
    pub capacity_limit: i64,
    /// Coalescing window for re-scan triggers.
    pub debounce_window: Duration,
    /// Retry policy for guard acquisition.
    pub guard_retry: RetryPolicy,
    /// Retry policy for "no candidates" from the directory.
    pub candidate_retry: RetryPolicy,
}

impl EngineConfig {
    pub fn from_allocation(config: &AllocationConfig) -> Self {
        Self {
            capacity_limit: config.max_customers,
            debounce_window: Duration::from_millis(config.debounce_window_ms),
            guard_retry: RetryPolicy::new(
                config.guard_attempts,
                Duration::from_millis(config.guard_backoff_ms),
            ),
            candidate_retry: RetryPolicy::new(
                config.candidate_attempts,
                Duration::from_millis(config.candidate_backoff_ms),
            ),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_allocation(&AllocationConfig::default())
    }
}

/// Routes rooms to agents under the per-agent capacity limit.
pub struct AllocationEngine {
    db: Database,
    directory: Arc<dyn AgentDirectory>,
    config: EngineConfig,
}

impl AllocationEngine {
    pub fn new(db: Database, directory: Arc<dyn AgentDirectory>, config: EngineConfig) -> Self {
        Self { db, directory, config }
    }

    /// The underlying database handle (for admin listings).
    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Process a new-session trigger: insert the room and attempt one
    /// immediate assignment.
    ///
    /// A duplicate delivery for an existing room is absorbed without an
    /// allocation attempt, so redelivered webhooks cannot double-assign.
    pub async fn handle_new_session(
        &self,
        room_id: i64,
        channel_id: i64,
    ) -> Result<AllocationOutcome, ParlorError> {
        let created = rooms::create_if_absent(&self.db, room_id, channel_id).await?;
        if !created {
            debug!(room_id, channel_id, "duplicate new-session event absorbed");
            return Ok(AllocationOutcome::Duplicate);
        }

        parlor_prometheus::record_room_created(channel_id);
        info!(room_id, channel_id, "room queued");

        match self.try_allocate_room(room_id, channel_id).await? {
            Some(agent_id) => Ok(AllocationOutcome::Assigned { agent_id }),
            None => Ok(AllocationOutcome::Queued),
        }
    }

    /// Process a resolution trigger inline: resolve, then re-scan the
    /// queue unless another trigger inside the window owns it.
    pub async fn handle_resolution(
        &self,
        room_id: i64,
        channel_id: i64,
        agent_id: i64,
    ) -> Result<ResolutionOutcome, ParlorError> {
        self.resolve(room_id, channel_id, agent_id).await?;

        if !self.try_begin_rescan().await {
            return Ok(ResolutionOutcome::Debounced);
        }
        match self.run_rescan(channel_id).await {
            Ok(assigned) => Ok(ResolutionOutcome::Rescanned { assigned }),
            Err(e) => {
                // A failed scan covered nothing: free the guard so the
                // next trigger retries promptly instead of waiting out
                // the window.
                self.abort_rescan().await;
                Err(e)
            }
        }
    }

    /// Mark a room resolved and release the agent's counted slot.
    ///
    /// Returns whether this call was the first resolution. Only the first
    /// winner decrements the load counter, so redelivered resolution
    /// events cannot drain it; the clamp at zero backstops anything that
    /// slips through.
    pub async fn resolve(
        &self,
        room_id: i64,
        channel_id: i64,
        agent_id: i64,
    ) -> Result<bool, ParlorError> {
        let first = rooms::mark_resolved(&self.db, room_id, channel_id, Some(agent_id)).await?;
        if first {
            let value = load::decrement(&self.db, agent_id).await?;
            parlor_prometheus::set_agent_load(agent_id, value as f64);
            info!(room_id, channel_id, agent_id, "room resolved");
        } else {
            debug!(room_id, channel_id, "duplicate resolution event absorbed");
        }
        Ok(first)
    }

    /// Try to take ownership of the next queue re-scan.
    ///
    /// Retried a few times with short linear backoff; exhaustion means
    /// another trigger inside the window covers the queue, which is the
    /// intended debounce outcome, not an error. A successful scan keeps the guard
    /// until the window expires, so a burst of N triggers executes at most
    /// one scan.
    pub async fn try_begin_rescan(&self) -> bool {
        let db = &self.db;
        let window = self.config.debounce_window;
        let acquired = self
            .config
            .guard_retry
            .run(|attempt| async move {
                match guard::try_acquire(db, RESCAN_LOCK_ID, window).await {
                    Ok(true) => Some(()),
                    Ok(false) => {
                        debug!(attempt, "re-scan guard held by another trigger");
                        None
                    }
                    Err(e) => {
                        warn!(error = %e, attempt, "re-scan guard acquisition failed");
                        None
                    }
                }
            })
            .await
            .is_some();

        if !acquired {
            parlor_prometheus::record_debounce_skip();
            debug!("re-scan debounced");
        }
        acquired
    }

    /// Re-scan the queue oldest-first, assigning every room an agent can
    /// take. Caller must hold the re-scan guard.
    ///
    /// A room with no qualifying agent is left queued for the next
    /// trigger; per-room failures never abort the pass. Returns the number
    /// of rooms assigned.
    pub async fn run_rescan(&self, channel_id: i64) -> Result<usize, ParlorError> {
        let queued = rooms::list_queued(&self.db, channel_id).await?;
        let mut assigned = 0;
        for room in &queued {
            if self
                .try_allocate_room(room.room_id, room.channel_id)
                .await?
                .is_some()
            {
                assigned += 1;
            }
        }
        parlor_prometheus::record_rescan();
        info!(channel_id, scanned = queued.len(), assigned, "queue re-scan complete");
        Ok(assigned)
    }

    /// Release the re-scan guard after a failed scan so the next trigger
    /// does not wait out the window. Failures are absorbed: the lock
    /// expires on its own.
    pub async fn abort_rescan(&self) {
        if let Err(e) = guard::release(&self.db, RESCAN_LOCK_ID).await {
            warn!(error = %e, "failed to release re-scan guard");
        }
    }

    /// Resolve every unresolved room, directory first (bulk sweep).
    ///
    /// Per-room directory failures are logged and skipped; local
    /// resolution reuses the ordinary idempotent transition, so resolution
    /// webhooks arriving later for the same rooms are absorbed.
    pub async fn resolve_all(&self) -> Result<usize, ParlorError> {
        let unresolved = rooms::list_unresolved(&self.db).await?;
        let mut resolved = 0;

        for room in unresolved {
            if let Err(e) = self.directory.mark_resolved(room.room_id).await {
                warn!(error = %e, room_id = room.room_id, "sweep: directory mark_as_resolved failed, skipping");
                continue;
            }
            let first =
                rooms::mark_resolved(&self.db, room.room_id, room.channel_id, room.agent_id)
                    .await?;
            if first && let Some(agent_id) = room.agent_id {
                let value = load::decrement(&self.db, agent_id).await?;
                parlor_prometheus::set_agent_load(agent_id, value as f64);
            }
            resolved += 1;
        }

        info!(resolved, "bulk resolution sweep complete");
        Ok(resolved)
    }

    /// One allocation attempt for one room: fetch candidates (with the
    /// bounded no-candidates retry), then walk them in deterministic order
    /// until one claim sticks.
    ///
    /// Returns the assigned agent, or `None` when the room stays queued.
    async fn try_allocate_room(
        &self,
        room_id: i64,
        channel_id: i64,
    ) -> Result<Option<i64>, ParlorError> {
        let candidates = self
            .config
            .candidate_retry
            .run(|attempt| async move {
                let candidates = self.qualified_candidates(channel_id).await;
                if candidates.is_empty() {
                    debug!(room_id, channel_id, attempt, "no candidates this attempt");
                    None
                } else {
                    Some(candidates)
                }
            })
            .await;

        let Some(candidates) = candidates else {
            debug!(room_id, channel_id, "no agent available now, room stays queued");
            return Ok(None);
        };

        for agent in candidates {
            // Cheap pre-filter: external count plus the slots we have
            // handed out locally. The store recount below is the arbiter.
            let local = load::get(&self.db, agent.id).await?;
            if agent.current_customer_count + local >= self.config.capacity_limit {
                debug!(
                    agent_id = agent.id,
                    external = agent.current_customer_count,
                    local,
                    "candidate at combined capacity, skipping"
                );
                continue;
            }

            let claimed = match rooms::try_assign(
                &self.db,
                room_id,
                channel_id,
                agent.id,
                self.config.capacity_limit,
            )
            .await
            {
                Ok(claimed) => claimed,
                Err(e) => {
                    // Contained: one failed claim must not abort the scan pass.
                    warn!(error = %e, room_id, agent_id = agent.id, "assignment transaction failed");
                    continue;
                }
            };
            if !claimed {
                debug!(room_id, agent_id = agent.id, "claim lost the race or agent full");
                continue;
            }

            match load::increment(&self.db, agent.id).await {
                Ok(value) => parlor_prometheus::set_agent_load(agent.id, value as f64),
                Err(e) => {
                    warn!(error = %e, agent_id = agent.id, "load counter increment failed after claim");
                }
            }

            if let Err(e) = self.directory.assign(room_id, agent.id).await {
                // Reverting here could hand the session to two agents;
                // the room stays HANDLED and the divergence is logged.
                error!(
                    error = %e,
                    room_id,
                    agent_id = agent.id,
                    "directory assign failed after store commit, room left HANDLED"
                );
            }

            parlor_prometheus::record_assignment(agent.id);
            info!(room_id, channel_id, agent_id = agent.id, "room assigned");
            return Ok(Some(agent.id));
        }

        Ok(None)
    }

    /// One directory listing, filtered and ordered. Directory errors count
    /// as "no candidates this attempt" and are retried by the caller.
    async fn qualified_candidates(&self, channel_id: i64) -> Vec<Agent> {
        let started = std::time::Instant::now();
        let agents = match self.directory.list_agents(channel_id).await {
            Ok(agents) => agents,
            Err(e) => {
                warn!(error = %e, channel_id, "directory listing failed, treating as no candidates");
                return Vec::new();
            }
        };
        parlor_prometheus::record_directory_latency(started.elapsed().as_secs_f64());

        self.sync_offline_counters(&agents).await;
        available_candidates(&agents, self.config.capacity_limit)
    }

    /// Reset counters for agents the directory reports offline, so stale
    /// load cannot block them once they return.
    async fn sync_offline_counters(&self, agents: &[Agent]) {
        for agent in agents.iter().filter(|a| !a.is_available) {
            match load::get(&self.db, agent.id).await {
                Ok(0) => {}
                Ok(stale) => {
                    info!(agent_id = agent.id, stale, "agent offline, resetting load counter");
                    if let Err(e) = load::reset(&self.db, agent.id).await {
                        warn!(error = %e, agent_id = agent.id, "load counter reset failed");
                    } else {
                        parlor_prometheus::set_agent_load(agent.id, 0.0);
                    }
                }
                Err(e) => {
                    warn!(error = %e, agent_id = agent.id, "load counter read failed");
                }
            }
        }
    }
}
