// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capacity-aware allocation engine.
//!
//! Two triggers drive the engine: a new session (insert + one immediate
//! allocation attempt) and a resolution (resolve + debounced oldest-first
//! queue re-scan). All shared state lives in `parlor-store`; agent
//! presence comes from an injected [`parlor_core::AgentDirectory`].

pub mod backoff;
pub mod engine;

pub use backoff::RetryPolicy;
pub use engine::{
    AllocationEngine, AllocationOutcome, EngineConfig, RESCAN_LOCK_ID, ResolutionOutcome,
};
