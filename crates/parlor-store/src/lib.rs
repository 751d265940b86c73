// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Parlor allocation service.
//!
//! Provides WAL-mode SQLite storage with embedded migrations and a
//! single-writer concurrency model via `tokio-rusqlite`. Hosts the three
//! shared-state primitives of the allocation engine: the room store
//! (conditioned state transitions), the per-agent load counters (atomic,
//! clamped at zero), and the coalescing guard (set-if-absent with expiry).

pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use database::Database;
pub use models::*;
