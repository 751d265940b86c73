// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Parlor allocation service.
//!
//! This crate provides the shared error type, domain types, and the
//! [`AgentDirectory`] trait implemented by the directory HTTP client and
//! by test doubles. All other workspace crates depend on it.

pub mod directory;
pub mod error;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use directory::AgentDirectory;
pub use error::ParlorError;
pub use types::{Agent, Room, RoomStatus};
