// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the external agent directory.
//!
//! The directory is the system of record for agent presence and the
//! authoritative assign action. This crate implements the
//! [`parlor_core::AgentDirectory`] trait over its HTTP API and hosts the
//! candidate-selection rule applied to its listings.

pub mod candidates;
pub mod client;
pub mod types;

pub use candidates::available_candidates;
pub use client::DirectoryClient;
