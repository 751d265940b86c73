// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Parlor integration tests.
//!
//! Provides [`MockDirectory`], a scriptable stand-in for the external
//! agent directory, and [`TestHarness`], which assembles temp storage and
//! the allocation engine for end-to-end tests.

pub mod harness;
pub mod mock_directory;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_directory::{ListingScript, MockDirectory, agent};
