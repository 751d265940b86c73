// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a complete allocation stack: temp SQLite
//! database, mock agent directory, and the engine with test-friendly
//! (short) retry timings.

use std::sync::Arc;
use std::time::Duration;

use parlor_core::{Agent, ParlorError};
use parlor_engine::{AllocationEngine, EngineConfig, RetryPolicy};
use parlor_store::Database;

use crate::mock_directory::MockDirectory;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    capacity_limit: i64,
    agents: Vec<Agent>,
    debounce_window: Duration,
    guard_retry: RetryPolicy,
    candidate_retry: RetryPolicy,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            capacity_limit: 2,
            agents: Vec::new(),
            // Short timings keep tests fast without changing semantics.
            debounce_window: Duration::from_millis(200),
            guard_retry: RetryPolicy::new(3, Duration::from_millis(5)),
            candidate_retry: RetryPolicy::new(3, Duration::from_millis(10)),
        }
    }

    /// Set the per-agent capacity limit.
    pub fn with_capacity(mut self, capacity_limit: i64) -> Self {
        self.capacity_limit = capacity_limit;
        self
    }

    /// Seed the mock directory's standing agent listing.
    pub fn with_agents(mut self, agents: Vec<Agent>) -> Self {
        self.agents = agents;
        self
    }

    /// Override the coalescing window.
    pub fn with_debounce_window(mut self, window: Duration) -> Self {
        self.debounce_window = window;
        self
    }

    /// Override the "no candidates" retry policy.
    pub fn with_candidate_retry(mut self, policy: RetryPolicy) -> Self {
        self.candidate_retry = policy;
        self
    }

    /// Build the test harness, creating the temp database and engine.
    pub async fn build(self) -> Result<TestHarness, ParlorError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| ParlorError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");
        let db = Database::open(&db_path.to_string_lossy()).await?;

        let directory = Arc::new(MockDirectory::new());
        directory.set_agents(self.agents);

        let config = EngineConfig {
            capacity_limit: self.capacity_limit,
            debounce_window: self.debounce_window,
            guard_retry: self.guard_retry,
            candidate_retry: self.candidate_retry,
        };
        let engine = Arc::new(AllocationEngine::new(db.clone(), directory.clone(), config));

        Ok(TestHarness {
            db,
            directory,
            engine,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with mock directory and temp storage.
pub struct TestHarness {
    /// The temp SQLite database (cleaned up on drop).
    pub db: Database,
    /// The mock agent directory.
    pub directory: Arc<MockDirectory>,
    /// The allocation engine under test.
    pub engine: Arc<AllocationEngine>,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_directory::agent;
    use parlor_store::queries::rooms;

    #[tokio::test]
    async fn builder_creates_working_environment() {
        let harness = TestHarness::builder().build().await.unwrap();
        let all = rooms::list_rooms(&harness.db).await.unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn temp_db_is_unique_per_harness() {
        let h1 = TestHarness::builder().build().await.unwrap();
        let h2 = TestHarness::builder().build().await.unwrap();

        rooms::create_if_absent(&h1.db, 1, 1).await.unwrap();
        assert_eq!(rooms::list_rooms(&h1.db).await.unwrap().len(), 1);
        assert_eq!(rooms::list_rooms(&h2.db).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn seeded_agents_reach_the_engine() {
        let harness = TestHarness::builder()
            .with_agents(vec![agent(500, "Ana", true, 0)])
            .build()
            .await
            .unwrap();

        let listing = {
            use parlor_core::AgentDirectory;
            harness.directory.list_agents(1).await.unwrap()
        };
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].id, 500);
    }
}
