// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scriptable in-memory stand-in for the external agent directory.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parlor_core::{Agent, AgentDirectory, ParlorError};

/// One scripted `list_agents` response, consumed before the standing
/// listing.
#[derive(Debug, Clone)]
pub enum ListingScript {
    Agents(Vec<Agent>),
    Error(String),
}

/// Mock [`AgentDirectory`] with a standing agent listing, optional
/// one-shot scripted responses, and call recording.
#[derive(Default)]
pub struct MockDirectory {
    agents: Mutex<Vec<Agent>>,
    scripted: Mutex<VecDeque<ListingScript>>,
    fail_assign: AtomicBool,
    list_calls: AtomicUsize,
    assign_calls: Mutex<Vec<(i64, i64)>>,
    resolve_calls: Mutex<Vec<i64>>,
}

impl MockDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the standing listing returned once scripted responses run out.
    pub fn set_agents(&self, agents: Vec<Agent>) {
        *self.agents.lock().unwrap() = agents;
    }

    /// Queue a one-shot listing consumed before the standing listing.
    pub fn push_listing(&self, script: ListingScript) {
        self.scripted.lock().unwrap().push_back(script);
    }

    /// Make subsequent `assign` calls fail.
    pub fn set_fail_assign(&self, fail: bool) {
        self.fail_assign.store(fail, Ordering::SeqCst);
    }

    /// Number of `list_agents` calls seen.
    pub fn list_call_count(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Recorded `(room_id, agent_id)` pairs from `assign` calls,
    /// including failed ones.
    pub fn assign_calls(&self) -> Vec<(i64, i64)> {
        self.assign_calls.lock().unwrap().clone()
    }

    /// Recorded room ids from `mark_resolved` calls.
    pub fn resolve_calls(&self) -> Vec<i64> {
        self.resolve_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AgentDirectory for MockDirectory {
    async fn list_agents(&self, _channel_id: i64) -> Result<Vec<Agent>, ParlorError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        let scripted = self.scripted.lock().unwrap().pop_front();
        match scripted {
            Some(ListingScript::Agents(agents)) => Ok(agents),
            Some(ListingScript::Error(message)) => {
                Err(ParlorError::Directory { message, source: None })
            }
            None => Ok(self.agents.lock().unwrap().clone()),
        }
    }

    async fn assign(&self, room_id: i64, agent_id: i64) -> Result<(), ParlorError> {
        self.assign_calls.lock().unwrap().push((room_id, agent_id));
        if self.fail_assign.load(Ordering::SeqCst) {
            return Err(ParlorError::Directory {
                message: "scripted assign failure".into(),
                source: None,
            });
        }
        Ok(())
    }

    async fn mark_resolved(&self, room_id: i64) -> Result<(), ParlorError> {
        self.resolve_calls.lock().unwrap().push(room_id);
        Ok(())
    }
}

/// Shorthand agent constructor for tests.
pub fn agent(id: i64, name: &str, available: bool, count: i64) -> Agent {
    Agent {
        id,
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        is_available: available,
        current_customer_count: count,
    }
}
