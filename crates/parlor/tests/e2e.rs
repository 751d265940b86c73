// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end scenarios for the allocation pipeline.
//!
//! Each test creates an isolated TestHarness with temp SQLite and a
//! scriptable mock directory. Tests are independent and order-insensitive.

use std::time::Duration;

use parlor_core::RoomStatus;
use parlor_engine::{AllocationOutcome, ResolutionOutcome};
use parlor_store::queries::{load, rooms};
use parlor_test_utils::{ListingScript, TestHarness, agent};

// ---- Scenario 1: fill one agent to capacity ----

#[tokio::test]
async fn test_three_arrivals_fill_agent_to_capacity() {
    // Capacity 2, agent A with 0 active, nobody else online. Three
    // sessions arrive in order: r1 and r2 are handled by A, r3 queues.
    let harness = TestHarness::builder()
        .with_capacity(2)
        .with_agents(vec![agent(500, "Ana", true, 0)])
        .build()
        .await
        .unwrap();

    assert_eq!(
        harness.engine.handle_new_session(1, 1).await.unwrap(),
        AllocationOutcome::Assigned { agent_id: 500 }
    );
    assert_eq!(
        harness.engine.handle_new_session(2, 1).await.unwrap(),
        AllocationOutcome::Assigned { agent_id: 500 }
    );
    assert_eq!(
        harness.engine.handle_new_session(3, 1).await.unwrap(),
        AllocationOutcome::Queued
    );

    assert_eq!(rooms::count_handled(&harness.db, 500).await.unwrap(), 2);
    assert_eq!(load::get(&harness.db, 500).await.unwrap(), 2);
    assert_eq!(
        rooms::get_room(&harness.db, 3, 1).await.unwrap().unwrap().status,
        RoomStatus::Queue
    );
}

// ---- Scenario 2: resolution re-routes the queued room ----

#[tokio::test]
async fn test_resolution_reroutes_queued_room_to_freed_agent() {
    let harness = TestHarness::builder()
        .with_capacity(2)
        .with_agents(vec![agent(500, "Ana", true, 0)])
        .build()
        .await
        .unwrap();

    for room_id in [1, 2, 3] {
        harness.engine.handle_new_session(room_id, 1).await.unwrap();
    }

    // r1 resolves; the triggered re-scan hands r3 to the freed agent.
    let outcome = harness.engine.handle_resolution(1, 1, 500).await.unwrap();
    assert_eq!(outcome, ResolutionOutcome::Rescanned { assigned: 1 });

    let r3 = rooms::get_room(&harness.db, 3, 1).await.unwrap().unwrap();
    assert_eq!(r3.status, RoomStatus::Handled);
    assert_eq!(r3.agent_id, Some(500));

    // Load counter returns to the capacity the agent actually holds.
    assert_eq!(load::get(&harness.db, 500).await.unwrap(), 2);
    assert_eq!(rooms::count_handled(&harness.db, 500).await.unwrap(), 2);
}

// ---- Scenario 3: backoff absorbs presence propagation delay ----

#[tokio::test]
async fn test_backoff_absorbs_slow_presence_signal() {
    // The directory reports nobody for two consecutive attempts, then the
    // agent appears within the bounded retry: the room is assigned on the
    // third attempt, not abandoned early.
    let harness = TestHarness::builder()
        .with_agents(vec![agent(500, "Ana", true, 0)])
        .build()
        .await
        .unwrap();
    harness.directory.push_listing(ListingScript::Agents(vec![]));
    harness.directory.push_listing(ListingScript::Agents(vec![]));

    let outcome = harness.engine.handle_new_session(1, 1).await.unwrap();
    assert_eq!(outcome, AllocationOutcome::Assigned { agent_id: 500 });
    assert_eq!(harness.directory.list_call_count(), 3);
}

// ---- Full lifecycle ----

#[tokio::test]
async fn test_room_lifecycle_queue_handled_resolved() {
    let harness = TestHarness::builder()
        .with_agents(vec![agent(500, "Ana", true, 0)])
        .with_debounce_window(Duration::from_millis(100))
        .build()
        .await
        .unwrap();

    harness.engine.handle_new_session(1, 1).await.unwrap();
    let room = rooms::get_room(&harness.db, 1, 1).await.unwrap().unwrap();
    assert_eq!(room.status, RoomStatus::Handled);

    harness.engine.handle_resolution(1, 1, 500).await.unwrap();
    let room = rooms::get_room(&harness.db, 1, 1).await.unwrap().unwrap();
    assert_eq!(room.status, RoomStatus::Resolved);
    assert_eq!(load::get(&harness.db, 500).await.unwrap(), 0);

    // The directory saw exactly one authoritative assignment.
    assert_eq!(harness.directory.assign_calls(), vec![(1, 500)]);
}

// ---- Least-loaded candidate selection across two agents ----

#[tokio::test]
async fn test_least_loaded_agent_is_preferred() {
    let harness = TestHarness::builder()
        .with_capacity(2)
        .with_agents(vec![
            agent(501, "Ben", true, 1),
            agent(500, "Ana", true, 0),
        ])
        .build()
        .await
        .unwrap();

    let outcome = harness.engine.handle_new_session(1, 1).await.unwrap();
    assert_eq!(outcome, AllocationOutcome::Assigned { agent_id: 500 });
}
