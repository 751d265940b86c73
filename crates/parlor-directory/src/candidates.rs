// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Candidate filtering and deterministic ordering.

use parlor_core::Agent;

/// Filter a directory listing down to agents that can take a room, in
/// deterministic assignment order.
///
/// An agent qualifies when it is online and its externally-reported count
/// is under the capacity limit. Ordering is least-loaded first, ties
/// broken by name ascending, so every scan pass selects the same candidate
/// for the same listing.
pub fn available_candidates(agents: &[Agent], capacity_limit: i64) -> Vec<Agent> {
    let mut candidates: Vec<Agent> = agents
        .iter()
        .filter(|a| a.is_available && a.current_customer_count < capacity_limit)
        .cloned()
        .collect();
    candidates.sort_by(|a, b| {
        a.current_customer_count
            .cmp(&b.current_customer_count)
            .then_with(|| a.name.cmp(&b.name))
    });
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(id: i64, name: &str, available: bool, count: i64) -> Agent {
        Agent {
            id,
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            is_available: available,
            current_customer_count: count,
        }
    }

    #[test]
    fn offline_agents_are_excluded() {
        let agents = vec![agent(1, "Ana", false, 0), agent(2, "Ben", true, 0)];
        let candidates = available_candidates(&agents, 2);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, 2);
    }

    #[test]
    fn agents_at_capacity_are_excluded() {
        let agents = vec![agent(1, "Ana", true, 2), agent(2, "Ben", true, 1)];
        let candidates = available_candidates(&agents, 2);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, 2);
    }

    #[test]
    fn least_loaded_sorts_first() {
        let agents = vec![
            agent(1, "Ana", true, 1),
            agent(2, "Ben", true, 0),
            agent(3, "Cleo", true, 1),
        ];
        let candidates = available_candidates(&agents, 2);
        let ids: Vec<i64> = candidates.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn equal_load_ties_break_by_name() {
        let agents = vec![
            agent(3, "Cleo", true, 1),
            agent(1, "Ana", true, 1),
            agent(2, "Ben", true, 1),
        ];
        let candidates = available_candidates(&agents, 2);
        let names: Vec<&str> = candidates.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Ana", "Ben", "Cleo"]);
    }

    #[test]
    fn empty_listing_yields_no_candidates() {
        assert!(available_candidates(&[], 2).is_empty());
    }
}
