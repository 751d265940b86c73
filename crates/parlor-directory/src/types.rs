// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the directory HTTP contract.

use parlor_core::Agent;
use serde::{Deserialize, Serialize};

/// Envelope of `GET /v2/admin/agents/by_division`.
#[derive(Debug, Deserialize)]
pub struct AgentListResponse {
    #[serde(default)]
    pub data: Vec<Agent>,
}

/// Body of `POST /v1/admin/service/assign_agent`.
///
/// `replace_latest_agent` and `max_agent` are pinned: the engine never
/// swaps an existing agent and a room holds exactly one.
#[derive(Debug, Serialize)]
pub struct AssignRequest {
    pub room_id: i64,
    pub agent_id: i64,
    pub replace_latest_agent: bool,
    pub max_agent: u32,
}

/// Body of `POST /v1/admin/service/mark_as_resolved`.
#[derive(Debug, Serialize)]
pub struct MarkResolvedRequest {
    pub room_id: i64,
}

/// Structured error envelope returned by the directory on failures,
/// including capacity conflicts on assign.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub errors: ErrorDetail,
}

/// Error detail inside [`ApiErrorResponse`].
#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_list_response_parses_directory_payload() {
        let json = r#"{
            "data": [
                {"id": 1, "name": "Ana", "email": "ana@example.com",
                 "is_available": true, "current_customer_count": 0},
                {"id": 2, "name": "Ben", "email": "ben@example.com",
                 "is_available": false, "current_customer_count": 2}
            ],
            "meta": {"total": 2}
        }"#;
        let resp: AgentListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.data.len(), 2);
        assert_eq!(resp.data[0].name, "Ana");
        assert!(!resp.data[1].is_available);
    }

    #[test]
    fn agent_list_response_defaults_to_empty_data() {
        let resp: AgentListResponse = serde_json::from_str(r#"{"status": 200}"#).unwrap();
        assert!(resp.data.is_empty());
    }

    #[test]
    fn assign_request_serializes_pinned_fields() {
        let req = AssignRequest {
            room_id: 10,
            agent_id: 500,
            replace_latest_agent: false,
            max_agent: 1,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"replace_latest_agent\":false"));
        assert!(json.contains("\"max_agent\":1"));
    }

    #[test]
    fn api_error_response_parses_message() {
        let json = r#"{"errors": {"message": "agent has reached max customer"}, "status": 400}"#;
        let resp: ApiErrorResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.errors.message, "agent has reached max customer");
    }
}
