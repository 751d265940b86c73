// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the external agent directory.
//!
//! Provides [`DirectoryClient`] which handles request construction,
//! authentication headers, bounded timeouts, and structured error mapping.
//! Retrying is the caller's concern: the allocation engine wraps these
//! calls in its bounded retry policy, so each method performs exactly one
//! attempt.

use std::time::Duration;

use async_trait::async_trait;
use parlor_config::model::DirectoryConfig;
use parlor_core::{Agent, AgentDirectory, ParlorError};
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, warn};

use crate::types::{AgentListResponse, ApiErrorResponse, AssignRequest, MarkResolvedRequest};

/// HTTP client for directory API communication.
///
/// Manages authentication headers, connection pooling, and the per-request
/// timeout. Cheap to clone.
#[derive(Debug, Clone)]
pub struct DirectoryClient {
    client: reqwest::Client,
    base_url: String,
    division_id: i64,
    timeout: Duration,
}

impl DirectoryClient {
    /// Creates a new directory client from configuration.
    pub fn new(config: &DirectoryConfig) -> Result<Self, ParlorError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-app-id",
            HeaderValue::from_str(&config.app_id)
                .map_err(|e| ParlorError::Config(format!("invalid app_id header value: {e}")))?,
        );
        headers.insert(
            "x-secret-key",
            HeaderValue::from_str(&config.secret_key).map_err(|e| {
                ParlorError::Config(format!("invalid secret_key header value: {e}"))
            })?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ParlorError::Directory {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            division_id: config.division_id,
            timeout,
        })
    }

    /// Maps a reqwest transport error, distinguishing timeouts so the
    /// engine can log them as bounded-attempt failures.
    fn transport_error(&self, context: &str, e: reqwest::Error) -> ParlorError {
        if e.is_timeout() {
            ParlorError::Timeout { duration: self.timeout }
        } else {
            ParlorError::Directory {
                message: format!("{context} request failed: {e}"),
                source: Some(Box::new(e)),
            }
        }
    }
}

/// Build a directory error from a non-success response body.
///
/// The directory returns a structured `{"errors": {"message": ...}}`
/// envelope for expected failures (e.g. a capacity conflict on assign);
/// anything else is passed through verbatim.
fn status_error(context: &str, status: reqwest::StatusCode, body: &str) -> ParlorError {
    let message = if let Ok(api_err) = serde_json::from_str::<ApiErrorResponse>(body) {
        format!("{context} returned {status}: {}", api_err.errors.message)
    } else {
        format!("{context} returned {status}: {body}")
    };
    ParlorError::Directory { message, source: None }
}

#[async_trait]
impl AgentDirectory for DirectoryClient {
    async fn list_agents(&self, channel_id: i64) -> Result<Vec<Agent>, ParlorError> {
        let url = format!("{}/v2/admin/agents/by_division", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("division_ids[]", self.division_id)])
            .send()
            .await
            .map_err(|e| self.transport_error("list_agents", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(channel_id, %status, "agent listing failed");
            return Err(status_error("list_agents", status, &body));
        }

        let listing: AgentListResponse =
            response.json().await.map_err(|e| ParlorError::Directory {
                message: format!("failed to parse agent listing: {e}"),
                source: Some(Box::new(e)),
            })?;

        debug!(channel_id, count = listing.data.len(), "agent listing received");
        Ok(listing.data)
    }

    async fn assign(&self, room_id: i64, agent_id: i64) -> Result<(), ParlorError> {
        let url = format!("{}/v1/admin/service/assign_agent", self.base_url);
        let body = AssignRequest {
            room_id,
            agent_id,
            replace_latest_agent: false,
            max_agent: 1,
        };
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error("assign_agent", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error("assign_agent", status, &body));
        }

        debug!(room_id, agent_id, "directory assignment confirmed");
        Ok(())
    }

    async fn mark_resolved(&self, room_id: i64) -> Result<(), ParlorError> {
        let url = format!("{}/v1/admin/service/mark_as_resolved", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&MarkResolvedRequest { room_id })
            .send()
            .await
            .map_err(|e| self.transport_error("mark_as_resolved", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error("mark_as_resolved", status, &body));
        }

        debug!(room_id, "directory resolution confirmed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> DirectoryClient {
        DirectoryClient::new(&DirectoryConfig {
            api_url: base_url.to_string(),
            app_id: "test-app".into(),
            secret_key: "test-secret".into(),
            division_id: 12,
            timeout_secs: 2,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn list_agents_parses_and_sends_headers() {
        let server = MockServer::start().await;

        let body = serde_json::json!({
            "data": [
                {"id": 1, "name": "Ana", "email": "ana@example.com",
                 "is_available": true, "current_customer_count": 0}
            ]
        });
        Mock::given(method("GET"))
            .and(path("/v2/admin/agents/by_division"))
            .and(query_param("division_ids[]", "12"))
            .and(header("x-app-id", "test-app"))
            .and(header("x-secret-key", "test-secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let agents = client.list_agents(1).await.unwrap();
        assert_eq!(agents.len(), 1);
        assert_eq!(agents[0].id, 1);
        assert!(agents[0].is_available);
    }

    #[tokio::test]
    async fn list_agents_maps_server_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2/admin/agents/by_division"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.list_agents(1).await.unwrap_err();
        assert!(err.to_string().contains("list_agents returned 500"), "got: {err}");
    }

    #[tokio::test]
    async fn assign_posts_pinned_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/admin/service/assign_agent"))
            .and(body_json(serde_json::json!({
                "room_id": 10,
                "agent_id": 500,
                "replace_latest_agent": false,
                "max_agent": 1
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": 200
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        client.assign(10, 500).await.unwrap();
    }

    #[tokio::test]
    async fn assign_surfaces_capacity_conflict_message() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/admin/service/assign_agent"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "errors": {"message": "agent has reached max customer"}
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.assign(10, 500).await.unwrap_err();
        assert!(
            err.to_string().contains("agent has reached max customer"),
            "got: {err}"
        );
    }

    #[tokio::test]
    async fn mark_resolved_posts_room_id() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/admin/service/mark_as_resolved"))
            .and(body_json(serde_json::json!({"room_id": 77})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": 200
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        client.mark_resolved(77).await.unwrap();
    }

    #[tokio::test]
    async fn slow_directory_times_out_as_bounded_failure() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2/admin/agents/by_division"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"data": []}))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.list_agents(1).await.unwrap_err();
        assert!(matches!(err, ParlorError::Timeout { .. }), "got: {err}");
    }
}
