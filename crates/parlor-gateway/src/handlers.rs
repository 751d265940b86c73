// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the webhook and admin API.
//!
//! Webhook payload shapes follow the upstream chat platform: a new session
//! carries `{channel: {id}, room_id}`, a resolution carries
//! `{channel: {id}, resolved_by: {id}, service: {room_id}}`. Every
//! response uses the `{status, message, payload}` envelope.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use parlor_core::ParlorError;
use parlor_engine::AllocationOutcome;
use parlor_store::queries::rooms;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};

use crate::server::GatewayState;

/// Reference to a channel inside a webhook payload.
#[derive(Debug, Deserialize)]
pub struct ChannelRef {
    pub id: i64,
}

/// Reference to the resolving agent inside a resolution payload.
#[derive(Debug, Deserialize)]
pub struct AgentRef {
    pub id: i64,
}

/// Service block of a resolution payload.
#[derive(Debug, Deserialize)]
pub struct ServiceRef {
    pub room_id: i64,
}

/// Body of `POST /webhooks/session`.
#[derive(Debug, Deserialize)]
pub struct NewSessionEvent {
    pub channel: ChannelRef,
    pub room_id: i64,
}

/// Body of `POST /webhooks/resolve`.
#[derive(Debug, Deserialize)]
pub struct ResolveEvent {
    pub channel: ChannelRef,
    pub resolved_by: AgentRef,
    pub service: ServiceRef,
}

/// Body of `POST /rooms` (admin insert).
#[derive(Debug, Deserialize)]
pub struct NewRoomRequest {
    #[serde(default)]
    pub room_id: Option<i64>,
    #[serde(default)]
    pub channel_id: Option<i64>,
}

/// The `{status, message, payload}` response envelope.
#[derive(Debug, Serialize)]
pub struct Payload {
    pub status: String,
    pub message: String,
    pub payload: serde_json::Value,
}

/// Build an envelope response.
pub fn response_payload(
    status: &str,
    message: impl Into<String>,
    payload: serde_json::Value,
    code: StatusCode,
) -> Response {
    (
        code,
        Json(Payload {
            status: status.to_string(),
            message: message.into(),
            payload,
        }),
    )
        .into_response()
}

/// Map an engine error onto the envelope. Store and directory outages are
/// retryable 500s; the upstream redelivers webhooks.
fn error_response(context: &str, e: &ParlorError) -> Response {
    error!(error = %e, context, "trigger processing failed");
    response_payload(
        "error",
        "internal server error, please check server config",
        json!({}),
        StatusCode::INTERNAL_SERVER_ERROR,
    )
}

/// POST /webhooks/session
///
/// New session arrival: insert the room and attempt one immediate
/// assignment. Always acknowledges quickly; a full queue is not an error.
pub async fn post_session(
    State(state): State<GatewayState>,
    Json(event): Json<NewSessionEvent>,
) -> Response {
    let room_id = event.room_id;
    let channel_id = event.channel.id;

    match state.engine.handle_new_session(room_id, channel_id).await {
        Ok(AllocationOutcome::Assigned { agent_id }) => response_payload(
            "ok",
            format!("room {room_id} assigned to agent {agent_id}"),
            json!({ "agent_id": agent_id }),
            StatusCode::OK,
        ),
        Ok(AllocationOutcome::Queued) => response_payload(
            "ok",
            format!("room {room_id} queued, no agent available"),
            json!({}),
            StatusCode::OK,
        ),
        Ok(AllocationOutcome::Duplicate) => response_payload(
            "ok",
            format!("room {room_id} already known, duplicate event ignored"),
            json!({}),
            StatusCode::OK,
        ),
        Err(e) => error_response("new_session", &e),
    }
}

/// POST /webhooks/resolve
///
/// Resolution event: resolve inline, then, only when this trigger wins
/// the coalescing guard, run the queue re-scan as a bounded background
/// task. The ack distinguishes "processed" from "skipped-debounced"; it
/// never blocks the caller on the scan itself.
pub async fn post_resolve(
    State(state): State<GatewayState>,
    Json(event): Json<ResolveEvent>,
) -> Response {
    let room_id = event.service.room_id;
    let channel_id = event.channel.id;
    let agent_id = event.resolved_by.id;

    if let Err(e) = state.engine.resolve(room_id, channel_id, agent_id).await {
        return error_response("resolve", &e);
    }

    if !state.engine.try_begin_rescan().await {
        return response_payload(
            "ok",
            format!("room {room_id} resolved, re-scan skipped (debounce window active)"),
            json!({ "rescan": "debounced" }),
            StatusCode::OK,
        );
    }

    let engine = state.engine.clone();
    let rescan_timeout = state.rescan_timeout;
    let task_id = uuid::Uuid::new_v4().to_string();
    info!(task_id = %task_id, channel_id, "queue re-scan scheduled");
    tokio::spawn(async move {
        match tokio::time::timeout(rescan_timeout, engine.run_rescan(channel_id)).await {
            Ok(Ok(assigned)) => {
                info!(task_id = %task_id, channel_id, assigned, "background re-scan finished");
            }
            Ok(Err(e)) => {
                error!(task_id = %task_id, channel_id, error = %e, "background re-scan failed");
                engine.abort_rescan().await;
            }
            Err(_) => {
                warn!(task_id = %task_id, channel_id, ?rescan_timeout, "background re-scan timed out");
                engine.abort_rescan().await;
            }
        }
    });

    response_payload(
        "ok",
        format!("room {room_id} resolved, re-scan scheduled"),
        json!({ "rescan": "scheduled" }),
        StatusCode::OK,
    )
}

/// GET /rooms
///
/// Admin listing of every room.
pub async fn get_rooms(State(state): State<GatewayState>) -> Response {
    match rooms::list_rooms(state.engine.database()).await {
        Ok(all) => response_payload(
            "ok",
            "success fetch all rooms",
            json!({ "data": all }),
            StatusCode::OK,
        ),
        Err(e) => error_response("list_rooms", &e),
    }
}

/// POST /rooms
///
/// Admin insert of a queued room. Duplicate inserts are absorbed.
pub async fn post_room(
    State(state): State<GatewayState>,
    Json(body): Json<NewRoomRequest>,
) -> Response {
    let (Some(room_id), Some(channel_id)) = (body.room_id, body.channel_id) else {
        return response_payload(
            "invalid",
            "invalid or empty values",
            json!({}),
            StatusCode::BAD_REQUEST,
        );
    };

    match rooms::create_if_absent(state.engine.database(), room_id, channel_id).await {
        Ok(true) => response_payload(
            "ok",
            "success adding new room",
            json!({ "room_id": room_id, "channel_id": channel_id }),
            StatusCode::OK,
        ),
        Ok(false) => response_payload(
            "ok",
            format!("room {room_id} already exists"),
            json!({}),
            StatusCode::OK,
        ),
        Err(e) => error_response("create_room", &e),
    }
}

/// POST /rooms/resolve-all
///
/// Bulk resolution sweep across every unresolved room.
pub async fn post_resolve_all(State(state): State<GatewayState>) -> Response {
    match state.engine.resolve_all().await {
        Ok(0) => response_payload(
            "ok",
            "no unresolved rooms",
            json!({ "resolved": 0 }),
            StatusCode::NOT_FOUND,
        ),
        Ok(resolved) => response_payload(
            "ok",
            "success resolving all rooms",
            json!({ "resolved": resolved }),
            StatusCode::OK,
        ),
        Err(e) => error_response("resolve_all", &e),
    }
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub timestamp: String,
}

/// GET /health (public)
pub async fn get_public_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// GET /metrics (public)
///
/// Prometheus exposition text when a recorder is installed, 404 otherwise.
pub async fn get_public_metrics(State(state): State<GatewayState>) -> Response {
    match &state.health.prometheus_render {
        Some(render) => (StatusCode::OK, render()).into_response(),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response(),
    }
}
