// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Parlor allocation service.
//!
//! Exposes the webhook trigger surface consumed from the upstream chat
//! platform (`/webhooks/session`, `/webhooks/resolve`), the admin room
//! endpoints, and public health/metrics. Triggers acknowledge quickly; the
//! queue re-scan runs as a bounded, logged background task.

pub mod auth;
pub mod handlers;
pub mod server;

pub use auth::AuthConfig;
pub use server::{GatewayState, HealthState, ServerConfig, router, start_server};
