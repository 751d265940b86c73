// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded retry with linear backoff.
//!
//! One policy object covers every transient-failure loop in the engine:
//! the directory "no candidates" retry and the coalescing-guard
//! acquisition both run through [`RetryPolicy::run`], parameterized only
//! by attempt count and base delay.

use std::future::Future;
use std::time::Duration;

/// A bounded retry policy with linearly increasing delays.
///
/// Attempt `n` (1-based) is followed by a sleep of `base_delay * n`, so a
/// 3-attempt policy sleeps `1x` then `2x` before giving up. No sleep
/// follows the final attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay to sleep after the given 1-based attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    /// Run `op` until it yields `Some`, up to `max_attempts` times.
    ///
    /// `op` receives the 1-based attempt number. Returns `None` when every
    /// attempt came up empty. The caller decides what "empty" means:
    /// errors the caller wants retried are mapped to `None` inside `op`.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Option<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        for attempt in 1..=self.max_attempts {
            if let Some(value) = op(attempt).await {
                return Some(value);
            }
            if attempt < self.max_attempts {
                tokio::time::sleep(self.delay_for(attempt)).await;
            }
        }
        None
    }
}
