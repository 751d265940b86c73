// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Coalescing guard: an atomic set-if-absent lock with expiry.
//!
//! Used to collapse bursts of queue re-scan triggers into one execution.
//! Failing to acquire is a normal control-flow outcome, not an error. The
//! lock key is scoped per trigger class (one key for "queue re-scan"),
//! never per room.

use std::time::Duration;

use parlor_core::ParlorError;
use rusqlite::params;

use crate::database::Database;

/// Try to take the named lock for `window`.
///
/// Single atomic statement: insert the lock row, or refresh it when it
/// already exists but has expired. Returns `true` iff this caller now
/// holds the lock. A live lock held by someone else leaves the row
/// untouched and returns `false`.
pub async fn try_acquire(
    db: &Database,
    lock_id: &str,
    window: Duration,
) -> Result<bool, ParlorError> {
    let lock_id = lock_id.to_string();
    // SQLite accepts fractional-second datetime modifiers.
    let window_modifier = format!("+{} seconds", window.as_secs_f64());
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "INSERT INTO guard_locks (lock_id, expires_at)
                 VALUES (?1, strftime('%Y-%m-%dT%H:%M:%fZ', 'now', ?2))
                 ON CONFLICT (lock_id) DO UPDATE SET
                   expires_at = excluded.expires_at
                 WHERE guard_locks.expires_at <= strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![lock_id, window_modifier],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Release the named lock so the next trigger does not wait out the window.
///
/// Releasing a lock that is absent or already expired is a no-op.
pub async fn release(db: &Database, lock_id: &str) -> Result<(), ParlorError> {
    let lock_id = lock_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute("DELETE FROM guard_locks WHERE lock_id = ?1", params![lock_id])?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}
