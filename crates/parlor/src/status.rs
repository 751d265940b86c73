// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `parlor status` command implementation.
//!
//! Prints room counts per state and checks directory reachability.

use parlor_config::ParlorConfig;
use parlor_core::{AgentDirectory, ParlorError};
use parlor_directory::DirectoryClient;
use parlor_store::Database;

/// Runs the `parlor status` command.
pub async fn run_status(config: ParlorConfig) -> Result<(), ParlorError> {
    let db = Database::open_with_options(&config.storage.database_path, config.storage.wal_mode)
        .await?;

    let counts: Vec<(String, i64)> = db
        .connection()
        .call(|conn| {
            let mut stmt =
                conn.prepare("SELECT status, COUNT(*) FROM rooms GROUP BY status ORDER BY status")?;
            let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
            let mut counts = Vec::new();
            for row in rows {
                counts.push(row?);
            }
            Ok(counts)
        })
        .await
        .map_err(|e: tokio_rusqlite::Error| ParlorError::Storage { source: Box::new(e) })?;

    println!("store: {}", config.storage.database_path);
    if counts.is_empty() {
        println!("  no rooms");
    }
    for (status, count) in counts {
        println!("  {status}: {count}");
    }

    if config.directory.api_url.trim().is_empty() {
        println!("directory: not configured");
    } else {
        let directory = DirectoryClient::new(&config.directory)?;
        match directory.list_agents(0).await {
            Ok(agents) => {
                let online = agents.iter().filter(|a| a.is_available).count();
                println!(
                    "directory: reachable ({} agents, {} online)",
                    agents.len(),
                    online
                );
            }
            Err(e) => println!("directory: unreachable ({e})"),
        }
    }

    db.close().await?;
    Ok(())
}
