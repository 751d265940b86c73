// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parlor - capacity-aware routing of customer chat rooms to human agents.
//!
//! This is the binary entry point for the Parlor service.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Parser, Subcommand};

mod serve;
mod status;

/// Parlor - capacity-aware routing of customer chat rooms to human agents.
#[derive(Parser, Debug)]
#[command(name = "parlor", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the allocation service.
    Serve,
    /// Print the resolved configuration (secrets redacted).
    Config,
    /// Show room counts and directory reachability.
    Status,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup.
    let config = match parlor_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            parlor_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Config) => {
            print_config(config);
            Ok(())
        }
        Some(Commands::Status) => status::run_status(config).await,
        None => {
            println!("parlor: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// Print the resolved configuration as TOML with secrets redacted.
fn print_config(mut config: parlor_config::ParlorConfig) {
    if !config.directory.secret_key.is_empty() {
        config.directory.secret_key = "[redacted]".to_string();
    }
    if config.service.bearer_token.is_some() {
        config.service.bearer_token = Some("[redacted]".to_string());
    }
    match toml::to_string_pretty(&config) {
        Ok(rendered) => print!("{rendered}"),
        Err(e) => eprintln!("failed to render config: {e}"),
    }
}
