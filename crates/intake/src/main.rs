// SPDX-FileCopyrightText: 2026 Intake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Intake - conversational support-ticket intake over WhatsApp.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod keepalive;
mod serve;
mod status;
mod tickets;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Intake - conversational support-ticket intake over WhatsApp.
#[derive(Parser, Debug)]
#[command(name = "intake", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the intake service.
    Serve,
    /// Query a running service's health endpoint.
    Status {
        /// Print machine-readable JSON.
        #[arg(long)]
        json: bool,
        /// Disable colors.
        #[arg(long)]
        plain: bool,
    },
    /// Inspect or repair the ticket counter.
    Tickets {
        #[command(subcommand)]
        action: Option<TicketsAction>,
    },
}

#[derive(Subcommand, Debug)]
enum TicketsAction {
    /// Show the counter and outstanding reservations (default).
    List {
        #[arg(long)]
        json: bool,
    },
    /// Drop a user's reservation, rolling the counter back if it is the latest id.
    Release {
        /// Chat id of the user, e.g. 919800000000@c.us.
        user: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match cli.config.as_deref() {
        Some(path) => intake_config::load_and_validate_path(path),
        None => intake_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            intake_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Status { json, plain }) => status::run_status(&config, json, plain).await,
        Some(Commands::Tickets { action }) => match action {
            None => tickets::run_list(&config, false).await,
            Some(TicketsAction::List { json }) => tickets::run_list(&config, json).await,
            Some(TicketsAction::Release { user }) => tickets::run_release(&config, &user).await,
        },
        None => {
            println!("intake: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["intake", "--config", "x.toml", "tickets", "release", "a@c.us"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        assert!(matches!(
            cli.command,
            Some(Commands::Tickets {
                action: Some(TicketsAction::Release { ref user })
            }) if user == "a@c.us"
        ));

        let cli = Cli::try_parse_from(["intake", "status", "--json"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Status { json: true, plain: false })
        ));
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = intake_config::load_config_from_str("")
            .expect("default config should be valid");
        assert_eq!(config.tickets.prefix, "ULI");
    }
}
