//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Altar - Awtrix scheduling broker
#[derive(Parser, Debug)]
#[command(
    name = "altar",
    about = "Polls routines and pushes their payloads to an Awtrix display",
    version = env!("CARGO_PKG_VERSION"),
    after_help = "Logs are written to: ~/.local/share/altar/logs/altar.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(long, global = true, help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)")]
    pub log_level: Option<String>,

    /// Write logs to this file instead of the default location
    #[arg(long, global = true, help = "Write logs to this file")]
    pub log_file: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// True when `run --debug` was given
    pub fn debug_mode(&self) -> bool {
        matches!(self.command, Some(Command::Run { debug: true, .. }))
    }
}

/// CLI subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the broker in the foreground (default)
    Run {
        /// IP address of the Awtrix device
        #[arg(short, long)]
        address: Option<String>,

        /// Port for the admin server
        #[arg(long)]
        admin_port: Option<u16>,

        /// Port the device listens on, e.g. 8080 for altar-request-logger
        #[arg(long)]
        device_port: Option<u16>,

        /// Skip the initial settings push and reboot, log at debug level
        #[arg(short, long)]
        debug: bool,
    },

    /// Stop a running broker through its admin server
    Stop {
        /// Host the broker's admin server listens on
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port of the broker's admin server
        #[arg(long)]
        admin_port: Option<u16>,
    },
}

impl Default for Command {
    fn default() -> Self {
        Command::Run {
            address: None,
            admin_port: None,
            device_port: None,
            debug: false,
        }
    }
}
