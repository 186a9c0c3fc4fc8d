//! Command-line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// API gateway and login service for the clinic backends
#[derive(Parser, Debug)]
#[command(name = "clinic-gateway")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, env = "CLINIC_GATEWAY_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Port to listen on (overrides the selected service's port)
    #[arg(short, long, global = true)]
    pub port: Option<u16>,

    /// Host to bind to (overrides the selected service's host)
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        long,
        default_value = "info",
        env = "CLINIC_GATEWAY_LOG_LEVEL",
        global = true
    )]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "CLINIC_GATEWAY_LOG_FORMAT", global = true)]
    pub log_format: Option<String>,

    /// Subcommand (optional - defaults to the gateway)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the API gateway (default, port 8080)
    Gateway,

    /// Run the login service (port 3000)
    Login,

    /// Print a bcrypt hash of a secret, for migrating plaintext rows
    HashPassword {
        /// Secret to hash
        #[arg(required = true)]
        secret: String,

        /// Bcrypt cost factor
        #[arg(long, default_value_t = bcrypt::DEFAULT_COST)]
        cost: u32,
    },
}
