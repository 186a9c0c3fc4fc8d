//! Clinic Gateway - API gateway and login service

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use clinic_gateway::{
    cli::{Cli, Command},
    config::Config,
    gateway::Gateway,
    login::{LoginService, hash_password},
    setup_tracing,
};

#[tokio::main]
async fn main() -> ExitCode {
    // .env is optional
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Err(e) = setup_tracing(&cli.log_level, cli.log_format.as_deref()) {
        eprintln!("Failed to setup tracing: {e}");
        return ExitCode::FAILURE;
    }

    match cli.command {
        Some(Command::HashPassword { ref secret, cost }) => run_hash_password(secret, cost).await,
        Some(Command::Login) => run_login(&cli).await,
        Some(Command::Gateway) | None => run_gateway(&cli).await,
    }
}

/// Load configuration, logging failures
fn load_config(cli: &Cli) -> Option<Config> {
    match Config::load(cli.config.as_deref()) {
        Ok(config) => Some(config),
        Err(e) => {
            error!("Failed to load configuration: {e}");
            None
        }
    }
}

/// Run the API gateway
async fn run_gateway(cli: &Cli) -> ExitCode {
    let Some(mut config) = load_config(cli) else {
        return ExitCode::FAILURE;
    };
    if let Some(port) = cli.port {
        config.gateway.port = port;
    }
    if let Some(ref host) = cli.host {
        config.gateway.host.clone_from(host);
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.gateway.port,
        "Starting API gateway"
    );

    let gateway = match Gateway::new(&config) {
        Ok(g) => g,
        Err(e) => {
            error!("Failed to create gateway: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = gateway.run().await {
        error!("Gateway error: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

/// Run the login service
async fn run_login(cli: &Cli) -> ExitCode {
    let Some(mut config) = load_config(cli) else {
        return ExitCode::FAILURE;
    };
    if let Some(port) = cli.port {
        config.login.port = port;
    }
    if let Some(ref host) = cli.host {
        config.login.host.clone_from(host);
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.login.port,
        "Starting login service"
    );

    let service = match LoginService::new(&config) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to create login service: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = service.run().await {
        error!("Login service error: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

/// Print a bcrypt hash
async fn run_hash_password(secret: &str, cost: u32) -> ExitCode {
    match hash_password(secret, cost).await {
        Ok(hash) => {
            println!("{hash}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("❌ Failed to hash secret: {e}");
            ExitCode::FAILURE
        }
    }
}
