use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use station_auth::auth::registry::TokenServices;
use station_auth::cache::token_cache::TokenCache;
use station_auth::config::loader::file_to_config;
use station_auth::server;
use station_auth::utils::logging::{self, LogLevel};
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = "station-auth.yaml")]
    config: PathBuf,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the Authorization header value for a service
    Token { service: String },
    /// Print the policy actor decoded from a service's token
    Actor { service: String },
    /// Serve tokens and metrics over HTTP
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Load YAML config
    // -------------------------------

    let args = Args::parse();
    let service_config = file_to_config(&args.config).await?;
    logging::run(Some(&service_config), args.log_level);

    // -------------------------------
    // 2. One cache for the whole process
    // -------------------------------

    let cache = TokenCache::new();
    let services = Arc::new(TokenServices::from_config(&service_config, cache)?);
    info!("configured services: {:?}", services.names());

    // -------------------------------
    // 3. Run command
    // -------------------------------

    match args.command {
        Command::Token { service } => {
            let token = services.get(&service)?.get_token().await?;
            println!("{}", token.authorization_value());
        }
        Command::Actor { service } => {
            let actor = services.get(&service)?.get_policy_actor().await?;
            println!("{}", serde_json::to_string_pretty(&actor)?);
        }
        Command::Serve => {
            info!("Service starting...");
            server::server::start(&service_config.settings, services).await?;
        }
    }

    Ok(())
}
