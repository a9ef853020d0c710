pub mod cli;
pub mod core;
pub mod dashboard;
pub mod providers;
pub mod server;

use crate::core::RateProvider;
use crate::core::config::AppConfig;
use crate::providers::FrankfurterProvider;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info};

/// Commands that need a loaded configuration and an upstream provider.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    Serve,
    Rates {
        base: Option<String>,
    },
    Convert {
        amount: f64,
        from: String,
        to: String,
    },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("fxdash starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let provider: Arc<dyn RateProvider> = Arc::new(FrankfurterProvider::new(
        &config.providers.frankfurter.base_url,
    ));

    match command {
        AppCommand::Serve => {
            let listener = TcpListener::bind(&config.server.bind)
                .await
                .with_context(|| format!("Failed to bind {}", config.server.bind))?;
            server::serve(listener, server::AppState::new(provider, config)).await
        }
        AppCommand::Rates { base } => cli::rates::run(provider, &config, base.as_deref()).await,
        AppCommand::Convert { amount, from, to } => {
            cli::convert::run(provider, &config, amount, &from, &to).await
        }
    }
}
