pub mod cli;
pub mod core;
pub mod providers;
pub mod query;
pub mod refresh;
pub mod scheduler;
pub mod server;
pub mod store;

use crate::core::config::AppConfig;
use crate::query::QueryService;
use crate::refresh::RefreshCoordinator;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    Serve,
    Refresh,
    GoldHistory { limit: Option<usize> },
    RateHistory { limit: Option<usize> },
}

/// Fully wired services built from a configuration.
pub struct App {
    pub config: AppConfig,
    pub coordinator: Arc<RefreshCoordinator>,
    pub query: Arc<QueryService>,
}

impl App {
    pub fn build(config: AppConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.refresh.timeout_secs);

        let exchange = &config.providers.exchange_rate;
        let metals = &config.providers.metals;
        if exchange.api_key.is_empty() {
            warn!("No exchange rate API key configured, refreshes will fail");
        }
        if metals.api_key.is_empty() {
            warn!("No metals API key configured, refreshes will fail");
        }

        let rate_source = providers::ExchangeRateApiProvider::new(
            &exchange.base_url,
            &exchange.api_key,
            &config.currency,
            timeout,
        )
        .context("Failed to create exchange rate provider")?;
        let metal_source = providers::MetalPriceApiProvider::new(
            &metals.base_url,
            &metals.api_key,
            &config.metal,
            timeout,
        )
        .context("Failed to create metal price provider")?;
        let store = store::open_history_store(&config)?;

        let coordinator = Arc::new(
            RefreshCoordinator::new(Arc::new(rate_source), Arc::new(metal_source), store)
                .with_persistence_mode(config.refresh.persistence),
        );
        let query = Arc::new(QueryService::new(Arc::clone(&coordinator)));

        Ok(Self {
            config,
            coordinator,
            query,
        })
    }
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Goldwatch starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!(
        currency = %config.currency,
        metal = %config.metal,
        storage = ?config.storage,
        "Loaded config"
    );

    let app = App::build(config)?;
    run_app(command, &app).await
}

pub async fn run_app(command: AppCommand, app: &App) -> Result<()> {
    let config = &app.config;
    match command {
        AppCommand::Serve => {
            let scheduled = config
                .refresh
                .schedule_secs
                .filter(|secs| *secs > 0)
                .map(|secs| {
                    scheduler::spawn(Arc::clone(&app.coordinator), Duration::from_secs(secs))
                });
            let result = server::serve(&config.server, Arc::clone(&app.query)).await;
            if let Some(handle) = scheduled {
                handle.abort();
            }
            result
        }
        AppCommand::Refresh => cli::refresh::run(&app.coordinator, &config.currency).await,
        AppCommand::GoldHistory { limit } => {
            let history = app.query.gold_history(limit).await?;
            println!(
                "{}",
                cli::history::gold_table(&history, &config.currency, &config.metal)
            );
            Ok(())
        }
        AppCommand::RateHistory { limit } => {
            let history = app.query.rate_history(limit).await?;
            println!("{}", cli::history::rate_table(&history, &config.currency));
            Ok(())
        }
    }
}
