use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vmb_gateway::api;
use vmb_gateway::config::{AppConfig, LoggingConfig};
use vmb_gateway::engine::Engine;
use vmb_gateway::features::{FeatureExtractor, UniformDeviceSignal};
use vmb_gateway::ingestion::{self, CsvReader};
use vmb_gateway::ledger::SqliteLedger;
use vmb_gateway::scorer::{self, ModelScorer};

/// Fraud-scored payment gateway for VMB accounts
#[derive(Parser)]
#[command(name = "vmb_gateway")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML configuration file (defaults to config/gateway.toml when present)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP gateway (default)
    Serve,

    /// Train and persist the bootstrap fraud model
    ProvisionModel {
        /// Retrain even if the artifact already exists
        #[arg(long)]
        force: bool,
    },

    /// Create the ledger schema, optionally seeding accounts from a CSV file
    InitDb {
        /// CSV with account_number,customer_name,current_balance rows
        #[arg(long)]
        seed: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    init_tracing(&config.logging)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::ProvisionModel { force } => {
            let model = scorer::provision_model(&config.model, force)
                .context("Failed to provision fraud model")?;
            println!(
                "model ready: path={} samples={} trained_at={}",
                config.model.path.display(),
                model.training_samples,
                model.trained_at
            );
            Ok(())
        }
        Command::InitDb { seed } => init_db(&config, seed).await,
    }
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("vmb_gateway={0},tower_http={0}", logging.level)))
        .context("Invalid log level")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let result = if logging.format.eq_ignore_ascii_case("json") {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))
}

async fn serve(config: AppConfig) -> Result<()> {
    let ledger = SqliteLedger::connect(&config.database)
        .await
        .context("Failed to open ledger database")?;
    ledger.migrate().await.context("Failed to migrate ledger")?;

    let scorer = ModelScorer::from_config(&config.model).context("Fraud model unavailable")?;
    let engine = Engine::new(
        scorer,
        ledger,
        FeatureExtractor::new(UniformDeviceSignal),
        config.accounts.clone(),
    );
    let app = api::create_router(Arc::new(engine), config.review.high_risk_limit);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(%addr, "Gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown requested");
    }
}

async fn init_db(config: &AppConfig, seed: Option<PathBuf>) -> Result<()> {
    let ledger = SqliteLedger::connect(&config.database)
        .await
        .context("Failed to open ledger database")?;
    ledger.migrate().await.context("Failed to migrate ledger")?;
    println!("schema ready: {}", config.database.url);

    if let Some(path) = seed {
        let file = File::open(&path)
            .with_context(|| format!("Failed to open seed file {}", path.display()))?;
        let mut reader = CsvReader::new(file);
        let report = ingestion::seed_ledger(&ledger, &mut reader)
            .await
            .context("Failed to seed accounts")?;
        println!(
            "seeded accounts: opened={} skipped={}",
            report.opened, report.skipped
        );
    }

    Ok(())
}
