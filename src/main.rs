//! Ledger Transfer service
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌──────────┐    ┌──────────┐
//! │  Config  │───▶│  Ledger  │───▶│Orchestr. │───▶│ Gateway  │
//! │  (YAML)  │    │(PG / RAM)│    │(FSM)     │    │ (axum)   │
//! └──────────┘    └──────────┘    └──────────┘    └──────────┘
//! ```

use std::sync::Arc;

use anyhow::{Context, Result, bail};

use ledger_transfer::auth::JwtVerifier;
use ledger_transfer::config::{AppConfig, SeedAccount};
use ledger_transfer::db::Database;
use ledger_transfer::gateway::{self, AppState};
use ledger_transfer::logging;
use ledger_transfer::transfer::{
    InMemoryLedger, Ledger, LedgerExecutor, PgLedger, TransferOrchestrator, TransferValidator,
};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

async fn build_ledger(config: &AppConfig) -> Result<Arc<dyn Ledger>> {
    let seeds = config
        .ledger
        .seed_accounts
        .iter()
        .map(SeedAccount::to_account)
        .collect::<Result<Vec<_>>>()?;

    let Some(url) = config.ledger.postgres_url.as_deref() else {
        tracing::info!(accounts = seeds.len(), "Using in-memory ledger");
        return Ok(Arc::new(InMemoryLedger::with_accounts(seeds)));
    };

    let db = Database::connect(url)
        .await
        .context("Failed to connect to PostgreSQL")?;
    db.migrate().await?;
    let ledger = PgLedger::new(db.pool().clone());

    // Seeds only create missing accounts; existing balances are left alone
    for account in &seeds {
        if ledger.read_account(&account.id).await?.is_none() {
            ledger
                .upsert_account(account)
                .await
                .with_context(|| format!("Failed to seed account {}", account.id))?;
            tracing::info!(account = %account.id, "Seeded account");
        }
    }
    tracing::info!("Using PostgreSQL ledger");
    Ok(Arc::new(ledger))
}

#[tokio::main]
async fn main() -> Result<()> {
    let env = get_env();
    let mut app_config = AppConfig::load(&env)?;
    if let Some(port) = get_port_override() {
        app_config.gateway.port = port;
    }
    let _log_guard = logging::init_logging(&app_config)?;

    tracing::info!(
        version = env!("GIT_HASH"),
        "Starting ledger transfer service in {} mode",
        env
    );

    if app_config.auth.jwt_secret.is_empty() {
        bail!("auth.jwt_secret is empty (set it in config or TRANSFER_JWT_SECRET)");
    }

    let ledger = build_ledger(&app_config).await?;
    let verifier = Arc::new(JwtVerifier::from_config(&app_config.auth));
    let validator = TransferValidator::new(app_config.limits.max_amount()?);
    let executor = LedgerExecutor::new(ledger, app_config.ledger.timeout());
    let orchestrator = Arc::new(TransferOrchestrator::new(verifier, validator, executor));

    gateway::run_server(&app_config.gateway, AppState::new(orchestrator)).await
}
