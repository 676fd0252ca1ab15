use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

use crate::money::{self, MinorUnits};
use crate::transfer::Account;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub gateway: GatewayConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthConfig {
    /// HS256 secret shared with the token issuer
    pub jwt_secret: String,
    /// Clock skew tolerated on `exp`
    #[serde(default = "default_leeway_secs")]
    pub leeway_secs: u64,
}

fn default_leeway_secs() -> u64 {
    30
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LedgerConfig {
    /// PostgreSQL connection URL; the in-memory ledger is used when absent
    #[serde(default)]
    pub postgres_url: Option<String>,
    /// Upper bound for every ledger call
    pub timeout_ms: u64,
    /// Accounts loaded into the in-memory ledger at start-up
    #[serde(default)]
    pub seed_accounts: Vec<SeedAccount>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            postgres_url: None,
            timeout_ms: 2_000,
            seed_accounts: Vec::new(),
        }
    }
}

impl LedgerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SeedAccount {
    pub id: String,
    /// Decimal string, e.g. "100.00"
    pub balance: String,
    #[serde(default)]
    pub verification_code: Option<String>,
}

impl SeedAccount {
    pub fn to_account(&self) -> Result<Account> {
        let balance = money::parse_balance(&self.balance)
            .with_context(|| format!("Invalid balance for seed account {}", self.id))?;
        Ok(Account::new(
            self.id.as_str(),
            balance,
            self.verification_code.as_deref(),
        ))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LimitsConfig {
    /// Largest accepted single transfer, decimal string
    pub max_amount: String,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_amount: "1000000.00".to_string(),
        }
    }
}

impl LimitsConfig {
    pub fn max_amount(&self) -> Result<MinorUnits> {
        money::parse_amount(&self.max_amount)
            .with_context(|| format!("Invalid limits.max_amount: {}", self.max_amount))
    }
}

impl AppConfig {
    pub fn load(env: &str) -> Result<Self> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path))?;
        let mut config = Self::from_yaml(&content)?;
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse config yaml")
    }

    /// Secrets and connection strings may come from the environment instead
    /// of the file.
    fn apply_env_overrides(&mut self) {
        if let Ok(secret) = std::env::var("TRANSFER_JWT_SECRET")
            && !secret.is_empty()
        {
            self.auth.jwt_secret = secret;
        }
        if let Ok(url) = std::env::var("DATABASE_URL")
            && !url.is_empty()
        {
            self.ledger.postgres_url = Some(url);
        }
    }
}
