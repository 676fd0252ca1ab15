//! Sign a development bearer token
//!
//! Usage:
//!   cargo run --bin issue_token -- alice
//!   cargo run --bin issue_token -- alice --env dev --ttl-minutes 60

use anyhow::{Context, Result, bail};
use ledger_transfer::auth::JwtVerifier;
use ledger_transfer::config::AppConfig;

fn arg_value(args: &[String], names: &[&str]) -> Option<String> {
    args.windows(2)
        .find(|pair| names.contains(&pair[0].as_str()))
        .map(|pair| pair[1].clone())
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let Some(account) = args.get(1).filter(|a| !a.starts_with('-')) else {
        bail!("usage: issue_token <account-id> [--env dev] [--ttl-minutes 60]");
    };

    let env = arg_value(&args, &["--env", "-e"]).unwrap_or_else(|| "dev".to_string());
    let ttl_minutes: i64 = match arg_value(&args, &["--ttl-minutes"]) {
        Some(v) => v.parse().with_context(|| format!("Invalid --ttl-minutes: {}", v))?,
        None => 60,
    };

    let config = AppConfig::load(&env)?;
    let verifier = JwtVerifier::from_config(&config.auth);
    let token = verifier.issue(account, chrono::Duration::minutes(ttl_minutes))?;
    println!("{}", token);
    Ok(())
}
