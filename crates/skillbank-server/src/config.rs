use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use skillbank_ledger::LedgerLimits;

/// Secrets that ship in examples and must never reach a running server.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me", "dev-secret-change-me", "secret", "changeme"];
const MIN_SECRET_LEN: usize = 16;

#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub proof_dir: PathBuf,
    pub public_url: String,
    pub owner_username: Option<String>,
    pub limits: LedgerLimits,
    pub webhook_url: Option<String>,
    pub relay_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let jwt_secret = get("SKILLBANK_JWT_SECRET").context("SKILLBANK_JWT_SECRET must be set")?;
        if PLACEHOLDER_SECRETS
            .iter()
            .any(|p| p.eq_ignore_ascii_case(&jwt_secret))
            || jwt_secret.len() < MIN_SECRET_LEN
        {
            bail!("SKILLBANK_JWT_SECRET is a placeholder or shorter than {MIN_SECRET_LEN} characters");
        }

        let limits = LedgerLimits {
            min_withdrawal: parse(&get, "SKILLBANK_MIN_WITHDRAWAL", 5_000)?,
            max_amount: parse(&get, "SKILLBANK_MAX_AMOUNT", 10_000_000)?,
        };
        if limits.min_withdrawal < 1 || limits.max_amount < limits.min_withdrawal {
            bail!(
                "invalid amount limits: min_withdrawal {} max_amount {}",
                limits.min_withdrawal,
                limits.max_amount
            );
        }

        let relay_interval_secs = parse(&get, "SKILLBANK_RELAY_INTERVAL_SECS", 15)?;
        if relay_interval_secs == 0 {
            bail!("SKILLBANK_RELAY_INTERVAL_SECS must be positive");
        }

        Ok(Self {
            jwt_secret,
            db_path: get("SKILLBANK_DB_PATH")
                .unwrap_or_else(|| "skillbank.db".into())
                .into(),
            host: get("SKILLBANK_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse(&get, "SKILLBANK_PORT", 3000)?,
            proof_dir: get("SKILLBANK_PROOF_DIR")
                .unwrap_or_else(|| "./proofs".into())
                .into(),
            public_url: get("SKILLBANK_PUBLIC_URL")
                .unwrap_or_else(|| "http://localhost:3000".into()),
            owner_username: get("SKILLBANK_OWNER_USERNAME"),
            limits,
            webhook_url: get("SKILLBANK_NOTIFY_WEBHOOK_URL"),
            relay_interval_secs,
        })
    }
}

fn parse<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
