//! Configuration management for the gateway.
//!
//! Values come from an optional TOML file, overridden by `VMB__`-prefixed
//! environment variables (`VMB__SERVER__PORT=8080`). Every key has a default.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config/gateway.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub model: ModelConfig,
    pub accounts: AccountsConfig,
    pub review: ReviewConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite URL; the file is created if missing.
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://vmb_gateway.db".to_string(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Location of the serialized classifier.
    pub path: PathBuf,
    /// Train and persist a bootstrap model at startup when `path` is missing.
    pub bootstrap_if_missing: bool,
    pub bootstrap_samples: usize,
    /// Bernoulli rate of the synthetic fraud label.
    pub fraud_rate: f64,
    /// Fixes the synthetic data; random when unset.
    pub seed: Option<u64>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("fraud_model.json"),
            bootstrap_if_missing: true,
            bootstrap_samples: 1000,
            fraud_rate: 0.05,
            seed: None,
        }
    }
}

/// What to do with payments against an account the ledger does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownAccountPolicy {
    /// Deny and journal the attempt.
    #[default]
    Reject,
    /// Open the account with `default_balance`. Simulation only.
    Open,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AccountsConfig {
    pub unknown_account: UnknownAccountPolicy,
    pub default_balance: Decimal,
    pub default_customer_name: String,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            unknown_account: UnknownAccountPolicy::Reject,
            default_balance: Decimal::new(1_000_000, 2),
            default_customer_name: "Simulated Customer".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    pub high_risk_limit: usize,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self { high_risk_limit: 10 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` takes precedence
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Load from `path`, or from `config/gateway.toml` if it exists.
    pub fn load(path: Option<&Path>) -> Result<Self, Error> {
        let (file, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };

        let config = Config::builder()
            .add_source(File::from(file.as_path()).required(required))
            .add_source(Environment::with_prefix("VMB").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.model.bootstrap_samples, 1000);
        assert_eq!(config.model.fraud_rate, 0.05);
        assert_eq!(config.accounts.unknown_account, UnknownAccountPolicy::Reject);
        assert_eq!(config.review.high_risk_limit, 10);
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_keys() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[server]\nport = 8088\n\n[accounts]\nunknown_account = \"open\"\ndefault_balance = \"250.00\"\n\n[model]\nseed = 7"
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.server.port, 8088);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.accounts.unknown_account, UnknownAccountPolicy::Open);
        assert_eq!(config.accounts.default_balance, Decimal::new(25_000, 2));
        assert_eq!(config.model.seed, Some(7));
        assert!(config.model.bootstrap_if_missing);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let result = AppConfig::load(Some(Path::new("/nonexistent/gateway.toml")));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
