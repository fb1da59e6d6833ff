pub mod run_options;

use crate::error::AppError;
use run_options::Args;
use serde::Deserialize;
use std::fs;
use tracing::warn;

pub const CONFIG_FILE: &str = "./wtr.toml";
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Database {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct WebServer {
    pub address: String,
}

impl Default for WebServer {
    fn default() -> Self {
        Self { address: "0.0.0.0:8080".to_owned() }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Log {
    pub level: String,
}

impl Default for Log {
    fn default() -> Self {
        Self { level: "info".to_owned() }
    }
}

#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub database: Database,
    pub web_server: WebServer,
    pub log: Log,
}

impl Config {
    /// File (if present), then `DATABASE_URL`, then command line.
    pub fn load(args: &Args) -> Result<Self, AppError> {
        let mut config = if args.cfg_file.exists() {
            let config_content = fs::read_to_string(&args.cfg_file)?;
            Self::load_from_str(&config_content)?
        } else {
            warn!("Config file '{}' not found. Proceeding with defaults.", args.cfg_file.display());
            Self::default()
        };
        config.apply_overrides(args, std::env::var(DATABASE_URL_ENV).ok());
        Ok(config)
    }

    pub fn load_from_str(config_str: &str) -> Result<Self, AppError> {
        toml::from_str(config_str).map_err(|e| AppError::Config(e.to_string()))
    }

    pub fn apply_overrides(&mut self, args: &Args, env_url: Option<String>) {
        if let Some(url) = env_url.filter(|u| !u.trim().is_empty()) {
            self.database.url = Some(url);
        }
        if let Some(url) = &args.database {
            self.database.url = Some(url.clone());
        }
        if let Some(address) = &args.address {
            self.web_server.address = address.clone();
        }
    }

    /// The store connection string. Missing is fatal.
    pub fn database_url(&self) -> Result<&str, AppError> {
        self.database
            .url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| AppError::Config(format!("{} must be set", DATABASE_URL_ENV)))
    }
}
