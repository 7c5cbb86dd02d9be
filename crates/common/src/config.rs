use anyhow::{Context, Result};
use serde::Deserialize;
use std::str::FromStr;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub general: General,
    pub database: Database,
    pub web: Web,
    pub dashboard: Dashboard,
}

#[derive(Debug, Deserialize)]
pub struct General {
    pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Database {
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Web {
    pub port: u16,
    pub host: String,
}

/// Row caps for the dashboard views. The collector keeps growing the store;
/// these bound what a single render will pull out of it.
#[derive(Debug, Deserialize, Clone)]
pub struct Dashboard {
    pub page_size: u32,
    pub smart_filter_limit: u32,
    pub price_history_limit: u32,
    pub alerts_limit: u32,
    pub whales_limit: u32,
    pub insights_limit: u32,
}

impl Config {
    /// Read the config file, `config/default.toml` unless `CONFIG_PATH`
    /// points somewhere else.
    pub fn load() -> Result<Self> {
        let path = std::env::var("CONFIG_PATH")
            .unwrap_or_else(|_| "config/default.toml".to_string());
        let content =
            std::fs::read_to_string(&path).with_context(|| format!("failed to read {path}"))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }
}

impl FromStr for Config {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_toml_str(s)
    }
}
