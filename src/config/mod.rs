// src/config/mod.rs - Process configuration from environment variables

use anyhow::{Context, Result};
use log::info;
use std::env;
use std::path::PathBuf;

const DEFAULT_DATA_FILE: &str = "data.json";
const DEFAULT_KEEPALIVE_PORT: u16 = 8080;

/// Everything the process needs besides the rule set itself. The Telegram
/// token is loaded separately by the platform layer.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// The bot owner. Always privileged, never stored in the admin list.
    pub owner_id: i64,
    /// Where the rule set is persisted.
    pub data_file: PathBuf,
    /// Port for the keep-alive HTTP endpoint.
    pub keepalive_port: u16,
}

impl BotConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let owner_id = env::var("OWNER_ID")
            .context("OWNER_ID environment variable not set")?
            .parse::<i64>()
            .context("OWNER_ID is not a valid user id")?;

        let data_file = env::var("DATA_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_FILE));

        let keepalive_port = match env::var("KEEPALIVE_PORT") {
            Ok(port) => port.parse().context("KEEPALIVE_PORT is not a valid port")?,
            Err(_) => DEFAULT_KEEPALIVE_PORT,
        };

        info!(
            "Configuration loaded: data file {}, keep-alive port {}",
            data_file.display(),
            keepalive_port
        );

        Ok(Self {
            owner_id,
            data_file,
            keepalive_port,
        })
    }
}
