// ⚙️ Shop Configuration - where the database lives and how loud to log

use crate::report::ReportOptions;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::Level;

pub const ENV_DB_PATH: &str = "TINT_SHOP_DB";
pub const ENV_SERVER_ADDR: &str = "TINT_SHOP_ADDR";
pub const ENV_LOG_LEVEL: &str = "TINT_SHOP_LOG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopConfig {
    /// SQLite database file
    pub db_path: PathBuf,
    /// Listen address for the HTTP server
    pub server_addr: String,
    /// trace, debug, info, warn or error
    pub log_level: String,
    pub report: ReportOptions,
}

impl Default for ShopConfig {
    fn default() -> Self {
        ShopConfig {
            db_path: PathBuf::from("tint_shop.db"),
            server_addr: "127.0.0.1:3000".to_string(),
            log_level: "info".to_string(),
            report: ReportOptions::default(),
        }
    }
}

impl ShopConfig {
    /// Defaults overridden by `TINT_SHOP_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ShopConfig::default();
        let set = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(path) = set(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(addr) = set(ENV_SERVER_ADDR) {
            config.server_addr = addr;
        }
        if let Some(level) = set(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        config
    }

    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = path.into();
        self
    }

    pub fn with_server_addr(mut self, addr: &str) -> Self {
        self.server_addr = addr.to_string();
        self
    }

    /// Parsed log level; unknown values fall back to INFO
    pub fn level(&self) -> Level {
        self.log_level.trim().parse().unwrap_or(Level::INFO)
    }
}
