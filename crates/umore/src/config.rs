//! Configuration loading from environment variables.

use anyhow::{Context, Result};
use std::path::PathBuf;

pub const DEFAULT_DB_PATH: &str = "umore.db";
pub const DEFAULT_PORT: u16 = 8080;

/// Runtime settings, before command-line overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub db_path: PathBuf,
    pub port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            port: DEFAULT_PORT,
        }
    }
}

impl Settings {
    /// Load settings from environment variables.
    ///
    /// Reads `UMORE_DB` and `UMORE_PORT`, either from the environment or from
    /// a `.env` file. Both are optional.
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_vars(
            std::env::var("UMORE_DB").ok(),
            std::env::var("UMORE_PORT").ok(),
        )
    }

    fn from_vars(db: Option<String>, port: Option<String>) -> Result<Self> {
        let mut settings = Self::default();

        if let Some(db) = db.filter(|v| !v.trim().is_empty()) {
            settings.db_path = PathBuf::from(db);
        }

        if let Some(port) = port.filter(|v| !v.trim().is_empty()) {
            settings.port = port
                .trim()
                .parse()
                .with_context(|| format!("UMORE_PORT is not a valid port: {}", port))?;
        }

        Ok(settings)
    }

    /// Apply command-line overrides on top of the environment
    pub fn with_overrides(mut self, db_path: Option<PathBuf>, port: Option<u16>) -> Self {
        if let Some(db_path) = db_path {
            self.db_path = db_path;
        }
        if let Some(port) = port {
            self.port = port;
        }
        self
    }
}
