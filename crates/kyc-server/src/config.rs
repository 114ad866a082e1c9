//! Server configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! `kyc-server.{toml,yaml,json}` file (or the file named by `KYC_CONFIG`),
//! then `KYC_*` environment variables.

use crate::error::Result;
use ::config::{Config, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Default config file stem, resolved against the working directory
pub const DEFAULT_CONFIG_FILE: &str = "kyc-server";

/// Default snapshot file name
pub const DEFAULT_SNAPSHOT_PATH: &str = "kycDetails.json";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub bind_address: String,
    pub database_path: String,
    pub snapshot_path: PathBuf,
    /// Seconds between background snapshot flushes; 0 disables the task
    pub snapshot_interval_secs: u64,
    pub log_level: String,
}

impl Settings {
    /// Load settings from the config file and the process environment
    pub fn load() -> Result<Self> {
        let file = std::env::var("KYC_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::build(Some(&file), None)
    }

    /// Build settings from an optional config file and an optional explicit
    /// environment map (the process environment is used when `env` is `None`).
    pub fn build(file: Option<&str>, env: Option<HashMap<String, String>>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("bind_address", "0.0.0.0:8080")?
            .set_default("database_path", "data/kyc.db")?
            .set_default("snapshot_path", DEFAULT_SNAPSHOT_PATH)?
            .set_default("snapshot_interval_secs", 0)?
            .set_default("log_level", "info")?;

        if let Some(file) = file {
            builder = builder.add_source(File::with_name(file).required(false));
        }

        let settings = builder
            .add_source(
                Environment::with_prefix("KYC")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?
            .try_deserialize()?;

        Ok(settings)
    }

    pub fn snapshot_interval(&self) -> Option<Duration> {
        (self.snapshot_interval_secs > 0).then(|| Duration::from_secs(self.snapshot_interval_secs))
    }
}
