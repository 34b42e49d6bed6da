// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use std::path::{Path, PathBuf};
use std::time::Duration;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.softwareengineering", "Finsage", "finsage"));

pub const ENV_DATA_DIR: &str = "FINSAGE_DATA_DIR";
pub const ENV_ORACLE_URL: &str = "FINSAGE_ORACLE_URL";
pub const ENV_ORACLE_KEY: &str = "FINSAGE_ORACLE_KEY";
pub const ENV_ORACLE_MODEL: &str = "FINSAGE_ORACLE_MODEL";
pub const ENV_ORACLE_TIMEOUT: &str = "FINSAGE_ORACLE_TIMEOUT_SECS";

pub const DEFAULT_ORACLE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_ORACLE_MODEL: &str = "gpt-4o";
pub const DEFAULT_ORACLE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ORACLE_URL.to_string(),
            api_key: None,
            model: DEFAULT_ORACLE_MODEL.to_string(),
            timeout: DEFAULT_ORACLE_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub oracle: OracleConfig,
}

pub fn default_data_dir() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    Ok(proj.data_dir().to_path_buf())
}

impl Config {
    /// Tables under `dir`, oracle left at its defaults.
    pub fn with_data_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: dir.as_ref().to_path_buf(),
            oracle: OracleConfig::default(),
        }
    }

    /// Reads the process environment. `data_dir` (from `--data-dir`) wins over
    /// `FINSAGE_DATA_DIR`, which wins over the platform data dir.
    pub fn load(data_dir: Option<PathBuf>) -> Result<Self> {
        Self::from_lookup(data_dir, |key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(data_dir: Option<PathBuf>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let data_dir = match data_dir.or_else(|| var(ENV_DATA_DIR).map(PathBuf::from)) {
            Some(dir) => dir,
            None => default_data_dir()?,
        };

        let mut oracle = OracleConfig::default();
        if let Some(url) = var(ENV_ORACLE_URL) {
            oracle.base_url = url.trim_end_matches('/').to_string();
        }
        oracle.api_key = var(ENV_ORACLE_KEY);
        if let Some(model) = var(ENV_ORACLE_MODEL) {
            oracle.model = model;
        }
        if let Some(secs) = var(ENV_ORACLE_TIMEOUT) {
            let secs: u64 = secs
                .parse()
                .with_context(|| format!("Invalid {} '{}'", ENV_ORACLE_TIMEOUT, secs))?;
            oracle.timeout = Duration::from_secs(secs);
        }

        Ok(Self { data_dir, oracle })
    }
}
