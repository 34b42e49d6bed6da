// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod accounts;
pub mod advice;
pub mod budgets;
pub mod categories;
pub mod doctor;
pub mod exporter;
pub mod holidays;
pub mod importer;
pub mod reports;
pub mod thresholds;
pub mod transactions;
pub mod users;

use crate::config::Config;
use crate::ledger::Ledger;
use crate::models::Category;
use crate::session::Session;
use anyhow::{anyhow, Context, Result};
use clap::ArgMatches;
use std::collections::HashMap;

/// What every command handler works against.
pub struct Ctx {
    pub ledger: Ledger,
    pub config: Config,
}

impl Ctx {
    pub fn open(config: Config) -> Result<Self> {
        let ledger = Ledger::open(&config)
            .with_context(|| format!("Open data directory {}", config.data_dir.display()))?;
        Ok(Self { ledger, config })
    }

    /// Logs in with the global `--user` / `--password`.
    pub fn session(&self, m: &ArgMatches) -> Result<Session> {
        let (user, password) = credentials(m)?;
        self.ledger
            .login(user, password)
            .with_context(|| format!("Login as '{}'", user))
    }
}

pub fn credentials(m: &ArgMatches) -> Result<(&str, &str)> {
    let user = m
        .get_one::<String>("user")
        .ok_or_else(|| anyhow!("--user (or FINSAGE_USER) is required"))?;
    let password = m
        .get_one::<String>("password")
        .ok_or_else(|| anyhow!("--password (or FINSAGE_PASSWORD) is required"))?;
    Ok((user, password))
}

pub fn arg<'a>(m: &'a ArgMatches, name: &str) -> Result<&'a str> {
    m.get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("--{} is required", name))
}

pub fn opt<'a>(m: &'a ArgMatches, name: &str) -> Option<&'a str> {
    m.get_one::<String>(name).map(String::as_str)
}

pub fn output_flags(m: &ArgMatches) -> (bool, bool) {
    (m.get_flag("json"), m.get_flag("jsonl"))
}

/// Category id → name for display.
pub fn category_names(categories: &[Category]) -> HashMap<String, String> {
    categories
        .iter()
        .map(|c| (c.id.clone(), c.name.clone()))
        .collect()
}
