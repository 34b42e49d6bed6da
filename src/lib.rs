// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exporter;
pub mod importer;
pub mod ledger;
pub mod logging;
pub mod models;
pub mod oracle;
pub mod reports;
pub mod repos;
pub mod session;
pub mod store;
pub mod utils;
pub mod validate;
pub mod worker;
