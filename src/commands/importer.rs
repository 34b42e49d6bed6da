// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::advice::off_thread;
use super::{arg, Ctx};
use crate::importer::import_transactions;
use crate::ledger::Ledger;
use crate::utils::pretty_table;
use anyhow::Result;

pub fn handle(ctx: &Ctx, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("transactions", sub)) => transactions(ctx, sub),
        _ => Ok(()),
    }
}

fn transactions(ctx: &Ctx, sub: &clap::ArgMatches) -> Result<()> {
    let session = ctx.session(sub)?;
    let path = arg(sub, "path")?.trim().to_string();
    let data_dir = ctx.config.data_dir.clone();
    let shown = path.clone();
    // the worker opens its own handle on the same tables
    let report = off_thread("import", move || -> Result<_> {
        let ledger = Ledger::open_dir(&data_dir)?;
        Ok(import_transactions(&ledger, &session, &path)?)
    })??;

    println!(
        "Imported {} transactions from {}",
        report.imported_count(),
        shown
    );
    if !report.skipped.is_empty() {
        let rows = report
            .skipped
            .into_iter()
            .map(|s| vec![s.line.to_string(), s.reason])
            .collect();
        println!("Skipped rows:");
        println!("{}", pretty_table(&["Line", "Reason"], rows));
    }
    Ok(())
}
