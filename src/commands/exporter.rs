// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{arg, opt, Ctx};
use crate::exporter::{export_transactions, ExportFormat};
use anyhow::Result;

pub fn handle(ctx: &Ctx, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("transactions", sub)) => {
            let session = ctx.session(sub)?;
            let format: ExportFormat = opt(sub, "format").unwrap_or("csv").parse()?;
            let out = arg(sub, "out")?;
            let n = export_transactions(&ctx.ledger, &session, format, out)?;
            println!("Exported {} transactions to {}", n, out);
            Ok(())
        }
        _ => Ok(()),
    }
}
