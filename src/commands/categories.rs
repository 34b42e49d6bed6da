// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{arg, output_flags, Ctx};
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::{bail, Result};

pub fn handle(ctx: &Ctx, m: &clap::ArgMatches) -> Result<()> {
    let Some((name, sub)) = m.subcommand() else {
        return Ok(());
    };
    let session = ctx.session(sub)?;
    match name {
        "add" => {
            let c = ctx.ledger.add_category(&session, arg(sub, "name")?)?;
            println!("Added category '{}' ({})", c.name, c.id);
        }
        "list" => {
            let data = ctx.ledger.list_categories(&session)?;
            let (json, jsonl) = output_flags(sub);
            if !maybe_print_json(json, jsonl, &data)? {
                let rows = data.into_iter().map(|c| vec![c.id, c.name]).collect();
                println!("{}", pretty_table(&["ID", "Name"], rows));
            }
        }
        "rename" => {
            let current = ctx.ledger.resolve_category(&session, arg(sub, "category")?)?;
            let c = ctx
                .ledger
                .rename_category(&session, &current.id, arg(sub, "name")?)?;
            println!("Renamed '{}' to '{}'", current.name, c.name);
        }
        "rm" => {
            let c = ctx.ledger.resolve_category(&session, arg(sub, "category")?)?;
            if !ctx.ledger.delete_category(&session, &c.id)? {
                bail!("Category '{}' not found", c.name);
            }
            println!("Deleted category '{}'", c.name);
        }
        _ => {}
    }
    Ok(())
}
