// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{arg, output_flags, Ctx};
use crate::utils::{maybe_print_json, parse_date, pretty_table};
use anyhow::{bail, Result};

pub fn handle(ctx: &Ctx, m: &clap::ArgMatches) -> Result<()> {
    let Some((name, sub)) = m.subcommand() else {
        return Ok(());
    };
    let session = ctx.session(sub)?;
    match name {
        "add" => {
            let start = parse_date(arg(sub, "start")?)?;
            let end = parse_date(arg(sub, "end")?)?;
            let h = ctx.ledger.add_holiday(&session, arg(sub, "name")?, start, end)?;
            println!("Added holiday '{}' {} to {}", h.name, h.start_date, h.end_date);
        }
        "list" => {
            let mut data = ctx.ledger.list_holidays(&session)?;
            data.sort_by_key(|h| h.start_date);
            let (json, jsonl) = output_flags(sub);
            if !maybe_print_json(json, jsonl, &data)? {
                let rows = data
                    .into_iter()
                    .map(|h| vec![h.name, h.start_date.to_string(), h.end_date.to_string(), h.id])
                    .collect();
                println!("{}", pretty_table(&["Name", "Start", "End", "ID"], rows));
            }
        }
        "rm" => {
            let h = ctx.ledger.resolve_holiday(&session, arg(sub, "holiday")?)?;
            if !ctx.ledger.delete_holiday(&session, &h.id)? {
                bail!("Holiday '{}' not found", h.name);
            }
            println!("Deleted holiday '{}'", h.name);
        }
        _ => {}
    }
    Ok(())
}
