// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{arg, output_flags, Ctx};
use crate::utils::{fmt_money, maybe_print_json, parse_decimal, pretty_table};
use anyhow::{bail, Result};

pub fn handle(ctx: &Ctx, m: &clap::ArgMatches) -> Result<()> {
    let Some((name, sub)) = m.subcommand() else {
        return Ok(());
    };
    let session = ctx.session(sub)?;
    match name {
        "set" => {
            let amount = parse_decimal(arg(sub, "amount")?)?;
            let t = ctx.ledger.set_threshold(&session, arg(sub, "item")?, amount)?;
            println!("Threshold for '{}' = {}", t.item_name, fmt_money(t.threshold));
        }
        "list" => {
            let data = ctx.ledger.list_thresholds(&session)?;
            let (json, jsonl) = output_flags(sub);
            if !maybe_print_json(json, jsonl, &data)? {
                let rows = data
                    .into_iter()
                    .map(|t| vec![t.item_name, fmt_money(t.threshold)])
                    .collect();
                println!("{}", pretty_table(&["Item", "Threshold"], rows));
            }
        }
        "rm" => {
            let item = arg(sub, "item")?;
            if !ctx.ledger.delete_threshold(&session, item)? {
                bail!("No threshold set for '{}'", item);
            }
            println!("Removed threshold for '{}'", item);
        }
        "check" => {
            let data = ctx.ledger.abnormal_expenses(&session)?;
            let (json, jsonl) = output_flags(sub);
            if !maybe_print_json(json, jsonl, &data)? {
                if data.is_empty() {
                    println!("No abnormal expenses");
                    return Ok(());
                }
                let rows = data
                    .into_iter()
                    .map(|a| {
                        vec![
                            a.transaction.date.to_string(),
                            a.category,
                            fmt_money(a.transaction.amount),
                            fmt_money(a.threshold),
                            a.transaction.note,
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Date", "Category", "Amount", "Threshold", "Note"], rows)
                );
            }
        }
        _ => {}
    }
    Ok(())
}
