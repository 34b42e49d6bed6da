// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{arg, category_names, opt, output_flags, Ctx};
use crate::models::{Budget, Month};
use crate::repos::budgets::Upsert;
use crate::utils::{fmt_money, maybe_print_json, parse_decimal, parse_month, pretty_table};
use anyhow::{bail, Result};
use chrono::Local;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

pub fn handle(ctx: &Ctx, m: &clap::ArgMatches) -> Result<()> {
    let Some((name, sub)) = m.subcommand() else {
        return Ok(());
    };
    let session = ctx.session(sub)?;
    match name {
        "set" => {
            let month = parse_month(arg(sub, "month")?)?;
            let amount = parse_decimal(arg(sub, "amount")?)?;
            let category = opt(sub, "category")
                .map(|c| ctx.ledger.resolve_category(&session, c))
                .transpose()?;
            let label = category.as_ref().map_or("Total", |c| c.name.as_str());
            match ctx.ledger.set_budget(
                &session,
                month,
                category.as_ref().map(|c| c.id.as_str()),
                amount,
            )? {
                Upsert::Inserted(b) => {
                    println!("Budget set for {} / {} = {}", month, label, fmt_money(b.amount))
                }
                Upsert::Updated(b) => println!(
                    "Budget updated for {} / {} = {}",
                    month,
                    label,
                    fmt_money(b.amount)
                ),
            }
        }
        "list" => {
            let month = opt(sub, "month").map(parse_month).transpose()?;
            let mut data = ctx.ledger.list_budgets(&session, month)?;
            data.sort_by(|a, b| b.month.cmp(&a.month).then(a.is_total().cmp(&b.is_total()).reverse()));
            let names = category_names(&ctx.ledger.list_categories(&session)?);
            let data: Vec<BudgetRow> = data.iter().map(|b| BudgetRow::new(b, &names)).collect();
            let (json, jsonl) = output_flags(sub);
            if !maybe_print_json(json, jsonl, &data)? {
                let rows = data
                    .into_iter()
                    .map(|r| vec![r.month, r.category, r.amount, r.id])
                    .collect();
                println!("{}", pretty_table(&["Month", "Category", "Budget", "ID"], rows));
            }
        }
        "status" => {
            let month = match opt(sub, "month") {
                Some(m) => parse_month(m)?,
                None => Month::of(Local::now().date_naive()),
            };
            let progress = ctx.ledger.budget_status(&session, month)?;
            let names = category_names(&ctx.ledger.list_categories(&session)?);
            let data: Vec<StatusRow> = progress
                .iter()
                .map(|p| StatusRow {
                    category: label(&p.budget, &names),
                    budget: p.budget.amount,
                    spent: p.spent,
                    remaining: p.remaining,
                    fraction: p.fraction,
                    over: p.is_over(),
                })
                .collect();
            let (json, jsonl) = output_flags(sub);
            if !maybe_print_json(json, jsonl, &data)? {
                if data.is_empty() {
                    println!("No budgets set for {}", month);
                    return Ok(());
                }
                let rows = data
                    .into_iter()
                    .map(|r| {
                        vec![
                            r.category,
                            fmt_money(r.budget),
                            fmt_money(r.spent),
                            fmt_money(r.remaining),
                            format!("{:.1}%", r.fraction * Decimal::ONE_HUNDRED),
                            if r.over { "OVER".into() } else { String::new() },
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(
                        &["Category", "Budget", "Spent", "Remaining", "Used", ""],
                        rows
                    )
                );
            }
        }
        "rm" => {
            let id = arg(sub, "id")?;
            if !ctx.ledger.delete_budget(&session, id)? {
                bail!("Budget '{}' not found", id);
            }
            println!("Deleted budget {}", id);
        }
        _ => {}
    }
    Ok(())
}

fn label(b: &Budget, names: &HashMap<String, String>) -> String {
    match &b.category_id {
        None => "Total".to_string(),
        Some(id) => names.get(id).cloned().unwrap_or_else(|| id.clone()),
    }
}

#[derive(Serialize)]
struct BudgetRow {
    id: String,
    month: String,
    category: String,
    amount: String,
}

impl BudgetRow {
    fn new(b: &Budget, names: &HashMap<String, String>) -> Self {
        Self {
            id: b.id.clone(),
            month: b.month.to_string(),
            category: label(b, names),
            amount: fmt_money(b.amount),
        }
    }
}

#[derive(Serialize)]
struct StatusRow {
    category: String,
    budget: Decimal,
    spent: Decimal,
    remaining: Decimal,
    fraction: Decimal,
    over: bool,
}
