// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::advice::{advisor, off_thread};
use super::{arg, category_names, opt, output_flags, Ctx};
use crate::ledger::NewTransaction;
use crate::models::Transaction;
use crate::reports::{self, Flow, TransactionFilter};
use crate::session::Session;
use crate::utils::{fmt_money, maybe_print_json, parse_date, parse_decimal, parse_month, pretty_table};
use crate::validate;
use anyhow::{anyhow, bail, Result};
use serde::Serialize;
use std::collections::HashMap;

pub fn handle(ctx: &Ctx, m: &clap::ArgMatches) -> Result<()> {
    let Some((name, sub)) = m.subcommand() else {
        return Ok(());
    };
    let session = ctx.session(sub)?;
    match name {
        "add" => add(ctx, &session, sub)?,
        "list" => list(ctx, &session, sub)?,
        "edit" => edit(ctx, &session, sub)?,
        "rm" => {
            let id = arg(sub, "id")?;
            if !ctx.ledger.delete_transaction(&session, id)? {
                bail!("Transaction '{}' not found", id);
            }
            println!("Deleted transaction {}", id);
        }
        "search" => {
            let found = ctx
                .ledger
                .transactions()
                .search_note(arg(sub, "keyword")?, session.user_id())?;
            print_rows(ctx, &session, sub, found)?;
        }
        _ => {}
    }
    Ok(())
}

fn add(ctx: &Ctx, session: &Session, sub: &clap::ArgMatches) -> Result<()> {
    let amount = validate::amount(arg(sub, "amount")?)?;
    let date = parse_date(arg(sub, "date")?)?;
    let note = opt(sub, "note").unwrap_or_default().to_string();

    let category = if sub.get_flag("auto-category") {
        let categories = ctx.ledger.list_categories(session)?;
        let advisor = advisor(&ctx.config)?;
        let note_for_task = note.clone();
        let inferred = off_thread("categorize", move || {
            advisor.infer_category(&note_for_task, &categories)
        })?
        .ok_or_else(|| anyhow!("Could not infer a category from the note; pass --category"))?;
        println!("Category inferred: {}", inferred);
        ctx.ledger.resolve_category(session, &inferred)?
    } else {
        ctx.ledger.resolve_category(session, arg(sub, "category")?)?
    };

    let tx = ctx.ledger.add_transaction(
        session,
        NewTransaction {
            amount,
            date,
            category_id: category.id,
            note,
        },
    )?;
    println!(
        "Recorded {} on {} in '{}' ({})",
        fmt_money(tx.amount),
        tx.date,
        category.name,
        tx.id
    );
    Ok(())
}

fn list(ctx: &Ctx, session: &Session, sub: &clap::ArgMatches) -> Result<()> {
    let mut criteria = TransactionFilter::default();
    if let Some(month) = opt(sub, "month") {
        let month = parse_month(month)?;
        criteria.start = Some(month.first_day());
        criteria.end = Some(month.last_day());
    }
    if let Some(from) = opt(sub, "from") {
        criteria.start = Some(parse_date(from)?);
    }
    if let Some(to) = opt(sub, "to") {
        criteria.end = Some(parse_date(to)?);
    }
    if let Some(flow) = opt(sub, "flow") {
        criteria.flow = Some(flow.parse::<Flow>().map_err(|e| anyhow!(e))?);
    }
    if let Some(cat) = opt(sub, "category") {
        criteria.category_id = Some(ctx.ledger.resolve_category(session, cat)?.id);
    }
    if let Some(min) = opt(sub, "min") {
        criteria.min_amount = Some(parse_decimal(min)?);
    }
    if let Some(max) = opt(sub, "max") {
        criteria.max_amount = Some(parse_decimal(max)?);
    }
    if let Some(holiday) = opt(sub, "holiday") {
        criteria.holiday = Some(ctx.ledger.resolve_holiday(session, holiday)?);
    }

    let all = ctx.ledger.list_transactions(session)?;
    let mut data = reports::filter(&all, &criteria);
    // newest first; equal dates keep file order
    data.sort_by(|a, b| b.date.cmp(&a.date));
    if let Some(limit) = sub.get_one::<usize>("limit") {
        data.truncate(*limit);
    }
    print_rows(ctx, session, sub, data)
}

fn edit(ctx: &Ctx, session: &Session, sub: &clap::ArgMatches) -> Result<()> {
    let mut tx = ctx.ledger.owned_transaction(session, arg(sub, "id")?)?;
    if let Some(amount) = opt(sub, "amount") {
        tx.amount = validate::amount(amount)?;
    }
    if let Some(date) = opt(sub, "date") {
        tx.date = parse_date(date)?;
    }
    if let Some(cat) = opt(sub, "category") {
        tx.category_id = ctx.ledger.resolve_category(session, cat)?.id;
    }
    if let Some(note) = opt(sub, "note") {
        tx.note = note.trim().to_string();
    }
    let tx = ctx.ledger.update_transaction(session, &tx)?;
    println!("Updated transaction {}", tx.id);
    Ok(())
}

#[derive(Serialize)]
pub struct TransactionRow {
    pub id: String,
    pub date: String,
    pub amount: String,
    pub category: String,
    pub note: String,
}

pub fn rows(names: &HashMap<String, String>, data: Vec<Transaction>) -> Vec<TransactionRow> {
    data.into_iter()
        .map(|t| TransactionRow {
            category: names
                .get(&t.category_id)
                .cloned()
                .unwrap_or_else(|| reports::UNCATEGORIZED.to_string()),
            id: t.id,
            date: t.date.to_string(),
            amount: fmt_money(t.amount),
            note: t.note,
        })
        .collect()
}

fn print_rows(
    ctx: &Ctx,
    session: &Session,
    sub: &clap::ArgMatches,
    data: Vec<Transaction>,
) -> Result<()> {
    let names = category_names(&ctx.ledger.list_categories(session)?);
    let data = rows(&names, data);
    let (json, jsonl) = output_flags(sub);
    if !maybe_print_json(json, jsonl, &data)? {
        let table_rows = data
            .iter()
            .map(|r| {
                vec![
                    r.date.clone(),
                    r.amount.clone(),
                    r.category.clone(),
                    r.note.clone(),
                    r.id.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Date", "Amount", "Category", "Note", "ID"], table_rows)
        );
    }
    Ok(())
}
