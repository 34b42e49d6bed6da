// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::transactions::rows as transaction_rows;
use super::{arg, category_names, opt, output_flags, Ctx};
use crate::reports::{self, Flow, UNCATEGORIZED};
use crate::session::Session;
use crate::utils::{fmt_money, maybe_print_json, parse_date, parse_month, pretty_table};
use anyhow::{anyhow, bail, Result};
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(ctx: &Ctx, m: &clap::ArgMatches) -> Result<()> {
    let Some((name, sub)) = m.subcommand() else {
        return Ok(());
    };
    let session = ctx.session(sub)?;
    match name {
        "summary" => summary(ctx, &session, sub)?,
        "monthly" => monthly(ctx, &session, sub)?,
        "top" => top(ctx, &session, sub)?,
        "net" => net(ctx, &session, sub)?,
        "overview" => overview(ctx, &session, sub)?,
        _ => {}
    }
    Ok(())
}

fn flow(sub: &clap::ArgMatches) -> Result<Flow> {
    opt(sub, "flow")
        .unwrap_or("expense")
        .parse::<Flow>()
        .map_err(|e| anyhow!(e))
}

#[derive(Serialize)]
struct Total {
    key: String,
    total: Decimal,
}

fn summary(ctx: &Ctx, session: &Session, sub: &clap::ArgMatches) -> Result<()> {
    let flow = flow(sub)?;
    let month = opt(sub, "month").map(parse_month).transpose()?;
    let transactions = ctx.ledger.list_transactions(session)?;
    let names = category_names(&ctx.ledger.list_categories(session)?);

    let mut data: Vec<Total> = reports::category_summary(&transactions, flow, month)
        .into_iter()
        .map(|(id, total)| Total {
            key: names.get(&id).cloned().unwrap_or_else(|| UNCATEGORIZED.to_string()),
            total,
        })
        .collect();
    data.sort_by(|a, b| b.total.cmp(&a.total));

    let (json, jsonl) = output_flags(sub);
    if !maybe_print_json(json, jsonl, &data)? {
        let total = reports::saturating_sum(data.iter().map(|t| t.total));
        let mut rows: Vec<Vec<String>> = data
            .into_iter()
            .map(|t| vec![t.key, fmt_money(t.total)])
            .collect();
        rows.push(vec!["Total".into(), fmt_money(total)]);
        println!("{}", pretty_table(&["Category", &flow.to_string()], rows));
    }
    Ok(())
}

fn monthly(ctx: &Ctx, session: &Session, sub: &clap::ArgMatches) -> Result<()> {
    let flow = flow(sub)?;
    let transactions = ctx.ledger.list_transactions(session)?;
    let data: Vec<Total> = reports::monthly_summary(&transactions, flow)
        .into_iter()
        .rev()
        .map(|(m, total)| Total {
            key: m.to_string(),
            total,
        })
        .collect();
    let (json, jsonl) = output_flags(sub);
    if !maybe_print_json(json, jsonl, &data)? {
        let rows = data
            .into_iter()
            .map(|t| vec![t.key, fmt_money(t.total)])
            .collect();
        println!("{}", pretty_table(&["Month", &flow.to_string()], rows));
    }
    Ok(())
}

fn top(ctx: &Ctx, session: &Session, sub: &clap::ArgMatches) -> Result<()> {
    let flow = flow(sub)?;
    let month = opt(sub, "month").map(parse_month).transpose()?;
    let n = sub.get_one::<usize>("n").copied().unwrap_or(5);
    let transactions = ctx.ledger.list_transactions(session)?;
    let names = category_names(&ctx.ledger.list_categories(session)?);
    let data = transaction_rows(&names, reports::top_n(&transactions, flow, month, n));
    let (json, jsonl) = output_flags(sub);
    if !maybe_print_json(json, jsonl, &data)? {
        let rows = data
            .into_iter()
            .enumerate()
            .map(|(i, r)| vec![(i + 1).to_string(), r.date, r.amount, r.category, r.note])
            .collect();
        println!(
            "{}",
            pretty_table(&["#", "Date", "Amount", "Category", "Note"], rows)
        );
    }
    Ok(())
}

#[derive(Serialize)]
struct NetExpense {
    from: String,
    to: String,
    expense: Decimal,
}

fn net(ctx: &Ctx, session: &Session, sub: &clap::ArgMatches) -> Result<()> {
    let from = parse_date(arg(sub, "from")?)?;
    let to = parse_date(arg(sub, "to")?)?;
    if to < from {
        bail!("--to ({}) is before --from ({})", to, from);
    }
    let expense = ctx
        .ledger
        .transactions()
        .net_expense_in_range(from, to, session.user_id())?;
    let data = NetExpense {
        from: from.to_string(),
        to: to.to_string(),
        expense,
    };
    let (json, jsonl) = output_flags(sub);
    if !maybe_print_json(json, jsonl, &data)? {
        println!("Expenses {} to {}: {}", data.from, data.to, fmt_money(expense));
    }
    Ok(())
}

fn overview(ctx: &Ctx, session: &Session, sub: &clap::ArgMatches) -> Result<()> {
    let mut transactions = ctx.ledger.list_transactions(session)?;
    if let Some(month) = opt(sub, "month").map(parse_month).transpose()? {
        transactions.retain(|t| month.contains(t.date));
    }
    let categories = ctx.ledger.list_categories(session)?;
    let summary = reports::financial_summary(&transactions, &categories);
    let (json, jsonl) = output_flags(sub);
    if !maybe_print_json(json, jsonl, &summary)? {
        let mut rows: Vec<Vec<String>> = summary
            .categories
            .iter()
            .map(|c| vec![c.name.clone(), c.flow.to_string(), fmt_money(c.total)])
            .collect();
        if !summary.uncategorized.is_zero() {
            rows.push(vec![
                UNCATEGORIZED.into(),
                String::new(),
                fmt_money(summary.uncategorized),
            ]);
        }
        println!("{}", pretty_table(&["Category", "Flow", "Total"], rows));
        println!(
            "Income: {}  Expense: {}  Net savings: {}",
            fmt_money(summary.total_income),
            fmt_money(summary.total_expense),
            fmt_money(summary.net_savings)
        );
    }
    Ok(())
}
