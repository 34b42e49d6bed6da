// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{opt, output_flags, Ctx};
use crate::config::Config;
use crate::models::Month;
use crate::oracle::{AdviceContext, Advisor, ChatOracle};
use crate::reports::{self, Flow};
use crate::utils::{fmt_money, maybe_print_json, parse_month, pretty_table};
use crate::worker::BackgroundTask;
use anyhow::Result;
use chrono::Local;
use serde::Serialize;
use tracing::debug;

pub fn advisor(config: &Config) -> Result<Advisor<ChatOracle>> {
    if config.oracle.api_key.is_none() {
        debug!("no oracle key configured, replies will be fallbacks");
    }
    Ok(Advisor::new(ChatOracle::new(&config.oracle)?))
}

/// Runs `work` on a background thread and waits for it.
pub fn off_thread<T, F>(name: &str, work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    Ok(BackgroundTask::spawn(name, work)?.wait()?)
}

pub fn handle_advise(ctx: &Ctx, sub: &clap::ArgMatches) -> Result<()> {
    let session = ctx.session(sub)?;
    let advisor = advisor(&ctx.config)?;
    let today = Local::now().date_naive();

    if sub.get_flag("insight") {
        let month = match opt(sub, "month") {
            Some(m) => parse_month(m)?,
            None => Month::of(today),
        };
        let transactions = ctx.ledger.transactions().by_month(month, session.user_id())?;
        let income = reports::total_amount(&transactions, Flow::Income, None);
        let expense = reports::total_amount(&transactions, Flow::Expense, None);
        let report = off_thread("insight", move || {
            advisor.insight(&transactions, income, expense, income.saturating_sub(expense))
        })?;
        println!("{}", report);
        return Ok(());
    }

    let Some(question) = opt(sub, "question").map(str::to_string) else {
        println!("Ask a question, for example:");
        for q in advisor.suggested_questions() {
            println!("  finsage advise \"{}\"", q);
        }
        return Ok(());
    };
    let context = AdviceContext::gather(&ctx.ledger, &session, today)?;
    let answer = off_thread("advise", move || advisor.advise(&context, &question))?;
    println!("{}", answer);
    Ok(())
}

#[derive(Serialize)]
struct Prediction {
    category: String,
    amount: rust_decimal::Decimal,
}

pub fn handle_forecast(ctx: &Ctx, sub: &clap::ArgMatches) -> Result<()> {
    let session = ctx.session(sub)?;
    let target = match opt(sub, "month") {
        Some(m) => parse_month(m)?,
        None => Month::of(Local::now().date_naive()).offset(1),
    };
    let transactions = ctx.ledger.list_transactions(&session)?;
    let categories = ctx.ledger.list_categories(&session)?;
    let history = reports::forecast_history(&transactions, &categories, target.offset(-1));
    if history.is_empty() {
        println!("No expense history before {} to forecast from", target);
        return Ok(());
    }

    let advisor = advisor(&ctx.config)?;
    let mapping = off_thread("forecast", move || advisor.forecast(&history, target))?;
    let total = reports::predicted_total(&mapping);
    let data: Vec<Prediction> = mapping
        .into_iter()
        .map(|(category, amount)| Prediction { category, amount })
        .collect();

    let (json, jsonl) = output_flags(sub);
    if !maybe_print_json(json, jsonl, &data)? {
        if data.is_empty() {
            println!("No forecast available for {}", target);
            return Ok(());
        }
        let mut rows: Vec<Vec<String>> = data
            .into_iter()
            .map(|p| vec![p.category, fmt_money(p.amount)])
            .collect();
        rows.push(vec!["Total".into(), fmt_money(total)]);
        println!(
            "{}",
            pretty_table(&["Category", &format!("Predicted {}", target)], rows)
        );
    }
    Ok(())
}
