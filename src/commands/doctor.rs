// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::Ctx;
use crate::models::{
    AbnormalThreshold, Budget, Category, Holiday, ThirdPartyAccount, Transaction, User,
};
use crate::store::codec::Record;
use crate::store::Repository;
use crate::utils::pretty_table;
use anyhow::Result;
use std::collections::HashSet;

fn table<R: Record>(repo: &Repository<R>, issues: &mut Vec<Vec<String>>) -> Vec<R> {
    if repo.backup_path().exists() {
        issues.push(vec![
            "leftover_backup".into(),
            repo.backup_path().display().to_string(),
        ]);
    }
    match repo.load_all() {
        Ok(rows) => rows,
        Err(e) => {
            issues.push(vec!["unreadable_table".into(), e.to_string()]);
            Vec::new()
        }
    }
}

/// Checks every table loads and that references between them resolve.
pub fn handle(ctx: &Ctx) -> Result<()> {
    let l = &ctx.ledger;
    let mut issues = Vec::new();

    let users = table::<User>(l.users(), &mut issues);
    let categories = table::<Category>(l.categories(), &mut issues);
    let transactions = table::<Transaction>(l.transactions(), &mut issues);
    let budgets = table::<Budget>(l.budgets(), &mut issues);
    table::<Holiday>(l.holidays(), &mut issues);
    table::<ThirdPartyAccount>(l.accounts(), &mut issues);
    table::<AbnormalThreshold>(l.thresholds(), &mut issues);

    let user_ids: HashSet<&str> = users.iter().map(|u| u.id.as_str()).collect();
    let owned: HashSet<(&str, &str)> = categories
        .iter()
        .map(|c| (c.user_id.as_str(), c.id.as_str()))
        .collect();

    for c in categories.iter().filter(|c| !user_ids.contains(c.user_id.as_str())) {
        issues.push(vec!["category_without_user".into(), format!("{} ({})", c.name, c.id)]);
    }
    for t in &transactions {
        if !owned.contains(&(t.user_id.as_str(), t.category_id.as_str())) {
            issues.push(vec![
                "transaction_unknown_category".into(),
                format!("{} {} {}", t.date, t.amount, t.id),
            ]);
        }
    }
    for b in &budgets {
        if let Some(cat) = b.category_id.as_deref() {
            if !owned.contains(&(b.user_id.as_str(), cat)) {
                issues.push(vec![
                    "budget_unknown_category".into(),
                    format!("{} {}", b.month, b.id),
                ]);
            }
        }
    }

    if issues.is_empty() {
        println!("doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], issues));
    }
    Ok(())
}
