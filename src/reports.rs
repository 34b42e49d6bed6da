// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Aggregations over already-loaded records.
//!
//! Everything here is a pure function of its inputs. Amounts are exact
//! decimals; expense figures are reported as magnitudes. Empty inputs give
//! zeros and empty maps.

use crate::models::{AbnormalThreshold, Budget, Category, Holiday, Month, Transaction};
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

pub const UNCATEGORIZED: &str = "Uncategorized";

/// Income or expense, decided by the sign of the amount alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Flow {
    Income,
    Expense,
}

impl Flow {
    pub fn of(t: &Transaction) -> Option<Flow> {
        if t.is_income() {
            Some(Flow::Income)
        } else if t.is_expense() {
            Some(Flow::Expense)
        } else {
            None
        }
    }

    pub fn matches(self, t: &Transaction) -> bool {
        Flow::of(t) == Some(self)
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flow::Income => f.write_str("Income"),
            Flow::Expense => f.write_str("Expense"),
        }
    }
}

impl FromStr for Flow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(Flow::Income),
            "expense" => Ok(Flow::Expense),
            other => Err(format!("unknown flow '{}', expected income or expense", other)),
        }
    }
}

fn in_month(t: &Transaction, month: Option<Month>) -> bool {
    month.is_none_or(|m| m.contains(t.date))
}

/// Sum that clamps at the edge of the `Decimal` range instead of overflowing.
pub fn saturating_sum<I: IntoIterator<Item = Decimal>>(values: I) -> Decimal {
    values.into_iter().fold(Decimal::ZERO, Decimal::saturating_add)
}

fn accumulate(slot: &mut Decimal, value: Decimal) {
    *slot = slot.saturating_add(value);
}

/// Fraction rounded half away from zero to 4 places.
fn ratio(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    match part.checked_div(whole) {
        Some(r) => r.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero),
        None if part.is_sign_negative() != whole.is_sign_negative() => Decimal::MIN,
        None => Decimal::MAX,
    }
}

/// Expense magnitude in `month`, optionally restricted to one category.
pub fn spent(transactions: &[Transaction], month: Month, category: Option<&str>) -> Decimal {
    transactions
        .iter()
        .filter(|t| t.is_expense() && month.contains(t.date))
        .filter(|t| category.is_none_or(|c| t.category_id == c))
        .map(|t| t.amount.abs())
        .fold(Decimal::ZERO, Decimal::saturating_add)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetProgress {
    pub budget: Budget,
    pub spent: Decimal,
    pub remaining: Decimal,
    pub fraction: Decimal,
}

impl BudgetProgress {
    pub fn is_over(&self) -> bool {
        self.remaining < Decimal::ZERO
    }
}

/// Progress of one budget against the expenses of its month (and category).
pub fn budget_progress(budget: &Budget, transactions: &[Transaction]) -> BudgetProgress {
    let spent = spent(transactions, budget.month, budget.category_id.as_deref());
    BudgetProgress {
        budget: budget.clone(),
        spent,
        remaining: budget.amount.saturating_sub(spent),
        fraction: ratio(spent, budget.amount),
    }
}

/// Total budget first, then category budgets in their stored order.
pub fn month_progress(
    budgets: &[Budget],
    transactions: &[Transaction],
    month: Month,
) -> Vec<BudgetProgress> {
    let (totals, by_category): (Vec<&Budget>, Vec<&Budget>) = budgets
        .iter()
        .filter(|b| b.month == month)
        .partition(|b| b.is_total());
    totals
        .into_iter()
        .chain(by_category)
        .map(|b| budget_progress(b, transactions))
        .collect()
}

pub fn of_flow(transactions: &[Transaction], flow: Flow, month: Option<Month>) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|t| flow.matches(t) && in_month(t, month))
        .cloned()
        .collect()
}

/// Category id → magnitude for one flow.
pub fn category_summary(
    transactions: &[Transaction],
    flow: Flow,
    month: Option<Month>,
) -> BTreeMap<String, Decimal> {
    let mut out = BTreeMap::new();
    for t in transactions.iter().filter(|t| flow.matches(t) && in_month(t, month)) {
        accumulate(out.entry(t.category_id.clone()).or_insert(Decimal::ZERO), t.amount.abs());
    }
    out
}

pub fn monthly_summary(transactions: &[Transaction], flow: Flow) -> BTreeMap<Month, Decimal> {
    let mut out = BTreeMap::new();
    for t in transactions.iter().filter(|t| flow.matches(t)) {
        accumulate(out.entry(Month::of(t.date)).or_insert(Decimal::ZERO), t.amount.abs());
    }
    out
}

pub fn total_amount(transactions: &[Transaction], flow: Flow, month: Option<Month>) -> Decimal {
    transactions
        .iter()
        .filter(|t| flow.matches(t) && in_month(t, month))
        .map(|t| t.amount.abs())
        .fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Largest magnitudes first; ties keep their input order.
pub fn top_n(
    transactions: &[Transaction],
    flow: Flow,
    month: Option<Month>,
    n: usize,
) -> Vec<Transaction> {
    let mut picked = of_flow(transactions, flow, month);
    picked.sort_by(|a, b| b.amount.abs().cmp(&a.amount.abs()));
    picked.truncate(n);
    picked
}

/// Expense magnitude between `start` and `end`, both inclusive.
pub fn net_expense(transactions: &[Transaction], start: NaiveDate, end: NaiveDate) -> Decimal {
    transactions
        .iter()
        .filter(|t| t.is_expense() && t.date >= start && t.date <= end)
        .map(|t| t.amount.abs())
        .fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Monthly expense magnitudes per category name over a seven-month window.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ForecastHistory {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub by_category: BTreeMap<String, BTreeMap<Month, Decimal>>,
}

impl ForecastHistory {
    pub fn is_empty(&self) -> bool {
        self.by_category.is_empty()
    }
}

/// History for the forecast prompt: the six months before `as_of` plus
/// `as_of` itself. Categories without expenses in the window are left out,
/// as are expenses whose category is not in `categories`.
pub fn forecast_history(
    transactions: &[Transaction],
    categories: &[Category],
    as_of: Month,
) -> ForecastHistory {
    let start = as_of.offset(-6).first_day();
    let end = as_of.last_day();
    let names: HashMap<&str, &str> = categories
        .iter()
        .map(|c| (c.id.as_str(), c.name.as_str()))
        .collect();

    let mut by_category: BTreeMap<String, BTreeMap<Month, Decimal>> = BTreeMap::new();
    for t in transactions
        .iter()
        .filter(|t| t.is_expense() && t.date >= start && t.date <= end)
    {
        let Some(name) = names.get(t.category_id.as_str()) else {
            continue;
        };
        let slot = by_category
            .entry(name.to_string())
            .or_default()
            .entry(Month::of(t.date))
            .or_insert(Decimal::ZERO);
        accumulate(slot, t.amount.abs());
    }
    ForecastHistory {
        start,
        end,
        by_category,
    }
}

/// Optional criteria over a transaction list; unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub flow: Option<Flow>,
    pub category_id: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
    pub holiday: Option<Holiday>,
}

impl TransactionFilter {
    pub fn accepts(&self, t: &Transaction) -> bool {
        // zero amounts never occur in stored data, so sign is enough here
        let flow_ok = match self.flow {
            Some(Flow::Income) => t.amount >= Decimal::ZERO,
            Some(Flow::Expense) => t.amount <= Decimal::ZERO,
            None => true,
        };
        flow_ok
            && self.category_id.as_deref().is_none_or(|c| t.category_id == c)
            && self.start.is_none_or(|d| t.date >= d)
            && self.end.is_none_or(|d| t.date <= d)
            && self.min_amount.is_none_or(|m| t.amount >= m)
            && self.max_amount.is_none_or(|m| t.amount <= m)
            && self.holiday.as_ref().is_none_or(|h| h.contains(t.date))
    }
}

pub fn filter(transactions: &[Transaction], criteria: &TransactionFilter) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|t| criteria.accepts(t))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub name: String,
    pub flow: Flow,
    /// Signed sum of the category's transactions.
    pub total: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FinancialSummary {
    pub categories: Vec<CategoryTotal>,
    pub uncategorized: Decimal,
    pub total_income: Decimal,
    /// Magnitude.
    pub total_expense: Decimal,
    pub net_savings: Decimal,
}

/// Signed totals per category (in `categories` order, zero totals omitted),
/// with transactions of unknown categories pooled under [`UNCATEGORIZED`].
pub fn financial_summary(transactions: &[Transaction], categories: &[Category]) -> FinancialSummary {
    let mut summary = FinancialSummary::default();
    let mut expense = Decimal::ZERO;
    let mut book = |total: Decimal, summary: &mut FinancialSummary| {
        if total > Decimal::ZERO {
            accumulate(&mut summary.total_income, total);
        } else {
            accumulate(&mut expense, total);
        }
    };

    for c in categories {
        let total = saturating_sum(
            transactions
                .iter()
                .filter(|t| t.category_id == c.id)
                .map(|t| t.amount),
        );
        if total.is_zero() {
            continue;
        }
        book(total, &mut summary);
        summary.categories.push(CategoryTotal {
            name: c.name.clone(),
            flow: if total > Decimal::ZERO { Flow::Income } else { Flow::Expense },
            total,
        });
    }

    summary.uncategorized = saturating_sum(
        transactions
            .iter()
            .filter(|t| !categories.iter().any(|c| c.id == t.category_id))
            .map(|t| t.amount),
    );
    if !summary.uncategorized.is_zero() {
        book(summary.uncategorized, &mut summary);
    }

    summary.total_expense = expense.abs();
    summary.net_savings = summary.total_income.saturating_sub(summary.total_expense);
    summary
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AbnormalExpense {
    pub transaction: Transaction,
    pub category: String,
    pub threshold: Decimal,
}

/// Expenses whose magnitude exceeds the threshold set for their category.
/// A threshold applies to the category whose name equals its item name,
/// ignoring case.
pub fn abnormal_expenses(
    transactions: &[Transaction],
    categories: &[Category],
    thresholds: &[AbnormalThreshold],
) -> Vec<AbnormalExpense> {
    let limits: HashMap<&str, (&str, Decimal)> = categories
        .iter()
        .filter_map(|c| {
            thresholds
                .iter()
                .find(|t| t.item_name.eq_ignore_ascii_case(&c.name))
                .map(|t| (c.id.as_str(), (c.name.as_str(), t.threshold)))
        })
        .collect();

    transactions
        .iter()
        .filter(|t| t.is_expense())
        .filter_map(|t| {
            let (name, limit) = limits.get(t.category_id.as_str())?;
            (t.amount.abs() > *limit).then(|| AbnormalExpense {
                transaction: t.clone(),
                category: name.to_string(),
                threshold: *limit,
            })
        })
        .collect()
}

pub fn predicted_total(mapping: &BTreeMap<String, Decimal>) -> Decimal {
    saturating_sum(mapping.values().copied())
}

/// The `n` months following `from`.
pub fn upcoming_months(from: Month, n: usize) -> Vec<Month> {
    (1..=n as i32).map(|i| from.offset(i)).collect()
}
