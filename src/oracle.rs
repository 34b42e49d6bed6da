// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Text-in/text-out calls to a chat-completion service.
//!
//! The service is treated as unreliable: [`Advisor`] never returns an
//! [`OracleError`], it logs the failure and falls back to a labelled
//! message or an empty mapping.

use crate::config::OracleConfig;
use crate::error::LedgerResult;
use crate::ledger::Ledger;
use crate::models::{Budget, Category, Month, Transaction};
use crate::reports::{self, FinancialSummary, ForecastHistory};
use crate::session::Session;
use crate::utils::http_client;
use chrono::{Months, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle unavailable: {0}")]
    Unavailable(String),
    #[error("oracle answered with HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("oracle reply had no content")]
    EmptyReply,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

pub trait Oracle: Send + Sync {
    fn complete(&self, request: &ChatRequest) -> Result<String, OracleError>;
}

impl<O: Oracle + ?Sized> Oracle for Arc<O> {
    fn complete(&self, request: &ChatRequest) -> Result<String, OracleError> {
        (**self).complete(request)
    }
}

impl<O: Oracle + ?Sized> Oracle for Box<O> {
    fn complete(&self, request: &ChatRequest) -> Result<String, OracleError> {
        (**self).complete(request)
    }
}

/// OpenAI-compatible `POST {base_url}/chat/completions`.
pub struct ChatOracle {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    choices: Vec<WireChoice>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireMessage,
}

#[derive(Deserialize)]
struct WireMessage {
    content: Option<String>,
}

impl ChatOracle {
    pub fn new(config: &OracleConfig) -> Result<Self, OracleError> {
        let client = http_client(config.timeout)
            .map_err(|e| OracleError::Unavailable(format!("{:#}", e)))?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

impl Oracle for ChatOracle {
    fn complete(&self, request: &ChatRequest) -> Result<String, OracleError> {
        let Some(key) = &self.api_key else {
            return Err(OracleError::Unavailable("no API key configured".into()));
        };
        let body = WireRequest {
            model: &self.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };
        debug!(endpoint = %self.endpoint, model = %self.model, "oracle request");
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(key)
            .json(&body)
            .send()
            .map_err(|e| OracleError::Unavailable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(OracleError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }
        let parsed: WireResponse = resp
            .json()
            .map_err(|e| OracleError::Unavailable(format!("unreadable reply: {}", e)))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(OracleError::EmptyReply)
    }
}

pub const ADVISOR_SYSTEM_PROMPT: &str = "You are a financial advisor helping users manage their personal finances. \
Analyze the user's financial data and provide personalized advice based on their transactions and budgets. \
Be concise, practical, and focus on actionable recommendations. \
When discussing specific categories, use their exact names from the user's data.";

const ANALYST_SYSTEM_PROMPT: &str = "You are a financial analyst. Analyze the following transaction data and provide \
a concise yet insightful report (3-5 paragraphs) that includes:\n\
1. Summary of income vs expenses\n\
2. Notable spending patterns\n\
3. Potential areas for improvement\n\
4. General financial health assessment\n\
Use professional but accessible language and provide actionable recommendations.";

pub const SUGGESTED_QUESTIONS: [&str; 5] = [
    "How can I save more money?",
    "Am I overspending in any category?",
    "What's the best way to allocate my budget?",
    "How do my spending habits compare to last month?",
    "What areas should I focus on to improve my finances?",
];

const ADVICE_UNAVAILABLE: &str =
    "Sorry, I couldn't generate advice at this time. Please try again later.";
const INSIGHT_UNAVAILABLE: &str = "Failed to generate insight. Please try again.";

/// `1234.5` → `1,234.50`.
pub fn money(d: Decimal) -> String {
    let text = format!("{:.2}", d.abs());
    let (int, frac) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    let mut grouped = String::with_capacity(text.len() + int.len() / 3);
    for (i, ch) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if d < Decimal::ZERO { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac)
}

/// What the advice prompt is built from.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AdviceContext {
    pub has_transactions: bool,
    pub summary: FinancialSummary,
    pub total_budget: Option<Decimal>,
    /// Category name (or "Unknown Category") and amount, in stored order.
    pub category_budgets: Vec<(String, Decimal)>,
}

impl AdviceContext {
    pub fn build(transactions: &[Transaction], budgets: &[Budget], categories: &[Category]) -> Self {
        let total_budget = budgets.iter().find(|b| b.is_total()).map(|b| b.amount);
        let category_budgets = budgets
            .iter()
            .filter_map(|b| {
                let cat = b.category_id.as_deref()?;
                let name = categories
                    .iter()
                    .find(|c| c.id == cat)
                    .map(|c| c.name.clone())
                    .unwrap_or_else(|| "Unknown Category".to_string());
                Some((name, b.amount))
            })
            .collect();
        Self {
            has_transactions: !transactions.is_empty(),
            summary: reports::financial_summary(transactions, categories),
            total_budget,
            category_budgets,
        }
    }

    /// The last three months of transactions up to `today` and the budgets
    /// of `today`'s month.
    pub fn gather(ledger: &Ledger, session: &Session, today: NaiveDate) -> LedgerResult<Self> {
        let start = today.checked_sub_months(Months::new(3)).unwrap_or(today);
        let transactions = ledger
            .transactions()
            .by_user_in_range(session.user_id(), start, today)?;
        let budgets = ledger.budgets().by_month(Month::of(today), session.user_id())?;
        let categories = ledger.categories().by_user(session.user_id())?;
        Ok(Self::build(&transactions, &budgets, &categories))
    }

    fn transaction_section(&self) -> String {
        if !self.has_transactions {
            return "No transactions in the last 3 months.".to_string();
        }
        let s = &self.summary;
        let mut out = String::new();
        for c in &s.categories {
            let _ = writeln!(out, "- {} ({}): {}", c.name, c.flow, money(c.total));
        }
        if !s.uncategorized.is_zero() {
            let _ = writeln!(out, "- {}: {}", reports::UNCATEGORIZED, money(s.uncategorized));
        }
        let _ = writeln!(out, "\nTotal Income: {}", money(s.total_income));
        let _ = writeln!(out, "Total Expense: {}", money(s.total_expense));
        let _ = write!(out, "Net Savings: {}", money(s.net_savings));
        out
    }

    fn budget_section(&self) -> String {
        if self.total_budget.is_none() && self.category_budgets.is_empty() {
            return "No budget set for current month.".to_string();
        }
        let mut out = String::new();
        if let Some(total) = self.total_budget {
            let _ = writeln!(out, "Total Budget: {}", money(total));
        }
        for (name, amount) in &self.category_budgets {
            let _ = writeln!(out, "- {}: {}", name, money(*amount));
        }
        out
    }
}

pub fn advice_request(context: &AdviceContext, question: &str) -> ChatRequest {
    let prompt = format!(
        "User's financial data:\n\
         === Transactions (last 3 months) ===\n{}\n\n\
         === Current Month Budget ===\n{}\n\n\
         User's question: {}\n\n\
         Please provide detailed financial advice addressing the user's question.",
        context.transaction_section(),
        context.budget_section(),
        question.trim()
    );
    ChatRequest {
        messages: vec![
            ChatMessage::system(ADVISOR_SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ],
        temperature: 0.7,
        max_tokens: 500,
    }
}

pub fn insight_request(
    transactions: &[Transaction],
    income: Decimal,
    expense: Decimal,
    net: Decimal,
) -> ChatRequest {
    let mut history = String::from("Transaction History:\n");
    for t in transactions {
        let _ = writeln!(history, "- {}: {} ({})", t.date, money(t.amount), t.note);
    }
    let prompt = format!(
        "Financial Summary:\nTotal Income: {}\nTotal Expenses: {}\nNet Balance: {}\n\n{}",
        money(income),
        money(expense),
        money(net),
        history
    );
    ChatRequest {
        messages: vec![
            ChatMessage::system(ANALYST_SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ],
        temperature: 0.7,
        max_tokens: 500,
    }
}

pub fn forecast_request(history: &ForecastHistory, target: Month) -> ChatRequest {
    let mut prompt = String::from("Based on the following historical monthly expense data by category:\n");
    for (category, months) in &history.by_category {
        let _ = writeln!(prompt, "Category: {}", category);
        for (month, amount) in months {
            let _ = writeln!(prompt, "{}: {}", month, amount);
        }
        prompt.push('\n');
    }
    let _ = write!(
        prompt,
        "Predict the expense distribution by category for {}. \
         Consider seasonal trends, spending patterns, and category-specific trends. \
         Respond only with a JSON object where keys are category names and values are predicted amounts, \
         like this: {{\"Food\": 500.00, \"Transportation\": 300.00, ...}}\n\
         Important: Do not include any additional text or explanations, only the JSON object.",
        target
    );
    ChatRequest {
        messages: vec![ChatMessage::user(prompt)],
        temperature: 0.3,
        max_tokens: 500,
    }
}

pub fn category_request(note: &str, categories: &[Category]) -> ChatRequest {
    let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
    let system = format!(
        "Analyze the following transaction note and classify it into exactly one of these categories: {}. \
         Only respond with the category name exactly as listed.",
        names.join(", ")
    );
    ChatRequest {
        messages: vec![ChatMessage::system(system), ChatMessage::user(note.trim())],
        temperature: 0.2,
        max_tokens: 20,
    }
}

fn strip_fences(text: &str) -> &str {
    let mut s = text.trim();
    if let Some(rest) = s.strip_prefix("```json") {
        s = rest;
    } else if let Some(rest) = s.strip_prefix("```") {
        s = rest;
    }
    if let Some(rest) = s.strip_suffix("```") {
        s = rest;
    }
    s.trim()
}

fn unquote(s: &str) -> &str {
    s.trim().trim_matches(|c| c == '"' || c == '\'').trim()
}

fn parse_pair(pair: &str) -> Option<(String, Decimal)> {
    let (key, value) = pair.split_once(':')?;
    let key = unquote(key);
    if key.is_empty() {
        return None;
    }
    let value: String = unquote(value)
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    let amount = value.parse::<Decimal>().ok()?;
    Some((key.to_string(), amount))
}

/// A chunk after a thousands separator: three digits, optional fraction,
/// optional closing quote.
static DIGIT_GROUP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*\d{3}(\.\d+)?\s*"?\s*$"#).expect("hardcoded regex should be valid")
});

/// Reads a `{"Category": amount, ...}` reply leniently.
///
/// Code fences, surrounding prose, quoted amounts and thousands separators
/// are accepted. A comma followed by a three-digit group continues the
/// amount, so `1,200.50` stays one number. Pairs that do not parse are
/// dropped; the rest are kept.
pub fn parse_forecast(text: &str) -> BTreeMap<String, Decimal> {
    let body = strip_fences(text);
    let (Some(open), Some(close)) = (body.find('{'), body.rfind('}')) else {
        return BTreeMap::new();
    };
    if close <= open {
        return BTreeMap::new();
    }

    let mut pairs: Vec<String> = Vec::new();
    for segment in body[open + 1..close].split(',') {
        match pairs.last_mut() {
            Some(last) if DIGIT_GROUP.is_match(segment) => {
                last.push(',');
                last.push_str(segment);
            }
            _ => pairs.push(segment.to_string()),
        }
    }

    let mut out = BTreeMap::new();
    for pair in &pairs {
        match parse_pair(pair) {
            Some((k, v)) => {
                out.insert(k, v);
            }
            None => debug!(pair = pair.trim(), "skipping malformed forecast entry"),
        }
    }
    out
}

/// Prompting and fallbacks on top of an [`Oracle`].
pub struct Advisor<O> {
    oracle: O,
}

impl<O: Oracle> Advisor<O> {
    pub fn new(oracle: O) -> Self {
        Self { oracle }
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn advise(&self, context: &AdviceContext, question: &str) -> String {
        info!("requesting financial advice");
        match self.oracle.complete(&advice_request(context, question)) {
            Ok(reply) => reply,
            Err(OracleError::EmptyReply) => {
                warn!("advice reply was empty");
                ADVICE_UNAVAILABLE.to_string()
            }
            Err(err) => {
                warn!("advice unavailable: {}", err);
                format!("Error connecting to AI service: {}", err)
            }
        }
    }

    pub fn insight(
        &self,
        transactions: &[Transaction],
        income: Decimal,
        expense: Decimal,
        net: Decimal,
    ) -> String {
        info!(transactions = transactions.len(), "requesting insight");
        match self
            .oracle
            .complete(&insight_request(transactions, income, expense, net))
        {
            Ok(reply) => reply,
            Err(OracleError::EmptyReply) => INSIGHT_UNAVAILABLE.to_string(),
            Err(err) => {
                warn!("insight unavailable: {}", err);
                format!("Error generating insight: {}", err)
            }
        }
    }

    /// Predicted expense per category name for `target`. Empty when there is
    /// no history or the oracle fails.
    pub fn forecast(&self, history: &ForecastHistory, target: Month) -> BTreeMap<String, Decimal> {
        if history.is_empty() {
            debug!("no expense history, skipping forecast");
            return BTreeMap::new();
        }
        info!(%target, categories = history.by_category.len(), "requesting forecast");
        match self.oracle.complete(&forecast_request(history, target)) {
            Ok(reply) => {
                let mapping = parse_forecast(&reply);
                if mapping.is_empty() {
                    warn!("forecast reply held no usable entries");
                }
                mapping
            }
            Err(err) => {
                warn!("forecast unavailable: {}", err);
                BTreeMap::new()
            }
        }
    }

    /// The category named by the oracle, if it named one of `categories`.
    pub fn infer_category(&self, note: &str, categories: &[Category]) -> Option<String> {
        if note.trim().is_empty() || categories.is_empty() {
            return None;
        }
        let reply = match self.oracle.complete(&category_request(note, categories)) {
            Ok(r) => r,
            Err(err) => {
                warn!("category inference unavailable: {}", err);
                return None;
            }
        };
        let answer = reply.trim().trim_matches(|c: char| c == '"' || c == '.' || c == '\'');
        let found = categories
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(answer))
            .map(|c| c.name.clone());
        if found.is_none() {
            debug!(reply = %reply, "inferred category is not one of the user's");
        }
        found
    }

    pub fn suggested_questions(&self) -> &'static [&'static str] {
        &SUGGESTED_QUESTIONS
    }
}
