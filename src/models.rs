// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// A calendar month (`YYYY-MM`), stored as its first day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Month(NaiveDate);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid month '{0}', expected YYYY-MM")]
pub struct InvalidMonth(pub String);

impl Month {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Month)
    }

    pub fn of(date: NaiveDate) -> Self {
        Month(date.with_day(1).unwrap_or(date))
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.0
    }

    pub fn last_day(&self) -> NaiveDate {
        self.0
            .checked_add_months(Months::new(1))
            .and_then(|d| d.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        Month::of(date) == *self
    }

    /// Shifts by `n` months (negative goes back); saturates at chrono's range.
    pub fn offset(&self, n: i32) -> Month {
        let shifted = if n >= 0 {
            self.0.checked_add_months(Months::new(n.unsigned_abs()))
        } else {
            self.0.checked_sub_months(Months::new(n.unsigned_abs()))
        };
        shifted.map(Month).unwrap_or(*self)
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m"))
    }
}

impl FromStr for Month {
    type Err = InvalidMonth;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() != 7 {
            return Err(InvalidMonth(s.to_string()));
        }
        NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d")
            .map(Month)
            .map_err(|_| InvalidMonth(s.to_string()))
    }
}

impl TryFrom<String> for Month {
    type Error = InvalidMonth;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Month> for String {
    fn from(m: Month) -> Self {
        m.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub phone: String,
    /// SHA-256 hex digest, never the entered password.
    #[serde(skip_serializing)]
    pub password: String,
    pub reset_code: Option<String>,
    pub reset_time: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub amount: Decimal, // positive = income, negative = expense
    pub date: NaiveDate,
    pub category_id: String,
    pub note: String,
    pub user_id: String,
}

impl Transaction {
    pub fn is_income(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    pub fn is_expense(&self) -> bool {
        self.amount < Decimal::ZERO
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub id: String,
    pub month: Month,
    pub category_id: Option<String>, // None = total budget
    pub amount: Decimal,
    pub user_id: String,
}

impl Budget {
    pub fn is_total(&self) -> bool {
        self.category_id.is_none()
    }

    /// True when both budgets occupy the same (month, user, category-or-total) slot.
    pub fn same_slot(&self, other: &Budget) -> bool {
        self.month == other.month
            && self.user_id == other.user_id
            && self.category_id == other.category_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    pub id: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub user_id: String,
}

impl Holiday {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Service {
    #[serde(rename = "QQ")]
    Qq,
    WeChat,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown service '{0}', expected QQ or WeChat")]
pub struct UnknownService(pub String);

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Service::Qq => f.write_str("QQ"),
            Service::WeChat => f.write_str("WeChat"),
        }
    }
}

impl FromStr for Service {
    type Err = UnknownService;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("qq") {
            Ok(Service::Qq)
        } else if s.eq_ignore_ascii_case("wechat") {
            Ok(Service::WeChat)
        } else {
            Err(UnknownService(s.to_string()))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThirdPartyAccount {
    pub id: String,
    pub service: Service,
    pub service_username: String,
    #[serde(skip_serializing)]
    pub service_password: String,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbnormalThreshold {
    pub id: String,
    pub item_name: String,
    pub threshold: Decimal,
    pub user_id: String,
}
