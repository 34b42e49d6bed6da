// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Field formats and the errors raised when user input breaks them.

use crate::models::Service;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use thiserror::Error;

pub const NOTE_MAX_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid username. Must be 4-20 alphanumeric characters.")]
    InvalidUsername,
    #[error("Invalid password. Must be 8-20 characters with letters, numbers and special symbols.")]
    InvalidPassword,
    #[error("Invalid email format.")]
    InvalidEmail,
    #[error("Invalid phone number. Must be 11 digits starting with 1.")]
    InvalidPhone,
    #[error("Invalid amount '{0}', expected a number with at most 12 digits and 2 decimal places")]
    InvalidAmount(String),
    #[error("Amount must not be zero")]
    ZeroAmount,
    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),
    #[error("{0} must not be empty")]
    MissingField(&'static str),
    #[error("Unknown service '{0}', expected QQ or WeChat")]
    InvalidService(String),
    #[error("Invalid {kind} name '{name}'. Use 1-50 letters, digits, CJK characters or spaces.")]
    InvalidName { kind: &'static str, name: String },
    #[error("Note is longer than 200 characters or spans several lines")]
    InvalidNote,
    #[error("Holiday ends ({end}) before it starts ({start})")]
    HolidayRangeInverted { start: NaiveDate, end: NaiveDate },

    #[error("Username already exists.")]
    UsernameTaken,
    #[error("Email already registered.")]
    EmailTaken,
    #[error("Phone number already registered.")]
    PhoneTaken,
    #[error("Category '{0}' already exists")]
    CategoryExists(String),
    #[error("Category '{0}' is used by existing transactions")]
    CategoryInUse(String),
    #[error("Unknown category '{0}'")]
    UnknownCategory(String),
    #[error("Holiday '{0}' already exists")]
    HolidayExists(String),
    #[error("A threshold for '{0}' already exists")]
    ThresholdExists(String),
    #[error("A {0} account is already linked")]
    ServiceAlreadyLinked(Service),
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("Invalid credentials")]
    BadCredentials,
    #[error("Invalid or expired reset code")]
    InvalidResetCode,
}

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("hardcoded regex should be valid")
}

static USERNAME: Lazy<Regex> = Lazy::new(|| pattern(r"^[a-zA-Z0-9]{4,20}$"));
static PASSWORD: Lazy<Regex> = Lazy::new(|| pattern(r"^[a-zA-Z0-9@#$%^&+=]{8,20}$"));
static EMAIL: Lazy<Regex> = Lazy::new(|| pattern(r"^[A-Za-z0-9+_.-]+@(.+)$"));
static PHONE: Lazy<Regex> = Lazy::new(|| pattern(r"^1[0-9]{10}$"));
static AMOUNT: Lazy<Regex> = Lazy::new(|| pattern(r"^-?\d{1,12}(\.\d{1,2})?$"));
static NAME: Lazy<Regex> = Lazy::new(|| pattern(r"^[\x{4e00}-\x{9fa5}a-zA-Z0-9 ]{1,50}$"));

fn check(re: &Regex, s: &str, err: ValidationError) -> Result<(), ValidationError> {
    if re.is_match(s) { Ok(()) } else { Err(err) }
}

pub fn username(s: &str) -> Result<(), ValidationError> {
    check(&USERNAME, s, ValidationError::InvalidUsername)
}

pub fn password(s: &str) -> Result<(), ValidationError> {
    check(&PASSWORD, s, ValidationError::InvalidPassword)
}

pub fn email(s: &str) -> Result<(), ValidationError> {
    check(&EMAIL, s, ValidationError::InvalidEmail)
}

pub fn phone(s: &str) -> Result<(), ValidationError> {
    check(&PHONE, s, ValidationError::InvalidPhone)
}

/// Parses a signed amount with at most two decimals. Zero is rejected.
pub fn amount(s: &str) -> Result<Decimal, ValidationError> {
    let s = s.trim();
    if !AMOUNT.is_match(s) {
        return Err(ValidationError::InvalidAmount(s.to_string()));
    }
    let value = s
        .parse::<Decimal>()
        .map_err(|_| ValidationError::InvalidAmount(s.to_string()))?;
    nonzero(value)
}

pub fn nonzero(value: Decimal) -> Result<Decimal, ValidationError> {
    if value.is_zero() {
        Err(ValidationError::ZeroAmount)
    } else {
        Ok(value)
    }
}

/// A strictly positive amount, as budgets and thresholds require.
pub fn positive(field: &'static str, value: Decimal) -> Result<Decimal, ValidationError> {
    if value <= Decimal::ZERO {
        return Err(ValidationError::NotPositive(field));
    }
    Ok(value)
}

pub fn required<'a>(field: &'static str, s: &'a str) -> Result<&'a str, ValidationError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(s)
}

pub fn service(s: &str) -> Result<Service, ValidationError> {
    s.parse::<Service>()
        .map_err(|_| ValidationError::InvalidService(s.trim().to_string()))
}

fn name(kind: &'static str, s: &str) -> Result<(), ValidationError> {
    check(
        &NAME,
        s,
        ValidationError::InvalidName {
            kind,
            name: s.to_string(),
        },
    )
}

pub fn category_name(s: &str) -> Result<(), ValidationError> {
    name("category", s)
}

pub fn holiday_name(s: &str) -> Result<(), ValidationError> {
    name("holiday", s)
}

pub fn item_name(s: &str) -> Result<(), ValidationError> {
    name("item", s)
}

pub fn note(s: &str) -> Result<(), ValidationError> {
    if s.chars().count() > NOTE_MAX_CHARS || s.contains(['\n', '\r']) {
        return Err(ValidationError::InvalidNote);
    }
    Ok(())
}

pub fn holiday_range(start: NaiveDate, end: NaiveDate) -> Result<(), ValidationError> {
    if start > end {
        return Err(ValidationError::HolidayRangeInverted { start, end });
    }
    Ok(())
}
