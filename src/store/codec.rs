// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Row-level codec between typed records and flat-file rows.

use crate::models::{Month, Service};
use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use rust_decimal::Decimal;
use std::collections::HashMap;
use thiserror::Error;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("missing column '{0}'")]
    MissingColumn(&'static str),
    #[error("invalid decimal '{value}' in column '{column}'")]
    InvalidDecimal { column: &'static str, value: String },
    #[error("invalid date '{value}' in column '{column}', expected YYYY-MM-DD")]
    InvalidDate { column: &'static str, value: String },
    #[error("invalid month '{value}' in column '{column}', expected YYYY-MM")]
    InvalidMonth { column: &'static str, value: String },
    #[error("invalid datetime '{value}' in column '{column}'")]
    InvalidDateTime { column: &'static str, value: String },
    #[error("invalid service '{value}' in column '{column}'")]
    InvalidService { column: &'static str, value: String },
    #[error("record id must not be empty")]
    EmptyId,
}

pub type CodecResult<T> = Result<T, CodecError>;

/// A typed record stored one-per-row in its own table file.
///
/// `HEADERS` is both the on-disk column order and the set of names rows are
/// looked up by. `encode` must yield exactly one value per header, in order.
pub trait Record: Clone {
    /// File stem of the backing table (`<TABLE>.csv`).
    const TABLE: &'static str;
    const HEADERS: &'static [&'static str];

    fn id(&self) -> &str;

    fn encode(&self) -> CodecResult<Vec<String>>;

    fn decode(row: &Row<'_>) -> CodecResult<Self>;
}

/// Header name → column index, matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct Columns {
    index: HashMap<String, usize>,
}

impl Columns {
    pub fn new(headers: &StringRecord) -> Self {
        let index = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_lowercase(), i))
            .collect();
        Self { index }
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(&name.to_lowercase()).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }
}

/// Read access to one row by header name.
pub struct Row<'a> {
    columns: &'a Columns,
    record: &'a StringRecord,
}

impl<'a> Row<'a> {
    pub fn new(columns: &'a Columns, record: &'a StringRecord) -> Self {
        Self { columns, record }
    }

    /// The field exactly as stored.
    pub fn text(&self, column: &'static str) -> CodecResult<&'a str> {
        self.columns
            .position(column)
            .and_then(|i| self.record.get(i))
            .ok_or(CodecError::MissingColumn(column))
    }

    /// The field with surrounding whitespace removed, for typed values.
    fn token(&self, column: &'static str) -> CodecResult<&'a str> {
        self.text(column).map(str::trim)
    }

    pub fn string(&self, column: &'static str) -> CodecResult<String> {
        self.text(column).map(str::to_string)
    }

    pub fn optional_string(&self, column: &'static str) -> CodecResult<Option<String>> {
        let s = self.text(column)?;
        Ok((!s.is_empty()).then(|| s.to_string()))
    }

    pub fn decimal(&self, column: &'static str) -> CodecResult<Decimal> {
        let s = self.token(column)?;
        s.parse::<Decimal>().map_err(|_| CodecError::InvalidDecimal {
            column,
            value: s.to_string(),
        })
    }

    pub fn date(&self, column: &'static str) -> CodecResult<NaiveDate> {
        let s = self.token(column)?;
        NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| CodecError::InvalidDate {
            column,
            value: s.to_string(),
        })
    }

    pub fn month(&self, column: &'static str) -> CodecResult<Month> {
        let s = self.token(column)?;
        s.parse::<Month>().map_err(|_| CodecError::InvalidMonth {
            column,
            value: s.to_string(),
        })
    }

    pub fn optional_datetime(&self, column: &'static str) -> CodecResult<Option<NaiveDateTime>> {
        let s = self.token(column)?;
        if s.is_empty() {
            return Ok(None);
        }
        NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
            .map(Some)
            .map_err(|_| CodecError::InvalidDateTime {
                column,
                value: s.to_string(),
            })
    }

    pub fn service(&self, column: &'static str) -> CodecResult<Service> {
        let s = self.token(column)?;
        s.parse::<Service>().map_err(|_| CodecError::InvalidService {
            column,
            value: s.to_string(),
        })
    }
}

pub fn encode_date(d: NaiveDate) -> String {
    d.format(DATE_FORMAT).to_string()
}

pub fn encode_datetime(d: Option<NaiveDateTime>) -> String {
    d.map(|d| d.format(DATETIME_FORMAT).to_string())
        .unwrap_or_default()
}

pub fn encode_decimal(d: Decimal) -> String {
    d.to_string()
}

pub fn require_id(id: &str) -> CodecResult<String> {
    if id.trim().is_empty() {
        Err(CodecError::EmptyId)
    } else {
        Ok(id.to_string())
    }
}
