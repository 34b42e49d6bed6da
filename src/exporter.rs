// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::LedgerError;
use crate::ledger::Ledger;
use crate::reports::UNCATEGORIZED;
use crate::session::Session;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(ExportError::UnknownFormat(other.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        })
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Unknown format: {0} (use csv|json)")]
    UnknownFormat(String),
    #[error("cannot write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot write {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// One exported transaction. `category` is the name, so the file reads
/// back through the importer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    pub date: String,
    pub amount: String,
    pub category: String,
    pub note: String,
}

/// The session user's transactions by date, with category names.
pub fn export_rows(ledger: &Ledger, session: &Session) -> Result<Vec<ExportRow>, LedgerError> {
    let names: HashMap<String, String> = ledger
        .list_categories(session)?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();
    let mut transactions = ledger.list_transactions(session)?;
    transactions.sort_by_key(|t| t.date);
    Ok(transactions
        .into_iter()
        .map(|t| ExportRow {
            date: t.date.to_string(),
            amount: format!("{:.2}", t.amount),
            category: names
                .get(&t.category_id)
                .cloned()
                .unwrap_or_else(|| UNCATEGORIZED.to_string()),
            note: t.note,
        })
        .collect())
}

/// Writes the export to `out` and returns how many rows were written.
pub fn export_transactions(
    ledger: &Ledger,
    session: &Session,
    format: ExportFormat,
    out: impl AsRef<Path>,
) -> Result<usize, ExportError> {
    let out = out.as_ref();
    let rows = export_rows(ledger, session)?;
    match format {
        ExportFormat::Csv => {
            let csv_err = |source| ExportError::Csv {
                path: out.to_path_buf(),
                source,
            };
            let mut wtr = csv::Writer::from_path(out).map_err(csv_err)?;
            // header even when there are no rows
            wtr.write_record(["date", "amount", "category", "note"])
                .map_err(csv_err)?;
            for r in &rows {
                wtr.write_record([&r.date, &r.amount, &r.category, &r.note])
                    .map_err(csv_err)?;
            }
            wtr.flush().map_err(|source| ExportError::Io {
                path: out.to_path_buf(),
                source,
            })?;
        }
        ExportFormat::Json => {
            fs::write(out, serde_json::to_string_pretty(&rows)?).map_err(|source| {
                ExportError::Io {
                    path: out.to_path_buf(),
                    source,
                }
            })?;
        }
    }
    info!(path = %out.display(), %format, rows = rows.len(), "exported transactions");
    Ok(rows.len())
}
