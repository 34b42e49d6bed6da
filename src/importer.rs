// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Bulk import of transactions from a CSV file.
//!
//! Columns are found by header name, case-insensitively: `amount`, `date`
//! and `categoryId` are required, `note` is optional. The category column
//! may hold a category id or name, and `category` is accepted as its header
//! so exported files import back. Each row stands alone: a bad row is
//! reported and skipped, the good ones are stored together.

use crate::error::LedgerError;
use crate::ledger::Ledger;
use crate::models::{new_id, Category, Transaction};
use crate::session::Session;
use crate::store::codec::{Columns, Row};
use crate::validate;
use csv::{ReaderBuilder, StringRecord};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("import file has no '{0}' column")]
    MissingColumn(&'static str),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    /// Line in the file, header included.
    pub line: u64,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportReport {
    pub imported: Vec<Transaction>,
    pub skipped: Vec<SkippedRow>,
}

impl ImportReport {
    pub fn imported_count(&self) -> usize {
        self.imported.len()
    }
}

fn category_column(columns: &Columns) -> Option<&'static str> {
    ["categoryId", "category"]
        .into_iter()
        .find(|c| columns.contains(c))
}

fn resolve<'a>(categories: &'a [Category], key: &str) -> Option<&'a Category> {
    categories
        .iter()
        .find(|c| c.id == key)
        .or_else(|| categories.iter().find(|c| c.name.eq_ignore_ascii_case(key)))
}

fn parse_row(
    columns: &Columns,
    record: &StringRecord,
    category_column: &'static str,
    categories: &[Category],
    session: &Session,
) -> Result<Transaction, String> {
    let row = Row::new(columns, record);
    let amount = validate::amount(row.text("amount").map_err(|e| e.to_string())?)
        .map_err(|e| e.to_string())?;
    let date = row.date("date").map_err(|e| e.to_string())?;
    let key = row.text(category_column).map_err(|e| e.to_string())?;
    if key.is_empty() {
        return Err(format!("{} is empty", category_column));
    }
    let category = resolve(categories, key).ok_or_else(|| format!("unknown category '{}'", key))?;
    // absent column or a short row both mean no note
    let note = row.text("note").unwrap_or_default().to_string();
    validate::note(&note).map_err(|e| e.to_string())?;
    Ok(Transaction {
        id: new_id(),
        amount,
        date,
        category_id: category.id.clone(),
        note,
        user_id: session.user_id().to_string(),
    })
}

pub fn import_transactions(
    ledger: &Ledger,
    session: &Session,
    path: impl AsRef<Path>,
) -> Result<ImportReport, ImportError> {
    let path = path.as_ref();
    let read_err = |source| ImportError::Read {
        path: path.to_path_buf(),
        source,
    };
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(read_err)?;
    let columns = Columns::new(rdr.headers().map_err(read_err)?);
    for required in ["amount", "date"] {
        if !columns.contains(required) {
            return Err(ImportError::MissingColumn(required));
        }
    }
    let category_column = category_column(&columns).ok_or(ImportError::MissingColumn("categoryId"))?;
    let categories = ledger.list_categories(session)?;

    let mut report = ImportReport::default();
    for (i, result) in rdr.records().enumerate() {
        // header is line 1
        let fallback_line = i as u64 + 2;
        let parsed = match result {
            Ok(record) => {
                let line = record.position().map_or(fallback_line, |p| p.line());
                parse_row(&columns, &record, category_column, &categories, session)
                    .map_err(|reason| SkippedRow { line, reason })
            }
            Err(e) => Err(SkippedRow {
                line: e.position().map_or(fallback_line, |p| p.line()),
                reason: e.to_string(),
            }),
        };
        match parsed {
            Ok(tx) => report.imported.push(tx),
            Err(skip) => {
                warn!(file = %path.display(), line = skip.line, reason = %skip.reason, "skipping import row");
                report.skipped.push(skip);
            }
        }
    }

    ledger
        .transactions()
        .save_many(&report.imported)
        .map_err(LedgerError::from)?;
    info!(
        file = %path.display(),
        imported = report.imported.len(),
        skipped = report.skipped.len(),
        "imported transactions"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::NewUser;
    use std::fs;
    use tempfile::tempdir;

    fn setup(dir: &Path) -> (Ledger, Session) {
        let ledger = Ledger::open_dir(dir.join("data")).unwrap();
        let user = ledger
            .register(&NewUser {
                username: "importer1",
                email: "importer1@example.com",
                phone: "13900000009",
                password: "s3cret#pw",
            })
            .unwrap();
        let session = Session::new(&user);
        (ledger, session)
    }

    #[test]
    fn missing_required_column_is_rejected_up_front() {
        let dir = tempdir().unwrap();
        let (ledger, session) = setup(dir.path());
        let file = dir.path().join("in.csv");
        fs::write(&file, "amount,note\n-5,coffee\n").unwrap();
        let err = import_transactions(&ledger, &session, &file).unwrap_err();
        assert!(matches!(err, ImportError::MissingColumn("date")));
        assert_eq!(ledger.list_transactions(&session).unwrap().len(), 0);
    }

    #[test]
    fn short_row_without_note_cell_gets_empty_note() {
        let dir = tempdir().unwrap();
        let (ledger, session) = setup(dir.path());
        let file = dir.path().join("in.csv");
        fs::write(
            &file,
            "amount,date,category,note\n-5,2025-03-01,Food\n -7.25 , 2025-03-02 , food ,  lunch  \n",
        )
        .unwrap();
        let report = import_transactions(&ledger, &session, &file).unwrap();
        assert!(report.skipped.is_empty());
        let notes: Vec<&str> = report.imported.iter().map(|t| t.note.as_str()).collect();
        assert_eq!(notes, ["", "lunch"]);
        assert_eq!(report.imported[1].amount, rust_decimal::Decimal::new(-725, 2));
    }
}
