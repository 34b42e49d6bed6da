// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::store::codec::CodecError;
use crate::validate::ValidationError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by a table-backed repository.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{table}: line {line}: {source}")]
    Decode {
        table: &'static str,
        line: u64,
        #[source]
        source: CodecError,
    },

    #[error("{table}: header is missing column '{column}'")]
    HeaderMismatch {
        table: &'static str,
        column: &'static str,
    },

    #[error("{table}: I/O error on {}: {source}", path.display())]
    Io {
        table: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{table}: unreadable table: {source}")]
    Csv {
        table: &'static str,
        #[source]
        source: csv::Error,
    },

    #[error("{table}: cannot encode record: {source}")]
    Encode {
        table: &'static str,
        #[source]
        source: CodecError,
    },

    #[error("{table}: record id '{id}' already exists")]
    DuplicateId { table: &'static str, id: String },
}

impl StoreError {
    /// Whether the table itself could not be read or trusted.
    pub fn is_integrity(&self) -> bool {
        matches!(
            self,
            StoreError::Decode { .. }
                | StoreError::HeaderMismatch { .. }
                | StoreError::Io { .. }
                | StoreError::Csv { .. }
        )
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}
