// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use finsage::error::StoreError;
use finsage::repos::TransactionRepository;
use finsage::store::codec::{CodecError, CodecResult, Record, Row};
use finsage::store::Repository;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    id: String,
    label: String,
}

impl Record for Entry {
    const TABLE: &'static str = "entries";
    const HEADERS: &'static [&'static str] = &["id", "label"];

    fn id(&self) -> &str {
        &self.id
    }

    fn encode(&self) -> CodecResult<Vec<String>> {
        if self.label == "unencodable" {
            return Err(CodecError::EmptyId);
        }
        Ok(vec![self.id.clone(), self.label.clone()])
    }

    fn decode(row: &Row<'_>) -> CodecResult<Self> {
        Ok(Entry {
            id: row.string("id")?,
            label: row.string("label")?,
        })
    }
}

fn entry(id: &str, label: &str) -> Entry {
    Entry {
        id: id.into(),
        label: label.into(),
    }
}

fn no_siblings(dir: &Path) {
    let leftovers: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|n| n.ends_with(".bak") || n.ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty(), "leftover files: {:?}", leftovers);
}

#[test]
fn failed_update_and_delete_many_leave_table_untouched() {
    let dir = tempdir().unwrap();
    let repo = Repository::<Entry>::open(dir.path()).unwrap();
    fs::write(repo.path(), "id,label\na,one\nb,unencodable\nc,three\n").unwrap();
    let before = fs::read(repo.path()).unwrap();

    assert!(repo.update(&entry("a", "ONE")).is_err());
    assert_eq!(fs::read(repo.path()).unwrap(), before);
    no_siblings(dir.path());

    assert!(repo.delete_many(&["a", "c"]).is_err());
    assert_eq!(fs::read(repo.path()).unwrap(), before);
    no_siblings(dir.path());

    // the poisoned row itself can still be removed
    assert!(repo.delete_by_id("b").unwrap());
    assert_eq!(repo.load_all().unwrap(), vec![entry("a", "one"), entry("c", "three")]);
    no_siblings(dir.path());
}

#[test]
fn repositories_on_the_same_file_see_each_other() {
    let dir = tempdir().unwrap();
    let first = Repository::<Entry>::open(dir.path()).unwrap();
    let second = Repository::<Entry>::open(dir.path()).unwrap();
    first.save(&entry("a", "one")).unwrap();
    assert!(second.exists("a").unwrap());
    assert!(matches!(
        second.save(&entry("a", "again")),
        Err(StoreError::DuplicateId { .. })
    ));
}

#[test]
fn concurrent_saves_lose_nothing() {
    let dir = tempdir().unwrap();
    let path = dir.path().to_path_buf();
    Repository::<Entry>::open(&path).unwrap();
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let path = path.clone();
            std::thread::spawn(move || {
                let repo = Repository::<Entry>::open(&path).unwrap();
                for i in 0..10 {
                    repo.save(&entry(&format!("{}-{}", t, i), "x")).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    let repo = Repository::<Entry>::open(&path).unwrap();
    assert_eq!(repo.count().unwrap(), 40);
    no_siblings(&path);
}

#[test]
fn bad_row_in_domain_table_is_an_integrity_error() {
    let dir = tempdir().unwrap();
    let repo = TransactionRepository::open(dir.path()).unwrap();
    let header = fs::read_to_string(repo.path()).unwrap();
    fs::write(
        repo.path(),
        format!("{}t1,-12.50,2025-03-01,c1,lunch,u1\nt2,twelve,2025-03-02,c1,,u1\n", header),
    )
    .unwrap();

    let err = repo.load_all().unwrap_err();
    assert!(err.is_integrity());
    match err {
        StoreError::Decode { line, source, .. } => {
            assert_eq!(line, 3);
            assert!(matches!(source, CodecError::InvalidDecimal { .. }));
        }
        other => panic!("expected decode error, got {other:?}"),
    }
}

#[test]
fn missing_header_column_is_reported() {
    let dir = tempdir().unwrap();
    let repo = TransactionRepository::open(dir.path()).unwrap();
    fs::write(repo.path(), "id,amount,date\n").unwrap();
    let err = repo.load_all().unwrap_err();
    assert!(matches!(err, StoreError::HeaderMismatch { .. }));
}
