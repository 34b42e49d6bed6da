// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Generic CRUD over one flat CSV table per record type.
//!
//! Every call loads the full table and every mutation rewrites it. Rewrites
//! render the whole table in memory, keep a `<file>.bak` copy of the live
//! table, write `<file>.tmp`, sync it and rename it over the live file. The
//! backup is removed once the new file is confirmed on disk; on any failure
//! the live file is restored from it. A failed mutation therefore leaves the
//! table in its previous state.
//!
//! Calls are serialised per table path inside the process. Nothing guards
//! against a second process touching the same files.

pub mod codec;

use crate::error::{StoreError, StoreResult};
use codec::{Columns, Record, Row};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::{self, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

static TABLE_LOCKS: Lazy<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

fn lock_for(path: &Path) -> Arc<Mutex<()>> {
    TABLE_LOCKS
        .lock()
        .entry(path.to_path_buf())
        .or_default()
        .clone()
}

pub struct Repository<R: Record> {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> Clone for Repository<R> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            lock: Arc::clone(&self.lock),
            _record: PhantomData,
        }
    }
}

impl<R: Record> std::fmt::Debug for Repository<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("table", &R::TABLE)
            .field("path", &self.path)
            .finish()
    }
}

impl<R: Record> Repository<R> {
    /// Binds the table `<dir>/<TABLE>.csv`, creating it if needed.
    pub fn open(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|source| io_error::<R>(dir, source))?;
        let dir = fs::canonicalize(dir).map_err(|source| io_error::<R>(dir, source))?;
        let path = dir.join(format!("{}.csv", R::TABLE));
        let repo = Self {
            lock: lock_for(&path),
            path,
            _record: PhantomData,
        };
        repo.ensure_initialized()?;
        Ok(repo)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> PathBuf {
        sibling(&self.path, "bak")
    }

    fn temp_path(&self) -> PathBuf {
        sibling(&self.path, "tmp")
    }

    /// Creates a header-only table if none exists. Idempotent.
    ///
    /// A missing table with a leftover backup is restored from it; a backup
    /// next to an intact table is stale and removed.
    pub fn ensure_initialized(&self) -> StoreResult<()> {
        let _guard = self.lock.lock();
        let backup = self.backup_path();
        if !self.path.exists() {
            if backup.exists() {
                warn!(table = R::TABLE, "table missing, restoring from backup");
                fs::copy(&backup, &self.path).map_err(|source| io_error::<R>(&self.path, source))?;
                remove_quietly(&backup);
                return Ok(());
            }
            let bytes = render::<R>(&[])?;
            self.replace_with(&bytes)?;
            info!(table = R::TABLE, path = %self.path.display(), "created table");
        } else if backup.exists() {
            warn!(table = R::TABLE, "removing stale backup {}", backup.display());
            remove_quietly(&backup);
        }
        Ok(())
    }

    /// Every record in file order.
    pub fn load_all(&self) -> StoreResult<Vec<R>> {
        let _guard = self.lock.lock();
        self.read_all()
    }

    pub fn find_by_id(&self, id: &str) -> StoreResult<Option<R>> {
        self.find_first(|r| r.id() == id)
    }

    pub fn exists(&self, id: &str) -> StoreResult<bool> {
        Ok(self.find_by_id(id)?.is_some())
    }

    pub fn find_where<F>(&self, predicate: F) -> StoreResult<Vec<R>>
    where
        F: Fn(&R) -> bool,
    {
        Ok(self.load_all()?.into_iter().filter(|r| predicate(r)).collect())
    }

    pub fn find_first<F>(&self, predicate: F) -> StoreResult<Option<R>>
    where
        F: Fn(&R) -> bool,
    {
        Ok(self.load_all()?.into_iter().find(|r| predicate(r)))
    }

    pub fn count(&self) -> StoreResult<usize> {
        Ok(self.load_all()?.len())
    }

    /// Appends one record. Fails if its id is already stored.
    pub fn save(&self, record: &R) -> StoreResult<()> {
        self.save_many(std::slice::from_ref(record))
    }

    /// Appends a batch in a single rewrite. Fails, storing nothing, if any id
    /// is already stored or repeated within the batch.
    pub fn save_many(&self, records: &[R]) -> StoreResult<()> {
        if records.is_empty() {
            return Ok(());
        }
        let _guard = self.lock.lock();
        let mut all = self.read_all()?;
        {
            let mut seen: HashSet<&str> = all.iter().map(|r| r.id()).collect();
            if let Some(dup) = records.iter().find(|r| !seen.insert(r.id())) {
                return Err(StoreError::DuplicateId {
                    table: R::TABLE,
                    id: dup.id().to_string(),
                });
            }
        }
        all.extend(records.iter().cloned());
        self.rewrite(&all)?;
        info!(table = R::TABLE, count = records.len(), "saved records");
        Ok(())
    }

    /// Replaces the first record with the same id. Returns `false` when no
    /// record matched; the table is not touched then.
    pub fn update(&self, record: &R) -> StoreResult<bool> {
        let _guard = self.lock.lock();
        let mut all = self.read_all()?;
        let Some(slot) = all.iter_mut().find(|r| r.id() == record.id()) else {
            return Ok(false);
        };
        *slot = record.clone();
        self.rewrite(&all)?;
        info!(table = R::TABLE, id = record.id(), "updated record");
        Ok(true)
    }

    /// Removes every record with `id`. Returns whether anything was removed.
    pub fn delete_by_id(&self, id: &str) -> StoreResult<bool> {
        let _guard = self.lock.lock();
        let mut all = self.read_all()?;
        let before = all.len();
        all.retain(|r| r.id() != id);
        if all.len() == before {
            return Ok(false);
        }
        self.rewrite(&all)?;
        info!(table = R::TABLE, id, "deleted record");
        Ok(true)
    }

    pub fn delete_many<S: AsRef<str>>(&self, ids: &[S]) -> StoreResult<bool> {
        let doomed: HashSet<&str> = ids.iter().map(AsRef::as_ref).collect();
        let _guard = self.lock.lock();
        let mut all = self.read_all()?;
        let before = all.len();
        all.retain(|r| !doomed.contains(r.id()));
        if all.len() == before {
            return Ok(false);
        }
        let removed = before - all.len();
        self.rewrite(&all)?;
        info!(table = R::TABLE, removed, "deleted records");
        Ok(true)
    }

    fn read_all(&self) -> StoreResult<Vec<R>> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::Headers)
            .from_path(&self.path)
            .map_err(|source| csv_error::<R>(source))?;
        let headers = rdr.headers().map_err(|source| csv_error::<R>(source))?.clone();
        let columns = Columns::new(&headers);
        if let Some(&column) = R::HEADERS.iter().find(|h| !columns.contains(h)) {
            return Err(StoreError::HeaderMismatch {
                table: R::TABLE,
                column,
            });
        }

        let mut out = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|source| csv_error::<R>(source))?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            let row = Row::new(&columns, &record);
            let decoded = R::decode(&row).map_err(|source| StoreError::Decode {
                table: R::TABLE,
                line,
                source,
            })?;
            out.push(decoded);
        }
        debug!(table = R::TABLE, rows = out.len(), "loaded table");
        Ok(out)
    }

    fn rewrite(&self, records: &[R]) -> StoreResult<()> {
        let bytes = render(records)?;
        let backup = self.backup_path();
        fs::copy(&self.path, &backup).map_err(|source| io_error::<R>(&backup, source))?;
        match self.replace_with(&bytes) {
            Ok(()) => {
                remove_quietly(&backup);
                debug!(table = R::TABLE, rows = records.len(), "rewrote table");
                Ok(())
            }
            Err(err) => {
                warn!(table = R::TABLE, "rewrite failed: {}", err);
                self.restore_from(&backup);
                Err(err)
            }
        }
    }

    fn replace_with(&self, bytes: &[u8]) -> StoreResult<()> {
        let tmp = self.temp_path();
        write_and_swap(&tmp, &self.path, bytes).map_err(|source| {
            remove_quietly(&tmp);
            io_error::<R>(&self.path, source)
        })
    }

    fn restore_from(&self, backup: &Path) {
        match fs::copy(backup, &self.path) {
            Ok(_) => {
                remove_quietly(backup);
                info!(table = R::TABLE, "restored table from backup");
            }
            Err(err) => error!(
                table = R::TABLE,
                "could not restore {} from {}: {}",
                self.path.display(),
                backup.display(),
                err
            ),
        }
    }
}

fn render<R: Record>(records: &[R]) -> StoreResult<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(R::HEADERS)
        .map_err(|source| csv_error::<R>(source))?;
    for r in records {
        let fields = r.encode().map_err(|source| StoreError::Encode {
            table: R::TABLE,
            source,
        })?;
        wtr.write_record(&fields)
            .map_err(|source| csv_error::<R>(source))?;
    }
    wtr.into_inner().map_err(|err| StoreError::Io {
        table: R::TABLE,
        path: PathBuf::new(),
        source: err.into_error(),
    })
}

fn write_and_swap(tmp: &Path, live: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(tmp)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);
    fs::rename(tmp, live)?;
    let on_disk = fs::metadata(live)?.len();
    if on_disk != bytes.len() as u64 {
        return Err(io::Error::new(
            io::ErrorKind::WriteZero,
            format!("expected {} bytes on disk, found {}", bytes.len(), on_disk),
        ));
    }
    Ok(())
}

fn sibling(path: &Path, ext: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

fn remove_quietly(path: &Path) {
    if path.exists() {
        if let Err(err) = fs::remove_file(path) {
            warn!("could not remove {}: {}", path.display(), err);
        }
    }
}

fn io_error<R: Record>(path: &Path, source: io::Error) -> StoreError {
    StoreError::Io {
        table: R::TABLE,
        path: path.to_path_buf(),
        source,
    }
}

fn csv_error<R: Record>(source: csv::Error) -> StoreError {
    StoreError::Csv {
        table: R::TABLE,
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::codec::{CodecError, CodecResult};
    use super::*;
    use tempfile::tempdir;

    #[derive(Debug, Clone, PartialEq)]
    struct Note {
        id: String,
        body: String,
    }

    impl Record for Note {
        const TABLE: &'static str = "notes";
        const HEADERS: &'static [&'static str] = &["id", "body"];

        fn id(&self) -> &str {
            &self.id
        }

        fn encode(&self) -> CodecResult<Vec<String>> {
            // "poison" stands in for a write that dies halfway through
            if self.body == "poison" {
                return Err(CodecError::EmptyId);
            }
            Ok(vec![self.id.clone(), self.body.clone()])
        }

        fn decode(row: &Row<'_>) -> CodecResult<Self> {
            Ok(Note {
                id: row.string("id")?,
                body: row.string("body")?,
            })
        }
    }

    fn note(id: &str, body: &str) -> Note {
        Note {
            id: id.into(),
            body: body.into(),
        }
    }

    #[test]
    fn open_creates_header_only_table() {
        let dir = tempdir().unwrap();
        let repo = Repository::<Note>::open(dir.path()).unwrap();
        let text = fs::read_to_string(repo.path()).unwrap();
        assert_eq!(text, "id,body\n");
        assert_eq!(repo.count().unwrap(), 0);
        // idempotent
        Repository::<Note>::open(dir.path()).unwrap();
        assert_eq!(fs::read_to_string(repo.path()).unwrap(), "id,body\n");
    }

    #[test]
    fn preserves_insertion_order_and_escapes_fields() {
        let dir = tempdir().unwrap();
        let repo = Repository::<Note>::open(dir.path()).unwrap();
        repo.save(&note("b", "second, with comma")).unwrap();
        repo.save(&note("a", "quote \" inside")).unwrap();
        let all = repo.load_all().unwrap();
        assert_eq!(all, vec![note("b", "second, with comma"), note("a", "quote \" inside")]);
    }

    #[test]
    fn save_rejects_existing_id() {
        let dir = tempdir().unwrap();
        let repo = Repository::<Note>::open(dir.path()).unwrap();
        repo.save(&note("a", "one")).unwrap();
        let err = repo.save(&note("a", "two")).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId { .. }));
        let err = repo
            .save_many(&[note("b", "x"), note("b", "y")])
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId { .. }));
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn update_and_delete_report_missing_targets() {
        let dir = tempdir().unwrap();
        let repo = Repository::<Note>::open(dir.path()).unwrap();
        repo.save_many(&[note("a", "one"), note("b", "two"), note("c", "three")])
            .unwrap();
        assert!(!repo.update(&note("zz", "nope")).unwrap());
        assert!(repo.update(&note("b", "TWO")).unwrap());
        assert_eq!(repo.find_by_id("b").unwrap().unwrap().body, "TWO");
        assert!(!repo.delete_by_id("zz").unwrap());
        assert!(repo.delete_by_id("a").unwrap());
        assert!(repo.delete_many(&["b", "c"]).unwrap());
        assert!(!repo.delete_many(&["b"]).unwrap());
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn failed_delete_leaves_table_byte_identical() {
        let dir = tempdir().unwrap();
        let repo = Repository::<Note>::open(dir.path()).unwrap();
        // written directly, the codec refuses to re-encode it
        fs::write(repo.path(), "id,body\na,one\nb,poison\nc,three\n").unwrap();
        let before = fs::read(repo.path()).unwrap();

        assert!(repo.delete_by_id("a").is_err());
        assert_eq!(fs::read(repo.path()).unwrap(), before);
        assert!(!repo.backup_path().exists());
    }

    #[test]
    fn io_failure_during_swap_restores_table() {
        let dir = tempdir().unwrap();
        let repo = Repository::<Note>::open(dir.path()).unwrap();
        repo.save_many(&[note("a", "one"), note("b", "two")]).unwrap();
        let before = fs::read(repo.path()).unwrap();

        // a directory squatting on the temp path makes the write fail
        fs::create_dir(repo.temp_path()).unwrap();
        let err = repo.delete_by_id("a").unwrap_err();
        assert!(err.is_integrity());
        assert_eq!(fs::read(repo.path()).unwrap(), before);
        assert!(!repo.backup_path().exists());

        let err = repo.update(&note("b", "changed")).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
        assert_eq!(fs::read(repo.path()).unwrap(), before);
    }

    #[test]
    fn undecodable_row_fails_the_whole_load() {
        let dir = tempdir().unwrap();
        let repo = Repository::<Note>::open(dir.path()).unwrap();
        fs::write(repo.path(), "id,body\na,one\nb\n").unwrap();
        let err = repo.load_all().unwrap_err();
        assert!(err.is_integrity());

        fs::write(repo.path(), "id,text\na,one\n").unwrap();
        let err = repo.load_all().unwrap_err();
        assert!(matches!(
            err,
            StoreError::HeaderMismatch { column: "body", .. }
        ));
    }

    #[test]
    fn leftover_backup_is_recovered_or_discarded() {
        let dir = tempdir().unwrap();
        let repo = Repository::<Note>::open(dir.path()).unwrap();
        repo.save(&note("a", "one")).unwrap();
        let snapshot = fs::read(repo.path()).unwrap();

        fs::write(repo.backup_path(), b"id,body\nold,row\n").unwrap();
        repo.ensure_initialized().unwrap();
        assert!(!repo.backup_path().exists());
        assert_eq!(fs::read(repo.path()).unwrap(), snapshot);

        fs::rename(repo.path(), repo.backup_path()).unwrap();
        repo.ensure_initialized().unwrap();
        assert_eq!(fs::read(repo.path()).unwrap(), snapshot);
        assert!(!repo.backup_path().exists());
    }
}
