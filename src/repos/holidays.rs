// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::domain_repository;
use crate::error::StoreResult;
use crate::models::Holiday;
use crate::store::codec::{encode_date, require_id, CodecResult, Record, Row};
use chrono::NaiveDate;

impl Record for Holiday {
    const TABLE: &'static str = "holidays";
    const HEADERS: &'static [&'static str] = &["id", "name", "startDate", "endDate", "userId"];

    fn id(&self) -> &str {
        &self.id
    }

    fn encode(&self) -> CodecResult<Vec<String>> {
        Ok(vec![
            require_id(&self.id)?,
            self.name.clone(),
            encode_date(self.start_date),
            encode_date(self.end_date),
            self.user_id.clone(),
        ])
    }

    fn decode(row: &Row<'_>) -> CodecResult<Self> {
        Ok(Holiday {
            id: row.string("id")?,
            name: row.string("name")?,
            start_date: row.date("startDate")?,
            end_date: row.date("endDate")?,
            user_id: row.string("userId")?,
        })
    }
}

domain_repository!(HolidayRepository, Holiday);

impl HolidayRepository {
    pub fn by_user(&self, user_id: &str) -> StoreResult<Vec<Holiday>> {
        self.find_where(|h| h.user_id == user_id)
    }

    /// Holidays whose window includes `date`.
    pub fn covering(&self, date: NaiveDate, user_id: &str) -> StoreResult<Vec<Holiday>> {
        self.find_where(|h| h.user_id == user_id && h.contains(date))
    }

    /// Holidays sharing at least one day with `[start, end]`.
    pub fn overlapping(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        user_id: &str,
    ) -> StoreResult<Vec<Holiday>> {
        self.find_where(|h| h.user_id == user_id && h.start_date <= end && h.end_date >= start)
    }

    pub fn by_name(&self, name: &str, user_id: &str) -> StoreResult<Option<Holiday>> {
        self.find_first(|h| h.user_id == user_id && h.name.eq_ignore_ascii_case(name))
    }

    pub fn exists_by_name(&self, name: &str, user_id: &str) -> StoreResult<bool> {
        Ok(self.by_name(name, user_id)?.is_some())
    }

    pub fn search_by_name(&self, keyword: &str, user_id: &str) -> StoreResult<Vec<Holiday>> {
        let needle = keyword.to_lowercase();
        self.find_where(|h| h.user_id == user_id && h.name.to_lowercase().contains(&needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn holiday(id: &str, name: &str, start: &str, end: &str) -> Holiday {
        Holiday {
            id: id.into(),
            name: name.into(),
            start_date: day(start),
            end_date: day(end),
            user_id: "u1".into(),
        }
    }

    #[test]
    fn windows_are_inclusive() {
        let dir = tempdir().unwrap();
        let repo = HolidayRepository::open(dir.path()).unwrap();
        repo.save_many(&[
            holiday("h1", "Spring Festival", "2025-01-28", "2025-02-04"),
            holiday("h2", "National Day", "2025-10-01", "2025-10-07"),
        ])
        .unwrap();

        assert_eq!(repo.covering(day("2025-02-04"), "u1").unwrap()[0].id, "h1");
        assert!(repo.covering(day("2025-02-05"), "u1").unwrap().is_empty());
        assert_eq!(
            repo.overlapping(day("2025-09-25"), day("2025-10-01"), "u1")
                .unwrap()
                .len(),
            1
        );
        assert!(repo.exists_by_name("national day", "u1").unwrap());
        assert_eq!(repo.search_by_name("fest", "u1").unwrap().len(), 1);
    }
}
