// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::domain_repository;
use crate::error::StoreResult;
use crate::models::Category;
use crate::store::codec::{require_id, CodecResult, Record, Row};

impl Record for Category {
    const TABLE: &'static str = "categories";
    const HEADERS: &'static [&'static str] = &["id", "name", "userId"];

    fn id(&self) -> &str {
        &self.id
    }

    fn encode(&self) -> CodecResult<Vec<String>> {
        Ok(vec![
            require_id(&self.id)?,
            self.name.clone(),
            self.user_id.clone(),
        ])
    }

    fn decode(row: &Row<'_>) -> CodecResult<Self> {
        Ok(Category {
            id: row.string("id")?,
            name: row.string("name")?,
            user_id: row.string("userId")?,
        })
    }
}

domain_repository!(CategoryRepository, Category);

impl CategoryRepository {
    pub fn by_user(&self, user_id: &str) -> StoreResult<Vec<Category>> {
        self.find_where(|c| c.user_id == user_id)
    }

    /// Case-insensitive name lookup within one user's categories.
    pub fn by_name(&self, name: &str, user_id: &str) -> StoreResult<Option<Category>> {
        self.find_first(|c| c.user_id == user_id && c.name.eq_ignore_ascii_case(name))
    }

    pub fn exists_by_name(&self, name: &str, user_id: &str) -> StoreResult<bool> {
        Ok(self.by_name(name, user_id)?.is_some())
    }

    pub fn search_by_name(&self, keyword: &str, user_id: &str) -> StoreResult<Vec<Category>> {
        let needle = keyword.to_lowercase();
        self.find_where(|c| c.user_id == user_id && c.name.to_lowercase().contains(&needle))
    }

    pub fn count_by_user(&self, user_id: &str) -> StoreResult<usize> {
        Ok(self.by_user(user_id)?.len())
    }
}
