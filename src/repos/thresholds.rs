// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::domain_repository;
use crate::error::StoreResult;
use crate::models::AbnormalThreshold;
use crate::store::codec::{encode_decimal, require_id, CodecResult, Record, Row};
use rust_decimal::Decimal;

impl Record for AbnormalThreshold {
    const TABLE: &'static str = "abnormal_configs";
    const HEADERS: &'static [&'static str] = &["id", "itemName", "threshold", "userId"];

    fn id(&self) -> &str {
        &self.id
    }

    fn encode(&self) -> CodecResult<Vec<String>> {
        Ok(vec![
            require_id(&self.id)?,
            self.item_name.clone(),
            encode_decimal(self.threshold),
            self.user_id.clone(),
        ])
    }

    fn decode(row: &Row<'_>) -> CodecResult<Self> {
        Ok(AbnormalThreshold {
            id: row.string("id")?,
            item_name: row.string("itemName")?,
            threshold: row.decimal("threshold")?,
            user_id: row.string("userId")?,
        })
    }
}

domain_repository!(ThresholdRepository, AbnormalThreshold);

impl ThresholdRepository {
    pub fn by_user(&self, user_id: &str) -> StoreResult<Vec<AbnormalThreshold>> {
        self.find_where(|t| t.user_id == user_id)
    }

    pub fn by_item_name(&self, item: &str, user_id: &str) -> StoreResult<Option<AbnormalThreshold>> {
        self.find_first(|t| t.user_id == user_id && t.item_name.eq_ignore_ascii_case(item))
    }

    pub fn exists_by_item_name(&self, item: &str, user_id: &str) -> StoreResult<bool> {
        Ok(self.by_item_name(item, user_id)?.is_some())
    }

    pub fn above(&self, threshold: Decimal, user_id: &str) -> StoreResult<Vec<AbnormalThreshold>> {
        self.find_where(|t| t.user_id == user_id && t.threshold > threshold)
    }

    pub fn below(&self, threshold: Decimal, user_id: &str) -> StoreResult<Vec<AbnormalThreshold>> {
        self.find_where(|t| t.user_id == user_id && t.threshold < threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn item_lookup_and_bounds() {
        let dir = tempdir().unwrap();
        let repo = ThresholdRepository::open(dir.path()).unwrap();
        repo.save_many(&[
            AbnormalThreshold {
                id: "t1".into(),
                item_name: "Food".into(),
                threshold: Decimal::new(50000, 2),
                user_id: "u1".into(),
            },
            AbnormalThreshold {
                id: "t2".into(),
                item_name: "Travel".into(),
                threshold: Decimal::new(3000, 0),
                user_id: "u1".into(),
            },
        ])
        .unwrap();
        assert_eq!(
            repo.by_item_name("food", "u1").unwrap().unwrap().threshold,
            Decimal::new(500, 0)
        );
        assert_eq!(repo.above(Decimal::new(1000, 0), "u1").unwrap()[0].id, "t2");
        assert_eq!(repo.below(Decimal::new(1000, 0), "u1").unwrap()[0].id, "t1");
        assert!(repo.by_user("u2").unwrap().is_empty());
    }
}
