// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::domain_repository;
use crate::error::StoreResult;
use crate::models::{Budget, Month};
use crate::store::codec::{encode_decimal, require_id, CodecResult, Record, Row};
use tracing::warn;

impl Record for Budget {
    const TABLE: &'static str = "budgets";
    const HEADERS: &'static [&'static str] = &["id", "month", "categoryId", "amount", "userId"];

    fn id(&self) -> &str {
        &self.id
    }

    fn encode(&self) -> CodecResult<Vec<String>> {
        Ok(vec![
            require_id(&self.id)?,
            self.month.to_string(),
            self.category_id.clone().unwrap_or_default(),
            encode_decimal(self.amount),
            self.user_id.clone(),
        ])
    }

    fn decode(row: &Row<'_>) -> CodecResult<Self> {
        Ok(Budget {
            id: row.string("id")?,
            month: row.month("month")?,
            category_id: row.optional_string("categoryId")?,
            amount: row.decimal("amount")?,
            user_id: row.string("userId")?,
        })
    }
}

domain_repository!(BudgetRepository, Budget);

/// What `save_or_update` did with the submitted budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upsert {
    Inserted(Budget),
    /// The slot was taken; the stored record kept its id and got the new amount.
    Updated(Budget),
}

impl Upsert {
    pub fn budget(&self) -> &Budget {
        match self {
            Upsert::Inserted(b) | Upsert::Updated(b) => b,
        }
    }
}

impl BudgetRepository {
    pub fn by_user(&self, user_id: &str) -> StoreResult<Vec<Budget>> {
        self.find_where(|b| b.user_id == user_id)
    }

    /// Total and category budgets of one month, in file order.
    pub fn by_month(&self, month: Month, user_id: &str) -> StoreResult<Vec<Budget>> {
        self.find_where(|b| b.month == month && b.user_id == user_id)
    }

    pub fn total_for_month(&self, month: Month, user_id: &str) -> StoreResult<Option<Budget>> {
        self.find_first(|b| b.month == month && b.user_id == user_id && b.is_total())
    }

    pub fn category_budget(
        &self,
        month: Month,
        category_id: &str,
        user_id: &str,
    ) -> StoreResult<Option<Budget>> {
        self.find_first(|b| {
            b.month == month
                && b.user_id == user_id
                && b.category_id.as_deref() == Some(category_id)
        })
    }

    /// Upsert by slot `(month, user, category-or-total)`.
    ///
    /// This is the only place "one budget per slot" is enforced.
    pub fn save_or_update(&self, budget: &Budget) -> StoreResult<Upsert> {
        let existing = match &budget.category_id {
            None => self.total_for_month(budget.month, &budget.user_id)?,
            Some(cat) => self.category_budget(budget.month, cat, &budget.user_id)?,
        };
        match existing {
            Some(mut stored) => {
                stored.amount = budget.amount;
                self.replace_or_insert(stored, budget)
            }
            None => self.insert(budget),
        }
    }

    /// Writes the new amount onto `stored`; inserts `budget` instead when
    /// `stored` is gone from the table by the time of the write.
    fn replace_or_insert(&self, stored: Budget, budget: &Budget) -> StoreResult<Upsert> {
        if self.update(&stored)? {
            return Ok(Upsert::Updated(stored));
        }
        warn!(id = %stored.id, month = %stored.month, "budget vanished before update, inserting");
        self.insert(budget)
    }

    fn insert(&self, budget: &Budget) -> StoreResult<Upsert> {
        self.save(budget)?;
        Ok(Upsert::Inserted(budget.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::new_id;
    use rust_decimal::Decimal;
    use tempfile::tempdir;

    fn budget(month: &str, cat: Option<&str>, amount: i64) -> Budget {
        Budget {
            id: new_id(),
            month: month.parse().unwrap(),
            category_id: cat.map(str::to_string),
            amount: Decimal::new(amount, 0),
            user_id: "u1".into(),
        }
    }

    #[test]
    fn total_slot_upsert_keeps_one_record() {
        let dir = tempdir().unwrap();
        let repo = BudgetRepository::open(dir.path()).unwrap();
        let first = repo.save_or_update(&budget("2025-05", None, 1000)).unwrap();
        assert!(matches!(first, Upsert::Inserted(_)));
        let second = repo.save_or_update(&budget("2025-05", None, 1500)).unwrap();
        assert!(matches!(second, Upsert::Updated(_)));
        assert_eq!(second.budget().id, first.budget().id);

        let all = repo.load_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].amount, Decimal::new(1500, 0));
        assert!(all[0].is_total());
    }

    #[test]
    fn vanished_slot_is_inserted_not_reported_as_updated() {
        let dir = tempdir().unwrap();
        let repo = BudgetRepository::open(dir.path()).unwrap();
        let gone = budget("2025-05", None, 1000);
        let submitted = budget("2025-05", None, 1500);
        let outcome = repo.replace_or_insert(gone, &submitted).unwrap();
        assert_eq!(outcome, Upsert::Inserted(submitted.clone()));

        let all = repo.load_all().unwrap();
        assert_eq!(all, vec![submitted]);
    }

    #[test]
    fn category_and_total_slots_are_distinct() {
        let dir = tempdir().unwrap();
        let repo = BudgetRepository::open(dir.path()).unwrap();
        repo.save_or_update(&budget("2025-05", None, 1000)).unwrap();
        repo.save_or_update(&budget("2025-05", Some("food"), 300)).unwrap();
        repo.save_or_update(&budget("2025-06", Some("food"), 200)).unwrap();
        repo.save_or_update(&budget("2025-05", Some("food"), 350)).unwrap();

        let may = Month::new(2025, 5).unwrap();
        assert_eq!(repo.by_month(may, "u1").unwrap().len(), 2);
        assert_eq!(
            repo.category_budget(may, "food", "u1").unwrap().unwrap().amount,
            Decimal::new(350, 0)
        );
        assert_eq!(
            repo.total_for_month(may, "u1").unwrap().unwrap().amount,
            Decimal::new(1000, 0)
        );
        assert!(repo.total_for_month(may, "u2").unwrap().is_none());
    }

    #[test]
    fn total_budget_round_trips_with_empty_category() {
        let dir = tempdir().unwrap();
        let repo = BudgetRepository::open(dir.path()).unwrap();
        let b = budget("2024-12", None, 42);
        repo.save(&b).unwrap();
        let text = std::fs::read_to_string(repo.path()).unwrap();
        assert!(text.contains(&format!("{},2024-12,,42,u1", b.id)));
        assert_eq!(repo.find_by_id(&b.id).unwrap(), Some(b));
    }
}
