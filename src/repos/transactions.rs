// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::domain_repository;
use crate::error::StoreResult;
use crate::models::{Month, Transaction};
use crate::store::codec::{encode_date, encode_decimal, require_id, CodecResult, Record, Row};
use chrono::NaiveDate;
use rust_decimal::Decimal;

impl Record for Transaction {
    const TABLE: &'static str = "transactions";
    const HEADERS: &'static [&'static str] =
        &["id", "amount", "date", "categoryId", "note", "userId"];

    fn id(&self) -> &str {
        &self.id
    }

    fn encode(&self) -> CodecResult<Vec<String>> {
        Ok(vec![
            require_id(&self.id)?,
            encode_decimal(self.amount),
            encode_date(self.date),
            self.category_id.clone(),
            self.note.clone(),
            self.user_id.clone(),
        ])
    }

    fn decode(row: &Row<'_>) -> CodecResult<Self> {
        Ok(Transaction {
            id: row.string("id")?,
            amount: row.decimal("amount")?,
            date: row.date("date")?,
            category_id: row.string("categoryId")?,
            note: row.string("note")?,
            user_id: row.string("userId")?,
        })
    }
}

domain_repository!(TransactionRepository, Transaction);

fn in_range(t: &Transaction, start: NaiveDate, end: NaiveDate) -> bool {
    t.date >= start && t.date <= end
}

fn sum(transactions: &[Transaction]) -> Decimal {
    crate::reports::saturating_sum(transactions.iter().map(|t| t.amount))
}

impl TransactionRepository {
    pub fn by_user(&self, user_id: &str) -> StoreResult<Vec<Transaction>> {
        self.find_where(|t| t.user_id == user_id)
    }

    /// Inclusive on both ends.
    pub fn by_user_in_range(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Vec<Transaction>> {
        self.find_where(|t| t.user_id == user_id && in_range(t, start, end))
    }

    pub fn by_category(&self, category_id: &str, user_id: &str) -> StoreResult<Vec<Transaction>> {
        self.find_where(|t| t.category_id == category_id && t.user_id == user_id)
    }

    pub fn by_month(&self, month: Month, user_id: &str) -> StoreResult<Vec<Transaction>> {
        self.by_user_in_range(user_id, month.first_day(), month.last_day())
    }

    pub fn by_month_and_category(
        &self,
        month: Month,
        category_id: &str,
        user_id: &str,
    ) -> StoreResult<Vec<Transaction>> {
        self.find_where(|t| {
            t.user_id == user_id && t.category_id == category_id && month.contains(t.date)
        })
    }

    pub fn amount_greater_than(&self, amount: Decimal, user_id: &str) -> StoreResult<Vec<Transaction>> {
        self.find_where(|t| t.amount > amount && t.user_id == user_id)
    }

    pub fn amount_less_than(&self, amount: Decimal, user_id: &str) -> StoreResult<Vec<Transaction>> {
        self.find_where(|t| t.amount < amount && t.user_id == user_id)
    }

    pub fn amount_between(
        &self,
        min: Decimal,
        max: Decimal,
        user_id: &str,
    ) -> StoreResult<Vec<Transaction>> {
        self.find_where(|t| t.amount >= min && t.amount <= max && t.user_id == user_id)
    }

    /// Case-insensitive substring match on the note.
    pub fn search_note(&self, keyword: &str, user_id: &str) -> StoreResult<Vec<Transaction>> {
        let needle = keyword.to_lowercase();
        self.find_where(|t| t.user_id == user_id && t.note.to_lowercase().contains(&needle))
    }

    pub fn total_by_user(&self, user_id: &str) -> StoreResult<Decimal> {
        Ok(sum(&self.by_user(user_id)?))
    }

    pub fn total_by_category(&self, category_id: &str, user_id: &str) -> StoreResult<Decimal> {
        Ok(sum(&self.by_category(category_id, user_id)?))
    }

    /// Signed sum over an inclusive date range.
    pub fn total_in_range(&self, start: NaiveDate, end: NaiveDate, user_id: &str) -> StoreResult<Decimal> {
        Ok(sum(&self.by_user_in_range(user_id, start, end)?))
    }

    pub fn total_by_category_in_range(
        &self,
        category_id: &str,
        start: NaiveDate,
        end: NaiveDate,
        user_id: &str,
    ) -> StoreResult<Decimal> {
        let rows = self.find_where(|t| {
            t.user_id == user_id && t.category_id == category_id && in_range(t, start, end)
        })?;
        Ok(sum(&rows))
    }

    /// Sum of expense magnitudes over an inclusive date range; income is ignored.
    pub fn net_expense_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        user_id: &str,
    ) -> StoreResult<Decimal> {
        let rows = self.by_user_in_range(user_id, start, end)?;
        Ok(crate::reports::net_expense(&rows, start, end))
    }

    pub fn count_by_user(&self, user_id: &str) -> StoreResult<usize> {
        Ok(self.by_user(user_id)?.len())
    }

    pub fn count_by_category(&self, category_id: &str, user_id: &str) -> StoreResult<usize> {
        Ok(self.by_category(category_id, user_id)?.len())
    }

    pub fn is_category_used(&self, category_id: &str, user_id: &str) -> StoreResult<bool> {
        Ok(self
            .find_first(|t| t.category_id == category_id && t.user_id == user_id)?
            .is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::codec::Columns;
    use csv::StringRecord;
    use proptest::prelude::*;
    use tempfile::tempdir;

    fn tx(id: &str, amount: &str, date: &str, cat: &str, note: &str, user: &str) -> Transaction {
        Transaction {
            id: id.into(),
            amount: amount.parse().unwrap(),
            date: date.parse().unwrap(),
            category_id: cat.into(),
            note: note.into(),
            user_id: user.into(),
        }
    }

    fn round_trip(t: &Transaction) -> Transaction {
        let headers = StringRecord::from(Transaction::HEADERS.to_vec());
        let columns = Columns::new(&headers);
        let values = StringRecord::from(t.encode().unwrap());
        Transaction::decode(&Row::new(&columns, &values)).unwrap()
    }

    proptest! {
        #[test]
        fn codec_round_trips(
            units in -10_000_000i64..10_000_000i64,
            scale in 0u32..4,
            days in 0i64..20_000,
            note in " {0,2}[a-z,\"]{1,8}( [a-z,\"]{1,8}){0,3} {0,2}",
        ) {
            prop_assume!(units != 0);
            let t = Transaction {
                id: crate::models::new_id(),
                amount: Decimal::new(units, scale),
                date: NaiveDate::from_ymd_opt(1970, 1, 1).unwrap() + chrono::Duration::days(days),
                category_id: "cat-1".into(),
                note,
                user_id: "u1".into(),
            };
            prop_assert_eq!(round_trip(&t), t);
        }
    }

    #[test]
    fn padded_note_survives_the_file() {
        let dir = tempdir().unwrap();
        let repo = TransactionRepository::open(dir.path()).unwrap();
        let t = tx("1", "-12.50", "2025-03-01", "food", "  indented note ", "u1");
        repo.save(&t).unwrap();
        assert_eq!(repo.find_by_id("1").unwrap(), Some(t));
    }

    #[test]
    fn finders_filter_by_user_and_range() {
        let dir = tempdir().unwrap();
        let repo = TransactionRepository::open(dir.path()).unwrap();
        repo.save_many(&[
            tx("1", "2000", "2025-03-01", "salary", "March pay", "u1"),
            tx("2", "-300", "2025-03-05", "food", "Groceries", "u1"),
            tx("3", "-150", "2025-03-20", "food", "dinner out", "u1"),
            tx("4", "-50", "2025-04-02", "transport", "Metro card", "u1"),
            tx("5", "-999", "2025-03-10", "food", "someone else", "u2"),
        ])
        .unwrap();

        let march = Month::new(2025, 3).unwrap();
        assert_eq!(repo.by_month(march, "u1").unwrap().len(), 3);
        assert_eq!(
            repo.by_month_and_category(march, "food", "u1").unwrap().len(),
            2
        );
        assert_eq!(
            repo.total_in_range(march.first_day(), march.last_day(), "u1")
                .unwrap(),
            Decimal::new(1550, 0)
        );
        assert_eq!(
            repo.net_expense_in_range(march.first_day(), march.last_day(), "u1")
                .unwrap(),
            Decimal::new(450, 0)
        );
        assert_eq!(repo.search_note("DINNER", "u1").unwrap()[0].id, "3");
        assert_eq!(
            repo.amount_between(Decimal::new(-300, 0), Decimal::new(-50, 0), "u1")
                .unwrap()
                .len(),
            3
        );
        assert_eq!(repo.amount_greater_than(Decimal::ZERO, "u1").unwrap().len(), 1);
        assert_eq!(repo.total_by_category("food", "u1").unwrap(), Decimal::new(-450, 0));
        assert!(repo.is_category_used("transport", "u1").unwrap());
        assert!(!repo.is_category_used("transport", "u2").unwrap());
    }
}
