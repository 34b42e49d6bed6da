// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Validated add/update/delete flows over the repositories.
//!
//! Every call that touches user data takes the [`Session`] it acts for and
//! only sees records owned by that user. Records of another user behave as
//! if they did not exist.

use crate::config::Config;
use crate::error::LedgerResult;
use crate::models::{
    new_id, AbnormalThreshold, Budget, Category, Holiday, Month, Service, ThirdPartyAccount,
    Transaction, User,
};
use crate::reports::{self, AbnormalExpense};
use crate::repos::budgets::Upsert;
use crate::repos::{
    BudgetRepository, CategoryRepository, HolidayRepository, ThirdPartyRepository,
    ThresholdRepository, TransactionRepository, UserRepository,
};
use crate::session::Session;
use crate::validate::{self, ValidationError};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::{info, warn};

pub const DEFAULT_CATEGORIES: [&str; 14] = [
    "Food",
    "Housing",
    "Transportation",
    "Entertainment",
    "Shopping",
    "Healthcare",
    "Education",
    "Utilities",
    "Travel",
    "Investment",
    "Gifts",
    "Salary",
    "Savings",
    "Insurance",
];

/// How long a password reset code stays valid.
pub const RESET_CODE_TTL_MINUTES: i64 = 15;

pub fn password_digest(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub amount: Decimal,
    pub date: NaiveDate,
    pub category_id: String,
    pub note: String,
}

#[derive(Debug, Clone)]
pub struct Ledger {
    users: UserRepository,
    categories: CategoryRepository,
    transactions: TransactionRepository,
    budgets: BudgetRepository,
    holidays: HolidayRepository,
    accounts: ThirdPartyRepository,
    thresholds: ThresholdRepository,
}

fn not_found(kind: &'static str, id: &str) -> ValidationError {
    ValidationError::NotFound {
        kind,
        id: id.to_string(),
    }
}

impl Ledger {
    pub fn open(config: &Config) -> LedgerResult<Self> {
        Self::open_dir(&config.data_dir)
    }

    pub fn open_dir(dir: impl AsRef<Path>) -> LedgerResult<Self> {
        let dir = dir.as_ref();
        Ok(Self {
            users: UserRepository::open(dir)?,
            categories: CategoryRepository::open(dir)?,
            transactions: TransactionRepository::open(dir)?,
            budgets: BudgetRepository::open(dir)?,
            holidays: HolidayRepository::open(dir)?,
            accounts: ThirdPartyRepository::open(dir)?,
            thresholds: ThresholdRepository::open(dir)?,
        })
    }

    pub fn users(&self) -> &UserRepository {
        &self.users
    }

    pub fn categories(&self) -> &CategoryRepository {
        &self.categories
    }

    pub fn transactions(&self) -> &TransactionRepository {
        &self.transactions
    }

    pub fn budgets(&self) -> &BudgetRepository {
        &self.budgets
    }

    pub fn holidays(&self) -> &HolidayRepository {
        &self.holidays
    }

    pub fn accounts(&self) -> &ThirdPartyRepository {
        &self.accounts
    }

    pub fn thresholds(&self) -> &ThresholdRepository {
        &self.thresholds
    }

    // ---- accounts and login ----

    /// Creates the user and seeds the default categories.
    pub fn register(&self, new: &NewUser<'_>) -> LedgerResult<User> {
        let username = new.username.trim();
        let email = new.email.trim();
        let phone = new.phone.trim();
        validate::username(username)?;
        validate::email(email)?;
        validate::phone(phone)?;
        validate::password(new.password)?;

        if self.users.exists_by_username(username)? {
            return Err(ValidationError::UsernameTaken.into());
        }
        if self.users.exists_by_email(email)? {
            return Err(ValidationError::EmailTaken.into());
        }
        if self.users.exists_by_phone(phone)? {
            return Err(ValidationError::PhoneTaken.into());
        }

        let user = User {
            id: new_id(),
            username: username.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            password: password_digest(new.password),
            reset_code: None,
            reset_time: None,
        };
        self.users.save(&user)?;

        let defaults: Vec<Category> = DEFAULT_CATEGORIES
            .iter()
            .map(|name| Category {
                id: new_id(),
                name: name.to_string(),
                user_id: user.id.clone(),
            })
            .collect();
        self.categories.save_many(&defaults)?;
        info!(user = %user.username, "registered user");
        Ok(user)
    }

    /// Username, email or phone number, tried in that order.
    pub fn find_user(&self, identifier: &str) -> LedgerResult<Option<User>> {
        let identifier = identifier.trim();
        if let Some(u) = self.users.by_username(identifier)? {
            return Ok(Some(u));
        }
        if let Some(u) = self.users.by_email(identifier)? {
            return Ok(Some(u));
        }
        Ok(self.users.by_phone(identifier)?)
    }

    pub fn login(&self, identifier: &str, password: &str) -> LedgerResult<Session> {
        match self.find_user(identifier)? {
            Some(user) if user.password == password_digest(password) => {
                info!(user = %user.username, "login");
                Ok(Session::new(&user))
            }
            _ => {
                warn!(identifier, "login rejected");
                Err(ValidationError::BadCredentials.into())
            }
        }
    }

    pub fn login_third_party(
        &self,
        service: &str,
        username: &str,
        password: &str,
    ) -> LedgerResult<Session> {
        let service = validate::service(service)?;
        let username = validate::required("Third-party username", username)?;
        validate::required("Third-party password", password)?;
        let Some(link) = self.accounts.find_credentials(service, username, password)? else {
            warn!(%service, username, "third-party login rejected");
            return Err(ValidationError::BadCredentials.into());
        };
        let user = self
            .users
            .find_by_id(&link.user_id)?
            .ok_or_else(|| not_found("User", &link.user_id))?;
        info!(user = %user.username, %service, "third-party login");
        Ok(Session::new(&user))
    }

    /// Links one account per service to the session's user.
    pub fn link_account(
        &self,
        session: &Session,
        service: &str,
        username: &str,
        password: &str,
    ) -> LedgerResult<ThirdPartyAccount> {
        let service = validate::service(service)?;
        let username = validate::required("Third-party username", username)?;
        validate::required("Third-party password", password)?;
        if self.accounts.exists_by_service(service, session.user_id())? {
            return Err(ValidationError::ServiceAlreadyLinked(service).into());
        }
        let account = ThirdPartyAccount {
            id: new_id(),
            service,
            service_username: username.to_string(),
            service_password: password.to_string(),
            user_id: session.user_id().to_string(),
        };
        self.accounts.save(&account)?;
        Ok(account)
    }

    pub fn linked_accounts(&self, session: &Session) -> LedgerResult<Vec<ThirdPartyAccount>> {
        Ok(self.accounts.by_user(session.user_id())?)
    }

    pub fn unlink_account(&self, session: &Session, service: Service) -> LedgerResult<bool> {
        match self.accounts.by_service(service, session.user_id())? {
            Some(a) => Ok(self.accounts.delete_by_id(&a.id)?),
            None => Ok(false),
        }
    }

    /// Issues a six-digit reset code for the user behind `identifier`.
    pub fn request_password_reset(
        &self,
        identifier: &str,
        now: NaiveDateTime,
    ) -> LedgerResult<String> {
        let user = self
            .find_user(identifier)?
            .ok_or_else(|| not_found("User", identifier))?;
        let code = format!("{:06}", uuid::Uuid::new_v4().as_u128() % 1_000_000);
        self.users.update_reset_info(&user.id, &code, now)?;
        info!(user = %user.username, "issued password reset code");
        Ok(code)
    }

    pub fn reset_password(
        &self,
        code: &str,
        new_password: &str,
        now: NaiveDateTime,
    ) -> LedgerResult<()> {
        validate::password(new_password)?;
        let user = self
            .users
            .by_reset_code(code.trim())?
            .ok_or(ValidationError::InvalidResetCode)?;
        let fresh = user
            .reset_time
            .is_some_and(|issued| now >= issued && now - issued <= TimeDelta::minutes(RESET_CODE_TTL_MINUTES));
        if !fresh {
            self.users.clear_reset_info(&user.id)?;
            return Err(ValidationError::InvalidResetCode.into());
        }
        self.users
            .update_password(&user.id, &password_digest(new_password))?;
        info!(user = %user.username, "password reset");
        Ok(())
    }

    // ---- categories ----

    pub fn list_categories(&self, session: &Session) -> LedgerResult<Vec<Category>> {
        Ok(self.categories.by_user(session.user_id())?)
    }

    /// The session user's category with this id or (case-insensitive) name.
    pub fn resolve_category(&self, session: &Session, key: &str) -> LedgerResult<Category> {
        let key = key.trim();
        if let Some(c) = self.categories.find_by_id(key)? {
            if session.owns(&c.user_id) {
                return Ok(c);
            }
        }
        self.categories
            .by_name(key, session.user_id())?
            .ok_or_else(|| ValidationError::UnknownCategory(key.to_string()).into())
    }

    pub fn add_category(&self, session: &Session, name: &str) -> LedgerResult<Category> {
        let name = name.trim();
        validate::category_name(name)?;
        if self.categories.exists_by_name(name, session.user_id())? {
            return Err(ValidationError::CategoryExists(name.to_string()).into());
        }
        let category = Category {
            id: new_id(),
            name: name.to_string(),
            user_id: session.user_id().to_string(),
        };
        self.categories.save(&category)?;
        Ok(category)
    }

    pub fn rename_category(&self, session: &Session, id: &str, name: &str) -> LedgerResult<Category> {
        let name = name.trim();
        validate::category_name(name)?;
        let mut category = self.owned_category(session, id)?;
        if let Some(other) = self.categories.by_name(name, session.user_id())? {
            if other.id != category.id {
                return Err(ValidationError::CategoryExists(name.to_string()).into());
            }
        }
        category.name = name.to_string();
        self.categories.update(&category)?;
        Ok(category)
    }

    /// Refuses while any of the user's transactions still use the category.
    pub fn delete_category(&self, session: &Session, id: &str) -> LedgerResult<bool> {
        let Some(category) = self
            .categories
            .find_by_id(id)?
            .filter(|c| session.owns(&c.user_id))
        else {
            return Ok(false);
        };
        if self
            .transactions
            .is_category_used(&category.id, session.user_id())?
        {
            return Err(ValidationError::CategoryInUse(category.name).into());
        }
        Ok(self.categories.delete_by_id(&category.id)?)
    }

    fn owned_category(&self, session: &Session, id: &str) -> LedgerResult<Category> {
        self.categories
            .find_by_id(id)?
            .filter(|c| session.owns(&c.user_id))
            .ok_or_else(|| not_found("Category", id).into())
    }

    // ---- transactions ----

    pub fn list_transactions(&self, session: &Session) -> LedgerResult<Vec<Transaction>> {
        Ok(self.transactions.by_user(session.user_id())?)
    }

    fn check_transaction(&self, session: &Session, amount: Decimal, category_id: &str, note: &str) -> LedgerResult<()> {
        validate::nonzero(amount)?;
        validate::note(note)?;
        self.owned_category(session, category_id)
            .map_err(|_| ValidationError::UnknownCategory(category_id.to_string()))?;
        Ok(())
    }

    pub fn add_transaction(&self, session: &Session, new: NewTransaction) -> LedgerResult<Transaction> {
        let note = new.note.trim().to_string();
        self.check_transaction(session, new.amount, &new.category_id, &note)?;
        let tx = Transaction {
            id: new_id(),
            amount: new.amount,
            date: new.date,
            category_id: new.category_id,
            note,
            user_id: session.user_id().to_string(),
        };
        self.transactions.save(&tx)?;
        Ok(tx)
    }

    /// Replaces amount, date, category and note of an owned transaction.
    pub fn update_transaction(&self, session: &Session, tx: &Transaction) -> LedgerResult<Transaction> {
        let stored = self.owned_transaction(session, &tx.id)?;
        let note = tx.note.trim().to_string();
        self.check_transaction(session, tx.amount, &tx.category_id, &note)?;
        let updated = Transaction {
            user_id: stored.user_id,
            note,
            ..tx.clone()
        };
        self.transactions.update(&updated)?;
        Ok(updated)
    }

    pub fn delete_transaction(&self, session: &Session, id: &str) -> LedgerResult<bool> {
        if self.owned_transaction(session, id).is_err() {
            return Ok(false);
        }
        Ok(self.transactions.delete_by_id(id)?)
    }

    pub fn owned_transaction(&self, session: &Session, id: &str) -> LedgerResult<Transaction> {
        self.transactions
            .find_by_id(id)?
            .filter(|t| session.owns(&t.user_id))
            .ok_or_else(|| not_found("Transaction", id).into())
    }

    // ---- budgets ----

    /// Sets the month's total budget (`category_id` = None) or a category
    /// budget, replacing the amount if that slot already has one.
    pub fn set_budget(
        &self,
        session: &Session,
        month: Month,
        category_id: Option<&str>,
        amount: Decimal,
    ) -> LedgerResult<Upsert> {
        validate::positive("Budget", amount)?;
        if let Some(cat) = category_id {
            self.owned_category(session, cat)
                .map_err(|_| ValidationError::UnknownCategory(cat.to_string()))?;
        }
        let budget = Budget {
            id: new_id(),
            month,
            category_id: category_id.map(str::to_string),
            amount,
            user_id: session.user_id().to_string(),
        };
        Ok(self.budgets.save_or_update(&budget)?)
    }

    pub fn list_budgets(&self, session: &Session, month: Option<Month>) -> LedgerResult<Vec<Budget>> {
        Ok(match month {
            Some(m) => self.budgets.by_month(m, session.user_id())?,
            None => self.budgets.by_user(session.user_id())?,
        })
    }

    pub fn delete_budget(&self, session: &Session, id: &str) -> LedgerResult<bool> {
        match self.budgets.find_by_id(id)? {
            Some(b) if session.owns(&b.user_id) => Ok(self.budgets.delete_by_id(id)?),
            _ => Ok(false),
        }
    }

    pub fn budget_status(&self, session: &Session, month: Month) -> LedgerResult<Vec<reports::BudgetProgress>> {
        let budgets = self.budgets.by_month(month, session.user_id())?;
        let transactions = self.transactions.by_month(month, session.user_id())?;
        Ok(reports::month_progress(&budgets, &transactions, month))
    }

    // ---- holidays ----

    pub fn list_holidays(&self, session: &Session) -> LedgerResult<Vec<Holiday>> {
        Ok(self.holidays.by_user(session.user_id())?)
    }

    pub fn add_holiday(
        &self,
        session: &Session,
        name: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> LedgerResult<Holiday> {
        let name = name.trim();
        validate::holiday_name(name)?;
        validate::holiday_range(start, end)?;
        if self.holidays.exists_by_name(name, session.user_id())? {
            return Err(ValidationError::HolidayExists(name.to_string()).into());
        }
        let holiday = Holiday {
            id: new_id(),
            name: name.to_string(),
            start_date: start,
            end_date: end,
            user_id: session.user_id().to_string(),
        };
        self.holidays.save(&holiday)?;
        Ok(holiday)
    }

    pub fn resolve_holiday(&self, session: &Session, key: &str) -> LedgerResult<Holiday> {
        if let Some(h) = self.holidays.find_by_id(key)? {
            if session.owns(&h.user_id) {
                return Ok(h);
            }
        }
        self.holidays
            .by_name(key, session.user_id())?
            .ok_or_else(|| not_found("Holiday", key).into())
    }

    pub fn delete_holiday(&self, session: &Session, id: &str) -> LedgerResult<bool> {
        match self.holidays.find_by_id(id)? {
            Some(h) if session.owns(&h.user_id) => Ok(self.holidays.delete_by_id(id)?),
            _ => Ok(false),
        }
    }

    // ---- abnormal-expense thresholds ----

    pub fn list_thresholds(&self, session: &Session) -> LedgerResult<Vec<AbnormalThreshold>> {
        Ok(self.thresholds.by_user(session.user_id())?)
    }

    /// Adds a threshold or changes the one already set for `item`.
    pub fn set_threshold(
        &self,
        session: &Session,
        item: &str,
        threshold: Decimal,
    ) -> LedgerResult<AbnormalThreshold> {
        let item = item.trim();
        validate::item_name(item)?;
        validate::positive("Threshold", threshold)?;
        if let Some(mut existing) = self.thresholds.by_item_name(item, session.user_id())? {
            existing.threshold = threshold;
            self.thresholds.update(&existing)?;
            return Ok(existing);
        }
        let config = AbnormalThreshold {
            id: new_id(),
            item_name: item.to_string(),
            threshold,
            user_id: session.user_id().to_string(),
        };
        self.thresholds.save(&config)?;
        Ok(config)
    }

    pub fn delete_threshold(&self, session: &Session, item: &str) -> LedgerResult<bool> {
        match self.thresholds.by_item_name(item.trim(), session.user_id())? {
            Some(t) => Ok(self.thresholds.delete_by_id(&t.id)?),
            None => Ok(false),
        }
    }

    pub fn abnormal_expenses(&self, session: &Session) -> LedgerResult<Vec<AbnormalExpense>> {
        let transactions = self.transactions.by_user(session.user_id())?;
        let categories = self.categories.by_user(session.user_id())?;
        let thresholds = self.thresholds.by_user(session.user_id())?;
        Ok(reports::abnormal_expenses(&transactions, &categories, &thresholds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;
    use tempfile::tempdir;

    fn register(ledger: &Ledger, name: &str, phone: &str) -> User {
        ledger
            .register(&NewUser {
                username: name,
                email: &format!("{}@example.com", name),
                phone,
                password: "s3cret#pw",
            })
            .unwrap()
    }

    fn validation(err: LedgerError) -> ValidationError {
        match err {
            LedgerError::Validation(v) => v,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn register_seeds_categories_and_stores_digest() {
        let dir = tempdir().unwrap();
        let ledger = Ledger::open_dir(dir.path()).unwrap();
        let user = register(&ledger, "alice01", "13800000001");
        assert_eq!(user.password, password_digest("s3cret#pw"));
        assert_ne!(user.password, "s3cret#pw");

        let session = ledger.login("alice01@example.com", "s3cret#pw").unwrap();
        let names: Vec<String> = ledger
            .list_categories(&session)
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, DEFAULT_CATEGORIES);
    }

    #[test]
    fn duplicates_and_bad_credentials_are_rejected() {
        let dir = tempdir().unwrap();
        let ledger = Ledger::open_dir(dir.path()).unwrap();
        register(&ledger, "alice01", "13800000001");
        let err = ledger
            .register(&NewUser {
                username: "ALICE01",
                email: "other@example.com",
                phone: "13800000002",
                password: "s3cret#pw",
            })
            .unwrap_err();
        assert_eq!(validation(err), ValidationError::UsernameTaken);

        let err = ledger.login("13800000001", "wrong-pass").unwrap_err();
        assert_eq!(validation(err), ValidationError::BadCredentials);
        assert!(ledger.login("13800000001", "s3cret#pw").is_ok());
    }

    #[test]
    fn category_in_use_cannot_be_deleted() {
        let dir = tempdir().unwrap();
        let ledger = Ledger::open_dir(dir.path()).unwrap();
        register(&ledger, "alice01", "13800000001");
        let session = ledger.login("alice01", "s3cret#pw").unwrap();
        let food = ledger.resolve_category(&session, "food").unwrap();
        ledger
            .add_transaction(
                &session,
                NewTransaction {
                    amount: Decimal::new(-300, 0),
                    date: "2025-03-05".parse().unwrap(),
                    category_id: food.id.clone(),
                    note: "Groceries".into(),
                },
            )
            .unwrap();

        let err = ledger.delete_category(&session, &food.id).unwrap_err();
        assert_eq!(validation(err), ValidationError::CategoryInUse("Food".into()));

        let gifts = ledger.resolve_category(&session, "Gifts").unwrap();
        assert!(ledger.delete_category(&session, &gifts.id).unwrap());
    }

    #[test]
    fn notes_are_trimmed_on_add_and_update() {
        let dir = tempdir().unwrap();
        let ledger = Ledger::open_dir(dir.path()).unwrap();
        register(&ledger, "alice01", "13800000001");
        let session = ledger.login("alice01", "s3cret#pw").unwrap();
        let food = ledger.resolve_category(&session, "food").unwrap();
        let mut tx = ledger
            .add_transaction(
                &session,
                NewTransaction {
                    amount: Decimal::new(-300, 0),
                    date: "2025-03-05".parse().unwrap(),
                    category_id: food.id.clone(),
                    note: "  Groceries ".into(),
                },
            )
            .unwrap();
        assert_eq!(tx.note, "Groceries");

        tx.note = " weekly shop  ".into();
        let updated = ledger.update_transaction(&session, &tx).unwrap();
        assert_eq!(updated.note, "weekly shop");
        assert_eq!(ledger.owned_transaction(&session, &tx.id).unwrap().note, "weekly shop");
    }

    #[test]
    fn records_of_other_users_are_invisible() {
        let dir = tempdir().unwrap();
        let ledger = Ledger::open_dir(dir.path()).unwrap();
        register(&ledger, "alice01", "13800000001");
        register(&ledger, "bob0002", "13800000002");
        let alice = ledger.login("alice01", "s3cret#pw").unwrap();
        let bob = ledger.login("bob0002", "s3cret#pw").unwrap();

        let cat = ledger.resolve_category(&alice, "Travel").unwrap();
        let tx = ledger
            .add_transaction(
                &alice,
                NewTransaction {
                    amount: Decimal::new(-90, 0),
                    date: "2025-05-01".parse().unwrap(),
                    category_id: cat.id.clone(),
                    note: String::new(),
                },
            )
            .unwrap();

        assert!(!ledger.delete_transaction(&bob, &tx.id).unwrap());
        assert!(ledger.list_transactions(&bob).unwrap().is_empty());
        // bob cannot book against alice's category either
        let err = ledger
            .add_transaction(
                &bob,
                NewTransaction {
                    amount: Decimal::ONE,
                    date: "2025-05-01".parse().unwrap(),
                    category_id: cat.id,
                    note: String::new(),
                },
            )
            .unwrap_err();
        assert!(matches!(validation(err), ValidationError::UnknownCategory(_)));
        assert!(ledger.delete_transaction(&alice, &tx.id).unwrap());
    }

    #[test]
    fn third_party_link_and_login() {
        let dir = tempdir().unwrap();
        let ledger = Ledger::open_dir(dir.path()).unwrap();
        register(&ledger, "alice01", "13800000001");
        let session = ledger.login("alice01", "s3cret#pw").unwrap();
        ledger
            .link_account(&session, "wechat", "wx_alice", "wxpass")
            .unwrap();
        let err = ledger
            .link_account(&session, "WeChat", "wx_other", "x")
            .unwrap_err();
        assert_eq!(
            validation(err),
            ValidationError::ServiceAlreadyLinked(Service::WeChat)
        );

        let via_wechat = ledger
            .login_third_party("WECHAT", "wx_alice", "wxpass")
            .unwrap();
        assert_eq!(via_wechat, session);
        assert!(ledger.login_third_party("QQ", "wx_alice", "wxpass").is_err());
        assert!(ledger.unlink_account(&session, Service::WeChat).unwrap());
    }

    #[test]
    fn password_reset_code_expires() {
        let dir = tempdir().unwrap();
        let ledger = Ledger::open_dir(dir.path()).unwrap();
        register(&ledger, "alice01", "13800000001");
        let issued = NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();

        let code = ledger.request_password_reset("alice01", issued).unwrap();
        assert_eq!(code.len(), 6);
        let late = issued + TimeDelta::minutes(16);
        assert!(ledger.reset_password(&code, "n3wpass=ok", late).is_err());

        let code = ledger.request_password_reset("alice01", issued).unwrap();
        ledger
            .reset_password(&code, "n3w=passok", issued + TimeDelta::minutes(5))
            .unwrap();
        assert!(ledger.login("alice01", "n3w=passok").is_ok());
        assert!(ledger.login("alice01", "s3cret#pw").is_err());
    }

    #[test]
    fn thresholds_upsert_by_item() {
        let dir = tempdir().unwrap();
        let ledger = Ledger::open_dir(dir.path()).unwrap();
        register(&ledger, "alice01", "13800000001");
        let session = ledger.login("alice01", "s3cret#pw").unwrap();
        let first = ledger
            .set_threshold(&session, "Food", Decimal::new(200, 0))
            .unwrap();
        let second = ledger
            .set_threshold(&session, "food", Decimal::new(250, 0))
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(ledger.list_thresholds(&session).unwrap().len(), 1);

        let food = ledger.resolve_category(&session, "Food").unwrap();
        ledger
            .add_transaction(
                &session,
                NewTransaction {
                    amount: Decimal::new(-300, 0),
                    date: "2025-03-05".parse().unwrap(),
                    category_id: food.id,
                    note: "Banquet".into(),
                },
            )
            .unwrap();
        assert_eq!(ledger.abnormal_expenses(&session).unwrap().len(), 1);
    }
}
