// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::domain_repository;
use crate::error::StoreResult;
use crate::models::User;
use crate::store::codec::{encode_datetime, require_id, CodecResult, Record, Row};
use chrono::NaiveDateTime;

impl Record for User {
    const TABLE: &'static str = "users";
    const HEADERS: &'static [&'static str] = &[
        "id",
        "username",
        "email",
        "phone",
        "password",
        "resetCode",
        "resetTime",
    ];

    fn id(&self) -> &str {
        &self.id
    }

    fn encode(&self) -> CodecResult<Vec<String>> {
        Ok(vec![
            require_id(&self.id)?,
            self.username.clone(),
            self.email.clone(),
            self.phone.clone(),
            self.password.clone(),
            self.reset_code.clone().unwrap_or_default(),
            encode_datetime(self.reset_time),
        ])
    }

    fn decode(row: &Row<'_>) -> CodecResult<Self> {
        Ok(User {
            id: row.string("id")?,
            username: row.string("username")?,
            email: row.string("email")?,
            phone: row.string("phone")?,
            password: row.string("password")?,
            reset_code: row.optional_string("resetCode")?,
            reset_time: row.optional_datetime("resetTime")?,
        })
    }
}

domain_repository!(UserRepository, User);

impl UserRepository {
    pub fn by_username(&self, username: &str) -> StoreResult<Option<User>> {
        self.find_first(|u| u.username.eq_ignore_ascii_case(username))
    }

    pub fn by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.find_first(|u| u.email.eq_ignore_ascii_case(email))
    }

    pub fn by_phone(&self, phone: &str) -> StoreResult<Option<User>> {
        self.find_first(|u| u.phone == phone)
    }

    pub fn by_reset_code(&self, code: &str) -> StoreResult<Option<User>> {
        self.find_first(|u| u.reset_code.as_deref() == Some(code))
    }

    pub fn exists_by_username(&self, username: &str) -> StoreResult<bool> {
        Ok(self.by_username(username)?.is_some())
    }

    pub fn exists_by_email(&self, email: &str) -> StoreResult<bool> {
        Ok(self.by_email(email)?.is_some())
    }

    pub fn exists_by_phone(&self, phone: &str) -> StoreResult<bool> {
        Ok(self.by_phone(phone)?.is_some())
    }

    /// Username or email containing `keyword`, ignoring case.
    pub fn search(&self, keyword: &str) -> StoreResult<Vec<User>> {
        let needle = keyword.to_lowercase();
        self.find_where(|u| {
            u.username.to_lowercase().contains(&needle) || u.email.to_lowercase().contains(&needle)
        })
    }

    pub fn update_reset_info(
        &self,
        user_id: &str,
        code: &str,
        issued_at: NaiveDateTime,
    ) -> StoreResult<bool> {
        self.modify(user_id, |u| {
            u.reset_code = Some(code.to_string());
            u.reset_time = Some(issued_at);
        })
    }

    pub fn clear_reset_info(&self, user_id: &str) -> StoreResult<bool> {
        self.modify(user_id, |u| {
            u.reset_code = None;
            u.reset_time = None;
        })
    }

    /// Stores a new password digest and drops any pending reset.
    pub fn update_password(&self, user_id: &str, digest: &str) -> StoreResult<bool> {
        self.modify(user_id, |u| {
            u.password = digest.to_string();
            u.reset_code = None;
            u.reset_time = None;
        })
    }

    fn modify(&self, user_id: &str, change: impl FnOnce(&mut User)) -> StoreResult<bool> {
        let Some(mut user) = self.find_by_id(user_id)? else {
            return Ok(false);
        };
        change(&mut user);
        self.update(&user)
    }
}
