// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::User;
use serde::Serialize;

/// The logged-in user. Created by a successful login and passed to every
/// call that reads or writes that user's records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    user_id: String,
    username: String,
}

impl Session {
    pub fn new(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            username: user.username.clone(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn owns(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}
