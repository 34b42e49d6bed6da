// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::domain_repository;
use crate::error::StoreResult;
use crate::models::{Service, ThirdPartyAccount};
use crate::store::codec::{require_id, CodecResult, Record, Row};

impl Record for ThirdPartyAccount {
    const TABLE: &'static str = "third_parties";
    const HEADERS: &'static [&'static str] = &[
        "id",
        "serviceName",
        "serviceUsername",
        "servicePassword",
        "userId",
    ];

    fn id(&self) -> &str {
        &self.id
    }

    fn encode(&self) -> CodecResult<Vec<String>> {
        Ok(vec![
            require_id(&self.id)?,
            self.service.to_string(),
            self.service_username.clone(),
            self.service_password.clone(),
            self.user_id.clone(),
        ])
    }

    fn decode(row: &Row<'_>) -> CodecResult<Self> {
        Ok(ThirdPartyAccount {
            id: row.string("id")?,
            service: row.service("serviceName")?,
            service_username: row.string("serviceUsername")?,
            service_password: row.string("servicePassword")?,
            user_id: row.string("userId")?,
        })
    }
}

domain_repository!(ThirdPartyRepository, ThirdPartyAccount);

impl ThirdPartyRepository {
    pub fn by_user(&self, user_id: &str) -> StoreResult<Vec<ThirdPartyAccount>> {
        self.find_where(|a| a.user_id == user_id)
    }

    pub fn by_service(
        &self,
        service: Service,
        user_id: &str,
    ) -> StoreResult<Option<ThirdPartyAccount>> {
        self.find_first(|a| a.service == service && a.user_id == user_id)
    }

    pub fn exists_by_service(&self, service: Service, user_id: &str) -> StoreResult<bool> {
        Ok(self.by_service(service, user_id)?.is_some())
    }

    pub fn by_service_username(
        &self,
        service: Service,
        username: &str,
    ) -> StoreResult<Option<ThirdPartyAccount>> {
        self.find_first(|a| a.service == service && a.service_username == username)
    }

    /// The linked account whose stored credentials match exactly.
    pub fn find_credentials(
        &self,
        service: Service,
        username: &str,
        password: &str,
    ) -> StoreResult<Option<ThirdPartyAccount>> {
        self.find_first(|a| {
            a.service == service && a.service_username == username && a.service_password == password
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn service_column_round_trips_and_credentials_match() {
        let dir = tempdir().unwrap();
        let repo = ThirdPartyRepository::open(dir.path()).unwrap();
        let acct = ThirdPartyAccount {
            id: "a1".into(),
            service: Service::WeChat,
            service_username: "wx_alice".into(),
            service_password: "s3cret".into(),
            user_id: "u1".into(),
        };
        repo.save(&acct).unwrap();

        let text = std::fs::read_to_string(repo.path()).unwrap();
        assert!(text.contains("a1,WeChat,wx_alice,s3cret,u1"));

        assert!(repo.exists_by_service(Service::WeChat, "u1").unwrap());
        assert!(!repo.exists_by_service(Service::Qq, "u1").unwrap());
        assert_eq!(
            repo.find_credentials(Service::WeChat, "wx_alice", "s3cret")
                .unwrap(),
            Some(acct)
        );
        assert!(repo
            .find_credentials(Service::WeChat, "wx_alice", "wrong")
            .unwrap()
            .is_none());
    }
}
