// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! One repository per entity: the row codec plus typed finders over a
//! [`Repository`](crate::store::Repository).

/// Implements `open` and `Deref` to the generic repository for a wrapper.
macro_rules! domain_repository {
    ($name:ident, $record:ty) => {
        #[derive(Debug, Clone)]
        pub struct $name {
            repo: $crate::store::Repository<$record>,
        }

        impl $name {
            pub fn open(dir: impl AsRef<std::path::Path>) -> $crate::error::StoreResult<Self> {
                Ok(Self {
                    repo: $crate::store::Repository::open(dir)?,
                })
            }
        }

        impl std::ops::Deref for $name {
            type Target = $crate::store::Repository<$record>;

            fn deref(&self) -> &Self::Target {
                &self.repo
            }
        }
    };
}

pub(crate) use domain_repository;

pub mod accounts;
pub mod budgets;
pub mod categories;
pub mod holidays;
pub mod thresholds;
pub mod transactions;
pub mod users;

pub use accounts::ThirdPartyRepository;
pub use budgets::BudgetRepository;
pub use categories::CategoryRepository;
pub use holidays::HolidayRepository;
pub use thresholds::ThresholdRepository;
pub use transactions::TransactionRepository;
pub use users::UserRepository;
