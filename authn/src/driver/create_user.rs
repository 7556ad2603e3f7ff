// Snippets
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Extends the driver with the `create_user` method.

use crate::db;
use crate::driver::AuthnDriver;
use crate::model::{Password, User};
use log::info;
use snippets_core::db::DbError;
use snippets_core::driver::{DriverError, DriverResult};
use snippets_core::model::Username;

/// Minimum number of characters in a password.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Checks that `password` is acceptable and returns a description of the problem if it is not.
fn password_validator(password: &str) -> Option<&'static str> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Some("This password is too short. It must contain at least 8 characters.");
    }
    if password.chars().all(|ch| ch.is_ascii_digit()) {
        return Some("This password is entirely numeric.");
    }
    None
}

impl AuthnDriver {
    /// Provisions a new account for `username` with the given `password`.
    pub async fn create_user(self, username: Username, password: Password) -> DriverResult<User> {
        let password = password.validate_and_hash(password_validator)?;

        let mut tx = self.db.begin().await?;
        let user = match db::create_user(tx.ex(), username.clone(), Some(password)).await {
            Ok(user) => user,
            Err(DbError::AlreadyExists) => {
                return Err(DriverError::AlreadyExists(format!(
                    "User {} already exists",
                    username
                )));
            }
            Err(e) => return Err(e.into()),
        };
        tx.commit().await?;

        info!("Created user {} with id {}", user.username(), user.id());
        Ok(user)
    }
}
