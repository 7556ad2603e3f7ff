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

//! Extends the driver with the `authenticate` method.

use crate::db;
use crate::driver::AuthnDriver;
use crate::model::{HashedPassword, Password, User};
use once_cell::sync::Lazy;
use snippets_core::db::{DbError, Executor};
use snippets_core::driver::{DriverError, DriverResult};
use snippets_core::model::Username;
use std::sync::Arc;

/// Message returned for any credentials mismatch, regardless of whether the account exists.
const BAD_CREDENTIALS: &str = "Invalid username or password";

/// Hash to verify passwords against when the account has no usable hash, so that every
/// rejected login costs the same.
static DUMMY_HASH: Lazy<Option<HashedPassword>> = Lazy::new(|| {
    Password::new("not a real password").ok()?.validate_and_hash(|_| None).ok()
});

impl AuthnDriver {
    /// Looks up `username` and checks that `password` matches their stored hash.
    pub(super) async fn check_credentials(
        &self,
        ex: &mut Executor,
        username: &Username,
        password: Password,
    ) -> DriverResult<User> {
        let user = match db::get_user_by_username(ex, username).await {
            Ok(user) => Some(user),
            Err(DbError::NotFound) => None,
            Err(e) => return Err(e.into()),
        };

        let hash = user.as_ref().and_then(|user| user.password()).or(DUMMY_HASH.as_ref());
        let matches = match hash {
            Some(hash) => password.verify(hash)?,
            None => false,
        };

        match user {
            Some(user) if matches && user.password().is_some() => Ok(user),
            _ => Err(DriverError::Unauthorized(BAD_CREDENTIALS.to_owned())),
        }
    }

    /// Validates the `username` and `password` pair provided with a single request and returns
    /// the matching user.
    ///
    /// Unlike `login`, this does not create a session nor record the login time.
    pub async fn authenticate(
        &self,
        username: &Username,
        password: Password,
    ) -> DriverResult<Arc<User>> {
        let mut ex = self.db.ex().await?;
        let user = self.check_credentials(&mut ex, username, password).await?;
        Ok(Arc::new(user))
    }
}
