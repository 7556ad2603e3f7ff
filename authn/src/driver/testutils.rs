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

//! Utilities to help testing services that integrate with the `authn` features.

use crate::db;
use crate::driver::{AuthnDriver, AuthnOptions};
use crate::model::{AccessToken, Password, User};
use snippets_core::clocks::testutils::{SettableClock, utc_datetime};
use snippets_core::db::{Db, Executor};
use snippets_core::model::Username;
use std::sync::Arc;

/// Password assigned to all users created via `TestContext::create_user`.
pub const TEST_PASSWORD: &str = "test0password";

/// State of a running test.
pub struct TestContext {
    /// The database backing the driver.
    db: Arc<dyn Db + Send + Sync>,

    /// The clock used by the driver, which tests can adjust at will.
    pub clock: Arc<SettableClock>,

    /// The driver to handle authentication flows.
    driver: AuthnDriver,
}

impl TestContext {
    /// Initializes the driver using an in-memory database and a settable clock.
    pub async fn setup(opts: AuthnOptions) -> Self {
        let db = Arc::new(snippets_core::db::sqlite::testutils::setup().await);
        let clock = Arc::new(SettableClock::new(utc_datetime(2023, 6, 1, 10, 0, 0)));
        Self::setup_with(opts, db, clock, "the-realm").await
    }

    /// Initializes the test context using the given already-initialized objects.
    pub async fn setup_with(
        opts: AuthnOptions,
        db: Arc<dyn Db + Send + Sync>,
        clock: Arc<SettableClock>,
        realm: &'static str,
    ) -> Self {
        db::init_schema(&mut db.ex().await.unwrap()).await.unwrap();
        let driver = AuthnDriver::new(db.clone(), clock.clone(), realm, opts);
        TestContext { db, clock, driver }
    }

    /// Syntactic sugar to create a user with the `TEST_PASSWORD` for testing purposes.
    pub async fn create_user(&self, username: Username) -> User {
        self.driver.clone().create_user(username, Password::from(TEST_PASSWORD)).await.unwrap()
    }

    /// Syntactic sugar to create and log a user in for testing purposes.
    pub async fn do_test_login(&self, username: Username) -> AccessToken {
        self.create_user(username.clone()).await;

        let session =
            self.driver.clone().login(username, Password::from(TEST_PASSWORD)).await.unwrap();
        session.take_access_token()
    }

    /// Gets access to the database used by this test context.
    pub fn db(&self) -> Arc<dyn Db + Send + Sync> {
        self.db.clone()
    }

    /// Gets a direct executor against the database.
    pub async fn ex(&self) -> Executor {
        self.db.ex().await.unwrap()
    }

    /// Gets a copy of the driver in this test context.
    pub fn driver(&self) -> AuthnDriver {
        self.driver.clone()
    }
}
