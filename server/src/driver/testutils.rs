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

//! Test utilities for the business layer.

use crate::db;
use crate::driver::Driver;
use crate::model::{Snippet, SnippetContent, SnippetId};
use snippets_authn::driver::AuthnOptions;
use snippets_authn::driver::testutils::TestContext as AuthnTestContext;
use snippets_authn::model::{AccessToken, User};
use snippets_core::clocks::Clock;
use snippets_core::clocks::testutils::{SettableClock, utc_datetime};
use snippets_core::db::{Db, Executor};
use snippets_core::model::Username;
use std::sync::Arc;
use std::time::Duration;

/// Realm used by all tests.
pub(crate) const TEST_REALM: &str = "the-realm";

/// State of a running test.
pub(crate) struct TestContext {
    /// Context of the authentication layer, sharing the database and clock with the driver.
    authn: AuthnTestContext,

    /// The driver under test.
    driver: Driver,
}

impl TestContext {
    /// Initializes the driver using an in-memory database and a settable clock.
    pub(crate) async fn setup() -> Self {
        let _can_fail = env_logger::builder().is_test(true).try_init();

        let db: Arc<dyn Db + Send + Sync> =
            Arc::new(snippets_core::db::sqlite::testutils::setup().await);
        db::init_schema(&mut db.ex().await.unwrap()).await.unwrap();
        let clock = Arc::new(SettableClock::new(utc_datetime(2023, 6, 1, 10, 0, 0)));

        let opts = AuthnOptions::default();
        let authn = AuthnTestContext::setup_with(opts, db.clone(), clock.clone(), TEST_REALM).await;
        let driver = Driver::new(db, clock, authn.driver());
        Self { authn, driver }
    }

    /// Gets a direct executor against the database.
    pub(crate) async fn ex(&self) -> Executor {
        self.authn.ex().await
    }

    /// Gets a copy of the driver in this test context.
    pub(crate) fn driver(&self) -> Driver {
        self.driver.clone()
    }

    /// Advances the test clock by `delta`.
    pub(crate) fn advance_clock(&self, delta: Duration) {
        self.authn.clock.advance(delta);
    }

    /// Creates a user that can log in with the test password.
    pub(crate) async fn create_user(&self, username: &'static str) -> User {
        self.authn.create_user(Username::from(username)).await
    }

    /// Creates a user and logs them in, returning the session's access token.
    pub(crate) async fn do_test_login(&self, username: &'static str) -> AccessToken {
        self.authn.do_test_login(Username::from(username)).await
    }

    /// Creates a snippet owned by `owner` directly in the database.
    ///
    /// The stored `highlighted` document is fake so that tests can tell it apart.
    pub(crate) async fn create_snippet(&self, owner: &User, content: SnippetContent) -> SnippetId {
        let now = self.authn.clock.now_utc();
        let highlighted = format!("<fake>{}</fake>", content.code());
        db::create_snippet(&mut self.ex().await, owner.id(), now, &content, &highlighted)
            .await
            .unwrap()
    }

    /// Syntactic sugar to create a snippet with default values for everything but `code`.
    pub(crate) async fn create_code(&self, owner: &User, code: &str) -> SnippetId {
        let mut content = SnippetContent::default();
        content.set_code(code.to_owned());
        self.create_snippet(owner, content).await
    }

    /// Fetches the snippet `id` directly from the database.
    pub(crate) async fn get_snippet(&self, id: SnippetId) -> Snippet {
        db::get_snippet(&mut self.ex().await, id).await.unwrap()
    }

    /// Returns true if the snippet `id` exists in the database.
    pub(crate) async fn snippet_exists(&self, id: SnippetId) -> bool {
        db::get_snippet(&mut self.ex().await, id).await.is_ok()
    }
}
