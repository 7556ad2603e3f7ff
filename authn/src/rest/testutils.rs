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

//! Test utilities for the REST API.

use crate::db;
use crate::driver::AuthnOptions;
use crate::driver::testutils::TestContext as DriverTestContext;
use crate::model::AccessToken;
use crate::rest::app;
use axum::Router;
use snippets_core::db::DbError;
use snippets_core::model::Username;

/// State of a running test.
pub(crate) struct TestContext {
    /// Test context for the driver backing the app.
    driver: DriverTestContext,

    /// The app under test, mounted where services are expected to mount it.
    app: Router,
}

impl TestContext {
    /// Initializes the REST app using an in-memory datastore with default options.
    pub(crate) async fn setup() -> Self {
        let driver = DriverTestContext::setup(AuthnOptions::default()).await;
        let app = Router::new().nest("/api-auth", app(driver.driver()));
        Self { driver, app }
    }

    /// Gets a copy of the app router.
    pub(crate) fn app(&self) -> Router {
        self.app.clone()
    }

    /// Consumes the context and returns the app router.
    pub(crate) fn into_app(self) -> Router {
        self.app
    }

    /// Creates a user with the test password.
    pub(crate) async fn create_user(&self, username: &'static str) {
        self.driver.create_user(Username::from(username)).await;
    }

    /// Creates a user and logs it in, returning the access token of the new session.
    pub(crate) async fn do_test_login(&self, username: &'static str) -> AccessToken {
        self.driver.do_test_login(Username::from(username)).await
    }

    /// Checks if a session identified by `token` is active.
    pub(crate) async fn session_exists(&self, token: &AccessToken) -> bool {
        match db::get_session(&mut self.driver.ex().await, token).await {
            Ok(session) => session.logout_time().is_none(),
            Err(DbError::NotFound) => false,
            Err(e) => panic!("{:?}", e),
        }
    }
}
