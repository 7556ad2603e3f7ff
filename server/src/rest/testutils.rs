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

use crate::driver::testutils::TestContext as DriverTestContext;
use crate::model::{Snippet, SnippetContent, SnippetId};
use crate::rest::{RestOptions, app};
use axum::Router;
use snippets_authn::model::{AccessToken, User};
use snippets_core::rest::BaseUrls;
use std::sync::Arc;

/// Base URL of the service during tests.
pub(crate) const BASE_URL: &str = "http://localhost:8000/";

/// State of a running test.
pub(crate) struct TestContext {
    /// Context of the business layer, used to prepare and inspect the database.
    driver: DriverTestContext,

    /// The application under test.
    app: Router,
}

impl TestContext {
    /// Initializes the application with the default options.
    pub(crate) async fn setup() -> Self {
        Self::setup_with(RestOptions::default()).await
    }

    /// Initializes the application with `opts`.
    pub(crate) async fn setup_with(opts: RestOptions) -> Self {
        let driver = DriverTestContext::setup().await;
        let base_urls = Arc::new(BaseUrls::from_strs(BASE_URL));
        let app = app(driver.driver(), base_urls, opts);
        Self { driver, app }
    }

    /// Gets a copy of the application router.
    pub(crate) fn app(&self) -> Router {
        self.app.clone()
    }

    /// Consumes the context and returns the application router.
    pub(crate) fn into_app(self) -> Router {
        self.app
    }

    /// Creates a user that can log in with the test password.
    pub(crate) async fn create_user(&self, username: &'static str) -> User {
        self.driver.create_user(username).await
    }

    /// Creates a user and logs them in, returning the session's access token.
    pub(crate) async fn do_test_login(&self, username: &'static str) -> AccessToken {
        self.driver.do_test_login(username).await
    }

    /// Creates a snippet owned by `owner` directly in the database.
    pub(crate) async fn create_snippet(&self, owner: &User, content: SnippetContent) -> SnippetId {
        self.driver.create_snippet(owner, content).await
    }

    /// Syntactic sugar to create a snippet with default values for everything but `code`.
    pub(crate) async fn create_code(&self, owner: &User, code: &str) -> SnippetId {
        self.driver.create_code(owner, code).await
    }

    /// Fetches the snippet `id` directly from the database.
    pub(crate) async fn get_snippet(&self, id: SnippetId) -> Snippet {
        self.driver.get_snippet(id).await
    }

    /// Returns true if the snippet `id` exists in the database.
    pub(crate) async fn snippet_exists(&self, id: SnippetId) -> bool {
        self.driver.snippet_exists(id).await
    }

    /// Gets the user named `username` from the database after logging in.
    pub(crate) async fn get_user(&self, username: &'static str) -> User {
        let mut ex = self.driver.ex().await;
        snippets_authn::db::get_user_by_username(&mut ex, &username.into()).await.unwrap()
    }
}
