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

//! Entry point to the REST server.
//!
//! Every resource lives under a canonical path that ends in a slash.  Requests are rewritten
//! before routing to strip format suffixes and to add missing trailing slashes, so the route
//! table below only lists canonical paths.

use crate::driver::Driver;
use crate::model::SnippetId;
use axum::Router;
use axum::http::header::ALLOW;
use axum::http::{Method, StatusCode};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use snippets_authn::model::UserId;
use snippets_core::env::get_optional_var;
use snippets_core::rest::{BaseUrls, RestError, RestResult};
use std::str::FromStr;
use std::sync::Arc;
use tower::util::MapRequest;

mod format;
use format::Format;
mod pagination;
mod payload;
mod render;
use render::Resource;
mod repr;
pub(crate) use repr::Relations;
mod root_get;
mod snippet_delete;
mod snippet_get;
mod snippet_highlight_get;
mod snippet_patch;
mod snippet_put;
mod snippets_get;
mod snippets_post;
#[cfg(test)]
mod testutils;
mod user_get;
mod users_get;

/// Formats offered by all resources other than the highlighted documents.
const JSON_FORMATS: &[Format] = &[Format::Json, Format::Api];

/// The API root.
const ROOT: Resource = Resource { name: "Api Root", allow: "GET" };

/// The collection of snippets.
const SNIPPET_LIST: Resource = Resource { name: "Snippet List", allow: "GET, POST" };

/// A single snippet.
const SNIPPET_INSTANCE: Resource =
    Resource { name: "Snippet Instance", allow: "GET, PUT, PATCH, DELETE" };

/// The collection of users.
const USER_LIST: Resource = Resource { name: "User List", allow: "GET" };

/// A single user.
const USER_INSTANCE: Resource = Resource { name: "User Instance", allow: "GET" };

/// Options that control how resources are represented.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct RestOptions {
    /// Number of items per page in collections.  Zero disables pagination.
    pub(crate) page_size: u32,

    /// How snippets refer to themselves.
    pub(crate) snippet_relations: Relations,

    /// How users refer to themselves and to their snippets.
    pub(crate) user_relations: Relations,
}

impl Default for RestOptions {
    fn default() -> Self {
        Self {
            page_size: 10,
            snippet_relations: Relations::Hyperlinked,
            user_relations: Relations::Hyperlinked,
        }
    }
}

impl RestOptions {
    /// Creates a new set of options from environment variables whose name is prefixed with the
    /// given `prefix`.
    ///
    /// This will use variables such as `<prefix>_PAGE_SIZE` and `<prefix>_SNIPPET_RELATIONS`.
    pub(crate) fn from_env(prefix: &str) -> Result<Self, String> {
        let get_relations = |suffix: &str| -> Result<Option<Relations>, String> {
            get_optional_var::<String>(prefix, suffix)?
                .map(|raw| Relations::from_str(&raw))
                .transpose()
                .map_err(|e| {
                    format!("Invalid value in environment variable {}_{}: {}", prefix, suffix, e)
                })
        };

        let defaults = Self::default();
        Ok(Self {
            page_size: get_optional_var::<u32>(prefix, "PAGE_SIZE")?.unwrap_or(defaults.page_size),
            snippet_relations: get_relations("SNIPPET_RELATIONS")?
                .unwrap_or(defaults.snippet_relations),
            user_relations: get_relations("USER_RELATIONS")?.unwrap_or(defaults.user_relations),
        })
    }
}

/// State shared by all handlers.
#[derive(Clone)]
pub(crate) struct AppState {
    /// The business logic.
    driver: Driver,

    /// Base URLs used to build hyperlinks.
    base_urls: Arc<BaseUrls>,

    /// Options that control how resources are represented.
    opts: Arc<RestOptions>,
}

/// Parses a snippet identifier from a path segment, treating invalid values as missing entries.
fn parse_snippet_id(raw: &str) -> RestResult<SnippetId> {
    SnippetId::from_str(raw).map_err(|_| RestError::NotFound("Not found.".to_owned()))
}

/// Parses a user identifier from a path segment, treating invalid values as missing entries.
fn parse_user_id(raw: &str) -> RestResult<UserId> {
    UserId::from_str(raw).map_err(|_| RestError::NotFound("Not found.".to_owned()))
}

/// Handler for paths that do not match any resource.
async fn not_found() -> RestError {
    RestError::NotFound("Not found.".to_owned())
}

/// Replaces the empty body of a "method not allowed" response with a JSON error.
async fn json_method_not_allowed(method: Method, response: Response) -> Response {
    if response.status() != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }

    let allow = response.headers().get(ALLOW).cloned();
    let mut response = RestError::MethodNotAllowed(method.to_string()).into_response();
    if let Some(allow) = allow {
        response.headers_mut().insert(ALLOW, allow);
    }
    response
}

/// Creates the router for the application.
pub(crate) fn app(driver: Driver, base_urls: Arc<BaseUrls>, opts: RestOptions) -> Router {
    use axum::routing::get;

    let authn = snippets_authn::rest::app(driver.authn().clone());
    let state = AppState { driver, base_urls, opts: Arc::new(opts) };

    let router = Router::new()
        .route("/", get(root_get::handler))
        .route("/snippets/", get(snippets_get::handler).post(snippets_post::handler))
        .route(
            "/snippets/:id/",
            get(snippet_get::handler)
                .put(snippet_put::handler)
                .patch(snippet_patch::handler)
                .delete(snippet_delete::handler),
        )
        .route("/snippets/:id/highlight/", get(snippet_highlight_get::handler))
        .route("/users/", get(users_get::handler))
        .route("/users/:id/", get(user_get::handler))
        .with_state(state)
        .nest("/api-auth", authn)
        .fallback(not_found)
        .layer(middleware::map_response(json_method_not_allowed));

    Router::new().fallback_service(MapRequest::new(router, format::rewrite_format_suffix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::testutils::*;
    use axum::http;
    use snippets_core::rest::testutils::*;

    #[test]
    fn test_rest_options_from_env_defaults() {
        let overrides: [(&str, Option<&str>); 3] = [
            ("TEST_PAGE_SIZE", None),
            ("TEST_SNIPPET_RELATIONS", None),
            ("TEST_USER_RELATIONS", None),
        ];
        temp_env::with_vars(overrides, || {
            assert_eq!(RestOptions::default(), RestOptions::from_env("TEST").unwrap());
        });
    }

    #[test]
    fn test_rest_options_from_env_all_present() {
        let overrides = [
            ("TEST_PAGE_SIZE", Some("0")),
            ("TEST_SNIPPET_RELATIONS", Some("primary-key")),
            ("TEST_USER_RELATIONS", Some("hyperlinked")),
        ];
        temp_env::with_vars(overrides, || {
            assert_eq!(
                RestOptions {
                    page_size: 0,
                    snippet_relations: Relations::PrimaryKey,
                    user_relations: Relations::Hyperlinked,
                },
                RestOptions::from_env("TEST").unwrap()
            );
        });
    }

    #[test]
    fn test_rest_options_from_env_bad_relations() {
        temp_env::with_var("TEST_USER_RELATIONS", Some("ids"), || {
            let err = RestOptions::from_env("TEST").unwrap_err();
            assert!(err.contains("TEST_USER_RELATIONS"));
            assert!(err.contains("Invalid relations style 'ids'"));
        });
    }

    #[tokio::test]
    async fn test_unknown_path() {
        let context = TestContext::setup().await;

        for path in ["/foo/", "/snippets/1/other/", "/snippets.xml", "/users/1/highlight/"] {
            OneShotBuilder::new(context.app(), (http::Method::GET, path))
                .send_empty()
                .await
                .expect_status(http::StatusCode::NOT_FOUND)
                .expect_error("Not found.")
                .await;
        }
    }

    #[tokio::test]
    async fn test_method_not_allowed() {
        let context = TestContext::setup().await;

        let response = OneShotBuilder::new(context.app(), (http::Method::DELETE, "/snippets/"))
            .send_empty()
            .await
            .expect_status(http::StatusCode::METHOD_NOT_ALLOWED)
            .take_response()
            .await;
        let allow = response.headers().get(ALLOW).unwrap().to_str().unwrap().to_owned();
        assert!(allow.contains("GET"));
        assert!(allow.contains("POST"));

        OneShotBuilder::new(context.into_app(), (http::Method::POST, "/users/1.json"))
            .send_empty()
            .await
            .expect_status(http::StatusCode::METHOD_NOT_ALLOWED)
            .expect_error("Method \"POST\" not allowed.")
            .await;
    }

    #[tokio::test]
    async fn test_trailing_slash_is_optional() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.into_app(), (http::Method::GET, "/snippets"))
            .send_empty()
            .await
            .expect_json::<serde_json::Value>()
            .await;
    }

    #[tokio::test]
    async fn test_authn_endpoints_are_nested() {
        let context = TestContext::setup().await;
        context.create_user("someone").await;

        let route = (http::Method::POST, "/api-auth/login");
        let response = OneShotBuilder::new(context.into_app(), route)
            .with_basic_auth("someone", snippets_authn::driver::testutils::TEST_PASSWORD)
            .send_empty()
            .await
            .expect_json::<serde_json::Value>()
            .await;
        assert!(response["access_token"].is_string());
    }
}
