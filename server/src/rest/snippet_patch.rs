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

//! API to modify some fields of a snippet.

use crate::rest::AppState;
use crate::rest::format::Negotiation;
use crate::rest::payload::Payload;
use crate::rest::snippet_put::update;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;
use snippets_core::rest::RestResult;

/// API handler.
pub(crate) async fn handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    negotiation: Negotiation,
    headers: HeaderMap,
    Payload(payload): Payload,
) -> RestResult<Response> {
    update(state, &id, negotiation, &headers, &payload, true).await
}

#[cfg(test)]
mod tests {
    use crate::model::{Language, SnippetContent, Style};
    use crate::rest::testutils::*;
    use axum::http;
    use serde_json::{Value, json};
    use snippets_core::rest::testutils::*;

    fn route<T: std::fmt::Display>(id: T) -> (http::Method, String) {
        (http::Method::PATCH, format!("/snippets/{}/", id))
    }

    fn content() -> SnippetContent {
        SnippetContent::new(
            "Original".to_owned(),
            "original code".to_owned(),
            false,
            Language::Go,
            Style::Friendly,
        )
    }

    #[tokio::test]
    async fn test_ok() {
        let context = TestContext::setup().await;
        let token = context.do_test_login("someone").await;
        let user = context.get_user("someone").await;
        let id = context.create_snippet(&user, content()).await;

        let response = OneShotBuilder::new(context.app(), route(id))
            .with_bearer_auth(token.as_str())
            .send_json(json!({"linenos": "yes", "style": "solarized-light"}))
            .await
            .expect_json::<Value>()
            .await;
        assert_eq!(json!(true), response["linenos"]);
        assert_eq!(json!("original code"), response["code"]);

        let mut exp_content = content();
        exp_content.set_linenos(true);
        exp_content.set_style(Style::SolarizedLight);
        assert_eq!(&exp_content, context.get_snippet(id).await.content());
    }

    #[tokio::test]
    async fn test_empty_payload_rerenders() {
        let context = TestContext::setup().await;
        let token = context.do_test_login("someone").await;
        let user = context.get_user("someone").await;
        let id = context.create_snippet(&user, content()).await;
        assert_eq!("<fake>original code</fake>", context.get_snippet(id).await.highlighted());

        OneShotBuilder::new(context.app(), route(id))
            .with_bearer_auth(token.as_str())
            .send_empty()
            .await
            .expect_json::<Value>()
            .await;

        let snippet = context.get_snippet(id).await;
        assert_eq!(&content(), snippet.content());
        assert!(snippet.highlighted().starts_with("<!DOCTYPE html>"));
    }

    #[tokio::test]
    async fn test_invalid_field() {
        let context = TestContext::setup().await;
        let token = context.do_test_login("someone").await;
        let user = context.get_user("someone").await;
        let id = context.create_snippet(&user, content()).await;

        let fields = OneShotBuilder::new(context.app(), route(id))
            .with_bearer_auth(token.as_str())
            .send_json(json!({"code": "   "}))
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_field_errors()
            .await;
        assert_eq!(Some(&["This field may not be blank.".to_owned()][..]), fields.get("code"));
        assert_eq!(&content(), context.get_snippet(id).await.content());
    }

    #[tokio::test]
    async fn test_not_owner() {
        let context = TestContext::setup().await;
        let owner = context.create_user("owner").await;
        let token = context.do_test_login("other").await;
        let id = context.create_snippet(&owner, content()).await;

        OneShotBuilder::new(context.app(), route(id))
            .with_bearer_auth(token.as_str())
            .send_json(json!({"title": "mine"}))
            .await
            .expect_status(http::StatusCode::FORBIDDEN)
            .expect_error("You do not have permission")
            .await;
        assert_eq!(&content(), context.get_snippet(id).await.content());
    }

    #[tokio::test]
    async fn test_anonymous_missing_snippet() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.into_app(), route(5))
            .send_json(json!({"title": "x"}))
            .await
            .expect_status(http::StatusCode::UNAUTHORIZED)
            .expect_error("Authentication credentials were not provided")
            .await;
    }
}
