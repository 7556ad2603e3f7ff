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

//! API to create a snippet.

use crate::rest::format::Negotiation;
use crate::rest::payload::Payload;
use crate::rest::render::render;
use crate::rest::repr::{Linker, SnippetRepr};
use crate::rest::{AppState, JSON_FORMATS, Relations, SNIPPET_LIST};
use axum::extract::State;
use axum::http::header::LOCATION;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use snippets_authn::rest::get_whoami;
use snippets_core::rest::{RestError, RestResult};

/// API handler.
pub(crate) async fn handler(
    State(AppState { driver, base_urls, opts }): State<AppState>,
    negotiation: Negotiation,
    headers: HeaderMap,
    Payload(payload): Payload,
) -> RestResult<Response> {
    let format = negotiation.negotiate(JSON_FORMATS)?;

    let whoami = get_whoami(driver.authn(), &headers).await?;
    let snippet = driver.create_snippet(whoami.as_deref(), &payload).await?;

    let linker = Linker::new(&base_urls, negotiation.suffix());
    let repr = SnippetRepr::new(&snippet, opts.snippet_relations, &linker);
    let mut response = render(format, SNIPPET_LIST, StatusCode::CREATED, &repr)?;
    if opts.snippet_relations == Relations::Hyperlinked {
        let location = HeaderValue::from_str(linker.snippet(*snippet.id()).as_str())
            .map_err(|e| RestError::InternalError(format!("Invalid Location header: {}", e)))?;
        response.headers_mut().insert(LOCATION, location);
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use crate::model::{Language, SnippetContent, SnippetId, Style};
    use crate::rest::testutils::*;
    use crate::rest::{Relations, RestOptions};
    use axum::http;
    use serde_json::{Value, json};
    use snippets_authn::driver::testutils::TEST_PASSWORD;
    use snippets_authn::rest::SESSION_COOKIE;
    use snippets_core::rest::testutils::*;
    use std::str::FromStr;

    fn route() -> (http::Method, &'static str) {
        (http::Method::POST, "/snippets/")
    }

    /// Extracts the identifier of a snippet from its hyperlinked representation.
    fn id_from_url(url: &Value) -> SnippetId {
        let url = url.as_str().unwrap();
        let id = url.strip_prefix("http://localhost:8000/snippets/").unwrap();
        SnippetId::from_str(id.strip_suffix('/').unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_defaults_with_bearer() {
        let context = TestContext::setup().await;
        let token = context.do_test_login("someone").await;

        let response = OneShotBuilder::new(context.app(), route())
            .with_bearer_auth(token.as_str())
            .send_json(json!({"code": "print(123)"}))
            .await
            .expect_status(http::StatusCode::CREATED)
            .take_response()
            .await;
        let location =
            response.headers().get(http::header::LOCATION).unwrap().to_str().unwrap().to_owned();
        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        let body: Value = serde_json::from_slice(&body).unwrap();

        let id = id_from_url(&body["url"]);
        assert_eq!(format!("http://localhost:8000/snippets/{}/", id), location);
        assert_eq!(
            json!({
                "url": format!("http://localhost:8000/snippets/{}/", id),
                "highlight": format!("http://localhost:8000/snippets/{}/highlight.html", id),
                "owner": "someone",
                "title": "",
                "code": "print(123)",
                "linenos": false,
                "language": "python",
                "style": "friendly",
            }),
            body
        );

        let snippet = context.get_snippet(id).await;
        assert_eq!(context.get_user("someone").await.id(), *snippet.owner_id());
        assert!(snippet.highlighted().contains("print"));
    }

    #[tokio::test]
    async fn test_all_fields_with_basic_auth() {
        let opts = RestOptions { snippet_relations: Relations::PrimaryKey, ..Default::default() };
        let context = TestContext::setup_with(opts).await;
        context.create_user("someone").await;

        let response = OneShotBuilder::new(context.app(), route())
            .with_basic_auth("someone", TEST_PASSWORD)
            .send_json(json!({
                "title": "Hello",
                "code": "fn main() {}",
                "linenos": true,
                "language": "rust",
                "style": "mocha",
                "owner": "nobody",
            }))
            .await
            .expect_status(http::StatusCode::CREATED)
            .expect_json::<Value>()
            .await;

        let id = SnippetId::new(response["id"].as_i64().unwrap());
        assert_eq!(json!("someone"), response["owner"]);
        assert!(response.get("url").is_none());
        assert_eq!(
            &SnippetContent::new(
                "Hello".to_owned(),
                "fn main() {}".to_owned(),
                true,
                Language::Rust,
                Style::Mocha
            ),
            context.get_snippet(id).await.content()
        );
    }

    #[tokio::test]
    async fn test_form_with_session_cookie() {
        let opts = RestOptions { snippet_relations: Relations::PrimaryKey, ..Default::default() };
        let context = TestContext::setup_with(opts).await;
        let token = context.do_test_login("someone").await;

        let response = OneShotBuilder::new(context.app(), route())
            .with_cookie(SESSION_COOKIE, token.as_str())
            .send_form([("code", "x = 1"), ("linenos", "on"), ("language", "ruby")])
            .await
            .expect_status(http::StatusCode::CREATED)
            .expect_json::<Value>()
            .await;

        assert_eq!(json!("x = 1"), response["code"]);
        assert_eq!(json!(true), response["linenos"]);
        assert_eq!(json!("ruby"), response["language"]);
    }

    #[tokio::test]
    async fn test_anonymous() {
        let context = TestContext::setup().await;

        let response = OneShotBuilder::new(context.app(), route())
            .send_json(json!({"code": "print(123)"}))
            .await
            .expect_status(http::StatusCode::UNAUTHORIZED)
            .take_response()
            .await;
        assert_eq!(
            "Basic realm=\"the-realm\"",
            response.headers().get("WWW-Authenticate").unwrap().to_str().unwrap()
        );

        OneShotBuilder::new(context.into_app(), (http::Method::GET, "/snippets/"))
            .send_empty()
            .await
            .expect_text("\"count\":0")
            .await;
    }

    #[tokio::test]
    async fn test_anonymous_message() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.into_app(), route())
            .send_json(json!({"code": "print(123)"}))
            .await
            .expect_status(http::StatusCode::UNAUTHORIZED)
            .expect_error("Authentication credentials were not provided")
            .await;
    }

    #[tokio::test]
    async fn test_invalid_fields() {
        let context = TestContext::setup().await;
        let token = context.do_test_login("someone").await;

        let fields = OneShotBuilder::new(context.into_app(), route())
            .with_bearer_auth(token.as_str())
            .send_json(json!({"title": "x", "style": "neon", "linenos": null}))
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_field_errors()
            .await;

        assert_eq!(3, fields.len());
        assert_eq!(Some(&["This field is required.".to_owned()][..]), fields.get("code"));
        assert_eq!(Some(&["\"neon\" is not a valid choice.".to_owned()][..]), fields.get("style"));
        assert_eq!(Some(&["This field may not be null.".to_owned()][..]), fields.get("linenos"));
    }

    #[tokio::test]
    async fn test_empty_json_body() {
        let context = TestContext::setup().await;
        let token = context.do_test_login("someone").await;

        OneShotBuilder::new(context.into_app(), route())
            .with_bearer_auth(token.as_str())
            .with_header(http::header::CONTENT_TYPE, "application/json")
            .send_empty()
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("This field is required")
            .await;
    }

    #[tokio::test]
    async fn test_json_not_an_object() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.into_app(), route())
            .send_json(json!(["code"]))
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("Invalid data. Expected a dictionary, but got array.")
            .await;
    }

    #[tokio::test]
    async fn test_unsupported_media_type() {
        let context = TestContext::setup().await;
        let token = context.do_test_login("someone").await;

        OneShotBuilder::new(context.into_app(), route())
            .with_bearer_auth(token.as_str())
            .send_text("code")
            .await
            .expect_status(http::StatusCode::UNSUPPORTED_MEDIA_TYPE)
            .expect_error("Unsupported media type \"text/plain\" in request")
            .await;
    }
}
