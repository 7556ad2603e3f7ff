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

//! API to get one snippet.

use crate::rest::format::Negotiation;
use crate::rest::render::render;
use crate::rest::repr::{Linker, SnippetRepr};
use crate::rest::{AppState, JSON_FORMATS, SNIPPET_INSTANCE, parse_snippet_id};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use snippets_authn::rest::get_whoami;
use snippets_core::rest::{EmptyBody, RestResult};

/// API handler.
pub(crate) async fn handler(
    State(AppState { driver, base_urls, opts }): State<AppState>,
    Path(id): Path<String>,
    negotiation: Negotiation,
    headers: HeaderMap,
    _: EmptyBody,
) -> RestResult<Response> {
    let format = negotiation.negotiate(JSON_FORMATS)?;
    let id = parse_snippet_id(&id)?;

    let whoami = get_whoami(driver.authn(), &headers).await?;
    let snippet = driver.get_snippet(whoami.as_deref(), id).await?;

    let linker = Linker::new(&base_urls, negotiation.suffix());
    let repr = SnippetRepr::new(&snippet, opts.snippet_relations, &linker);
    render(format, SNIPPET_INSTANCE, StatusCode::OK, &repr)
}

#[cfg(test)]
mod tests {
    use crate::model::{Language, SnippetContent, Style};
    use crate::rest::testutils::*;
    use crate::rest::{Relations, RestOptions};
    use axum::http;
    use serde_json::{Value, json};
    use snippets_core::rest::testutils::*;

    fn route<T: std::fmt::Display>(id: T) -> (http::Method, String) {
        (http::Method::GET, format!("/snippets/{}/", id))
    }

    fn content() -> SnippetContent {
        SnippetContent::new(
            "My title".to_owned(),
            "SELECT 1;".to_owned(),
            true,
            Language::Sql,
            Style::Eighties,
        )
    }

    #[tokio::test]
    async fn test_hyperlinked() {
        let context = TestContext::setup().await;
        let user = context.create_user("someone").await;
        let id = context.create_snippet(&user, content()).await;

        let response = OneShotBuilder::new(context.into_app(), route(id))
            .send_empty()
            .await
            .expect_json::<Value>()
            .await;
        assert_eq!(
            json!({
                "url": format!("http://localhost:8000/snippets/{}/", id),
                "highlight": format!("http://localhost:8000/snippets/{}/highlight.html", id),
                "owner": "someone",
                "title": "My title",
                "code": "SELECT 1;",
                "linenos": true,
                "language": "sql",
                "style": "eighties",
            }),
            response
        );
    }

    #[tokio::test]
    async fn test_primary_key_with_suffix() {
        let opts = RestOptions { snippet_relations: Relations::PrimaryKey, ..Default::default() };
        let context = TestContext::setup_with(opts).await;
        let user = context.create_user("someone").await;
        let id = context.create_snippet(&user, content()).await;

        let route = (http::Method::GET, format!("/snippets/{}.json", id));
        let response = OneShotBuilder::new(context.into_app(), route)
            .send_empty()
            .await
            .expect_json::<Value>()
            .await;
        assert_eq!(json!(id.as_i64()), response["id"]);
        assert_eq!(json!("someone"), response["owner"]);
    }

    #[tokio::test]
    async fn test_hyperlinked_with_suffix() {
        let context = TestContext::setup().await;
        let user = context.create_user("someone").await;
        let id = context.create_snippet(&user, content()).await;

        let route = (http::Method::GET, format!("/snippets/{}.json", id));
        let response = OneShotBuilder::new(context.into_app(), route)
            .send_empty()
            .await
            .expect_json::<Value>()
            .await;
        assert_eq!(json!(format!("http://localhost:8000/snippets/{}.json", id)), response["url"]);
        assert_eq!(
            json!(format!("http://localhost:8000/snippets/{}/highlight.html", id)),
            response["highlight"]
        );
    }

    #[tokio::test]
    async fn test_browsable_via_accept() {
        let context = TestContext::setup().await;
        let user = context.create_user("someone").await;
        let id = context.create_snippet(&user, content()).await;

        OneShotBuilder::new(context.into_app(), route(id))
            .with_header(http::header::ACCEPT, "text/html,application/xhtml+xml,*/*;q=0.8")
            .send_empty()
            .await
            .expect_text("(?s)<h1>Snippet Instance</h1>.*GET, PUT, PATCH, DELETE.*SELECT 1;")
            .await;
    }

    #[tokio::test]
    async fn test_not_found() {
        let context = TestContext::setup().await;

        for id in ["1", "0", "abc"] {
            OneShotBuilder::new(context.app(), route(id))
                .send_empty()
                .await
                .expect_status(http::StatusCode::NOT_FOUND)
                .expect_error("Not found.")
                .await;
        }
    }

    test_payload_must_be_empty!(TestContext::setup().await.into_app(), route(1));
}
