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

//! API to replace the fields of a snippet.

use crate::rest::format::Negotiation;
use crate::rest::payload::Payload;
use crate::rest::render::render;
use crate::rest::repr::{Linker, SnippetRepr};
use crate::rest::{AppState, JSON_FORMATS, SNIPPET_INSTANCE, parse_snippet_id};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use serde_json::{Map, Value};
use snippets_authn::rest::get_whoami;
use snippets_core::rest::RestResult;

/// Updates the snippet `id` with the fields in `payload`, shared by the full and partial update
/// APIs.
pub(super) async fn update(
    AppState { driver, base_urls, opts }: AppState,
    id: &str,
    negotiation: Negotiation,
    headers: &HeaderMap,
    payload: &Map<String, Value>,
    partial: bool,
) -> RestResult<Response> {
    let format = negotiation.negotiate(JSON_FORMATS)?;
    let id = parse_snippet_id(id)?;

    let whoami = get_whoami(driver.authn(), headers).await?;
    let snippet = driver.update_snippet(whoami.as_deref(), id, payload, partial).await?;

    let linker = Linker::new(&base_urls, negotiation.suffix());
    let repr = SnippetRepr::new(&snippet, opts.snippet_relations, &linker);
    render(format, SNIPPET_INSTANCE, StatusCode::OK, &repr)
}

/// API handler.
pub(crate) async fn handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    negotiation: Negotiation,
    headers: HeaderMap,
    Payload(payload): Payload,
) -> RestResult<Response> {
    update(state, &id, negotiation, &headers, &payload, false).await
}
