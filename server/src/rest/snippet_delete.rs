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

//! API to delete a snippet.

use crate::rest::format::Negotiation;
use crate::rest::{AppState, JSON_FORMATS, parse_snippet_id};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use snippets_authn::rest::get_whoami;
use snippets_core::rest::{EmptyBody, RestResult};

/// API handler.
pub(crate) async fn handler(
    State(AppState { driver, .. }): State<AppState>,
    Path(id): Path<String>,
    negotiation: Negotiation,
    headers: HeaderMap,
    _: EmptyBody,
) -> RestResult<StatusCode> {
    negotiation.negotiate(JSON_FORMATS)?;
    let id = parse_snippet_id(&id)?;

    let whoami = get_whoami(driver.authn(), &headers).await?;
    driver.delete_snippet(whoami.as_deref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
