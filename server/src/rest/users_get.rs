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

//! API to list users.

use crate::rest::format::Negotiation;
use crate::rest::pagination::Paginator;
use crate::rest::render::render;
use crate::rest::repr::{Linker, UserRepr};
use crate::rest::{AppState, JSON_FORMATS, USER_LIST};
use axum::extract::{RawQuery, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use snippets_authn::rest::get_whoami;
use snippets_core::rest::{EmptyBody, RestResult};

/// API handler.
pub(crate) async fn handler(
    State(AppState { driver, base_urls, opts }): State<AppState>,
    negotiation: Negotiation,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    _: EmptyBody,
) -> RestResult<Response> {
    let format = negotiation.negotiate(JSON_FORMATS)?;
    let paginator = Paginator::new(opts.page_size, query.as_deref())?;
    let (offset, limit) = paginator.window()?;

    get_whoami(driver.authn(), &headers).await?;
    let (users, count) = driver.list_users(offset, limit).await?;

    let linker = Linker::new(&base_urls, negotiation.suffix());
    let results =
        users.iter().map(|user| UserRepr::new(user, opts.user_relations, &linker)).collect();
    let listing = paginator.paginate(results, count, &linker.users())?;
    render(format, USER_LIST, StatusCode::OK, &listing)
}
