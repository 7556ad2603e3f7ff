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

//! API to get one user.

use crate::rest::format::Negotiation;
use crate::rest::render::render;
use crate::rest::repr::{Linker, UserRepr};
use crate::rest::{AppState, JSON_FORMATS, USER_INSTANCE, parse_user_id};
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
    let id = parse_user_id(&id)?;

    get_whoami(driver.authn(), &headers).await?;
    let user = driver.get_user(id).await?;

    let linker = Linker::new(&base_urls, negotiation.suffix());
    let repr = UserRepr::new(&user, opts.user_relations, &linker);
    render(format, USER_INSTANCE, StatusCode::OK, &repr)
}
