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

//! API to terminate an existing session.

use crate::driver::AuthnDriver;
use crate::rest::{get_bearer_auth, get_session_cookie, make_removal_cookie};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use snippets_core::rest::{EmptyBody, RestError};

/// POST handler for this API.
///
/// The session to terminate comes from the bearer token if there is an `Authorization` header or
/// from the session cookie otherwise.
pub(crate) async fn handler(
    State(driver): State<AuthnDriver>,
    headers: HeaderMap,
    _: EmptyBody,
) -> Result<impl IntoResponse, RestError> {
    let access_token = if headers.contains_key(header::AUTHORIZATION) {
        get_bearer_auth(&headers, driver.realm())?
    } else {
        match get_session_cookie(&headers) {
            Some(token) => token,
            None => {
                return Err(RestError::Unauthorized {
                    scheme: "Bearer",
                    realm: driver.realm(),
                    message: "Missing Authorization header".to_owned(),
                });
            }
        }
    };

    driver.logout(access_token).await?;

    Ok((StatusCode::NO_CONTENT, [(header::SET_COOKIE, make_removal_cookie())]))
}
