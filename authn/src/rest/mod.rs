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

//! REST interface for session management.
//!
//! The router returned by `app` is meant to be nested by the service that embeds this crate,
//! which gets the `login` and `logout` endpoints.  Any other endpoint in the service can figure
//! out who is calling it via `get_whoami`.

use crate::driver::AuthnDriver;
use crate::model::AccessToken;
use axum::Router;
use axum::routing::post;
use cookie::{Cookie, SameSite};
use snippets_core::rest::{RestError, RestResult};

mod api_login_post;
mod api_logout_post;
mod httputils;
pub use httputils::{
    SESSION_COOKIE, get_basic_auth, get_bearer_auth, get_session_cookie, get_whoami,
};
#[cfg(test)]
mod testutils;

/// Builds the `Set-Cookie` value that stores the session identified by `token` in a browser.
fn make_session_cookie(driver: &AuthnDriver, token: &AccessToken) -> RestResult<String> {
    let max_age = time::Duration::try_from(driver.opts().session_max_age)
        .map_err(|e| RestError::InternalError(format!("Invalid session max age: {}", e)))?;
    let cookie = Cookie::build((SESSION_COOKIE, token.as_str()))
        .http_only(true)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(max_age)
        .build();
    Ok(cookie.to_string())
}

/// Builds the `Set-Cookie` value that asks a browser to forget its session.
fn make_removal_cookie() -> String {
    Cookie::build((SESSION_COOKIE, "")).path("/").removal().build().to_string()
}

/// Creates the router for the authentication endpoints.
pub fn app(driver: AuthnDriver) -> Router {
    Router::new()
        .route("/login/", post(api_login_post::handler))
        .route("/logout/", post(api_logout_post::handler))
        .with_state(driver)
}
