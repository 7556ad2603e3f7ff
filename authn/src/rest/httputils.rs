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

//! Utilities to deal with HTTP authorization.

use crate::driver::AuthnDriver;
use crate::model::{AccessToken, Password, User};
use base64::Engine;
use base64::engine::general_purpose;
use cookie::Cookie;
use http::header::{self, HeaderMap};
use snippets_core::driver::DriverError;
use snippets_core::model::Username;
use snippets_core::rest::{RestError, RestResult, get_unique_header};
use std::sync::Arc;

/// Name of the cookie that carries the session's access token for browser clients.
pub const SESSION_COOKIE: &str = "sessionid";

/// Validates that the `Authorization` HTTP header contains a textual payload for the
/// `exp_scheme` scheme and returns it.
fn get_authorization_header<'a>(
    headers: &'a HeaderMap,
    exp_scheme: &'static str,
    exp_realm: &'static str,
) -> RestResult<&'a str> {
    let unauthorized = |message: String| RestError::Unauthorized {
        scheme: exp_scheme,
        realm: exp_realm,
        message,
    };

    let authz = match get_unique_header(headers, &header::AUTHORIZATION) {
        Ok(Some(value)) => value,
        Ok(None) => return Err(unauthorized("Missing Authorization header".to_owned())),
        Err(e) => return Err(unauthorized(e.to_string())),
    };

    let authz = authz
        .to_str()
        .map_err(|e| unauthorized(format!("Bad encoding in Authorization header: {}", e)))?;

    let (scheme, payload) = match authz.split_once(' ') {
        Some((scheme, _)) if scheme.is_empty() => {
            return Err(unauthorized("Bad Authorization header: missing scheme".to_owned()));
        }
        Some((scheme, payload)) => (scheme, payload),
        None if authz.is_empty() => {
            return Err(unauthorized("Bad Authorization header: missing scheme".to_owned()));
        }
        None => return Err(unauthorized("Bad Authorization header: missing payload".to_owned())),
    };

    if !scheme.eq_ignore_ascii_case(exp_scheme) {
        return Err(unauthorized("Unsupported scheme".to_owned()));
    }

    Ok(payload.trim())
}

/// Assumes that the `headers` contain basic authentication credentials and extracts them.
pub fn get_basic_auth(
    headers: &HeaderMap,
    exp_realm: &'static str,
) -> RestResult<(Username, Password)> {
    let unauthorized = |message: String| RestError::Unauthorized {
        scheme: "Basic",
        realm: exp_realm,
        message,
    };

    let base64_payload = get_authorization_header(headers, "Basic", exp_realm)?;

    let payload = general_purpose::STANDARD
        .decode(base64_payload)
        .map_err(|e| unauthorized(format!("Bad base64 encoding in payload: {}", e)))?;

    // Both the username and the password have to be strings, so it is easier to convert the
    // payload first in one go instead of doing two conversion after splitting the bytes.
    let payload = String::from_utf8(payload)
        .map_err(|e| unauthorized(format!("Bad UTF-8 encoding in payload: {}", e)))?;

    let (username, password) = match payload.split_once(':') {
        Some(parts) => parts,
        None => return Err(unauthorized("Bad content".to_owned())),
    };

    let username = Username::new(username).map_err(|e| unauthorized(e.to_string()))?;
    let password = Password::new(password).map_err(|e| unauthorized(e.to_string()))?;
    Ok((username, password))
}

/// Assumes that the `headers` contain a bearer access token and extracts it.
pub fn get_bearer_auth(headers: &HeaderMap, exp_realm: &'static str) -> RestResult<AccessToken> {
    let payload = get_authorization_header(headers, "Bearer", exp_realm)?;
    AccessToken::new(payload).map_err(|e| RestError::Unauthorized {
        scheme: "Bearer",
        realm: exp_realm,
        message: e.to_string(),
    })
}

/// Extracts the access token from the session cookie, if any.
///
/// Malformed cookies and tokens are ignored as if they had not been sent.
pub fn get_session_cookie(headers: &HeaderMap) -> Option<AccessToken> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .and_then(|cookie| AccessToken::new(cookie.value()).ok())
}

/// Returns the lowercase name of the scheme used in the `Authorization` header, if present.
///
/// A header that is present but not readable as text yields an empty scheme.
fn get_authorization_scheme(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?;
    let scheme = match value.to_str() {
        Ok(value) => value.split(' ').next().unwrap_or_default(),
        Err(_) => "",
    };
    Some(scheme.to_ascii_lowercase())
}

/// Converts an authentication failure reported by the driver into an HTTP challenge for
/// `scheme`, passing any other failure through.
fn into_challenge(e: DriverError, scheme: &'static str, realm: &'static str) -> RestError {
    match e {
        DriverError::Unauthorized(message) => RestError::Unauthorized { scheme, realm, message },
        e => e.into(),
    }
}

/// Determines who is issuing the request described by `headers`.
///
/// Credentials are looked up in this order: basic authentication, a bearer token and the session
/// cookie.  Invalid credentials in the `Authorization` header are an error so that clients learn
/// about them.  An invalid session cookie, however, is ignored and the request is treated as
/// anonymous.  Returns `None` for anonymous requests.
pub async fn get_whoami(
    driver: &AuthnDriver,
    headers: &HeaderMap,
) -> RestResult<Option<Arc<User>>> {
    let realm = driver.realm();

    match get_authorization_scheme(headers).as_deref() {
        Some("basic") => {
            let (username, password) = get_basic_auth(headers, realm)?;
            let user = driver
                .authenticate(&username, password)
                .await
                .map_err(|e| into_challenge(e, "Basic", realm))?;
            Ok(Some(user))
        }

        Some("bearer") => {
            let token = get_bearer_auth(headers, realm)?;
            let user =
                driver.get_session(&token).await.map_err(|e| into_challenge(e, "Bearer", realm))?;
            Ok(Some(user))
        }

        Some(_) => {
            get_authorization_header(headers, "Basic", realm)?;
            Err(RestError::Unauthorized {
                scheme: "Basic",
                realm,
                message: "Unsupported scheme".to_owned(),
            })
        }

        None => match get_session_cookie(headers) {
            Some(token) => match driver.get_session(&token).await {
                Ok(user) => Ok(Some(user)),
                Err(DriverError::Unauthorized(_)) => Ok(None),
                Err(e) => Err(e.into()),
            },
            None => Ok(None),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::AuthnOptions;
    use crate::driver::testutils::{TEST_PASSWORD, TestContext};
    use http::HeaderValue;

    /// Builds a `HeaderMap` with a single `Authorization` header with `value`.
    fn authorization(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.append(header::AUTHORIZATION, value.parse().unwrap());
        headers
    }

    /// Builds a `HeaderMap` with basic authentication credentials.
    fn basic_auth(username: &str, password: &str) -> HeaderMap {
        let payload = general_purpose::STANDARD.encode(format!("{}:{}", username, password));
        authorization(&format!("Basic {}", payload))
    }

    #[test]
    fn test_get_basic_auth_ok() {
        assert_eq!(
            (Username::from("hello"), Password::from("bye:now")),
            get_basic_auth(&basic_auth("Hello", "bye:now"), "the-realm").unwrap()
        );
    }

    /// Runs `get_basic_auth` with an invalid set of header `values` and ensures that the call
    /// falls with an `Unauthorized` error that contains `exp_error` in the failure message.
    fn do_get_basic_auth_error_test(exp_error: &str, values: &[&[u8]]) {
        let mut headers = HeaderMap::new();
        for value in values {
            headers.append(header::AUTHORIZATION, HeaderValue::from_bytes(value).unwrap());
        }
        match get_basic_auth(&headers, "the-realm") {
            Err(ref e @ RestError::Unauthorized { scheme, realm, ref message }) => {
                assert_eq!("Basic", scheme);
                assert_eq!("the-realm", realm);
                assert!(
                    message.contains(exp_error),
                    "message '{}' does not contain '{}'",
                    message,
                    exp_error
                );
                assert!(e.to_string().contains(exp_error));
            }
            e => panic!("{:?}", e),
        }
    }

    #[test]
    fn test_get_basic_auth_missing() {
        do_get_basic_auth_error_test("Missing Authorization", &[]);
    }

    #[test]
    fn test_get_basic_auth_duplicate() {
        do_get_basic_auth_error_test("cannot have more than one value", &[b"abc", b"def"]);
    }

    #[test]
    fn test_get_basic_auth_invalid_encoding() {
        do_get_basic_auth_error_test("Bad encoding in Authorization", &[b"bad \xc5 bytes"]);
    }

    #[test]
    fn test_get_basic_auth_missing_scheme() {
        do_get_basic_auth_error_test("missing scheme", &[b""]);
        do_get_basic_auth_error_test("missing scheme", &[b" abc"]);
    }

    #[test]
    fn test_get_basic_auth_missing_payload() {
        do_get_basic_auth_error_test("missing payload", &[b"Basic"]);
    }

    #[test]
    fn test_get_basic_auth_unsupported_scheme() {
        do_get_basic_auth_error_test("Unsupported scheme", &[b"Bearer 123"]);
    }

    #[test]
    fn test_get_basic_auth_invalid_payload_base64() {
        do_get_basic_auth_error_test("Bad base64 encoding", &[b"Basic xxx"]);
    }

    #[test]
    fn test_get_basic_auth_invalid_payload_utf8() {
        let mut value = vec![];
        value.extend_from_slice(b"Basic ");
        value.extend_from_slice(general_purpose::STANDARD.encode(b"bad \xc5 bytes").as_bytes());
        do_get_basic_auth_error_test("Bad UTF-8 encoding in payload", &[&value]);
    }

    #[test]
    fn test_get_basic_auth_bad_content() {
        let mut value = vec![];
        value.extend_from_slice(b"Basic ");
        value.extend_from_slice(general_purpose::STANDARD.encode("username-password").as_bytes());
        do_get_basic_auth_error_test("Bad content", &[&value]);
    }

    #[test]
    fn test_get_basic_auth_bad_username() {
        let mut value = vec![];
        value.extend_from_slice(b"Basic ");
        value.extend_from_slice(general_purpose::STANDARD.encode("not valid:pass").as_bytes());
        do_get_basic_auth_error_test("Unsupported character", &[&value]);
    }

    #[test]
    fn test_get_bearer_auth_ok() {
        let token = AccessToken::generate();
        let headers = authorization(&format!("Bearer {}", token.as_str()));
        assert_eq!(token, get_bearer_auth(&headers, "the-realm").unwrap());
    }

    #[test]
    fn test_get_bearer_auth_errors() {
        for (value, exp_error) in [
            ("Basic 123", "Unsupported scheme"),
            ("Bearer", "missing payload"),
            ("Bearer xxx", "Invalid access token"),
        ] {
            match get_bearer_auth(&authorization(value), "the-realm") {
                Err(RestError::Unauthorized { scheme, realm, message }) => {
                    assert_eq!("Bearer", scheme);
                    assert_eq!("the-realm", realm);
                    assert!(message.contains(exp_error), "{} vs. {}", message, exp_error);
                }
                e => panic!("{:?}", e),
            }
        }
    }

    #[test]
    fn test_get_session_cookie() {
        let token = AccessToken::generate();

        let mut headers = HeaderMap::new();
        assert!(get_session_cookie(&headers).is_none());

        headers.append(header::COOKIE, "theme=dark; sessionid=short".parse().unwrap());
        assert!(get_session_cookie(&headers).is_none());

        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, "theme=dark".parse().unwrap());
        headers.append(
            header::COOKIE,
            format!("a=b; {}={}", SESSION_COOKIE, token.as_str()).parse().unwrap(),
        );
        assert_eq!(Some(token), get_session_cookie(&headers));
    }

    #[tokio::test]
    async fn test_get_whoami_anonymous() {
        let context = TestContext::setup(AuthnOptions::default()).await;
        assert!(get_whoami(&context.driver(), &HeaderMap::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_whoami_basic() {
        let context = TestContext::setup(AuthnOptions::default()).await;
        let user = context.create_user(Username::from("someone")).await;

        let whoami = get_whoami(&context.driver(), &basic_auth("someone", TEST_PASSWORD))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.id(), whoami.id());

        match get_whoami(&context.driver(), &basic_auth("someone", "bad password")).await {
            Err(RestError::Unauthorized { scheme: "Basic", realm: "the-realm", message }) => {
                assert_eq!("Invalid username or password", message)
            }
            e => panic!("{:?}", e),
        }
    }

    #[tokio::test]
    async fn test_get_whoami_bearer() {
        let context = TestContext::setup(AuthnOptions::default()).await;
        let token = context.do_test_login(Username::from("someone")).await;

        let headers = authorization(&format!("Bearer {}", token.as_str()));
        let whoami = get_whoami(&context.driver(), &headers).await.unwrap().unwrap();
        assert_eq!(&Username::from("someone"), whoami.username());

        let headers = authorization(&format!("Bearer {}", AccessToken::generate().as_str()));
        match get_whoami(&context.driver(), &headers).await {
            Err(RestError::Unauthorized { scheme: "Bearer", message, .. }) => {
                assert_eq!("Invalid session", message)
            }
            e => panic!("{:?}", e),
        }
    }

    #[tokio::test]
    async fn test_get_whoami_cookie() {
        let context = TestContext::setup(AuthnOptions::default()).await;
        let token = context.do_test_login(Username::from("someone")).await;

        let mut headers = HeaderMap::new();
        headers.append(
            header::COOKIE,
            format!("{}={}", SESSION_COOKIE, token.as_str()).parse().unwrap(),
        );
        let whoami = get_whoami(&context.driver(), &headers).await.unwrap().unwrap();
        assert_eq!(&Username::from("someone"), whoami.username());

        let mut headers = HeaderMap::new();
        headers.append(
            header::COOKIE,
            format!("{}={}", SESSION_COOKIE, AccessToken::generate().as_str()).parse().unwrap(),
        );
        assert!(get_whoami(&context.driver(), &headers).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_whoami_unreadable_header_is_not_anonymous() {
        let context = TestContext::setup(AuthnOptions::default()).await;

        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_bytes(b"Basic \xe9t\xe9").unwrap();
        headers.append(header::AUTHORIZATION, value);
        headers.append(
            header::COOKIE,
            format!("{}={}", SESSION_COOKIE, AccessToken::generate().as_str()).parse().unwrap(),
        );
        match get_whoami(&context.driver(), &headers).await {
            Err(RestError::Unauthorized { scheme, message, .. }) => {
                assert_eq!("Basic", scheme);
                assert!(message.contains("Bad encoding in Authorization header"));
            }
            e => panic!("{:?}", e),
        }
    }

    #[tokio::test]
    async fn test_get_whoami_unsupported_scheme() {
        let context = TestContext::setup(AuthnOptions::default()).await;

        match get_whoami(&context.driver(), &authorization("Digest abc")).await {
            Err(RestError::Unauthorized { message, .. }) => {
                assert_eq!("Unsupported scheme", message)
            }
            e => panic!("{:?}", e),
        }
    }
}
