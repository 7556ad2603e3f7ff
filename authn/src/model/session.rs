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

//! Login sessions and their lifecycle.

use crate::model::AccessToken;
use snippets_core::model::Username;
use std::time::Duration;
use time::OffsetDateTime;

/// Outcome of checking whether a session can authenticate requests at a given time.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionStatus {
    /// The session can authenticate requests.
    Active,

    /// The user logged out of the session.
    LoggedOut,

    /// The session is older than the maximum allowed age.
    Expired,

    /// The session claims to start further in the future than the tolerated clock skew.
    Skewed,
}

/// A login of a user, identified by the access token handed to the client.
///
/// Sessions are never deleted: logging out stamps the session with its logout time so that the
/// token cannot be reused.
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    /// Secret that identifies the session in requests.
    access_token: AccessToken,

    /// Owner of the session.
    username: Username,

    /// When the user logged in.
    login_time: OffsetDateTime,

    /// When the user logged out, if they did.
    logout_time: Option<OffsetDateTime>,
}

impl Session {
    /// Starts a new session for `username` at `login_time`.
    pub(crate) fn new(
        access_token: AccessToken,
        username: Username,
        login_time: OffsetDateTime,
    ) -> Self {
        Self { access_token, username, login_time, logout_time: None }
    }

    /// Marks the session as logged out at `logout_time`.
    pub(crate) fn with_logout_time(self, logout_time: OffsetDateTime) -> Self {
        Self { logout_time: Some(logout_time), ..self }
    }

    /// Gets the access token of the session.
    pub fn access_token(&self) -> &AccessToken {
        &self.access_token
    }

    /// Gets the owner of the session.
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Gets the login time.
    pub fn login_time(&self) -> OffsetDateTime {
        self.login_time
    }

    /// Gets the logout time, or `None` if the session is still open.
    pub fn logout_time(&self) -> Option<OffsetDateTime> {
        self.logout_time
    }

    /// Determines if the session can authenticate requests at `now`, given the maximum session
    /// age and the tolerated clock skew between the login time and `now`.
    pub fn status_at(
        &self,
        now: OffsetDateTime,
        max_age: Duration,
        max_skew: Duration,
    ) -> SessionStatus {
        if self.logout_time.is_some() {
            SessionStatus::LoggedOut
        } else if self.login_time < now - max_age {
            SessionStatus::Expired
        } else if self.login_time > now + max_skew {
            SessionStatus::Skewed
        } else {
            SessionStatus::Active
        }
    }

    /// Consumes the session and extracts its access token.
    pub fn take_access_token(self) -> AccessToken {
        self.access_token
    }
}
