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

//! The `User` and `UserId` data types.

use crate::model::HashedPassword;
use serde::{Deserialize, Serialize};
use snippets_core::model::Username;
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

/// Identifier of a user account, as assigned by the database.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Creates a new identifier from its numeric representation.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the numeric representation of the identifier.
    pub fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<i64>() {
            Ok(id) if id > 0 => Ok(Self(id)),
            _ => Err(format!("Invalid user id '{}'", s)),
        }
    }
}

/// Representation of a user's information.
#[derive(Clone, Debug, PartialEq)]
pub struct User {
    /// Identifier of the user.
    id: UserId,

    /// Name of the user.
    username: Username,

    /// Hashed password.  None if the user is not allowed to log in.
    password: Option<HashedPassword>,

    /// Time of last login of the user.  None if the user has never logged in.
    last_login: Option<OffsetDateTime>,
}

impl User {
    /// Creates a new user with the given fields.
    pub fn new(id: UserId, username: Username) -> Self {
        Self { id, username, password: None, last_login: None }
    }

    /// Modifies a user to record their most recent login time.
    pub(crate) fn with_last_login(mut self, last_login: OffsetDateTime) -> Self {
        self.last_login = Some(last_login);
        self
    }

    /// Modifies a user to add a password.
    pub(crate) fn with_password(mut self, password: HashedPassword) -> Self {
        self.password = Some(password);
        self
    }

    /// Gets the user's identifier.
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Gets the user's username.
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Gets the user's password as a hash.
    pub fn password(&self) -> Option<&HashedPassword> {
        self.password.as_ref()
    }

    /// Gets the user's last login timestamp, or `None` if the user has never logged in yet.
    pub fn last_login(&self) -> Option<OffsetDateTime> {
        self.last_login
    }
}
