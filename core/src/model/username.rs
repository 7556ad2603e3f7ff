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

//! The `Username` data type.

use crate::model::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum length of a username as specified in the schema.
pub(crate) const MAX_USERNAME_LENGTH: usize = 32;

/// Punctuation characters allowed in usernames in addition to ASCII alphanumerics.
const USERNAME_EXTRA_CHARS: &str = ".-_";

/// Represents a correctly-formatted (but maybe non-existent) username.
///
/// Usernames are case-insensitive and we store them in lowercase.  They show up in snippet
/// representations as the owner of each snippet.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Creates a new username from an untrusted string `s`, making sure it is valid.
    pub fn new<S: Into<String>>(s: S) -> ModelResult<Self> {
        let s = s.into();

        if s.is_empty() {
            return Err(ModelError("Username cannot be empty".to_owned()));
        }
        if s.len() > MAX_USERNAME_LENGTH {
            return Err(ModelError(format!(
                "Username cannot be longer than {} characters",
                MAX_USERNAME_LENGTH
            )));
        }
        if let Some(ch) =
            s.chars().find(|ch| !(ch.is_ascii_alphanumeric() || USERNAME_EXTRA_CHARS.contains(*ch)))
        {
            return Err(ModelError(format!("Unsupported character '{}' in username '{}'", ch, s)));
        }

        Ok(Self(s.to_lowercase()))
    }

    /// Returns a string view of the username.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Username {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Username::new(s)
    }
}

#[cfg(any(test, feature = "testutils"))]
impl From<&'static str> for Username {
    /// Creates a new username from a hardcoded string, which must be valid.
    fn from(name: &'static str) -> Self {
        assert_eq!(name, name.to_lowercase(), "Hardcoded usernames must be lowercase");
        Username::new(name).expect("Hardcoded usernames must be valid")
    }
}

impl<'de> Deserialize<'de> for Username {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Username::new(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_test::{Token, assert_de_tokens_error, assert_tokens};

    #[test]
    fn test_username_ok() {
        assert_eq!(Username::from("admin"), Username::new("admin").unwrap());
        assert_eq!(Username::from("tom.c_2-x"), Username::new("Tom.C_2-x").unwrap());
        assert_eq!("admin", Username::from("admin").to_string());
    }

    #[test]
    fn test_username_parse() {
        assert_eq!(Username::from("vagrant"), "Vagrant".parse::<Username>().unwrap());
        assert!("vag rant".parse::<Username>().is_err());
    }

    #[test]
    fn test_username_error() {
        assert_eq!("Username cannot be empty", Username::new("").unwrap_err().0);
        assert!(Username::new("tom jobim").is_err());
        assert!(Username::new("tom@example.com").is_err());
        assert!(Username::new("jos\u{00e9}").is_err());
        assert!(Username::new("a:b").is_err());

        let mut long_name = "a".repeat(MAX_USERNAME_LENGTH);
        assert!(Username::new(&long_name).is_ok());
        long_name.push('a');
        assert_eq!(
            "Username cannot be longer than 32 characters",
            Username::new(&long_name).unwrap_err().0
        );
    }

    #[test]
    fn test_username_ser_de_ok() {
        let username = Username::new("SnippetOwner").unwrap();
        assert_tokens(&username, &[Token::String("snippetowner")]);
    }

    #[test]
    fn test_username_de_error() {
        assert_de_tokens_error::<Username>(
            &[Token::String("not valid")],
            "Unsupported character ' ' in username 'not valid'",
        );
    }
}
