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

//! The `Snippet` data type and its components.

use crate::model::{Language, Style};
use derive_getters::{Dissolve, Getters};
use derive_more::Constructor;
use serde::{Deserialize, Serialize};
use snippets_authn::model::UserId;
use snippets_core::model::Username;
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

/// Maximum length of a snippet title, in characters.
pub(crate) const MAX_TITLE_LENGTH: usize = 100;

/// Identifier of a snippet, as assigned by the database.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub(crate) struct SnippetId(i64);

impl SnippetId {
    /// Creates a new identifier from its numeric representation.
    pub(crate) fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the numeric representation of the identifier.
    pub(crate) fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for SnippetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SnippetId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<i64>() {
            Ok(id) if id > 0 => Ok(Self(id)),
            _ => Err(format!("Invalid snippet id '{}'", s)),
        }
    }
}

/// User-provided content of a snippet.
#[derive(Clone, Constructor, Debug, Getters, PartialEq)]
pub(crate) struct SnippetContent {
    /// Optional title; may be empty.
    title: String,

    /// The code to highlight.
    code: String,

    /// Whether to render line numbers next to the code.
    linenos: bool,

    /// Language to highlight the code as.
    language: Language,

    /// Color scheme to highlight the code with.
    style: Style,
}

impl Default for SnippetContent {
    fn default() -> Self {
        Self {
            title: String::new(),
            code: String::new(),
            linenos: false,
            language: Language::default(),
            style: Style::default(),
        }
    }
}

impl SnippetContent {
    /// Replaces the title.
    pub(crate) fn set_title(&mut self, title: String) {
        self.title = title;
    }

    /// Replaces the code.
    pub(crate) fn set_code(&mut self, code: String) {
        self.code = code;
    }

    /// Replaces the line numbers flag.
    pub(crate) fn set_linenos(&mut self, linenos: bool) {
        self.linenos = linenos;
    }

    /// Replaces the language.
    pub(crate) fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    /// Replaces the style.
    pub(crate) fn set_style(&mut self, style: Style) {
        self.style = style;
    }
}

/// A stored snippet.
#[derive(Clone, Constructor, Debug, Dissolve, Getters, PartialEq)]
pub(crate) struct Snippet {
    /// Identifier of the snippet.
    id: SnippetId,

    /// Time at which the snippet was created.
    created: OffsetDateTime,

    /// Identifier of the user that created the snippet.
    owner_id: UserId,

    /// Name of the user that created the snippet.
    owner: Username,

    /// User-provided content.
    content: SnippetContent,

    /// HTML rendering of the content as of the last save.
    highlighted: String,
}
