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

//! Wire representations of the resources.

use crate::driver::UserSnippets;
use crate::model::{Snippet, SnippetId};
use crate::rest::format::Format;
use serde::Serialize;
use snippets_authn::model::UserId;
use snippets_core::rest::BaseUrls;
use std::str::FromStr;
use url::Url;

/// How a resource refers to itself and to related resources.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Relations {
    /// Absolute URLs.
    Hyperlinked,

    /// Numeric identifiers.
    PrimaryKey,
}

impl FromStr for Relations {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hyperlinked" => Ok(Relations::Hyperlinked),
            "primary-key" => Ok(Relations::PrimaryKey),
            _ => Err(format!("Invalid relations style '{}'", s)),
        }
    }
}

/// Builds absolute links to resources that preserve the format suffix of the current request.
pub(crate) struct Linker<'a> {
    /// Base URLs of the service.
    base_urls: &'a BaseUrls,

    /// Suffix to append to links, if any.
    suffix: Option<Format>,
}

impl<'a> Linker<'a> {
    /// Creates a new linker for a request that used `suffix`.
    pub(crate) fn new(base_urls: &'a BaseUrls, suffix: Option<Format>) -> Self {
        Self { base_urls, suffix }
    }

    /// Builds the link to the resource at `segments`.
    fn link(&self, segments: &[&str]) -> Url {
        self.base_urls.make_resource_url(segments, self.suffix.map(Format::suffix))
    }

    /// Link to the collection of snippets.
    pub(crate) fn snippets(&self) -> Url {
        self.link(&["snippets"])
    }

    /// Link to a snippet.
    pub(crate) fn snippet(&self, id: SnippetId) -> Url {
        self.link(&["snippets", &id.to_string()])
    }

    /// Link to the HTML rendering of a snippet, which always carries the `.html` suffix.
    pub(crate) fn highlight(&self, id: SnippetId) -> Url {
        self.base_urls.make_resource_url(
            &["snippets", &id.to_string(), "highlight"],
            Some(Format::Html.suffix()),
        )
    }

    /// Link to the collection of users.
    pub(crate) fn users(&self) -> Url {
        self.link(&["users"])
    }

    /// Link to a user.
    pub(crate) fn user(&self, id: UserId) -> Url {
        self.link(&["users", &id.as_i64().to_string()])
    }
}

/// Representation of the API root.
#[derive(Debug, Serialize)]
pub(crate) struct RootRepr {
    /// Link to the collection of users.
    users: String,

    /// Link to the collection of snippets.
    snippets: String,
}

impl RootRepr {
    /// Creates the representation of the API root.
    pub(crate) fn new(linker: &Linker) -> Self {
        Self { users: linker.users().to_string(), snippets: linker.snippets().to_string() }
    }
}

/// Representation of a snippet.
#[derive(Debug, Serialize)]
pub(crate) struct SnippetRepr {
    /// Identifier of the snippet, only with primary key relations.
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<SnippetId>,

    /// Link to the snippet, only with hyperlinked relations.
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,

    /// Link to the HTML rendering, only with hyperlinked relations.
    #[serde(skip_serializing_if = "Option::is_none")]
    highlight: Option<String>,

    /// Username of the owner.
    owner: String,

    /// Title of the snippet.
    title: String,

    /// Code of the snippet.
    code: String,

    /// Whether the rendering includes line numbers.
    linenos: bool,

    /// Key of the language.
    language: &'static str,

    /// Key of the style.
    style: &'static str,
}

impl SnippetRepr {
    /// Creates the representation of `snippet` using the `relations` style.
    pub(crate) fn new(snippet: &Snippet, relations: Relations, linker: &Linker) -> Self {
        let (id, url, highlight) = match relations {
            Relations::Hyperlinked => (
                None,
                Some(linker.snippet(*snippet.id()).to_string()),
                Some(linker.highlight(*snippet.id()).to_string()),
            ),
            Relations::PrimaryKey => (Some(*snippet.id()), None, None),
        };
        let content = snippet.content();
        Self {
            id,
            url,
            highlight,
            owner: snippet.owner().as_str().to_owned(),
            title: content.title().clone(),
            code: content.code().clone(),
            linenos: *content.linenos(),
            language: content.language().as_str(),
            style: content.style().as_str(),
        }
    }
}

/// Reference from a user to one of their snippets.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum SnippetRef {
    /// Reference by identifier.
    Id(SnippetId),

    /// Reference by URL.
    Url(String),
}

/// Representation of a user and their snippets.
#[derive(Debug, Serialize)]
pub(crate) struct UserRepr {
    /// Identifier of the user, only with primary key relations.
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<UserId>,

    /// Link to the user, only with hyperlinked relations.
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,

    /// Name of the user.
    username: String,

    /// References to the snippets owned by the user, in creation order.
    snippets: Vec<SnippetRef>,
}

impl UserRepr {
    /// Creates the representation of `user` using the `relations` style.
    pub(crate) fn new(user: &UserSnippets, relations: Relations, linker: &Linker) -> Self {
        let (id, url) = match relations {
            Relations::Hyperlinked => (None, Some(linker.user(user.user().id()).to_string())),
            Relations::PrimaryKey => (Some(user.user().id()), None),
        };
        let snippets = user
            .snippets()
            .iter()
            .map(|id| match relations {
                Relations::Hyperlinked => SnippetRef::Url(linker.snippet(*id).to_string()),
                Relations::PrimaryKey => SnippetRef::Id(*id),
            })
            .collect();
        Self { id, url, username: user.user().username().as_str().to_owned(), snippets }
    }
}
