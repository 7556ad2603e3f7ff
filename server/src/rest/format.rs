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

//! Format suffixes and content negotiation.
//!
//! Every resource can be requested with a format suffix in its last path segment
//! (`/snippets/1.json`) or without one, in which case the `Accept` header decides.  Suffixes are
//! stripped from the request path before routing so that the route table only needs to know
//! about canonical paths, which always end in a slash.

use async_trait::async_trait;
use axum::extract::{FromRequestParts, Request};
use axum::http::header::ACCEPT;
use axum::http::request::Parts;
use axum::http::uri::PathAndQuery;
use axum::http::Uri;
use log::warn;
use mime::Mime;
use snippets_core::rest::{RestError, RestResult, get_unique_header};

/// Representations that resources can be rendered as.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Format {
    /// Plain JSON.
    Json,

    /// HTML page that embeds the JSON representation for browsing.
    Api,

    /// Static HTML document.
    Html,
}

impl Format {
    /// Parses a path suffix without its leading dot.
    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "json" => Some(Format::Json),
            "api" => Some(Format::Api),
            "html" => Some(Format::Html),
            _ => None,
        }
    }

    /// Returns the path suffix that selects this format, without its leading dot.
    pub(crate) fn suffix(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Api => "api",
            Format::Html => "html",
        }
    }

    /// Returns the media type of this format.
    fn media_type(self) -> Mime {
        match self {
            Format::Json => mime::APPLICATION_JSON,
            Format::Api | Format::Html => mime::TEXT_HTML,
        }
    }
}

/// Format selected by the suffix of the request path, if any.
///
/// This is attached to every request as an extension by `rewrite_format_suffix`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct FormatSuffix(pub(crate) Option<Format>);

/// Splits the format suffix from `path` and returns the canonical path, which always ends in a
/// slash, together with the suffix.  Unknown suffixes are left in place.
fn split_format_suffix(path: &str) -> (String, Option<Format>) {
    let trimmed = path.strip_suffix('/').unwrap_or(path);
    let (dir, last) = trimmed.rsplit_once('/').unwrap_or(("", trimmed));
    if let Some((stem, suffix)) = last.rsplit_once('.') {
        if let Some(format) = Format::from_suffix(suffix) {
            let path = match stem {
                "" => format!("{}/", dir),
                stem => format!("{}/{}/", dir, stem),
            };
            return (path, Some(format));
        }
    }
    (format!("{}/", trimmed), None)
}

/// Strips the format suffix from the path of `req` and records it as a `FormatSuffix` extension.
pub(crate) fn rewrite_format_suffix(mut req: Request) -> Request {
    let (path, suffix) = split_format_suffix(req.uri().path());

    let path_and_query = match req.uri().query() {
        Some(query) => format!("{}?{}", path, query),
        None => path,
    };
    let mut parts = req.uri().clone().into_parts();
    match PathAndQuery::try_from(path_and_query) {
        Ok(path_and_query) => {
            parts.path_and_query = Some(path_and_query);
            match Uri::from_parts(parts) {
                Ok(uri) => *req.uri_mut() = uri,
                Err(e) => warn!("Cannot rewrite request URI: {}", e),
            }
        }
        Err(e) => warn!("Cannot rewrite request path: {}", e),
    }

    req.extensions_mut().insert(FormatSuffix(suffix));
    req
}

/// Parses the media ranges in an `Accept` header and sorts them by decreasing quality.
///
/// Malformed ranges and ranges with a quality of zero are ignored.
fn parse_accept(accept: &str) -> Vec<Mime> {
    let mut ranges = accept
        .split(',')
        .filter_map(|range| range.trim().parse::<Mime>().ok())
        .map(|range| {
            let q = range
                .get_param("q")
                .and_then(|q| q.as_str().parse::<f32>().ok())
                .unwrap_or(1.0);
            (q, range)
        })
        .filter(|(q, _range)| *q > 0.0)
        .collect::<Vec<(f32, Mime)>>();
    ranges.sort_by(|(q1, _), (q2, _)| q2.total_cmp(q1));
    ranges.into_iter().map(|(_q, range)| range).collect()
}

/// Checks if the media `range` from an `Accept` header covers the media type of `format`.
fn range_matches(range: &Mime, format: Format) -> bool {
    let media_type = format.media_type();
    (range.type_() == mime::STAR || range.type_() == media_type.type_())
        && (range.subtype() == mime::STAR || range.subtype() == media_type.subtype())
}

/// Extractor for the client's preferences on the representation of the response.
#[derive(Debug)]
pub(crate) struct Negotiation {
    /// Format explicitly requested via the path suffix.
    suffix: Option<Format>,

    /// Raw value of the `Accept` header.
    accept: Option<String>,
}

impl Negotiation {
    /// Picks one of the `offered` formats, which are sorted by the server's preference.
    pub(crate) fn negotiate(&self, offered: &[Format]) -> RestResult<Format> {
        if let Some(format) = self.suffix {
            return match offered.contains(&format) {
                true => Ok(format),
                false => Err(RestError::NotFound("Not found.".to_owned())),
            };
        }

        let default = offered
            .first()
            .copied()
            .ok_or_else(|| RestError::InternalError("No formats offered".to_owned()))?;
        let ranges = match self.accept.as_deref() {
            Some(accept) => parse_accept(accept),
            None => return Ok(default),
        };
        if ranges.is_empty() {
            return Ok(default);
        }

        for range in ranges {
            if let Some(format) = offered.iter().find(|format| range_matches(&range, **format)) {
                return Ok(*format);
            }
        }
        Err(RestError::NotAcceptable("Could not satisfy the request Accept header.".to_owned()))
    }

    /// Checks that the request can be served in the only supported `format`, ignoring the
    /// `Accept` header.
    pub(crate) fn force(&self, format: Format) -> RestResult<Format> {
        match self.suffix {
            None => Ok(format),
            Some(suffix) if suffix == format => Ok(format),
            Some(_) => Err(RestError::NotFound("Not found.".to_owned())),
        }
    }

    /// Returns the format requested via the path suffix, if any.
    pub(crate) fn suffix(&self) -> Option<Format> {
        self.suffix
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Negotiation
where
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let suffix = parts.extensions.get::<FormatSuffix>().and_then(|suffix| suffix.0);
        let accept = match get_unique_header(&parts.headers, &ACCEPT)? {
            Some(value) => match value.to_str() {
                Ok(value) => Some(value.to_owned()),
                Err(_) => return Err(RestError::InvalidRequest("Invalid Accept header".to_owned())),
            },
            None => None,
        };
        Ok(Negotiation { suffix, accept })
    }
}
