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

//! Page-number pagination of collections.

use serde::Serialize;
use snippets_core::rest::{RestError, RestResult};
use url::Url;

/// Name of the query parameter that selects the page.
const PAGE_PARAM: &str = "page";

/// Returns the error for pages that cannot be served.
fn invalid_page() -> RestError {
    RestError::NotFound("Invalid page.".to_owned())
}

/// Body of a response that lists a collection.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum Listing<T> {
    /// The whole collection, when pagination is disabled.
    Plain(Vec<T>),

    /// One page of the collection.
    Paged {
        /// Total number of items in the collection.
        count: u64,

        /// Link to the next page, if any.
        next: Option<String>,

        /// Link to the previous page, if any.
        previous: Option<String>,

        /// Items in this page.
        results: Vec<T>,
    },
}

/// Selects which window of a collection to return for a request.
#[derive(Debug, PartialEq)]
pub(crate) struct Paginator {
    /// Maximum number of items per page.  Zero disables pagination.
    page_size: u32,

    /// Requested page number, starting at 1.
    page: u32,
}

impl Paginator {
    /// Creates a paginator for the raw `query` of a request.
    pub(crate) fn new(page_size: u32, query: Option<&str>) -> RestResult<Self> {
        if page_size == 0 {
            return Ok(Self { page_size, page: 1 });
        }

        let pairs = serde_urlencoded::from_str::<Vec<(String, String)>>(query.unwrap_or(""))
            .map_err(|e| RestError::InvalidRequest(format!("Invalid query string: {}", e)))?;
        let page = match pairs.into_iter().rev().find(|(key, _value)| key == PAGE_PARAM) {
            Some((_key, value)) => match value.parse::<u32>() {
                Ok(page) if page > 0 => page,
                _ => return Err(invalid_page()),
            },
            None => 1,
        };
        Ok(Self { page_size, page })
    }

    /// Returns the offset and the limit to query the collection with.
    pub(crate) fn window(&self) -> RestResult<(u32, Option<u32>)> {
        if self.page_size == 0 {
            return Ok((0, None));
        }
        let offset = (self.page - 1).checked_mul(self.page_size).ok_or_else(invalid_page)?;
        Ok((offset, Some(self.page_size)))
    }

    /// Builds a link to `page` of the collection at `url`.
    fn page_link(url: &Url, page: u32) -> String {
        let mut url = url.clone();
        if page > 1 {
            url.query_pairs_mut().append_pair(PAGE_PARAM, &page.to_string());
        }
        url.to_string()
    }

    /// Wraps the `results` fetched for `window` into the response for a collection of `count`
    /// items that lives at `url`.
    pub(crate) fn paginate<T>(
        self,
        results: Vec<T>,
        count: u64,
        url: &Url,
    ) -> RestResult<Listing<T>> {
        if self.page_size == 0 {
            return Ok(Listing::Plain(results));
        }

        let (offset, _limit) = self.window()?;
        let offset = u64::from(offset);
        if self.page > 1 && offset >= count {
            return Err(invalid_page());
        }

        let end = offset + u64::try_from(results.len()).unwrap_or(u64::MAX);
        let next = match end < count {
            true => Some(Self::page_link(url, self.page + 1)),
            false => None,
        };
        let previous = match self.page {
            1 => None,
            page => Some(Self::page_link(url, page - 1)),
        };
        Ok(Listing::Paged { count, next, previous, results })
    }
}
