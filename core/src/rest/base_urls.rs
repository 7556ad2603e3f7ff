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

//! The `BaseUrls` type.

use crate::env::get_required_var;
use url::Url;

/// Common error message for URLs built via hardcoded values.
const URL_MUST_BE_VALID: &str = "URLs built in-process must be valid";

/// Checks if `base` has the right format to be a base URL and returns an error if it is not.
fn ensure_valid_base(base: &Url) -> Result<(), String> {
    if base.cannot_be_a_base() {
        return Err(format!("URL '{}' cannot be a base", base));
    }
    if !base.path().ends_with('/') {
        return Err(format!("URL '{}' cannot be a base: missing trailing slash", base));
    }
    Ok(())
}

/// Contains the public base URL of the service and allows building absolute URLs within it.
///
/// Resources link to each other with absolute URLs, so the service needs to know the address
/// under which clients reach it, which may differ from the address it binds to when running
/// behind a proxy.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BaseUrls {
    /// The base URL to the backend service (ourselves).
    backend: Url,
}

impl BaseUrls {
    /// Creates a set of base URLs from an already-parsed URL.
    pub fn new(backend: Url) -> Result<Self, String> {
        ensure_valid_base(&backend)?;
        Ok(Self { backend })
    }

    /// Creates a set of base URLs from environment variables whose name is prefixed with the
    /// given `prefix`.
    ///
    /// This will use variables such as `<prefix>_BACKEND_BASE_URL`.
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        let backend = get_required_var::<Url>(prefix, "BACKEND_BASE_URL")?;
        Self::new(backend)
    }

    /// Creates a set of base URLs from a fixed string, which must represent a valid URL.
    #[cfg(any(test, feature = "testutils"))]
    pub fn from_strs(backend: &'static str) -> Self {
        let backend = Url::parse(backend).unwrap();
        Self::new(backend).unwrap()
    }

    /// Generates a URL to the backend given a `path`, which must be relative.  The `path` can be
    /// empty to obtain a reference to the root.
    pub fn make_backend_url(&self, path: &str) -> Url {
        assert!(!path.starts_with('/'));
        self.backend.join(path).expect(URL_MUST_BE_VALID)
    }

    /// Generates a URL to a resource identified by the path `segments`.
    ///
    /// Without a `suffix`, the URL ends in a slash (`snippets/1/`).  With a `suffix`, the suffix
    /// is appended to the last segment instead (`snippets/1.json`).  Segments must not be empty
    /// and must not contain slashes.
    pub fn make_resource_url(&self, segments: &[&str], suffix: Option<&str>) -> Url {
        debug_assert!(segments.iter().all(|s| !s.is_empty() && !s.contains('/')));
        let mut path = segments.join("/");
        match suffix {
            Some(suffix) => {
                path.push('.');
                path.push_str(suffix);
            }
            None if path.is_empty() => (),
            None => path.push('/'),
        }
        self.make_backend_url(&path)
    }
}
