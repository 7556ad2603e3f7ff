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

//! Rendering of resource representations in the negotiated format.

use crate::rest::format::Format;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde::Serialize;
use snippets_core::rest::RestResult;
use snippets_core::template;

/// Skeleton of the browsable pages.
const API_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>%name% - Snippets API</title>
  <meta http-equiv="content-type" content="text/html; charset=utf-8">
</head>
<body>
<h1>%name%</h1>
<pre class="response-info"><b>HTTP %status%</b>
<b>Allow:</b> %allow%
<b>Content-Type:</b> application/json

%content%</pre>
</body>
</html>
"#;

/// Description of a resource for rendering purposes.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Resource {
    /// Human-readable name of the resource.
    pub(crate) name: &'static str,

    /// Methods supported by the resource, as they go in the `Allow` header.
    pub(crate) allow: &'static str,
}

/// Renders `value` as a response with `status` in the negotiated `format`.
pub(crate) fn render<T: Serialize>(
    format: Format,
    resource: Resource,
    status: StatusCode,
    value: &T,
) -> RestResult<Response> {
    match format {
        Format::Json => Ok((status, Json(value)).into_response()),
        Format::Api | Format::Html => {
            let content = serde_json::to_string_pretty(value)?;
            let content = html_escape::encode_text(&content);
            let page = template::apply(
                API_TEMPLATE,
                &[
                    ("name", resource.name),
                    ("status", &status.to_string()),
                    ("allow", resource.allow),
                    ("content", content.as_ref()),
                ],
            );
            Ok((status, Html(page)).into_response())
        }
    }
}
