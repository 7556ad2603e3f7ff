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

//! Extractor for the payload of write requests.

use crate::model::json_kind;
use async_trait::async_trait;
use axum::extract::{FromRequest, Request};
use axum::http::header::CONTENT_TYPE;
use bytes::Bytes;
use mime::Mime;
use serde_json::{Map, Value};
use snippets_core::rest::{RestError, get_unique_header};

/// Fields sent by the client in the body of a request, either as a JSON object or as an HTML
/// form.  An empty body is an empty set of fields.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct Payload(pub(crate) Map<String, Value>);

impl Payload {
    /// Parses `body` as a JSON object.
    fn from_json(body: &[u8]) -> Result<Self, RestError> {
        let value = serde_json::from_slice::<Value>(body)
            .map_err(|e| RestError::InvalidRequest(format!("JSON parse error - {}", e)))?;
        match value {
            Value::Object(fields) => Ok(Payload(fields)),
            other => Err(RestError::InvalidRequest(format!(
                "Invalid data. Expected a dictionary, but got {}.",
                json_kind(&other)
            ))),
        }
    }

    /// Parses `body` as a URL-encoded form.  Repeated keys keep their last value.
    fn from_form(body: &[u8]) -> Result<Self, RestError> {
        let pairs = serde_urlencoded::from_bytes::<Vec<(String, String)>>(body)
            .map_err(|e| RestError::InvalidRequest(format!("Form parse error - {}", e)))?;
        let mut fields = Map::new();
        for (key, value) in pairs {
            fields.insert(key, Value::String(value));
        }
        Ok(Payload(fields))
    }
}

#[async_trait]
impl<S> FromRequest<S> for Payload
where
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = match get_unique_header(req.headers(), &CONTENT_TYPE)? {
            Some(value) => String::from_utf8_lossy(value.as_bytes()).into_owned(),
            None => String::new(),
        };

        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| RestError::InvalidRequest(e.body_text()))?;
        if body.is_empty() {
            return Ok(Payload::default());
        }

        let media_type = match content_type.parse::<Mime>() {
            Ok(media_type) => media_type,
            Err(_) => return Err(RestError::UnsupportedMediaType(content_type)),
        };
        if media_type.type_() == mime::APPLICATION && media_type.subtype() == mime::JSON {
            Payload::from_json(&body)
        } else if media_type.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str() {
            Payload::from_form(&body)
        } else {
            Err(RestError::UnsupportedMediaType(content_type))
        }
    }
}
