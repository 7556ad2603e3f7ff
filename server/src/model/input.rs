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

//! Parsing and validation of client-provided snippet fields.

use crate::model::{Language, MAX_TITLE_LENGTH, SnippetContent, Style};
use serde_json::{Map, Value};
use snippets_core::model::FieldErrors;
use std::str::FromStr;

/// Message for a required field that was not provided.
const REQUIRED: &str = "This field is required.";

/// Message for a field that was explicitly set to null.
const NOT_NULL: &str = "This field may not be null.";

/// Returns a short description of the type of a JSON `value` for error messages.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Converts a JSON `value` into text, accepting numbers as if they were strings.
fn parse_text(value: &Value) -> Result<String, String> {
    match value {
        Value::Null => Err(NOT_NULL.to_owned()),
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err("Not a valid string.".to_owned()),
    }
}

/// Converts a JSON `value` into a boolean with the leniency that HTML forms need.
fn parse_bool(value: &Value) -> Result<bool, String> {
    let invalid = || "Must be a valid boolean.".to_owned();
    match value {
        Value::Null => Err(NOT_NULL.to_owned()),
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(invalid()),
        },
        Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(invalid()),
        },
        _ => Err(invalid()),
    }
}

/// Converts a JSON `value` into one of the keys accepted by the choice type `T`.
fn parse_choice<T: FromStr<Err = snippets_core::model::ModelError>>(
    value: &Value,
) -> Result<T, String> {
    let key = match value {
        Value::Null => return Err(NOT_NULL.to_owned()),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    T::from_str(&key).map_err(|e| e.0)
}

/// Snippet fields as provided by a client, already validated.
///
/// Fields that were not provided are `None`.  Read-only and unknown fields in the input are
/// ignored.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct SnippetInput {
    /// New title, if provided.
    title: Option<String>,

    /// New code, if provided.
    code: Option<String>,

    /// New line numbers flag, if provided.
    linenos: Option<bool>,

    /// New language, if provided.
    language: Option<Language>,

    /// New style, if provided.
    style: Option<Style>,
}

impl SnippetInput {
    /// Validates the fields in `payload`.
    ///
    /// `code_required` indicates whether the `code` field must be present, which is the case for
    /// creations and full updates.  All problems are collected before returning.
    pub(crate) fn parse(
        payload: &Map<String, Value>,
        code_required: bool,
    ) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::default();
        let mut input = SnippetInput::default();

        match payload.get("title").map(parse_text) {
            Some(Ok(title)) if title.chars().count() > MAX_TITLE_LENGTH => errors.add(
                "title",
                format!("Ensure this field has no more than {} characters.", MAX_TITLE_LENGTH),
            ),
            Some(Ok(title)) => input.title = Some(title),
            Some(Err(e)) => errors.add("title", e),
            None => (),
        }

        match payload.get("code").map(parse_text) {
            Some(Ok(code)) if code.trim().is_empty() => {
                errors.add("code", "This field may not be blank.")
            }
            Some(Ok(code)) => input.code = Some(code),
            Some(Err(e)) => errors.add("code", e),
            None if code_required => errors.add("code", REQUIRED),
            None => (),
        }

        match payload.get("linenos").map(parse_bool) {
            Some(Ok(linenos)) => input.linenos = Some(linenos),
            Some(Err(e)) => errors.add("linenos", e),
            None => (),
        }

        match payload.get("language").map(parse_choice::<Language>) {
            Some(Ok(language)) => input.language = Some(language),
            Some(Err(e)) => errors.add("language", e),
            None => (),
        }

        match payload.get("style").map(parse_choice::<Style>) {
            Some(Ok(style)) => input.style = Some(style),
            Some(Err(e)) => errors.add("style", e),
            None => (),
        }

        errors.into_result(input)
    }

    /// Applies the provided fields on top of `content`, leaving the others untouched.
    pub(crate) fn apply(self, mut content: SnippetContent) -> SnippetContent {
        if let Some(title) = self.title {
            content.set_title(title);
        }
        if let Some(code) = self.code {
            content.set_code(code);
        }
        if let Some(linenos) = self.linenos {
            content.set_linenos(linenos);
        }
        if let Some(language) = self.language {
            content.set_language(language);
        }
        if let Some(style) = self.style {
            content.set_style(style);
        }
        content
    }
}
