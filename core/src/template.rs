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

//! Trivial templating engine.

/// Looks up the value for `key` in `replacements`, ensuring there is exactly one.
fn find_replacement<'a>(key: &str, replacements: &[(&str, &'a str)]) -> &'a str {
    let mut matches = replacements.iter().filter(|(candidate, _)| *candidate == key);
    let value = match matches.next() {
        Some((_, value)) => *value,
        None => panic!("No replacement for {} but it must have been defined", key),
    };
    assert!(matches.next().is_none(), "Found two values for replacement {}", key);
    value
}

/// Performs various named string replacements in `input` based on `replacements`.
///
/// The `input` string can have `%key%` strings in it where `key` must appear in `replacements` and
/// which will be replaced by its corresponding value.  Raw `%` characters can be escaped via `%%`
/// and nested expansions are not supported.
///
/// Templates are part of the binary, so malformed templates and missing replacements are
/// programming errors and cause a panic.
pub fn apply(input: &str, replacements: &[(&str, &str)]) -> String {
    let mut output = String::with_capacity(input.len());
    let mut in_key = false;
    let mut pieces = input.split('%').peekable();
    while let Some(piece) = pieces.next() {
        if !in_key {
            output.push_str(piece);
        } else {
            assert!(pieces.peek().is_some(), "Unterminated replacement key {}", piece);
            if piece.is_empty() {
                output.push('%');
            } else {
                output.push_str(find_replacement(piece, replacements));
            }
        }
        in_key = !in_key;
    }
    output
}
