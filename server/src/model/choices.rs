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

//! The `Language` and `Style` enumerated choices.

use serde::{Serialize, Serializer};
use snippets_core::model::ModelError;
use std::fmt;
use std::str::FromStr;

/// Defines an enumeration whose values are a fixed set of textual keys.
///
/// The generated type parses from and serializes to its keys, and rejects any other value with
/// the same message that form validation reports to clients.
macro_rules! choices [
    (
        $(#[$meta:meta])*
        $name:ident, default $default:ident, { $( $variant:ident => $key:literal ),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        pub(crate) enum $name {
            $(
                #[doc = concat!("The `", $key, "` choice.")]
                $variant,
            )+
        }

        impl $name {
            /// All possible values, in the order in which they are offered to users.
            #[cfg(test)]
            pub(crate) const ALL: &'static [$name] = &[ $( $name::$variant, )+ ];

            /// Returns the textual key of this choice.
            pub(crate) fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $key, )+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $key => Ok($name::$variant), )+
                    _ => Err(ModelError(format!("\"{}\" is not a valid choice.", s))),
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }
    }
];

choices!(
    /// Programming languages that snippets can be highlighted as.
    Language, default Python, {
        Bash => "bash",
        C => "c",
        Clojure => "clojure",
        Cpp => "cpp",
        CSharp => "csharp",
        Css => "css",
        Diff => "diff",
        Erlang => "erlang",
        Go => "go",
        Haskell => "haskell",
        Html => "html",
        Java => "java",
        JavaScript => "javascript",
        Json => "json",
        Latex => "latex",
        Lua => "lua",
        Markdown => "markdown",
        OCaml => "ocaml",
        Perl => "perl",
        Php => "php",
        Python => "python",
        Ruby => "ruby",
        Rust => "rust",
        Scala => "scala",
        Sql => "sql",
        Text => "text",
        Xml => "xml",
        Yaml => "yaml",
    }
);

choices!(
    /// Color schemes that snippets can be highlighted with.
    Style, default Friendly, {
        Eighties => "eighties",
        Friendly => "friendly",
        Mocha => "mocha",
        OceanDark => "ocean-dark",
        OceanLight => "ocean-light",
        SolarizedDark => "solarized-dark",
        SolarizedLight => "solarized-light",
    }
);
