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

//! Rendering of snippets as standalone HTML documents.

use crate::model::{Language, SnippetContent, Style};
use once_cell::sync::Lazy;
use snippets_core::template;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Color, Theme, ThemeSet};
use syntect::html::{IncludeBackground, styled_line_to_highlighted_html};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

/// Skeleton of the documents generated by `highlight`.
const DOCUMENT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>%title%</title>
  <meta http-equiv="content-type" content="text/html; charset=utf-8">
</head>
<body>
%heading%%body%
</body>
</html>
"#;

/// Syntax definitions bundled with the highlighter.
static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);

/// Color themes bundled with the highlighter.
static THEME_SET: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);

/// Returns the token that identifies the syntax definition for `language`.
fn syntax_token(language: Language) -> &'static str {
    match language {
        Language::Bash => "sh",
        Language::C => "c",
        Language::Clojure => "clj",
        Language::Cpp => "cpp",
        Language::CSharp => "cs",
        Language::Css => "css",
        Language::Diff => "diff",
        Language::Erlang => "erl",
        Language::Go => "go",
        Language::Haskell => "hs",
        Language::Html => "html",
        Language::Java => "java",
        Language::JavaScript => "js",
        Language::Json => "json",
        Language::Latex => "tex",
        Language::Lua => "lua",
        Language::Markdown => "md",
        Language::OCaml => "ml",
        Language::Perl => "pl",
        Language::Php => "php",
        Language::Python => "py",
        Language::Ruby => "rb",
        Language::Rust => "rs",
        Language::Scala => "scala",
        Language::Sql => "sql",
        Language::Text => "txt",
        Language::Xml => "xml",
        Language::Yaml => "yaml",
    }
}

/// Returns the name of the bundled theme that implements `style`.
fn theme_name(style: Style) -> &'static str {
    match style {
        Style::Eighties => "base16-eighties.dark",
        Style::Friendly => "InspiredGitHub",
        Style::Mocha => "base16-mocha.dark",
        Style::OceanDark => "base16-ocean.dark",
        Style::OceanLight => "base16-ocean.light",
        Style::SolarizedDark => "Solarized (dark)",
        Style::SolarizedLight => "Solarized (light)",
    }
}

/// Looks up the syntax definition for `language`, falling back to plain text.
fn find_syntax(language: Language) -> &'static SyntaxReference {
    SYNTAX_SET
        .find_syntax_by_token(syntax_token(language))
        .unwrap_or_else(|| SYNTAX_SET.find_syntax_plain_text())
}

/// Looks up the theme for `style`.
fn find_theme(style: Style) -> Result<&'static Theme, String> {
    let name = theme_name(style);
    THEME_SET.themes.get(name).ok_or_else(|| format!("Missing theme {}", name))
}

/// Renders `code` as a `pre` block and returns it along with the number of lines in it.
fn render_code(code: &str, language: Language, style: Style) -> Result<(String, usize), String> {
    let theme = find_theme(style)?;
    let mut highlighter = HighlightLines::new(find_syntax(language), theme);

    let background = theme.settings.background.unwrap_or(Color::WHITE);
    let mut html = format!(
        "<pre style=\"background-color:#{:02x}{:02x}{:02x};\">",
        background.r, background.g, background.b
    );
    let mut nlines = 0;
    for line in LinesWithEndings::from(code) {
        let regions = highlighter.highlight_line(line, &SYNTAX_SET).map_err(|e| e.to_string())?;
        let line = styled_line_to_highlighted_html(&regions, IncludeBackground::No)
            .map_err(|e| e.to_string())?;
        html.push_str(&line);
        nlines += 1;
    }
    html.push_str("</pre>");
    Ok((html, nlines))
}

/// Wraps the rendered `code` in a table that shows `nlines` line numbers next to it.
fn add_line_numbers(code: &str, nlines: usize) -> String {
    let numbers = (1..=nlines).map(|i| i.to_string()).collect::<Vec<String>>().join("\n");
    format!(
        "<table class=\"highlighttable\"><tr><td class=\"linenos\"><pre>{}</pre></td>\
         <td class=\"code\">{}</td></tr></table>",
        numbers, code
    )
}

/// Renders the snippet `content` as a full HTML document.
///
/// The output only depends on the content, so the same content always yields the same document.
pub(crate) fn highlight(content: &SnippetContent) -> Result<String, String> {
    let (code, nlines) = render_code(content.code(), *content.language(), *content.style())?;
    let body = if *content.linenos() { add_line_numbers(&code, nlines) } else { code };

    let title = html_escape::encode_text(content.title());
    let heading = if content.title().is_empty() {
        String::new()
    } else {
        format!("<h2>{}</h2>\n", title)
    };

    Ok(template::apply(
        DOCUMENT_TEMPLATE,
        &[("title", title.as_ref()), ("heading", heading.as_str()), ("body", body.as_str())],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Creates snippet content with the given properties and default title.
    fn content(code: &str, linenos: bool, language: Language, style: Style) -> SnippetContent {
        SnippetContent::new("".to_owned(), code.to_owned(), linenos, language, style)
    }

    #[test]
    fn test_all_styles_have_themes() {
        for style in Style::ALL {
            find_theme(*style).unwrap();
        }
    }

    #[test]
    fn test_common_languages_have_syntaxes() {
        for language in [Language::Python, Language::Rust, Language::Json, Language::Text] {
            assert_ne!(
                "",
                SYNTAX_SET.find_syntax_by_token(syntax_token(language)).unwrap().name,
                "{}",
                language
            );
        }
    }

    #[test]
    fn test_highlight_is_deterministic() {
        let content = content("print(123)\n", false, Language::Python, Style::Friendly);
        assert_eq!(highlight(&content).unwrap(), highlight(&content).unwrap());
    }

    #[test]
    fn test_highlight_document_structure() {
        let html =
            highlight(&content("print(123)", false, Language::Python, Style::Friendly)).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>\n<html>"));
        assert!(html.contains("<title></title>"));
        assert!(!html.contains("<h2>"));
        assert!(html.contains("<pre style=\"background-color:#"));
        assert!(html.contains("print"));
        assert!(html.contains("123"));
        assert!(!html.contains("highlighttable"));
    }

    #[test]
    fn test_highlight_title_is_escaped() {
        let content = SnippetContent::new(
            "<b>Bold</b> & co".to_owned(),
            "x".to_owned(),
            false,
            Language::Text,
            Style::Friendly,
        );
        let html = highlight(&content).unwrap();
        assert!(html.contains("<title>&lt;b&gt;Bold&lt;/b&gt; &amp; co</title>"));
        assert!(html.contains("<h2>&lt;b&gt;Bold&lt;/b&gt; &amp; co</h2>"));
    }

    #[test]
    fn test_highlight_code_is_escaped() {
        let html =
            highlight(&content("<script>alert(1)</script>", false, Language::Text, Style::Mocha))
                .unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_highlight_linenos() {
        let html =
            highlight(&content("a = 1\nb = 2\nc = 3\n", true, Language::Python, Style::Friendly))
                .unwrap();
        assert!(html.contains("<td class=\"linenos\"><pre>1\n2\n3</pre></td>"));
    }

    #[test]
    fn test_highlight_depends_on_style() {
        let light =
            highlight(&content("x = 1", false, Language::Python, Style::SolarizedLight)).unwrap();
        let dark =
            highlight(&content("x = 1", false, Language::Python, Style::SolarizedDark)).unwrap();
        assert_ne!(light, dark);
    }
}
