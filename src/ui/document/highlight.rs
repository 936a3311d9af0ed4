//! Server-side syntax highlighting for the code viewer.

use std::sync::LazyLock;

use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

static SYNTAXES: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEMES: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

const THEME: &str = "base16-ocean.dark";

/// Highlight `code` as the syntax registered for `extension`.
///
/// Unknown extensions fall back to plain text. Returns `None` only if
/// highlighting itself fails.
pub fn highlight_to_html(code: &str, extension: &str) -> Option<String> {
    let syntax = SYNTAXES
        .find_syntax_by_extension(extension)
        .unwrap_or_else(|| SYNTAXES.find_syntax_plain_text());
    let theme = THEMES.themes.get(THEME)?;
    match highlighted_html_for_string(code, &SYNTAXES, syntax, theme) {
        Ok(html) => Some(html),
        Err(e) => {
            tracing::warn!(extension, error = %e, "Syntax highlighting failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_python_is_highlighted() {
        let html = highlight_to_html("def pump():\n    return 40\n", "py").unwrap();
        assert!(html.starts_with("<pre"));
        assert!(html.contains("<span style="));
        assert!(html.contains("pump"));
    }

    #[test]
    fn test_markup_is_escaped() {
        let html = highlight_to_html("<script>alert(1)</script>", "txt").unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
