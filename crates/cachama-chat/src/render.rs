//! Incremental renderer: accumulated reply text to display markup.
//!
//! Only two constructs are recognized: `![alt](url)` image directives and
//! newlines. Everything else is HTML-escaped. An image is emitted only for
//! `http://`, `https://` or same-origin (`/…`) URLs; any other directive is
//! left as literal text.

use std::sync::LazyLock;

use regex::Regex;

static IMAGE_DIRECTIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"!\[(.*?)\]\((.*?)\)").expect("Invalid image directive regex")
});

/// Render the whole accumulated text. Pure; calling it twice on the same
/// input gives the same output.
pub fn render(text: &str) -> String {
    let mut html = String::with_capacity(text.len() + text.len() / 4);
    let mut last = 0;

    for caps in IMAGE_DIRECTIVE_RE.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let alt = caps.get(1).map_or("", |m| m.as_str());
        let url = caps.get(2).map_or("", |m| m.as_str());

        escape_into(&mut html, &text[last..whole.start()]);
        if is_safe_url(url) {
            html.push_str("<img src=\"");
            escape_into(&mut html, url);
            html.push_str("\" alt=\"");
            escape_into(&mut html, alt);
            html.push_str("\">");
        } else {
            escape_into(&mut html, whole.as_str());
        }
        last = whole.end();
    }
    escape_into(&mut html, &text[last..]);

    html.replace('\n', "<br>")
}

fn escape_into(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}

fn is_safe_url(url: &str) -> bool {
    let url = url.trim();
    let lower = url.to_ascii_lowercase();
    lower.starts_with("http://")
        || lower.starts_with("https://")
        || (url.starts_with('/') && !url.starts_with("//"))
}

/// Accumulated reply plus its current markup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedText {
    pub text: String,
    pub markup: String,
}

impl RenderedText {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an increment and re-render from scratch.
    pub fn push(&mut self, increment: &str) -> &str {
        self.text.push_str(increment);
        self.markup = render(&self.text);
        &self.markup
    }
}
