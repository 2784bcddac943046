//! Turns assistant replies into display markup.
//!
//! The formatter is a handful of sequential pattern substitutions, not a
//! markdown parser. Overlapping or unbalanced delimiters produce best-effort
//! output.
//!
//! The produced [`Markup`] is **not** safe to insert into a trusted render
//! target as-is, since nothing in the reply text is escaped. Go through
//! [`Markup::sanitize`] (for HTML) or [`Markup::tokens`] (for anything else)
//! before displaying it.

use std::fmt::{self, Display};
use std::sync::LazyLock;

use regex::Regex;

use crate::session::PENDING_TEXT;

/// Markup shown in place of a reply that has not arrived yet.
pub const THINKING_MARKUP: &str =
    r#"<span class="thinking">Thinking...</span>"#;

static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());
static ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*(.+?)\*").unwrap());
static CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`\n]+)`").unwrap());
static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\r?\n){2,}").unwrap());
static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r?\n").unwrap());
static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"<(/?)(strong|em|code)>|<br>|<span class="thinking">|</span>"#,
    )
    .unwrap()
});

/// Display markup produced by [`format`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Markup(String);

/// An element that the formatter may emit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tag {
    /// Strong emphasis.
    Strong,
    /// Emphasis.
    Em,
    /// Inline code span.
    Code,
    /// The thinking indicator.
    Thinking,
}

impl Tag {
    fn open(self) -> &'static str {
        match self {
            Tag::Strong => "<strong>",
            Tag::Em => "<em>",
            Tag::Code => "<code>",
            Tag::Thinking => r#"<span class="thinking">"#,
        }
    }

    fn close(self) -> &'static str {
        match self {
            Tag::Strong => "</strong>",
            Tag::Em => "</em>",
            Tag::Code => "</code>",
            Tag::Thinking => "</span>",
        }
    }
}

/// A piece of [`Markup`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Token<'a> {
    /// An allow-listed opening tag.
    Open(Tag),
    /// An allow-listed closing tag.
    Close(Tag),
    /// A structural line break.
    Break,
    /// Anything else, verbatim and unescaped.
    Text(&'a str),
}

impl Markup {
    /// Returns the raw markup.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Converts the markup into the raw string.
    #[inline]
    pub fn into_string(self) -> String {
        self.0
    }

    /// Wraps a string that is already formatter output.
    #[inline]
    pub fn from_formatted<S: Into<String>>(markup: S) -> Self {
        Self(markup.into())
    }

    /// Splits the markup into allow-listed tags and text runs.
    ///
    /// Tags are recognized only in the exact spelling the formatter emits,
    /// anything else (attributes, other elements, stray brackets) stays in
    /// the text runs.
    pub fn tokens(&self) -> Vec<Token<'_>> {
        let mut tokens = Vec::new();
        let mut last = 0;
        for caps in TAG.captures_iter(&self.0) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            if whole.start() > last {
                tokens.push(Token::Text(&self.0[last..whole.start()]));
            }
            last = whole.end();

            let token = match (caps.get(1), caps.get(2)) {
                (Some(slash), Some(name)) => {
                    let tag = match name.as_str() {
                        "strong" => Tag::Strong,
                        "em" => Tag::Em,
                        _ => Tag::Code,
                    };
                    if slash.as_str().is_empty() {
                        Token::Open(tag)
                    } else {
                        Token::Close(tag)
                    }
                }
                _ => match whole.as_str() {
                    "<br>" => Token::Break,
                    "</span>" => Token::Close(Tag::Thinking),
                    _ => Token::Open(Tag::Thinking),
                },
            };
            tokens.push(token);
        }
        if last < self.0.len() {
            tokens.push(Token::Text(&self.0[last..]));
        }
        tokens
    }

    /// Produces HTML that is safe to insert into a page.
    ///
    /// Every text run is escaped, only allow-listed tags survive, closing
    /// tags without a matching opening tag are escaped, and tags left open
    /// are closed at the end.
    pub fn sanitize(&self) -> String {
        let mut html = String::with_capacity(self.0.len());
        let mut open_tags: Vec<Tag> = Vec::new();
        for token in self.tokens() {
            match token {
                Token::Open(tag) => {
                    open_tags.push(tag);
                    html.push_str(tag.open());
                }
                Token::Close(tag) => {
                    if open_tags.last() == Some(&tag) {
                        open_tags.pop();
                        html.push_str(tag.close());
                    } else {
                        html.push_str(&escape_html(tag.close()));
                    }
                }
                Token::Break => html.push_str("<br>"),
                Token::Text(text) => html.push_str(&escape_html(text)),
            }
        }
        while let Some(tag) = open_tags.pop() {
            html.push_str(tag.close());
        }
        html
    }
}

impl Display for Markup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Formats a turn's text for display.
///
/// The pending sentinel becomes the thinking indicator. Any other text goes
/// through [`format_reply`].
pub fn format(text: &str) -> Markup {
    if text == PENDING_TEXT {
        return Markup(THINKING_MARKUP.to_owned());
    }
    format_reply(text)
}

/// Applies the reply substitutions: bold, italic, inline code, then line
/// breaks.
pub fn format_reply(text: &str) -> Markup {
    let text = BOLD.replace_all(text, "<strong>${1}</strong>");
    let text = ITALIC.replace_all(&text, "<em>${1}</em>");
    let text = CODE.replace_all(&text, "<code>${1}</code>");
    let text = PARAGRAPH_BREAK.replace_all(&text, "<br><br>");
    let text = LINE_BREAK.replace_all(&text, "<br>");
    Markup(text.into_owned())
}

/// Escapes the characters that are significant in HTML text and attributes.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
