//! Terminal rendering of assistant replies.

use owo_colors::{OwoColorize, Style};
use parley_core::format::{Markup, Tag, Token, format};
use parley_core::{Turn, TurnStatus};

/// Renders markup with ANSI styles.
///
/// Strong emphasis becomes bold, emphasis becomes italic, code spans are
/// cyan, the thinking indicator is dimmed, and breaks become newlines.
pub fn render_markup(markup: &Markup) -> String {
    let mut out = String::new();
    let mut depth = StyleDepth::default();
    for token in markup.tokens() {
        match token {
            Token::Open(tag) => depth.enter(tag),
            Token::Close(tag) => depth.leave(tag),
            Token::Break => out.push('\n'),
            Token::Text(text) => match depth.style() {
                Some(style) => out.push_str(&text.style(style).to_string()),
                None => out.push_str(text),
            },
        }
    }
    out
}

/// Renders the text of a single turn for the terminal.
pub fn render_turn(turn: &Turn) -> String {
    match turn.status() {
        TurnStatus::Pending => render_markup(&format(turn.text())),
        TurnStatus::Failed => turn.text().red().to_string(),
        TurnStatus::Complete => {
            render_markup(&Markup::from_formatted(turn.text()))
        }
    }
}

#[derive(Default)]
struct StyleDepth {
    strong: usize,
    em: usize,
    code: usize,
    thinking: usize,
}

impl StyleDepth {
    fn counter(&mut self, tag: Tag) -> &mut usize {
        match tag {
            Tag::Strong => &mut self.strong,
            Tag::Em => &mut self.em,
            Tag::Code => &mut self.code,
            Tag::Thinking => &mut self.thinking,
        }
    }

    fn enter(&mut self, tag: Tag) {
        *self.counter(tag) += 1;
    }

    fn leave(&mut self, tag: Tag) {
        let counter = self.counter(tag);
        *counter = counter.saturating_sub(1);
    }

    fn style(&self) -> Option<Style> {
        if self.strong + self.em + self.code + self.thinking == 0 {
            return None;
        }
        let mut style = Style::new();
        if self.strong > 0 {
            style = style.bold();
        }
        if self.em > 0 {
            style = style.italic();
        }
        if self.code > 0 {
            style = style.cyan();
        }
        if self.thinking > 0 {
            style = style.dimmed();
        }
        Some(style)
    }
}
