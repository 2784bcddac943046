//! HTML rendering of a transcript.

use parley_core::format::{Markup, escape_html, format};
use parley_core::{Turn, TurnStatus};
use parley_model::Role;

/// Renders the whole transcript as an HTML fragment.
///
/// Each turn becomes a `div` with the classes `turn`, its role, and
/// `pending` or `error` where it applies. The output is safe to insert into
/// a page.
pub fn render_transcript(turns: &[Turn]) -> String {
    let mut html = String::from(r#"<div class="transcript">"#);
    for turn in turns {
        render_turn(turn, &mut html);
    }
    html.push_str("</div>");
    html
}

fn render_turn(turn: &Turn, html: &mut String) {
    let role = match turn.role() {
        Role::User => "user",
        Role::Assistant => "assistant",
    };
    let modifier = match turn.status() {
        TurnStatus::Pending => " pending",
        TurnStatus::Failed => " error",
        TurnStatus::Complete => "",
    };
    let body = match (turn.role(), turn.status()) {
        (Role::User, _) | (_, TurnStatus::Failed) => escape_html(turn.text()),
        (Role::Assistant, TurnStatus::Pending) => {
            format(turn.text()).sanitize()
        }
        (Role::Assistant, TurnStatus::Complete) => {
            Markup::from_formatted(turn.text()).sanitize()
        }
    };

    html.push_str(&format!(
        r#"<div class="turn {role}{modifier}">{body}</div>"#
    ));
}
