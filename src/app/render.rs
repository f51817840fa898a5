//! Plain-text rendering of the view state for the console

use std::fmt::Write;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::mail::MessageMeta;

use super::state::ViewState;

const SUBJECT_WIDTH: usize = 32;
const FROM_WIDTH: usize = 24;

/// Render the list, label panel, and status line.
/// `pending_undo` is the description of the action `undo` would revert.
pub fn render(state: &ViewState, pending_undo: Option<&str>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "== {} ({} messages, {} unread) ==",
        state.view.title(),
        state.messages.len(),
        state.messages.unread_count()
    );

    if state.messages.is_empty() {
        out.push_str("  (no messages)\n");
    }
    for meta in state.messages.iter() {
        out.push_str(&render_row(meta));
        out.push('\n');
    }

    if let Some(panel) = &state.label_panel {
        let _ = writeln!(
            out,
            "-- labels for {}: {}",
            panel.message_id,
            if panel.labels.is_empty() {
                "(none)".to_string()
            } else {
                panel.labels.join(", ")
            }
        );
    }

    if let Some(error) = &state.status.error {
        let _ = writeln!(out, "error: {}", error);
    } else if !state.status.message.is_empty() {
        let _ = writeln!(out, "{}", state.status.message);
    }
    if state.status.loading {
        out.push_str("loading...\n");
    }
    if let Some(description) = pending_undo {
        let _ = writeln!(out, "[u] undo: {}", description);
    }
    out
}

fn render_row(meta: &MessageMeta) -> String {
    let marker = if meta.is_unread() { '*' } else { ' ' };
    let labels = if meta.label_names.is_empty() {
        String::new()
    } else {
        format!("  [{}]", meta.label_names.join(", "))
    };
    format!(
        "{} {:<6} {} {}{}",
        marker,
        meta.id,
        pad(truncate(&meta.subject, SUBJECT_WIDTH), SUBJECT_WIDTH),
        pad(truncate(meta.display_from(), FROM_WIDTH), FROM_WIDTH),
        labels,
    )
}

/// Truncate to `max_width` display columns, marking the cut with "..."
fn truncate(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    if max_width < 4 {
        return s.chars().take(max_width).collect();
    }

    let mut width = 0;
    let mut result = String::new();
    for c in s.chars() {
        let char_width = c.width().unwrap_or(1);
        if width + char_width > max_width - 3 {
            break;
        }
        width += char_width;
        result.push(c);
    }
    result.push_str("...");
    result
}

/// Right-pad with spaces to `width` display columns
fn pad(mut s: String, width: usize) -> String {
    let fill = width.saturating_sub(s.width());
    s.extend(std::iter::repeat_n(' ', fill));
    s
}
