//! Markdown rendering for model replies.
//!
//! Replies are parsed with pulldown-cmark and turned into pre-wrapped
//! ratatui lines, so the transcript can measure its height exactly.

mod code;
mod lists;
mod render;
#[path = "../markdown_wrap.rs"]
mod wrap;

#[cfg(test)]
mod tests;

use ratatui::style::Style;
use ratatui::text::{Line, Span};

use crate::ui::theme::Theme;

pub(crate) use wrap::wrap_spans_to_width;

/// Render `content` as markdown wrapped to `width` columns.
pub fn render_markdown(content: &str, theme: &Theme, width: usize) -> Vec<Line<'static>> {
    render::MarkdownRenderer::new(content, theme, width).render()
}

/// Render `content` verbatim, wrapping each source line to `width` columns.
pub fn render_plain(content: &str, style: Style, width: usize) -> Vec<Line<'static>> {
    content
        .lines()
        .flat_map(|line| {
            wrap_spans_to_width(&[Span::styled(line.to_string(), style)], width, 0)
        })
        .map(Line::from)
        .collect()
}

/// Concatenated text of a line without styling.
pub fn spans_text(line: &Line<'_>) -> String {
    line.spans.iter().map(|span| span.content.as_ref()).collect()
}
