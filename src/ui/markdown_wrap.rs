use ratatui::{style::Style, text::Span};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Split `text` into words that keep their trailing whitespace. Leading
/// whitespace becomes its own token.
fn split_words(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut in_space = text.starts_with(char::is_whitespace);
    for (idx, ch) in text.char_indices() {
        let is_space = ch.is_whitespace();
        if !is_space && in_space && idx > start {
            tokens.push(&text[start..idx]);
            start = idx;
        }
        in_space = is_space;
    }
    if start < text.len() {
        tokens.push(&text[start..]);
    }
    tokens
}

fn trim_trailing_whitespace(line: &mut Vec<Span<'static>>) {
    while let Some(last) = line.last_mut() {
        let trimmed = last.content.trim_end();
        if trimmed.is_empty() {
            line.pop();
            continue;
        }
        if trimmed.len() != last.content.len() {
            last.content = trimmed.to_string().into();
        }
        break;
    }
}

struct Wrapper {
    max_width: usize,
    indent: usize,
    lines: Vec<Vec<Span<'static>>>,
    current: Vec<Span<'static>>,
    width: usize,
    has_content: bool,
    wrapped: bool,
}

impl Wrapper {
    fn append(&mut self, text: &str, style: Style) {
        self.width += text.width();
        self.has_content = true;
        self.current.push(Span::styled(text.to_string(), style));
    }

    fn break_line(&mut self) {
        trim_trailing_whitespace(&mut self.current);
        self.lines.push(std::mem::take(&mut self.current));
        self.width = 0;
        self.has_content = false;
        self.wrapped = true;
        if self.indent > 0 {
            self.current.push(Span::raw(" ".repeat(self.indent)));
            self.width = self.indent;
        }
    }

    fn push(&mut self, token: &str, style: Style) {
        let mut token = token;
        if self.wrapped && !self.has_content {
            token = token.trim_start();
            if token.is_empty() {
                return;
            }
        }

        if self.has_content && self.width + token.trim_end().width() > self.max_width {
            self.break_line();
            token = token.trim_start();
            if token.is_empty() {
                return;
            }
        }

        // A single word wider than the line is hard-broken.
        while token.trim_end().width() > self.max_width.saturating_sub(self.width) {
            let room = self.max_width.saturating_sub(self.width);
            let mut used = 0;
            let mut split = 0;
            for (idx, ch) in token.char_indices() {
                let cw = ch.width().unwrap_or(0);
                if used + cw > room {
                    break;
                }
                used += cw;
                split = idx + ch.len_utf8();
            }
            if split == 0 {
                if self.has_content {
                    self.break_line();
                    continue;
                }
                split = token.chars().next().map(char::len_utf8).unwrap_or(token.len());
            }
            self.append(&token[..split], style);
            token = &token[split..];
            self.break_line();
            token = token.trim_start();
        }

        if !token.is_empty() {
            self.append(token, style);
        }
    }

    fn finish(mut self) -> Vec<Vec<Span<'static>>> {
        trim_trailing_whitespace(&mut self.current);
        if self.has_content || self.lines.is_empty() {
            self.lines.push(self.current);
        }
        self.lines
    }
}

/// Wrap styled spans to `max_width` columns at word boundaries.
///
/// Lines after the first start with `continuation_indent` spaces. Words
/// longer than a line are broken at the column limit.
pub(crate) fn wrap_spans_to_width(
    spans: &[Span<'static>],
    max_width: usize,
    continuation_indent: usize,
) -> Vec<Vec<Span<'static>>> {
    let max_width = max_width.max(1);
    let mut wrapper = Wrapper {
        max_width,
        indent: continuation_indent.min(max_width.saturating_sub(1)),
        lines: Vec::new(),
        current: Vec::new(),
        width: 0,
        has_content: false,
        wrapped: false,
    };

    for span in spans {
        for token in split_words(&span.content) {
            wrapper.push(token, span.style);
        }
    }

    wrapper.finish()
}
