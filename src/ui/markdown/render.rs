use super::code::{code_caption, detab, language_hint_from_codeblock_kind, push_codeblock_text};
use super::lists::ListLevel;
use super::wrap::wrap_spans_to_width;
use crate::ui::theme::Theme;
use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

const QUOTE_PREFIX: &str = "│ ";
const MAX_RULE_WIDTH: usize = 80;

pub(super) struct MarkdownRenderer<'a> {
    content: &'a str,
    theme: &'a Theme,
    width: usize,
    lines: Vec<Line<'static>>,
    current_spans: Vec<Span<'static>>,
    style_stack: Vec<Style>,
    list_stack: Vec<ListLevel>,
    /// The innermost list item's marker is in `current_spans` and not yet flushed.
    marker_pending: bool,
    quote_depth: usize,
    in_code_block: Option<String>,
    code_block_lines: Vec<String>,
    /// Destination and collected text of each open link.
    link_stack: Vec<(String, String)>,
    table_cell_index: usize,
    blank_run: usize,
}

impl<'a> MarkdownRenderer<'a> {
    pub(super) fn new(content: &'a str, theme: &'a Theme, width: usize) -> Self {
        Self {
            content,
            theme,
            width: width.max(1),
            lines: Vec::new(),
            current_spans: Vec::new(),
            style_stack: vec![theme.model_text_style],
            list_stack: Vec::new(),
            marker_pending: false,
            quote_depth: 0,
            in_code_block: None,
            code_block_lines: Vec::new(),
            link_stack: Vec::new(),
            table_cell_index: 0,
            blank_run: 0,
        }
    }

    pub(super) fn render(mut self) -> Vec<Line<'static>> {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_TASKLISTS);

        for event in Parser::new_ext(self.content, options) {
            match event {
                Event::Start(tag) => self.start_tag(tag),
                Event::End(tag_end) => self.end_tag(tag_end),
                Event::Text(text) => {
                    if self.in_code_block.is_some() {
                        push_codeblock_text(&mut self.code_block_lines, &text);
                    } else {
                        self.push_text(detab(&text), self.current_style());
                    }
                }
                Event::Code(code) => {
                    self.push_text(detab(&code), self.theme.inline_code_style);
                }
                Event::Html(html) | Event::InlineHtml(html) => {
                    self.push_text(detab(html.trim_end()), self.current_style());
                }
                Event::SoftBreak | Event::HardBreak => self.flush(),
                Event::Rule => {
                    self.flush();
                    self.push_rule();
                    self.push_empty_line();
                }
                Event::TaskListMarker(checked) => {
                    let marker = if checked { "[x] " } else { "[ ] " };
                    self.current_spans
                        .push(Span::styled(marker, self.theme.list_marker_style));
                }
                _ => {}
            }
        }

        self.flush();
        let keep = self.lines.len().saturating_sub(self.blank_run);
        self.lines.truncate(keep);
        self.lines
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush();
                let mut style = self.theme.heading_style;
                if level == HeadingLevel::H1 {
                    style = style.add_modifier(Modifier::UNDERLINED);
                }
                self.style_stack.push(style);
            }
            Tag::BlockQuote(_) => {
                self.flush();
                self.quote_depth += 1;
                self.style_stack.push(self.theme.quote_style);
            }
            Tag::List(start) => {
                self.flush();
                self.list_stack.push(ListLevel::new(start));
            }
            Tag::Item => {
                self.flush();
                if let Some(level) = self.list_stack.last_mut() {
                    let marker = level.next_marker();
                    self.current_spans
                        .push(Span::styled(marker, self.theme.list_marker_style));
                    self.marker_pending = true;
                }
            }
            Tag::CodeBlock(kind) => {
                self.flush();
                self.in_code_block = Some(language_hint_from_codeblock_kind(&kind));
                self.code_block_lines.clear();
            }
            Tag::Emphasis => self.push_modifier(Modifier::ITALIC),
            Tag::Strong => self.push_modifier(Modifier::BOLD),
            Tag::Strikethrough => self.push_modifier(Modifier::CROSSED_OUT),
            Tag::Link { dest_url, .. } | Tag::Image { dest_url, .. } => {
                self.style_stack.push(self.theme.link_style);
                self.link_stack.push((dest_url.to_string(), String::new()));
            }
            Tag::TableHead => {
                self.flush();
                self.table_cell_index = 0;
                self.push_modifier(Modifier::BOLD);
            }
            Tag::TableRow => {
                self.flush();
                self.table_cell_index = 0;
            }
            Tag::TableCell => {
                if self.table_cell_index > 0 {
                    self.current_spans
                        .push(Span::styled(" │ ", self.theme.rule_style));
                }
                self.table_cell_index += 1;
            }
            _ => {}
        }
    }

    fn end_tag(&mut self, tag_end: TagEnd) {
        match tag_end {
            TagEnd::Paragraph => {
                self.flush();
                if self.list_stack.is_empty() {
                    self.push_empty_line();
                }
            }
            TagEnd::Heading(_) => {
                self.flush();
                self.style_stack.pop();
                self.push_empty_line();
            }
            TagEnd::BlockQuote(_) => {
                self.flush();
                self.style_stack.pop();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            TagEnd::List(_) => {
                self.flush();
                self.list_stack.pop();
                if self.list_stack.is_empty() {
                    self.push_empty_line();
                }
            }
            TagEnd::Item => self.flush(),
            TagEnd::CodeBlock => self.finalize_code_block(),
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => {
                self.style_stack.pop();
            }
            TagEnd::Link | TagEnd::Image => {
                self.style_stack.pop();
                if let Some((dest, text)) = self.link_stack.pop() {
                    if !dest.is_empty() && dest != text {
                        self.push_text(format!(" ({dest})"), self.theme.rule_style);
                    }
                }
            }
            TagEnd::TableHead => {
                self.style_stack.pop();
                self.flush();
            }
            TagEnd::TableRow => self.flush(),
            TagEnd::Table => {
                self.flush();
                self.push_empty_line();
            }
            _ => {}
        }
    }

    fn current_style(&self) -> Style {
        self.style_stack
            .last()
            .copied()
            .unwrap_or(self.theme.model_text_style)
    }

    fn push_modifier(&mut self, modifier: Modifier) {
        let style = self.current_style().add_modifier(modifier);
        self.style_stack.push(style);
    }

    fn push_text(&mut self, text: String, style: Style) {
        if let Some((_, link_text)) = self.link_stack.last_mut() {
            link_text.push_str(&text);
        }
        self.current_spans.push(Span::styled(text, style));
    }

    /// Indent of the current block and the hanging indent for its wrapped
    /// lines. A line that starts with a list marker hangs under the marker.
    fn block_indent(&self) -> (usize, usize) {
        let total: usize = self.list_stack.iter().map(|level| level.marker_width).sum();
        if self.marker_pending {
            let inner = self.list_stack.last().map_or(0, |level| level.marker_width);
            (total - inner, inner)
        } else {
            (total, 0)
        }
    }

    fn available_width(&self, indent: usize) -> usize {
        let prefix = self.quote_depth * QUOTE_PREFIX.width() + indent;
        self.width.saturating_sub(prefix).max(1)
    }

    fn flush(&mut self) {
        if self.current_spans.is_empty() {
            return;
        }
        let spans = std::mem::take(&mut self.current_spans);
        let (indent, hanging) = self.block_indent();
        self.marker_pending = false;
        for wrapped in wrap_spans_to_width(&spans, self.available_width(indent), hanging) {
            self.push_prefixed(wrapped, indent);
        }
    }

    fn push_prefixed(&mut self, spans: Vec<Span<'static>>, indent: usize) {
        let mut line = Vec::with_capacity(spans.len() + self.quote_depth + 1);
        for _ in 0..self.quote_depth {
            line.push(Span::styled(QUOTE_PREFIX, self.theme.quote_style));
        }
        if indent > 0 {
            line.push(Span::raw(" ".repeat(indent)));
        }
        line.extend(spans);
        self.lines.push(Line::from(line));
        self.blank_run = 0;
    }

    fn push_empty_line(&mut self) {
        if self.lines.is_empty() || self.blank_run > 0 {
            return;
        }
        self.lines.push(Line::default());
        self.blank_run += 1;
    }

    fn push_rule(&mut self) {
        let (indent, _) = self.block_indent();
        let width = self.available_width(indent).min(MAX_RULE_WIDTH);
        let rule = Span::styled("─".repeat(width), self.theme.rule_style);
        self.push_prefixed(vec![rule], indent);
    }

    fn finalize_code_block(&mut self) {
        let Some(language) = self.in_code_block.take() else {
            return;
        };
        let (indent, _) = self.block_indent();
        let available = self.available_width(indent);
        let style = self.theme.code_block_style;

        let caption = Span::styled(code_caption(&language), self.theme.code_caption_style);
        self.push_prefixed(vec![caption], indent);

        for code_line in std::mem::take(&mut self.code_block_lines) {
            if code_line.trim().is_empty() {
                self.push_prefixed(vec![Span::styled(" ", style)], indent);
                continue;
            }
            for wrapped in wrap_spans_to_width(&[Span::styled(code_line, style)], available, 0) {
                self.push_prefixed(wrapped, indent);
            }
        }
        self.push_empty_line();
    }
}
