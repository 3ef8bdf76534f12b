use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::core::constants::{APP_TITLE, DISCLAIMER, ERROR_CAPTION};
use crate::core::message::{Message, Role};
use crate::core::models::ModelId;
use crate::core::store::MessageStore;
use crate::ui::markdown::{render_markdown, render_plain};
use crate::ui::state::{Focus, SidebarItem, UiState};
use crate::ui::theme::Theme;

const SIDEBAR_WIDTH: u16 = 30;
const MIN_INPUT_LINES: u16 = 1;
const MAX_INPUT_LINES: u16 = 6;
const THINKING_FRAMES: [&str; 4] = ["●○○", "○●○", "○○●", "○●○"];
const STREAMING_CURSOR: &str = "▌";

pub fn thinking_frame(tick: usize) -> &'static str {
    THINKING_FRAMES[tick % THINKING_FRAMES.len()]
}

/// Transcript lines for `messages`, wrapped to `width` columns.
pub fn build_transcript_lines(
    messages: &[Message],
    model: ModelId,
    theme: &Theme,
    markdown: bool,
    width: usize,
    tick: usize,
) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for message in messages {
        match message.role {
            Role::User => {
                lines.push(Line::from(Span::styled("You", theme.user_prefix_style)));
                lines.extend(render_plain(&message.content, theme.user_text_style, width));
            }
            Role::Model => {
                lines.push(Line::from(Span::styled(
                    format!("✦ {}", model.label()),
                    theme.model_prefix_style,
                )));
                lines.extend(model_body(message, theme, markdown, width, tick));
            }
        }
        lines.push(Line::default());
    }

    lines
}

fn model_body(
    message: &Message,
    theme: &Theme,
    markdown: bool,
    width: usize,
    tick: usize,
) -> Vec<Line<'static>> {
    if message.is_awaiting_first_fragment() {
        return vec![Line::from(Span::styled(
            thinking_frame(tick),
            theme.thinking_style,
        ))];
    }

    if message.is_error {
        let mut lines = render_plain(&message.content, theme.error_text_style, width);
        lines.push(Line::from(Span::styled(
            format!("⚠ {ERROR_CAPTION}"),
            theme.error_caption_style,
        )));
        return lines;
    }

    let mut lines = if markdown {
        render_markdown(&message.content, theme, width)
    } else {
        render_plain(&message.content, theme.model_text_style, width)
    };

    if message.is_streaming {
        let cursor = Span::styled(STREAMING_CURSOR, theme.thinking_style);
        match lines.last_mut() {
            Some(line) => line.spans.push(cursor),
            None => lines.push(Line::from(cursor)),
        }
    }
    lines
}

fn input_height(ui: &UiState) -> u16 {
    let lines = u16::try_from(ui.textarea.lines().len()).unwrap_or(MAX_INPUT_LINES);
    lines.clamp(MIN_INPUT_LINES, MAX_INPUT_LINES) + 2
}

pub fn draw(f: &mut Frame, store: &MessageStore, ui: &mut UiState) {
    let area = f.area();
    f.render_widget(
        Block::default().style(Style::default().bg(ui.theme.background_color)),
        area,
    );

    let main_area = if ui.sidebar_open && area.width > SIDEBAR_WIDTH * 2 {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
            .split(area);
        draw_sidebar(f, columns[0], store, ui);
        columns[1]
    } else {
        area
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(input_height(ui)),
            Constraint::Length(1),
        ])
        .split(main_area);

    draw_header(f, rows[0], store, &ui.theme);
    draw_transcript(f, rows[1], store, ui);
    draw_input(f, rows[2], store.is_loading(), ui);

    let disclaimer = Paragraph::new(Line::from(Span::styled(
        DISCLAIMER,
        ui.theme.disclaimer_style,
    )))
    .alignment(Alignment::Center);
    f.render_widget(disclaimer, rows[3]);
}

fn draw_header(f: &mut Frame, area: Rect, store: &MessageStore, theme: &Theme) {
    let mut spans = vec![
        Span::styled(format!(" {APP_TITLE}"), theme.title_style),
        Span::styled(" · ", theme.disclaimer_style),
        Span::styled(store.model().label(), theme.model_prefix_style),
    ];
    if store.is_loading() {
        spans.push(Span::styled(" · responding…", theme.thinking_style));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_transcript(f: &mut Frame, area: Rect, store: &MessageStore, ui: &mut UiState) {
    // One column of padding on each side.
    let inner = Rect {
        x: area.x + 1,
        width: area.width.saturating_sub(2),
        ..area
    };
    let lines = build_transcript_lines(
        store.messages(),
        store.model(),
        &ui.theme,
        ui.markdown,
        usize::from(inner.width.max(1)),
        ui.tick,
    );
    ui.update_scroll_bounds(lines.len(), inner.height);

    let transcript = Paragraph::new(lines).scroll((ui.scroll_offset, 0));
    f.render_widget(transcript, inner);
}

fn draw_input(f: &mut Frame, area: Rect, loading: bool, ui: &mut UiState) {
    let theme = ui.theme.clone();
    let focused = ui.focus == Focus::Input && !loading;
    let title = if loading {
        " Waiting for reply… "
    } else {
        " Message (Enter to send, Shift+Enter for newline) "
    };

    ui.textarea.set_block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(if focused {
                theme.input_border_style
            } else {
                theme.input_disabled_style
            })
            .title(Span::styled(title, theme.input_title_style)),
    );
    ui.textarea.set_style(if loading {
        theme.input_disabled_style
    } else {
        theme.input_text_style
    });
    ui.textarea.set_cursor_style(if focused {
        theme.input_cursor_style
    } else {
        theme.input_text_style
    });
    ui.textarea.set_cursor_line_style(theme.input_cursor_line_style);

    f.render_widget(&ui.textarea, area);
}

fn sidebar_line(item: SidebarItem, active_model: ModelId, theme: &Theme) -> Line<'static> {
    match item {
        SidebarItem::NewChat => Line::from(Span::styled(" + New chat", theme.sidebar_item_style)),
        SidebarItem::Model(model) => {
            let (bullet, style) = if model == active_model {
                ("●", theme.sidebar_active_style)
            } else {
                ("○", theme.sidebar_item_style)
            };
            Line::from(Span::styled(format!(" {bullet} {}", model.label()), style))
        }
    }
}

fn draw_sidebar(f: &mut Frame, area: Rect, store: &MessageStore, ui: &UiState) {
    let theme = &ui.theme;
    let focused = ui.focus == Focus::Sidebar;
    let block = Block::default()
        .borders(Borders::RIGHT)
        .border_style(if focused {
            theme.sidebar_focused_border_style
        } else {
            theme.sidebar_border_style
        });

    let mut lines = vec![
        Line::from(Span::styled(format!(" {APP_TITLE}"), theme.title_style)),
        Line::default(),
    ];
    for (idx, item) in SidebarItem::ALL.iter().enumerate() {
        if idx == 1 {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(" Model", theme.sidebar_heading_style)));
        }
        let mut line = sidebar_line(*item, store.model(), theme);
        if focused && idx == ui.sidebar_cursor {
            line = line.patch_style(theme.sidebar_cursor_style);
        }
        lines.push(line);
    }

    f.render_widget(Paragraph::new(lines).block(block), area);
}
