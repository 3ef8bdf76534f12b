use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone)]
pub struct Theme {
    // Overall background color to paint the full frame
    pub background_color: Color,

    // Chat message styles
    pub user_prefix_style: Style,
    pub user_text_style: Style,
    pub model_prefix_style: Style,
    pub model_text_style: Style,
    pub error_text_style: Style,
    pub error_caption_style: Style,
    pub thinking_style: Style,

    // Markdown
    pub heading_style: Style,
    pub inline_code_style: Style,
    pub code_block_style: Style,
    pub code_caption_style: Style,
    pub link_style: Style,
    pub quote_style: Style,
    pub rule_style: Style,
    pub list_marker_style: Style,

    // Chrome
    pub title_style: Style,
    pub disclaimer_style: Style,
    pub sidebar_border_style: Style,
    pub sidebar_focused_border_style: Style,
    pub sidebar_heading_style: Style,
    pub sidebar_item_style: Style,
    pub sidebar_active_style: Style,
    pub sidebar_cursor_style: Style,

    // Input area
    pub input_border_style: Style,
    pub input_title_style: Style,
    pub input_text_style: Style,
    pub input_disabled_style: Style,
    pub input_cursor_style: Style,
    pub input_cursor_line_style: Style,
}

impl Theme {
    pub fn dark_default() -> Self {
        let accent = Color::Rgb(138, 180, 248);
        let muted = Color::Rgb(128, 134, 139);
        Theme {
            background_color: Color::Rgb(19, 19, 20),

            user_prefix_style: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            user_text_style: Style::default().fg(Color::Rgb(227, 227, 227)),
            model_prefix_style: Style::default().fg(accent).add_modifier(Modifier::BOLD),
            model_text_style: Style::default().fg(Color::Rgb(227, 227, 227)),
            error_text_style: Style::default().fg(Color::Rgb(242, 139, 130)),
            error_caption_style: Style::default()
                .fg(Color::Rgb(242, 139, 130))
                .add_modifier(Modifier::ITALIC),
            thinking_style: Style::default().fg(accent),

            heading_style: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            inline_code_style: Style::default()
                .fg(Color::Rgb(253, 214, 99))
                .bg(Color::Rgb(40, 42, 46)),
            code_block_style: Style::default()
                .fg(Color::Rgb(215, 218, 224))
                .bg(Color::Rgb(30, 31, 32)),
            code_caption_style: Style::default().fg(muted).add_modifier(Modifier::ITALIC),
            link_style: Style::default()
                .fg(accent)
                .add_modifier(Modifier::UNDERLINED),
            quote_style: Style::default().fg(muted).add_modifier(Modifier::ITALIC),
            rule_style: Style::default().fg(muted),
            list_marker_style: Style::default().fg(accent),

            title_style: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            disclaimer_style: Style::default().fg(muted),
            sidebar_border_style: Style::default().fg(Color::Rgb(60, 64, 67)),
            sidebar_focused_border_style: Style::default().fg(accent),
            sidebar_heading_style: Style::default().fg(muted).add_modifier(Modifier::BOLD),
            sidebar_item_style: Style::default().fg(Color::Rgb(196, 199, 197)),
            sidebar_active_style: Style::default().fg(accent).add_modifier(Modifier::BOLD),
            sidebar_cursor_style: Style::default().add_modifier(Modifier::REVERSED),

            input_border_style: Style::default().fg(Color::Rgb(95, 99, 104)),
            input_title_style: Style::default().fg(muted),
            input_text_style: Style::default().fg(Color::White),
            input_disabled_style: Style::default().fg(muted).add_modifier(Modifier::DIM),
            input_cursor_style: Style::default().add_modifier(Modifier::REVERSED),
            input_cursor_line_style: Style::default(),
        }
    }

    /// Attribute-only theme for output that is not drawn by the UI.
    pub fn monochrome() -> Self {
        let plain = Style::default();
        let bold = plain.add_modifier(Modifier::BOLD);
        let italic = plain.add_modifier(Modifier::ITALIC);
        Theme {
            background_color: Color::Reset,

            user_prefix_style: bold,
            user_text_style: plain,
            model_prefix_style: bold,
            model_text_style: plain,
            error_text_style: plain,
            error_caption_style: italic,
            thinking_style: plain,

            heading_style: bold,
            inline_code_style: plain,
            code_block_style: plain,
            code_caption_style: italic,
            link_style: plain.add_modifier(Modifier::UNDERLINED),
            quote_style: italic,
            rule_style: plain,
            list_marker_style: plain,

            title_style: bold,
            disclaimer_style: plain,
            sidebar_border_style: plain,
            sidebar_focused_border_style: bold,
            sidebar_heading_style: bold,
            sidebar_item_style: plain,
            sidebar_active_style: bold,
            sidebar_cursor_style: plain.add_modifier(Modifier::REVERSED),

            input_border_style: plain,
            input_title_style: plain,
            input_text_style: plain,
            input_disabled_style: plain.add_modifier(Modifier::DIM),
            input_cursor_style: plain.add_modifier(Modifier::REVERSED),
            input_cursor_line_style: plain,
        }
    }
}
