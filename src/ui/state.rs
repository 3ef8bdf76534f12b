//! View state of the interactive UI: input buffer, sidebar, focus, scroll.
//!
//! Conversation data lives in the [`MessageStore`](crate::core::store::MessageStore);
//! nothing here outlives a redraw except what the user is typing and where
//! they are looking.

use tui_textarea::TextArea;

use crate::core::models::ModelId;
use crate::ui::theme::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Input,
    Sidebar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidebarItem {
    NewChat,
    Model(ModelId),
}

impl SidebarItem {
    pub const ALL: [SidebarItem; 3] = [
        SidebarItem::NewChat,
        SidebarItem::Model(ModelId::Flash),
        SidebarItem::Model(ModelId::Pro),
    ];
}

pub struct UiState {
    pub textarea: TextArea<'static>,
    pub theme: Theme,
    pub markdown: bool,
    pub sidebar_open: bool,
    pub focus: Focus,
    pub sidebar_cursor: usize,
    /// First transcript line shown, counted from the top.
    pub scroll_offset: u16,
    /// Follow the newest line; cleared when the user scrolls up.
    pub auto_scroll: bool,
    /// Largest valid `scroll_offset` for the last drawn frame.
    pub max_scroll: u16,
    /// Transcript viewport height of the last drawn frame.
    pub viewport_height: u16,
    /// Animation frame of the thinking indicator.
    pub tick: usize,
}

impl UiState {
    pub fn new(theme: Theme, markdown: bool) -> Self {
        Self {
            textarea: TextArea::default(),
            theme,
            markdown,
            sidebar_open: true,
            focus: Focus::Input,
            sidebar_cursor: 0,
            scroll_offset: 0,
            auto_scroll: true,
            max_scroll: 0,
            viewport_height: 0,
            tick: 0,
        }
    }

    pub fn input_text(&self) -> String {
        self.textarea.lines().join("\n")
    }

    pub fn input_is_empty(&self) -> bool {
        self.textarea.lines().iter().all(|line| line.is_empty())
    }

    pub fn clear_input(&mut self) {
        self.textarea = TextArea::default();
    }

    pub fn toggle_sidebar(&mut self) {
        self.sidebar_open = !self.sidebar_open;
        if !self.sidebar_open {
            self.focus = Focus::Input;
        }
    }

    /// Move focus between the input and the sidebar, opening the sidebar
    /// when it is hidden.
    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Input => {
                self.sidebar_open = true;
                Focus::Sidebar
            }
            Focus::Sidebar => Focus::Input,
        };
    }

    pub fn sidebar_up(&mut self) {
        self.sidebar_cursor = self.sidebar_cursor.saturating_sub(1);
    }

    pub fn sidebar_down(&mut self) {
        self.sidebar_cursor = (self.sidebar_cursor + 1).min(SidebarItem::ALL.len() - 1);
    }

    pub fn selected_item(&self) -> SidebarItem {
        SidebarItem::ALL[self.sidebar_cursor.min(SidebarItem::ALL.len() - 1)]
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.auto_scroll = false;
        self.scroll_offset = self.scroll_offset.min(self.max_scroll).saturating_sub(lines);
    }

    /// Scroll towards the newest line; reaching the bottom re-enables
    /// auto-scroll.
    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll_offset = self.scroll_offset.saturating_add(lines).min(self.max_scroll);
        if self.scroll_offset >= self.max_scroll {
            self.auto_scroll = true;
        }
    }

    pub fn page_up(&mut self) {
        self.scroll_up(self.viewport_height.saturating_sub(1).max(1));
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.viewport_height.saturating_sub(1).max(1));
    }

    pub fn scroll_to_bottom(&mut self) {
        self.auto_scroll = true;
        self.scroll_offset = self.max_scroll;
    }

    /// Record the geometry of a freshly laid out transcript and settle the
    /// offset for this frame.
    pub fn update_scroll_bounds(&mut self, total_lines: usize, viewport_height: u16) {
        let total = u16::try_from(total_lines).unwrap_or(u16::MAX);
        self.viewport_height = viewport_height;
        self.max_scroll = total.saturating_sub(viewport_height);
        if self.auto_scroll {
            self.scroll_offset = self.max_scroll;
        } else {
            self.scroll_offset = self.scroll_offset.min(self.max_scroll);
        }
    }
}
