//! Maps key presses to UI actions.
//!
//! The mapping is a pure function of the key and a small context so it can
//! be tested without a terminal.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::ui::state::{Focus, UiState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    Submit,
    InsertNewline,
    ToggleSidebar,
    ToggleFocus,
    NewChat,
    ScrollUp(u16),
    ScrollDown(u16),
    PageUp,
    PageDown,
    SidebarUp,
    SidebarDown,
    SidebarActivate,
    /// Hand the key to the input editor.
    Edit,
    Ignore,
}

#[derive(Debug, Clone, Copy)]
pub struct KeyContext {
    pub focus: Focus,
    pub input_empty: bool,
    pub loading: bool,
}

impl KeyContext {
    pub fn new(ui: &UiState, loading: bool) -> Self {
        Self {
            focus: ui.focus,
            input_empty: ui.input_is_empty(),
            loading,
        }
    }
}

pub fn map_key(key: &KeyEvent, ctx: KeyContext) -> KeyAction {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Char('c') if ctrl => return KeyAction::Quit,
        KeyCode::Char('b') if ctrl => return KeyAction::ToggleSidebar,
        KeyCode::Char('n') if ctrl => return KeyAction::NewChat,
        KeyCode::Tab | KeyCode::BackTab => return KeyAction::ToggleFocus,
        KeyCode::PageUp => return KeyAction::PageUp,
        KeyCode::PageDown => return KeyAction::PageDown,
        _ => {}
    }

    match ctx.focus {
        Focus::Sidebar => map_sidebar_key(key),
        Focus::Input => map_input_key(key, ctx),
    }
}

fn map_sidebar_key(key: &KeyEvent) -> KeyAction {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => KeyAction::SidebarUp,
        KeyCode::Down | KeyCode::Char('j') => KeyAction::SidebarDown,
        KeyCode::Enter | KeyCode::Char(' ') => KeyAction::SidebarActivate,
        KeyCode::Esc => KeyAction::ToggleFocus,
        _ => KeyAction::Ignore,
    }
}

fn map_input_key(key: &KeyEvent, ctx: KeyContext) -> KeyAction {
    let newline_modifier = key
        .modifiers
        .intersects(KeyModifiers::SHIFT | KeyModifiers::ALT);

    let action = match key.code {
        KeyCode::Enter if newline_modifier => KeyAction::InsertNewline,
        KeyCode::Enter => KeyAction::Submit,
        KeyCode::Up if ctx.input_empty => return KeyAction::ScrollUp(1),
        KeyCode::Down if ctx.input_empty => return KeyAction::ScrollDown(1),
        _ => KeyAction::Edit,
    };

    // The input is read-only while a reply streams in.
    if ctx.loading {
        KeyAction::Ignore
    } else {
        action
    }
}
