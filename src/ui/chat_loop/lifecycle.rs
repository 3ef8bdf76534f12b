use std::{error::Error, io};

use ratatui::backend::CrosstermBackend;
use ratatui::crossterm::{
    cursor::SetCursorStyle,
    event::{
        DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
        KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use ratatui::Terminal;

pub type ChatTerminal = Terminal<CrosstermBackend<io::Stdout>>;

/// Switch to raw mode on the alternate screen. Terminals that report
/// modifier-aware key events get them enabled so Shift+Enter can be told
/// apart from Enter.
pub fn setup_terminal() -> Result<(ChatTerminal, bool), Box<dyn Error>> {
    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableBracketedPaste,
        EnableMouseCapture,
        SetCursorStyle::SteadyBar
    )?;

    let enhanced = supports_keyboard_enhancement().unwrap_or(false);
    if enhanced {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        )?;
    }

    let terminal = Terminal::new(CrosstermBackend::new(stdout)).inspect_err(|_| {
        let _ = disable_raw_mode();
    })?;

    Ok((terminal, enhanced))
}

pub fn restore_terminal(terminal: &mut ChatTerminal, enhanced: bool) -> Result<(), Box<dyn Error>> {
    disable_raw_mode()?;
    if enhanced {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    execute!(
        terminal.backend_mut(),
        SetCursorStyle::DefaultUserShape,
        DisableMouseCapture,
        DisableBracketedPaste,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_and_restore_round_trip_when_a_terminal_is_present() {
        // Headless runs have no tty; only check the pair when setup succeeds.
        if let Ok((mut terminal, enhanced)) = setup_terminal() {
            assert!(restore_terminal(&mut terminal, enhanced).is_ok());
        }
    }
}
