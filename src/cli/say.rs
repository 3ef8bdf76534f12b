//! TUI-less "say" command

use std::error::Error;
use std::io::{self, Write};

use ratatui::crossterm::terminal;
use thiserror::Error;
use tracing::info;

use crate::core::session::ChatError;
use crate::core::store::MessageStore;
use crate::ui::markdown::{render_markdown, spans_text};
use crate::ui::theme::Theme;

const FALLBACK_WIDTH: usize = 100;

#[derive(Debug, Error)]
pub enum SayError {
    #[error("prompt was rejected")]
    Rejected,
    #[error(transparent)]
    Reply(#[from] ChatError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Send `prompt` and write the reply to `out`.
///
/// Plain output is written fragment by fragment as it arrives. With
/// `markdown` set the finished reply is rendered once at `width` columns.
pub async fn write_reply<W: Write>(
    store: &mut MessageStore,
    prompt: &str,
    markdown: bool,
    width: usize,
    out: &mut W,
) -> Result<(), SayError> {
    let reply = store.submit(prompt).ok_or(SayError::Rejected)?;
    info!(model = %store.model(), markdown, "say");

    let mut write_error = None;
    let result = store
        .drive_with(reply, |fragment| {
            if markdown || write_error.is_some() {
                return;
            }
            if let Err(err) = write!(out, "{fragment}").and_then(|_| out.flush()) {
                write_error = Some(err);
            }
        })
        .await;

    if let Some(err) = write_error {
        return Err(err.into());
    }
    result?;

    if markdown {
        let reply = store
            .messages()
            .last()
            .map(|message| message.content.clone())
            .unwrap_or_default();
        for line in render_markdown(&reply, &Theme::monochrome(), width) {
            writeln!(out, "{}", spans_text(&line))?;
        }
    } else {
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

pub async fn run_say(
    mut store: MessageStore,
    prompt: &str,
    markdown: bool,
) -> Result<(), Box<dyn Error>> {
    let width = terminal::size()
        .ok()
        .map(|(w, _)| w as usize)
        .unwrap_or(FALLBACK_WIDTH);
    let mut stdout = io::stdout();

    match write_reply(&mut store, prompt, markdown, width, &mut stdout).await {
        Ok(()) => Ok(()),
        Err(SayError::Reply(err)) => {
            eprintln!("\n\n❌ Error: {err}");
            std::process::exit(1);
        }
        Err(err) => Err(err.into()),
    }
}
