//! Main chat event loop
//!
//! Terminal events are read on a background task and forwarded over a
//! channel. The loop drains those events and the reply stream channel,
//! applies them to the store and the view state, and redraws when anything
//! changed.

mod keybindings;
mod lifecycle;

use std::{
    error::Error,
    time::{Duration, Instant},
};

use ratatui::crossterm::event::{self, Event, KeyEvent, KeyEventKind, MouseEventKind};
use tokio::sync::mpsc;
use tracing::{debug, info};

use self::keybindings::{map_key, KeyAction, KeyContext};
use self::lifecycle::{restore_terminal, setup_terminal};
use crate::core::chat_stream::{ChatStreamService, StreamMessage};
use crate::core::store::MessageStore;
use crate::ui::renderer::draw;
use crate::ui::state::{SidebarItem, UiState};
use crate::ui::theme::Theme;

const MAX_FPS: u64 = 60;
const THINKING_FRAME_INTERVAL: Duration = Duration::from_millis(250);
const MOUSE_SCROLL_LINES: u16 = 3;

#[derive(Debug)]
enum UiEvent {
    Crossterm(Event),
}

/// What the loop should do after an input event was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopControl {
    Continue,
    Redraw,
    Exit,
}

pub async fn run_chat(mut store: MessageStore, markdown: bool) -> Result<(), Box<dyn Error>> {
    let mut ui = UiState::new(Theme::dark_default(), markdown);

    let (mut terminal, enhanced_keys) = setup_terminal()?;
    let (stream_service, mut rx) = ChatStreamService::new();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<UiEvent>();

    let event_reader_handle = tokio::spawn(async move {
        loop {
            if let Ok(true) = event::poll(Duration::from_millis(10)) {
                match event::read() {
                    Ok(ev) => {
                        if event_tx.send(UiEvent::Crossterm(ev)).is_err() {
                            break;
                        }
                    }
                    Err(_) => continue,
                }
            } else {
                tokio::task::yield_now().await;
            }
        }
    });

    let frame_duration = Duration::from_millis(1000 / MAX_FPS);
    let mut request_redraw = true;
    let mut last_draw = Instant::now() - frame_duration;
    let mut last_tick = Instant::now();

    let result: Result<(), Box<dyn Error>> = 'main_loop: loop {
        if request_redraw && last_draw.elapsed() >= frame_duration {
            if let Err(err) = terminal.draw(|f| draw(f, &store, &mut ui)) {
                break 'main_loop Err(err.into());
            }
            request_redraw = false;
            last_draw = Instant::now();
        }

        let mut events_processed = false;
        while let Ok(UiEvent::Crossterm(ev)) = event_rx.try_recv() {
            events_processed = true;
            match handle_event(ev, &mut store, &mut ui, &stream_service) {
                LoopControl::Exit => break 'main_loop Ok(()),
                LoopControl::Redraw => request_redraw = true,
                LoopControl::Continue => {}
            }
        }

        let received_any = drain_stream_updates(&mut store, &mut rx);
        if received_any {
            request_redraw = true;
        }

        if store.is_loading() && last_tick.elapsed() >= THINKING_FRAME_INTERVAL {
            ui.tick = ui.tick.wrapping_add(1);
            last_tick = Instant::now();
            request_redraw = true;
        }

        if !events_processed && !received_any && !request_redraw {
            tokio::time::sleep(Duration::from_millis(16)).await;
        }
    };

    event_reader_handle.abort();
    restore_terminal(&mut terminal, enhanced_keys)?;
    info!("chat closed");

    result
}

fn handle_event(
    ev: Event,
    store: &mut MessageStore,
    ui: &mut UiState,
    stream_service: &ChatStreamService,
) -> LoopControl {
    match ev {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
            let ctx = KeyContext::new(ui, store.is_loading());
            let action = map_key(&key, ctx);
            handle_key_action(action, key, store, ui, stream_service)
        }
        Event::Mouse(mouse) => match mouse.kind {
            MouseEventKind::ScrollUp => {
                ui.scroll_up(MOUSE_SCROLL_LINES);
                LoopControl::Redraw
            }
            MouseEventKind::ScrollDown => {
                ui.scroll_down(MOUSE_SCROLL_LINES);
                LoopControl::Redraw
            }
            _ => LoopControl::Continue,
        },
        Event::Paste(text) => {
            if store.is_loading() {
                return LoopControl::Continue;
            }
            ui.textarea.insert_str(text.replace('\r', "\n"));
            LoopControl::Redraw
        }
        Event::Resize(..) => LoopControl::Redraw,
        _ => LoopControl::Continue,
    }
}

fn handle_key_action(
    action: KeyAction,
    key: KeyEvent,
    store: &mut MessageStore,
    ui: &mut UiState,
    stream_service: &ChatStreamService,
) -> LoopControl {
    match action {
        KeyAction::Quit => return LoopControl::Exit,
        KeyAction::Submit => submit_input(store, ui, stream_service),
        KeyAction::InsertNewline => ui.textarea.insert_newline(),
        KeyAction::ToggleSidebar => ui.toggle_sidebar(),
        KeyAction::ToggleFocus => ui.toggle_focus(),
        KeyAction::NewChat => {
            store.new_chat();
            ui.scroll_to_bottom();
        }
        KeyAction::ScrollUp(lines) => ui.scroll_up(lines),
        KeyAction::ScrollDown(lines) => ui.scroll_down(lines),
        KeyAction::PageUp => ui.page_up(),
        KeyAction::PageDown => ui.page_down(),
        KeyAction::SidebarUp => ui.sidebar_up(),
        KeyAction::SidebarDown => ui.sidebar_down(),
        KeyAction::SidebarActivate => activate_sidebar_item(store, ui),
        KeyAction::Edit => {
            if !ui.textarea.input(key) {
                return LoopControl::Continue;
            }
        }
        KeyAction::Ignore => return LoopControl::Continue,
    }
    LoopControl::Redraw
}

fn submit_input(store: &mut MessageStore, ui: &mut UiState, stream_service: &ChatStreamService) {
    let text = ui.input_text();
    let Some(reply) = store.submit(&text) else {
        return;
    };
    ui.clear_input();
    ui.scroll_to_bottom();
    debug!(stream_id = reply.stream_id, "dispatching reply stream");
    stream_service.spawn_stream(reply.stream_id, reply.cancel_token, reply.fragments);
}

fn activate_sidebar_item(store: &mut MessageStore, ui: &mut UiState) {
    match ui.selected_item() {
        SidebarItem::NewChat => store.new_chat(),
        SidebarItem::Model(model) => {
            store.switch_model(model);
        }
    }
    ui.scroll_to_bottom();
}

/// Apply every queued stream message. Returns whether any arrived.
fn drain_stream_updates(
    store: &mut MessageStore,
    rx: &mut mpsc::UnboundedReceiver<(StreamMessage, u64)>,
) -> bool {
    let mut received_any = false;
    while let Ok((message, stream_id)) = rx.try_recv() {
        received_any = true;
        store.apply_stream_message(stream_id, message);
    }
    received_any
}
