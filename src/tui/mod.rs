// TUI module - Terminal User Interface
//
// This module manages the terminal UI using ratatui. It handles:
// - Terminal initialization and cleanup
// - Event loop (keyboard input, timer ticks, finished background operations)
// - Turning key presses into UiEvents for the dispatcher

pub mod app;
pub mod clipboard;
pub mod input;
pub mod modal;
pub mod theme;
pub mod toast;
pub mod ui;

use crate::events::{Dispatched, Dispatcher, OpCompleted, UiEvent};
use crate::logging::LogBuffer;
use crate::selection::SelectionController;
use anyhow::{Context, Result};
use app::App;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use modal::{Modal, ModalAction};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use toast::Toast;

/// Run the TUI until the user quits
pub async fn run_tui(controller: Arc<SelectionController>, log_buffer: LogBuffer) -> Result<()> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to setup terminal")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    let (done_tx, mut done_rx) = mpsc::channel(16);
    let dispatcher = Dispatcher::new(controller.clone(), done_tx);
    let mut app = App::new(controller, log_buffer);

    // First page load
    submit(&mut app, &dispatcher, UiEvent::RequestedPage(1));

    let result = run_event_loop(&mut terminal, &mut app, &dispatcher, &mut done_rx).await;

    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to restore terminal")?;
    terminal.show_cursor().context("Failed to show cursor")?;

    result
}

/// Main event loop
///
/// Waits on keyboard input, a redraw tick and completions of background
/// operations, whichever comes first.
async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    dispatcher: &Dispatcher,
    done_rx: &mut mpsc::Receiver<OpCompleted>,
) -> Result<()> {
    let mut tick_interval = tokio::time::interval(Duration::from_millis(200));

    loop {
        app.refresh_view();
        terminal
            .draw(|f| ui::draw(f, app))
            .context("Failed to draw terminal")?;

        tokio::select! {
            _ = async {
                if event::poll(Duration::from_millis(10)).unwrap_or(false) {
                    if let Ok(Event::Key(key_event)) = event::read() {
                        handle_key_event(app, dispatcher, key_event);
                    }
                }
            } => {}

            _ = tick_interval.tick() => {
                app.tick();
            }

            Some(done) = done_rx.recv() => {
                app.handle_completion(done);
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Hand an event to the dispatcher and reflect the immediate answer
fn submit(app: &mut App, dispatcher: &Dispatcher, event: UiEvent) {
    match dispatcher.dispatch(event) {
        Dispatched::Applied { added, removed } => {
            tracing::debug!("Selection changed: +{} -{}", added, removed);
        }
        Dispatched::Started => {}
        Dispatched::Rejected(e) => {
            tracing::debug!("Request rejected: {}", e);
            app.handle_rejection(e);
        }
    }
    app.refresh_view();
}

/// Handle keyboard input
/// Layered dispatch: Modal → Global
fn handle_key_event(app: &mut App, dispatcher: &Dispatcher, key_event: KeyEvent) {
    match key_event.kind {
        KeyEventKind::Release => {
            app.handle_key_release(key_event.code);
            return;
        }
        KeyEventKind::Press | KeyEventKind::Repeat => {}
    }

    // Ctrl+C quits from anywhere
    if key_event.modifiers.contains(KeyModifiers::CONTROL) && key_event.code == KeyCode::Char('c')
    {
        app.should_quit = true;
        return;
    }

    if handle_modal_input(app, dispatcher, key_event.code) {
        return;
    }

    let key = key_event.code;
    if !app.handle_key_press(key) {
        return;
    }

    let event = match key {
        KeyCode::Char('q') => {
            app.should_quit = true;
            None
        }
        KeyCode::Char('?') => {
            app.modal = Some(Modal::help());
            None
        }
        KeyCode::Up | KeyCode::Char('k') => {
            app.cursor_up();
            None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.cursor_down();
            None
        }
        KeyCode::Char(' ') => app.toggle_cursor_row(),
        KeyCode::Char('a') => app.toggle_page(),
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('n') => app.next_page(),
        KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('p') => app.prev_page(),
        KeyCode::Home => app.first_page(),
        KeyCode::End => app.last_page(),
        KeyCode::Char('s') => {
            if app.view.busy {
                app.handle_rejection(crate::selection::SelectionError::Busy);
            } else {
                app.open_bulk_select();
            }
            None
        }
        KeyCode::Char('y') => {
            copy_selection(app);
            None
        }
        _ => None,
    };

    if let Some(event) = event {
        submit(app, dispatcher, event);
    }
}

/// Layer 1: an open modal captures all input
fn handle_modal_input(app: &mut App, dispatcher: &Dispatcher, key: KeyCode) -> bool {
    let Some(modal) = app.modal.as_mut() else {
        return false;
    };

    match modal.handle_input(key) {
        ModalAction::None => {}
        ModalAction::Close => app.modal = None,
        ModalAction::SubmitBulkSelect(n) => {
            submit(app, dispatcher, UiEvent::RequestedBulkSelect(n));
        }
    }
    true
}

fn copy_selection(app: &mut App) {
    let ids = app.controller.selected_ids();
    if ids.is_empty() {
        app.show_toast(Toast::info("Nothing selected"));
        return;
    }
    match clipboard::copy_to_clipboard(&clipboard::format_ids(&ids)) {
        Ok(()) => app.show_toast(Toast::info(format!("✓ Copied {} ids", ids.len()))),
        Err(e) => {
            tracing::warn!("Clipboard copy failed: {:#}", e);
            app.show_toast(Toast::error("✗ Clipboard unavailable"));
        }
    }
}
