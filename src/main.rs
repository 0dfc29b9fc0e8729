// pagesel - cross-page selection over a server-paginated record collection
//
// Browses a remote collection one page at a time while keeping a selection
// that survives page changes, and can select "the first N rows" across
// however many pages that takes.
//
// Architecture:
// - Source: fetches pages from the remote API (or an in-memory demo collection)
// - Selection: the controller owning the selection set, page cache and pagination
// - Events: UI events routed to the controller, background results sent back over mpsc
// - TUI (ratatui): table, status, overlays
// - CLI: headless page dump and bulk select, config management

mod cli;
mod config;
mod events;
mod logging;
mod selection;
mod source;
mod tui;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use logging::{LogBuffer, LogTarget};
use selection::SelectionController;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config management never touches the source or the terminal
    if let Some(Commands::Config { show, path, reset }) = cli.command {
        return cli::handle_config(show, path, reset);
    }

    // Ensure config template exists (helps users discover options)
    Config::ensure_config_exists();

    let mut config = Config::from_env()?;
    if cli.demo {
        config.demo_mode = true;
    }

    // In TUI mode logs go to the in-app pane so they don't garble the display
    let log_buffer = LogBuffer::new();
    let target = if cli.command.is_none() {
        LogTarget::Tui
    } else {
        LogTarget::Stderr
    };
    let file_guard = logging::init(&config.logging, target, &log_buffer);

    tracing::info!(
        "pagesel v{} starting (page size {}, demo: {})",
        config::VERSION,
        config.page_size,
        config.demo_mode
    );

    let source = source::create_source(&config)?;
    let controller =
        Arc::new(SelectionController::new(source).with_bulk_select_limit(config.bulk_select_limit));

    match cli.command {
        None => tui::run_tui(controller, log_buffer).await,
        Some(Commands::Page { page }) => cli::handle_page(&controller, page).await,
        Some(Commands::Select { count, start_page }) => {
            if !cli::handle_select(&controller, count, start_page).await? {
                // exit() skips destructors; flush file logs first
                drop(file_guard);
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Commands::Config { .. }) => Ok(()),
    }
}
