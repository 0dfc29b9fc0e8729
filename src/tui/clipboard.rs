//! Clipboard export of the selection
//!
//! Uses `arboard` for cross-platform support. The clipboard handle is created
//! per copy so nothing is held between key presses.

use crate::source::RecordId;
use anyhow::{Context, Result};
use arboard::Clipboard;

/// Copy text to the system clipboard
///
/// Fails without a display server (headless Linux) or when access is denied.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard = Clipboard::new().context("Failed to access clipboard")?;
    clipboard
        .set_text(text)
        .context("Failed to set clipboard text")
}

/// Comma-separated ids, ready to paste into a query
pub fn format_ids(ids: &[RecordId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
