// TUI application state
//
// The App never touches the selection directly. It keeps a snapshot of the
// controller (refreshed every frame), the cursor position, overlays and
// toasts, and turns key presses into UiEvents for the dispatcher.

use super::input::InputHandler;
use super::modal::Modal;
use super::theme::Theme;
use super::toast::Toast;
use crate::events::{OpCompleted, UiEvent};
use crate::logging::LogBuffer;
use crate::selection::{BulkSelectStatus, ControllerView, SelectionController, SelectionError};
use crate::source::RecordId;
use std::collections::HashSet;
use std::sync::Arc;

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Main application state for the TUI
pub struct App {
    pub controller: Arc<SelectionController>,

    /// Snapshot the current frame renders from
    pub view: ControllerView,

    /// Row under the cursor on the visible page
    pub cursor: usize,

    pub modal: Option<Modal>,

    pub toast: Option<Toast>,

    pub log_buffer: LogBuffer,

    pub theme: Theme,

    pub should_quit: bool,

    input_handler: InputHandler,

    spinner_frame: usize,
}

impl App {
    pub fn new(controller: Arc<SelectionController>, log_buffer: LogBuffer) -> Self {
        let view = controller.view();
        Self {
            controller,
            view,
            cursor: 0,
            modal: None,
            toast: None,
            log_buffer,
            theme: Theme::default(),
            should_quit: false,
            input_handler: InputHandler::default(),
            spinner_frame: 0,
        }
    }

    /// Pull a fresh snapshot from the controller and keep the cursor in range
    pub fn refresh_view(&mut self) {
        self.view = self.controller.view();
        let rows = self.view.records.len();
        if rows == 0 {
            self.cursor = 0;
        } else if self.cursor >= rows {
            self.cursor = rows - 1;
        }
    }

    pub fn handle_key_press(&mut self, key: crossterm::event::KeyCode) -> bool {
        self.input_handler.press(key)
    }

    pub fn handle_key_release(&mut self, key: crossterm::event::KeyCode) {
        self.input_handler.release(key);
    }

    /// Advance the busy spinner and drop expired toasts
    pub fn tick(&mut self) {
        self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAMES.len();
        if self.toast.as_ref().is_some_and(Toast::is_expired) {
            self.toast = None;
        }
    }

    pub fn spinner(&self) -> &'static str {
        SPINNER_FRAMES[self.spinner_frame]
    }

    pub fn show_toast(&mut self, toast: Toast) {
        self.toast = Some(toast);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Cursor
    // ─────────────────────────────────────────────────────────────────────────

    pub fn cursor_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_down(&mut self) {
        if self.cursor + 1 < self.view.records.len() {
            self.cursor += 1;
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Selection events
    // ─────────────────────────────────────────────────────────────────────────

    /// Selection change for the page this frame shows
    fn page_toggle(&self, reported: HashSet<RecordId>) -> UiEvent {
        UiEvent::ToggledSelection {
            page_ids: self.view.page_ids(),
            shown: self.view.selected_on_page.clone(),
            reported,
        }
    }

    /// Selection the table would report after flipping the cursor row
    pub fn toggle_cursor_row(&self) -> Option<UiEvent> {
        let record = self.view.records.get(self.cursor)?;
        let mut reported = self.view.selected_on_page.clone();
        if !reported.remove(&record.id) {
            reported.insert(record.id);
        }
        Some(self.page_toggle(reported))
    }

    /// Header checkbox: select the whole page, or clear it if already full
    pub fn toggle_page(&self) -> Option<UiEvent> {
        if self.view.records.is_empty() {
            return None;
        }
        let all_selected = self.view.selected_on_page.len() == self.view.records.len();
        let reported: HashSet<_> = if all_selected {
            HashSet::new()
        } else {
            self.view.page_ids()
        };
        Some(self.page_toggle(reported))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Navigation events
    // ─────────────────────────────────────────────────────────────────────────

    pub fn next_page(&self) -> Option<UiEvent> {
        let next = self.view.current_page.checked_add(1)?;
        match self.view.last_page {
            Some(last) if next > last => None,
            _ => Some(UiEvent::RequestedPage(next)),
        }
    }

    pub fn prev_page(&self) -> Option<UiEvent> {
        (self.view.current_page > 1).then(|| UiEvent::RequestedPage(self.view.current_page - 1))
    }

    pub fn first_page(&self) -> Option<UiEvent> {
        (self.view.current_page != 1).then_some(UiEvent::RequestedPage(1))
    }

    pub fn last_page(&self) -> Option<UiEvent> {
        let last = self.view.last_page.filter(|&last| last >= 1)?;
        (self.view.current_page != last).then_some(UiEvent::RequestedPage(last))
    }

    pub fn open_bulk_select(&mut self) {
        self.modal = Some(Modal::bulk_select(self.controller.bulk_select_limit()));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Completions
    // ─────────────────────────────────────────────────────────────────────────

    /// Apply the result of a background operation
    pub fn handle_completion(&mut self, done: OpCompleted) {
        match done {
            OpCompleted::Navigated { page, result } => match result {
                Ok(()) => self.cursor = 0,
                Err(SelectionError::Busy) => {
                    self.show_toast(Toast::error("Busy: page request ignored"));
                }
                Err(e) => {
                    tracing::warn!("Navigation to page {} failed: {}", page, e);
                    self.show_toast(Toast::error(format!("✗ {}", e)));
                }
            },
            OpCompleted::BulkSelected(result) => {
                // Overlay is dismissed once the scan is over, whatever the outcome
                if matches!(self.modal, Some(Modal::BulkSelect(_))) {
                    self.modal = None;
                }
                match result {
                    Ok(report) => {
                        let toast = match report.status {
                            BulkSelectStatus::SourceUnavailable { .. } => {
                                Toast::error(format!("✗ {}", report.summary()))
                            }
                            _ => Toast::info(format!("✓ {}", report.summary())),
                        };
                        self.show_toast(toast);
                    }
                    Err(e) => self.show_toast(Toast::error(format!("✗ {}", e))),
                }
            }
        }
        self.refresh_view();
    }

    /// Show why a request was refused
    pub fn handle_rejection(&mut self, error: SelectionError) {
        if let Some(Modal::BulkSelect(input)) = &mut self.modal {
            input.pending = false;
        }
        let message = match error {
            SelectionError::Busy => "Busy: wait for the current request".to_string(),
            SelectionError::StaleView => "Page changed, selection not applied".to_string(),
            other => other.to_string(),
        };
        self.show_toast(Toast::error(message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Dispatched, Dispatcher};
    use crate::selection::{BulkSelectReport, SelectionSet};
    use crate::source::{InMemorySource, RecordSource};
    use tokio::sync::mpsc;

    async fn app_with_selection(total: u64, page: u32, selection: SelectionSet) -> App {
        let source: Arc<dyn RecordSource> = Arc::new(InMemorySource::new(total, 12));
        let controller = Arc::new(SelectionController::new(source).with_selection(selection));
        controller.go_to_page(page).await.unwrap();
        let mut app = App::new(controller, LogBuffer::new());
        app.refresh_view();
        app
    }

    async fn app_on_page(total: u64, page: u32) -> App {
        app_with_selection(total, page, SelectionSet::new()).await
    }

    fn dispatcher(app: &App) -> Dispatcher {
        let (tx, _rx) = mpsc::channel(1);
        Dispatcher::new(app.controller.clone(), tx)
    }

    fn reported(event: &Option<UiEvent>) -> &HashSet<RecordId> {
        match event {
            Some(UiEvent::ToggledSelection { reported, .. }) => reported,
            other => panic!("expected a selection event, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_toggle_cursor_row_reports_page_selection() {
        let mut app = app_on_page(30, 1).await;
        let dispatcher = dispatcher(&app);
        app.cursor_down();

        let event = app.toggle_cursor_row();
        assert_eq!(*reported(&event), [2].into_iter().collect());

        let result = dispatcher.dispatch(event.unwrap());
        assert_eq!(result, Dispatched::Applied { added: 1, removed: 0 });
        app.refresh_view();

        let event = app.toggle_cursor_row();
        assert!(reported(&event).is_empty());
    }

    #[tokio::test]
    async fn test_toggle_page_selects_then_clears() {
        let mut app = app_on_page(30, 3).await;
        let dispatcher = dispatcher(&app);

        let event = app.toggle_page();
        assert_eq!(reported(&event).len(), 6);

        dispatcher.dispatch(event.unwrap());
        app.refresh_view();
        let event = app.toggle_page();
        assert!(reported(&event).is_empty());
    }

    #[tokio::test]
    async fn test_toggle_from_outdated_frame_keeps_other_pages() {
        let mut app = app_with_selection(30, 1, [13, 14].into_iter().collect()).await;
        let dispatcher = dispatcher(&app);

        // Frame still shows page 1 while page 2 finishes loading
        let event = app.toggle_cursor_row();
        app.controller.go_to_page(2).await.unwrap();

        assert_eq!(
            dispatcher.dispatch(event.unwrap()),
            Dispatched::Rejected(SelectionError::StaleView)
        );
        assert_eq!(app.controller.selected_ids(), vec![13, 14]);

        app.controller.go_to_page(1).await.unwrap();
        app.refresh_view();
        dispatcher.dispatch(app.toggle_cursor_row().unwrap());
        assert_eq!(app.controller.selected_ids(), vec![1, 13, 14]);
    }

    #[tokio::test]
    async fn test_toggle_from_frame_before_bulk_insert_is_rejected() {
        let mut app = app_on_page(30, 1).await;
        let dispatcher = dispatcher(&app);
        app.cursor = 5;

        let event = app.toggle_cursor_row();
        app.controller.select_first_n(3, 1).await.unwrap();

        assert_eq!(
            dispatcher.dispatch(event.unwrap()),
            Dispatched::Rejected(SelectionError::StaleView)
        );
        assert_eq!(app.controller.selected_ids(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_page_bounds() {
        let app = app_on_page(30, 3).await;
        assert_eq!(app.next_page(), None);
        assert_eq!(app.prev_page(), Some(UiEvent::RequestedPage(2)));
        assert_eq!(app.first_page(), Some(UiEvent::RequestedPage(1)));
        assert_eq!(app.last_page(), None);

        let app = app_on_page(30, 1).await;
        assert_eq!(app.prev_page(), None);
        assert_eq!(app.last_page(), Some(UiEvent::RequestedPage(3)));
    }

    #[tokio::test]
    async fn test_bulk_completion_closes_overlay() {
        let mut app = app_on_page(30, 1).await;
        app.open_bulk_select();

        app.handle_completion(OpCompleted::BulkSelected(Ok(BulkSelectReport {
            target: 5,
            selected: 5,
            newly_selected: 5,
            pages_fetched: 1,
            status: BulkSelectStatus::TargetReached,
        })));

        assert!(app.modal.is_none());
        assert!(app.toast.is_some());
    }

    #[tokio::test]
    async fn test_cursor_clamped_after_refresh() {
        let mut app = app_on_page(30, 1).await;
        app.cursor = 11;
        app.controller.go_to_page(3).await.unwrap();
        app.refresh_view();
        assert_eq!(app.cursor, 5);
    }
}
