// Presentation events and their dispatch to the selection controller
//
// The presentation layer never mutates the selection itself. It reports what
// the user did as a UiEvent; the dispatcher turns that into a controller call.
// Row toggles are applied synchronously. Page loads and bulk selects take the
// controller's busy flag here, then run on a spawned task and report back
// through an mpsc channel as OpCompleted, so the UI loop keeps drawing while
// the fetches are in flight.

use crate::selection::{BulkSelectReport, SelectionController, SelectionError};
use crate::source::RecordId;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;

/// What the user asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// Ids now shown as selected on the visible page
    ToggledSelection {
        /// Ids of the page the user was looking at
        page_ids: HashSet<RecordId>,
        /// Ids on that page shown as selected before the change
        shown: HashSet<RecordId>,
        /// Ids on that page shown as selected after the change
        reported: HashSet<RecordId>,
    },
    /// Navigate to a 1-based page
    RequestedPage(u32),
    /// Select the first N rows, starting from the visible page
    RequestedBulkSelect(i64),
}

/// Result of an operation that ran in the background
#[derive(Debug, Clone)]
pub enum OpCompleted {
    Navigated {
        page: u32,
        result: Result<(), SelectionError>,
    },
    BulkSelected(Result<BulkSelectReport, SelectionError>),
}

/// Immediate answer to a dispatched event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    /// Applied synchronously; `added`/`removed` ids on the visible page
    Applied { added: usize, removed: usize },
    /// Running in the background; an OpCompleted will follow
    Started,
    /// Rejected without side effects
    Rejected(SelectionError),
}

/// Routes presentation events to the controller
#[derive(Clone)]
pub struct Dispatcher {
    controller: Arc<SelectionController>,
    done_tx: mpsc::Sender<OpCompleted>,
}

impl Dispatcher {
    pub fn new(controller: Arc<SelectionController>, done_tx: mpsc::Sender<OpCompleted>) -> Self {
        Self {
            controller,
            done_tx,
        }
    }

    #[allow(dead_code)] // Used by tests
    pub fn controller(&self) -> &Arc<SelectionController> {
        &self.controller
    }

    pub fn dispatch(&self, event: UiEvent) -> Dispatched {
        match event {
            UiEvent::ToggledSelection {
                page_ids,
                shown,
                reported,
            } => match self.controller.reconcile(&page_ids, &shown, &reported) {
                Ok(delta) => Dispatched::Applied {
                    added: delta.added,
                    removed: delta.removed,
                },
                Err(e) => Dispatched::Rejected(e),
            },
            UiEvent::RequestedPage(page) => {
                // The flag is taken before spawning, so Started means the
                // task owns it and no other request can slip in first
                let busy = match self.controller.try_begin() {
                    Ok(busy) => busy,
                    Err(e) => return Dispatched::Rejected(e),
                };
                let controller = self.controller.clone();
                let done_tx = self.done_tx.clone();
                tokio::spawn(async move {
                    let result = controller.load_page(page, busy).await;
                    let _ = done_tx.send(OpCompleted::Navigated { page, result }).await;
                });
                Dispatched::Started
            }
            UiEvent::RequestedBulkSelect(n) => {
                if n < 1 {
                    return Dispatched::Rejected(SelectionError::InvalidArgument(format!(
                        "row count must be at least 1 (got {})",
                        n
                    )));
                }
                let busy = match self.controller.try_begin() {
                    Ok(busy) => busy,
                    Err(e) => return Dispatched::Rejected(e),
                };
                let start_page = self.controller.pagination().current_page;
                let controller = self.controller.clone();
                let done_tx = self.done_tx.clone();
                tokio::spawn(async move {
                    let result = controller.scan_first_n(n, start_page, busy).await;
                    let _ = done_tx.send(OpCompleted::BulkSelected(result)).await;
                });
                Dispatched::Started
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{InMemorySource, RecordSource};
    use std::time::Duration;

    fn setup(source: InMemorySource) -> (Dispatcher, mpsc::Receiver<OpCompleted>) {
        let source: Arc<dyn RecordSource> = Arc::new(source);
        let controller = Arc::new(SelectionController::new(source));
        let (tx, rx) = mpsc::channel(8);
        (Dispatcher::new(controller, tx), rx)
    }

    fn toggle(view: &crate::selection::ControllerView, reported: &[RecordId]) -> UiEvent {
        UiEvent::ToggledSelection {
            page_ids: view.page_ids(),
            shown: view.selected_on_page.clone(),
            reported: reported.iter().copied().collect(),
        }
    }

    #[tokio::test]
    async fn test_page_request_completes() {
        let (dispatcher, mut rx) = setup(InMemorySource::new(50, 12));

        assert_eq!(dispatcher.dispatch(UiEvent::RequestedPage(2)), Dispatched::Started);

        match rx.recv().await {
            Some(OpCompleted::Navigated { page: 2, result }) => assert!(result.is_ok()),
            other => panic!("unexpected completion: {:?}", other),
        }
        assert_eq!(dispatcher.controller().view().records[0].id, 13);
    }

    #[tokio::test]
    async fn test_toggle_applies_synchronously() {
        let (dispatcher, mut rx) = setup(InMemorySource::new(50, 12));
        dispatcher.dispatch(UiEvent::RequestedPage(1));
        rx.recv().await;

        let view = dispatcher.controller().view();
        let result = dispatcher.dispatch(toggle(&view, &[3, 4]));

        assert_eq!(result, Dispatched::Applied { added: 2, removed: 0 });
        assert_eq!(dispatcher.controller().selected_ids(), vec![3, 4]);
    }

    #[tokio::test]
    async fn test_toggle_against_replaced_page_is_rejected() {
        let (dispatcher, mut rx) = setup(InMemorySource::new(50, 12));
        dispatcher.dispatch(UiEvent::RequestedPage(2));
        rx.recv().await;
        let page_two = dispatcher.controller().view();
        dispatcher.dispatch(toggle(&page_two, &[13, 14]));

        let page_one = {
            dispatcher.dispatch(UiEvent::RequestedPage(1));
            rx.recv().await;
            dispatcher.controller().view()
        };
        // Page 2 comes back before the toggle made on page 1 is handled
        dispatcher.dispatch(UiEvent::RequestedPage(2));
        rx.recv().await;

        assert_eq!(
            dispatcher.dispatch(toggle(&page_one, &[1])),
            Dispatched::Rejected(SelectionError::StaleView)
        );
        assert_eq!(dispatcher.controller().selected_ids(), vec![13, 14]);
    }

    #[tokio::test]
    async fn test_back_to_back_requests_answered_immediately() {
        let (dispatcher, mut rx) = setup(InMemorySource::new(50, 12));

        // No await in between: the spawned task has not run yet
        assert_eq!(dispatcher.dispatch(UiEvent::RequestedPage(1)), Dispatched::Started);
        assert_eq!(
            dispatcher.dispatch(UiEvent::RequestedPage(2)),
            Dispatched::Rejected(SelectionError::Busy)
        );
        assert_eq!(
            dispatcher.dispatch(UiEvent::RequestedBulkSelect(3)),
            Dispatched::Rejected(SelectionError::Busy)
        );

        assert!(matches!(
            rx.recv().await,
            Some(OpCompleted::Navigated { page: 1, result: Ok(()) })
        ));
        assert!(!dispatcher.controller().is_busy());
    }

    #[tokio::test]
    async fn test_bulk_select_starts_from_current_page() {
        let (dispatcher, mut rx) = setup(InMemorySource::new(50, 12));
        dispatcher.dispatch(UiEvent::RequestedPage(2));
        rx.recv().await;

        dispatcher.dispatch(UiEvent::RequestedBulkSelect(4));

        match rx.recv().await {
            Some(OpCompleted::BulkSelected(Ok(report))) => assert_eq!(report.selected, 4),
            other => panic!("unexpected completion: {:?}", other),
        }
        assert_eq!(dispatcher.controller().selected_ids(), vec![13, 14, 15, 16]);
    }

    #[tokio::test]
    async fn test_requests_rejected_while_busy() {
        let (dispatcher, mut rx) =
            setup(InMemorySource::new(50, 12).with_latency(Duration::from_millis(50)));

        dispatcher.dispatch(UiEvent::RequestedPage(1));
        tokio::task::yield_now().await;
        assert!(dispatcher.controller().is_busy());

        assert_eq!(
            dispatcher.dispatch(UiEvent::RequestedPage(2)),
            Dispatched::Rejected(SelectionError::Busy)
        );
        assert_eq!(
            dispatcher.dispatch(UiEvent::RequestedBulkSelect(3)),
            Dispatched::Rejected(SelectionError::Busy)
        );
        assert!(matches!(
            rx.recv().await,
            Some(OpCompleted::Navigated { page: 1, .. })
        ));
    }

    #[test]
    fn test_invalid_bulk_count_rejected_without_runtime() {
        let source: Arc<dyn RecordSource> = Arc::new(InMemorySource::new(10, 12));
        let (tx, _rx) = mpsc::channel(1);
        let dispatcher = Dispatcher::new(Arc::new(SelectionController::new(source)), tx);

        assert!(matches!(
            dispatcher.dispatch(UiEvent::RequestedBulkSelect(0)),
            Dispatched::Rejected(SelectionError::InvalidArgument(_))
        ));
    }
}
