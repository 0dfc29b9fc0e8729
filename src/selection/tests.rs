//! Controller behaviour tests
//!
//! Run against the in-memory source so fetch counts and order are observable.

use super::*;
use crate::source::{InMemorySource, RecordSource};
use std::sync::Arc;
use std::time::Duration;

const PAGE_SIZE: u32 = 12;

fn controller(source: &Arc<InMemorySource>) -> SelectionController {
    let source: Arc<dyn RecordSource> = source.clone();
    SelectionController::new(source)
}

fn ids(values: impl IntoIterator<Item = RecordId>) -> HashSet<RecordId> {
    values.into_iter().collect()
}

/// Report `selected` for the cached page, as the table would
fn report(ctl: &SelectionController, selected: HashSet<RecordId>) -> ReconcileDelta {
    let view = ctl.view();
    ctl.reconcile(&view.page_ids(), &view.selected_on_page, &selected)
        .unwrap()
}

// ─────────────────────────────────────────────────────────────────────────────
// Reconciliation
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_reconcile_twice_is_unchanged() {
    let source = Arc::new(InMemorySource::new(100, PAGE_SIZE));
    let ctl = controller(&source);
    ctl.go_to_page(1).await.unwrap();

    let page_ids = ids(source.ids_on_page(1));
    let reported = ids([1, 4, 9]);

    ctl.reconcile(&page_ids, &HashSet::new(), &reported).unwrap();
    let after_first = ctl.selected_ids();
    let delta = ctl.reconcile(&page_ids, &reported, &reported).unwrap();

    assert!(delta.is_empty());
    assert_eq!(ctl.selected_ids(), after_first);
    assert_eq!(after_first, vec![1, 4, 9]);
}

#[tokio::test]
async fn test_selection_survives_navigation() {
    let source = Arc::new(InMemorySource::new(100, PAGE_SIZE));
    let ctl = controller(&source);

    ctl.go_to_page(1).await.unwrap();
    report(&ctl, ids([2, 3]));

    ctl.go_to_page(2).await.unwrap();
    report(&ctl, ids([13, 20]));

    ctl.go_to_page(1).await.unwrap();
    let view = ctl.view();

    assert_eq!(view.selected_on_page, ids([2, 3]));
    assert_eq!(view.total_selected, 4);
    assert_eq!(ctl.selected_ids(), vec![2, 3, 13, 20]);
}

#[tokio::test]
async fn test_deselect_on_one_page_keeps_other_pages() {
    let source = Arc::new(InMemorySource::new(100, PAGE_SIZE));
    let ctl = controller(&source).with_selection([1, 2, 30].into_iter().collect());

    ctl.go_to_page(1).await.unwrap();
    report(&ctl, ids([2]));

    assert_eq!(ctl.selected_ids(), vec![2, 30]);
}

#[tokio::test]
async fn test_report_for_replaced_page_changes_nothing() {
    let source = Arc::new(InMemorySource::new(100, PAGE_SIZE));
    let ctl = controller(&source).with_selection([13, 14].into_iter().collect());
    ctl.go_to_page(1).await.unwrap();
    let page_one = ctl.view();

    ctl.go_to_page(2).await.unwrap();
    let result = ctl.reconcile(&page_one.page_ids(), &page_one.selected_on_page, &ids([1]));

    assert_eq!(result, Err(SelectionError::StaleView));
    assert_eq!(ctl.selected_ids(), vec![13, 14]);
}

#[tokio::test]
async fn test_report_from_outdated_selection_changes_nothing() {
    let source = Arc::new(InMemorySource::new(100, PAGE_SIZE));
    let ctl = controller(&source);
    ctl.go_to_page(1).await.unwrap();
    let before = ctl.view();

    ctl.select_first_n(2, 1).await.unwrap();
    let result = ctl.reconcile(&before.page_ids(), &before.selected_on_page, &ids([7]));

    assert_eq!(result, Err(SelectionError::StaleView));
    assert_eq!(ctl.selected_ids(), vec![1, 2]);
}

// ─────────────────────────────────────────────────────────────────────────────
// Bulk select
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_select_first_15_spans_two_pages() {
    let source = Arc::new(InMemorySource::new(100, PAGE_SIZE));
    let ctl = controller(&source);

    let report = ctl.select_first_n(15, 1).await.unwrap();

    assert_eq!(ctl.selected_ids(), (1..=15).collect::<Vec<_>>());
    assert_eq!(source.fetch_count(), 2);
    assert_eq!(source.fetch_log(), vec![1, 2]);
    assert_eq!(report.status, BulkSelectStatus::TargetReached);
    assert_eq!(report.newly_selected, 15);
    assert_eq!(report.pages_fetched, 2);
}

#[tokio::test]
async fn test_existing_selection_counts_toward_target() {
    let source = Arc::new(InMemorySource::new(100, PAGE_SIZE));
    let page_three = source.ids_on_page(3);
    let preselected: SelectionSet = page_three.iter().copied().take(5).collect();
    let ctl = controller(&source).with_selection(preselected.clone());

    let report = ctl.select_first_n(5, 1).await.unwrap();

    assert_eq!(source.fetch_count(), 0);
    assert_eq!(ctl.selected_ids(), preselected.sorted());
    assert_eq!(report.newly_selected, 0);
    assert_eq!(report.status, BulkSelectStatus::TargetReached);
}

#[tokio::test]
async fn test_already_selected_ids_are_not_recounted() {
    let source = Arc::new(InMemorySource::new(100, PAGE_SIZE));
    let ctl = controller(&source).with_selection([1, 2, 3].into_iter().collect());

    let report = ctl.select_first_n(12, 1).await.unwrap();

    assert_eq!(ctl.selected_ids(), (1..=12).collect::<Vec<_>>());
    assert_eq!(report.newly_selected, 9);
    assert_eq!(source.fetch_count(), 1);
}

#[tokio::test]
async fn test_exhaustion_selects_everything() {
    let source = Arc::new(InMemorySource::new(30, PAGE_SIZE));
    let ctl = controller(&source);

    let report = ctl.select_first_n(40, 1).await.unwrap();

    assert_eq!(ctl.selection_len(), 30);
    assert_eq!(report.status, BulkSelectStatus::Exhausted);
    assert!(report.is_success());
    assert_eq!(source.fetch_log(), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_empty_page_stops_scan_when_total_overstated() {
    let source = Arc::new(InMemorySource::new(20, PAGE_SIZE).with_reported_total(1000));
    let ctl = controller(&source);

    let report = ctl.select_first_n(50, 1).await.unwrap();

    assert_eq!(ctl.selection_len(), 20);
    assert_eq!(report.status, BulkSelectStatus::Exhausted);
    assert_eq!(source.fetch_log(), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_scan_stops_at_capped_total() {
    let source = Arc::new(InMemorySource::new(100, PAGE_SIZE).with_reported_total(20));
    let ctl = controller(&source);

    let report = ctl.select_first_n(50, 1).await.unwrap();

    assert_eq!(ctl.selected_ids(), (1..=20).collect::<Vec<_>>());
    assert_eq!(report.selected, 20);
    assert_eq!(report.status, BulkSelectStatus::Exhausted);
    assert_eq!(source.fetch_log(), vec![1, 2]);
}

#[tokio::test]
async fn test_scan_starts_at_requested_page() {
    let source = Arc::new(InMemorySource::new(100, PAGE_SIZE));
    let ctl = controller(&source);

    ctl.select_first_n(3, 4).await.unwrap();

    assert_eq!(source.fetch_log(), vec![4]);
    assert_eq!(ctl.selected_ids(), vec![37, 38, 39]);
}

#[tokio::test]
async fn test_invalid_counts_do_nothing() {
    let source = Arc::new(InMemorySource::new(100, PAGE_SIZE));
    let ctl = controller(&source).with_selection([42].into_iter().collect());

    for n in [0, -3] {
        let result = ctl.select_first_n(n, 1).await;
        assert!(matches!(result, Err(SelectionError::InvalidArgument(_))));
    }

    assert_eq!(source.fetch_count(), 0);
    assert_eq!(ctl.selected_ids(), vec![42]);
    assert!(!ctl.is_busy());
}

#[tokio::test]
async fn test_limit_rejects_large_targets() {
    let source = Arc::new(InMemorySource::new(500, PAGE_SIZE));
    let ctl = controller(&source).with_bulk_select_limit(Some(100));

    let result = ctl.select_first_n(101, 1).await;

    assert!(matches!(result, Err(SelectionError::InvalidArgument(_))));
    assert_eq!(source.fetch_count(), 0);
}

#[tokio::test]
async fn test_fetch_failure_keeps_partial_selection() {
    let source = Arc::new(InMemorySource::new(100, PAGE_SIZE).failing_on(2));
    let ctl = controller(&source);

    let report = ctl.select_first_n(20, 1).await.unwrap();

    assert_eq!(ctl.selected_ids(), (1..=12).collect::<Vec<_>>());
    assert!(!report.is_success());
    assert!(matches!(
        report.status,
        BulkSelectStatus::SourceUnavailable { page: 2, .. }
    ));
    assert_eq!(report.selected, 12);
    assert!(!ctl.is_busy());
}

#[tokio::test]
async fn test_bulk_select_leaves_page_cache_alone() {
    let source = Arc::new(InMemorySource::new(100, PAGE_SIZE));
    let ctl = controller(&source);
    ctl.go_to_page(5).await.unwrap();

    ctl.select_first_n(30, 1).await.unwrap();

    let view = ctl.view();
    assert_eq!(view.current_page, 5);
    assert_eq!(view.records[0].id, 49);
    assert!(view.selected_on_page.is_empty());
}

// ─────────────────────────────────────────────────────────────────────────────
// Navigation
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_go_to_page_updates_pagination() {
    let source = Arc::new(InMemorySource::new(30, PAGE_SIZE));
    let ctl = controller(&source);

    assert_eq!(ctl.pagination().total_records, None);
    ctl.go_to_page(3).await.unwrap();

    let pagination = ctl.pagination();
    assert_eq!(pagination.current_page, 3);
    assert_eq!(pagination.total_records, Some(30));
    assert_eq!(pagination.last_page(), Some(3));
    assert_eq!(ctl.view().records.len(), 6);
}

#[tokio::test]
async fn test_failed_navigation_keeps_previous_page() {
    let source = Arc::new(InMemorySource::new(100, PAGE_SIZE).failing_on(2));
    let ctl = controller(&source);
    ctl.go_to_page(1).await.unwrap();
    report(&ctl, ids([5]));

    let result = ctl.go_to_page(2).await;

    assert!(matches!(
        result,
        Err(SelectionError::SourceUnavailable { page: 2, .. })
    ));
    let view = ctl.view();
    assert_eq!(view.current_page, 1);
    assert_eq!(view.records[0].id, 1);
    assert_eq!(view.selected_on_page, ids([5]));
    assert!(!view.busy);
}

#[tokio::test]
async fn test_page_zero_is_invalid() {
    let source = Arc::new(InMemorySource::new(10, PAGE_SIZE));
    let ctl = controller(&source);

    assert!(matches!(
        ctl.go_to_page(0).await,
        Err(SelectionError::InvalidArgument(_))
    ));
    assert!(matches!(
        ctl.select_first_n(5, 0).await,
        Err(SelectionError::InvalidArgument(_))
    ));
    assert_eq!(source.fetch_count(), 0);
}

// ─────────────────────────────────────────────────────────────────────────────
// Busy flag
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_requests_rejected_while_busy() {
    let source = Arc::new(
        InMemorySource::new(100, PAGE_SIZE).with_latency(Duration::from_millis(100)),
    );
    let ctl = Arc::new(controller(&source));

    let navigating = {
        let ctl = ctl.clone();
        tokio::spawn(async move { ctl.go_to_page(2).await })
    };
    while !ctl.is_busy() {
        tokio::task::yield_now().await;
    }

    assert_eq!(ctl.go_to_page(3).await, Err(SelectionError::Busy));
    assert_eq!(ctl.select_first_n(5, 1).await, Err(SelectionError::Busy));

    navigating.await.unwrap().unwrap();
    assert!(!ctl.is_busy());
    assert_eq!(source.fetch_log(), vec![2]);
    assert_eq!(ctl.selection_len(), 0);
}

#[test]
fn test_last_page_rounds_up() {
    assert_eq!(last_page_for(0, 12), 0);
    assert_eq!(last_page_for(12, 12), 1);
    assert_eq!(last_page_for(13, 12), 2);
    assert_eq!(last_page_for(1000, 12), 84);
}
