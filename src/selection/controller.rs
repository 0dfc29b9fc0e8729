// Selection controller
//
// Owns the selection set, the page cache and the pagination state. All
// operations take &self so one controller can be shared (Arc) between the UI
// loop and the tasks that run fetches. Fetching operations hold the busy flag
// for their whole duration; a second fetching request while busy is rejected,
// never queued. The state mutex is only held for short synchronous sections
// and never across an await.

use super::error::{BulkSelectReport, BulkSelectStatus, SelectionError};
use super::set::{ReconcileDelta, SelectionSet};
use super::{last_page_for, PageCache, PaginationState};
use crate::source::{Record, RecordId, RecordSource};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Read-only snapshot handed to the presentation layer
#[derive(Debug, Clone)]
pub struct ControllerView {
    pub records: Vec<Record>,
    /// Ids of `records` that are selected
    pub selected_on_page: HashSet<RecordId>,
    pub busy: bool,
    pub total_records: Option<u64>,
    pub current_page: u32,
    pub last_page: Option<u32>,
    /// Selection size across all pages
    pub total_selected: usize,
}

impl ControllerView {
    /// Ids of `records`
    pub fn page_ids(&self) -> HashSet<RecordId> {
        self.records.iter().map(|r| r.id).collect()
    }
}

#[derive(Debug)]
struct ControllerState {
    selection: SelectionSet,
    page: PageCache,
    pagination: PaginationState,
}

/// Holds the controller's busy flag
///
/// Obtained from [`SelectionController::try_begin`] and handed to the
/// fetching operation it was taken for. The flag clears when the guard is
/// dropped, including when the owning future is dropped mid-fetch.
#[derive(Debug)]
pub struct BusyGuard {
    flag: Arc<AtomicBool>,
}

impl BusyGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Result<Self, SelectionError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self { flag: flag.clone() })
            .map_err(|_| SelectionError::Busy)
    }

    fn guards(&self, flag: &Arc<AtomicBool>) -> bool {
        Arc::ptr_eq(&self.flag, flag)
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

pub struct SelectionController {
    source: Arc<dyn RecordSource>,
    state: Mutex<ControllerState>,
    busy: Arc<AtomicBool>,
    /// Largest accepted bulk-select target
    bulk_select_limit: Option<u64>,
}

impl SelectionController {
    pub fn new(source: Arc<dyn RecordSource>) -> Self {
        let pagination = PaginationState::new(source.page_size());
        Self {
            source,
            state: Mutex::new(ControllerState {
                selection: SelectionSet::new(),
                page: PageCache::default(),
                pagination,
            }),
            busy: Arc::new(AtomicBool::new(false)),
            bulk_select_limit: None,
        }
    }

    /// Reject bulk-select targets above `limit`
    pub fn with_bulk_select_limit(mut self, limit: Option<u64>) -> Self {
        self.bulk_select_limit = limit;
        self
    }

    #[allow(dead_code)] // Used by tests
    /// Start from an existing selection
    pub fn with_selection(self, selection: SelectionSet) -> Self {
        self.lock().selection = selection;
        self
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    pub fn bulk_select_limit(&self) -> Option<u64> {
        self.bulk_select_limit
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Take the busy flag for a fetching operation started later
    ///
    /// Lets a caller reject a request synchronously before spawning the task
    /// that runs it with [`load_page`](Self::load_page) or
    /// [`scan_first_n`](Self::scan_first_n).
    pub fn try_begin(&self) -> Result<BusyGuard, SelectionError> {
        BusyGuard::acquire(&self.busy)
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Read side
    // ─────────────────────────────────────────────────────────────────────────

    pub fn view(&self) -> ControllerView {
        let state = self.lock();
        let records = state.page.records().to_vec();
        let selected_on_page = records
            .iter()
            .map(|r| r.id)
            .filter(|id| state.selection.contains(*id))
            .collect();

        ControllerView {
            records,
            selected_on_page,
            busy: self.is_busy(),
            total_records: state.pagination.total_records,
            current_page: state.pagination.current_page,
            last_page: state.pagination.last_page(),
            total_selected: state.selection.len(),
        }
    }

    pub fn pagination(&self) -> PaginationState {
        self.lock().pagination
    }

    #[allow(dead_code)] // Used by tests
    pub fn selection_len(&self) -> usize {
        self.lock().selection.len()
    }

    /// Whole selection, ascending
    pub fn selected_ids(&self) -> Vec<RecordId> {
        self.lock().selection.sorted()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reconciliation
    // ─────────────────────────────────────────────────────────────────────────

    /// Fold the presentation layer's view of one page into the selection
    ///
    /// `page_ids` are the ids of the page the report was made against and
    /// `shown` the ids it displayed as selected before the change. If the
    /// cached page or its selection no longer match (a navigation or bulk
    /// select finished in between), nothing changes and `StaleView` is
    /// returned. Only ids in `page_ids` can change; selections on other pages
    /// survive.
    pub fn reconcile(
        &self,
        page_ids: &HashSet<RecordId>,
        shown: &HashSet<RecordId>,
        reported: &HashSet<RecordId>,
    ) -> Result<ReconcileDelta, SelectionError> {
        let delta = {
            let mut state = self.lock();
            if state.page.ids() != *page_ids {
                tracing::debug!("Selection report for a page that is no longer cached");
                return Err(SelectionError::StaleView);
            }
            let current: HashSet<RecordId> = page_ids
                .iter()
                .copied()
                .filter(|id| state.selection.contains(*id))
                .collect();
            if current != *shown {
                tracing::debug!("Selection report built from an outdated page selection");
                return Err(SelectionError::StaleView);
            }
            state.selection.reconcile(page_ids, reported)
        };
        log_delta(&delta);
        Ok(delta)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Navigation
    // ─────────────────────────────────────────────────────────────────────────

    /// Load `page` into the page cache
    ///
    /// On failure the previous page, pagination and selection are untouched.
    pub async fn go_to_page(&self, page: u32) -> Result<(), SelectionError> {
        validate_page(page)?;
        let busy = self.try_begin()?;
        self.load_page(page, busy).await
    }

    /// [`go_to_page`](Self::go_to_page) with the busy flag already held
    pub async fn load_page(&self, page: u32, busy: BusyGuard) -> Result<(), SelectionError> {
        debug_assert!(busy.guards(&self.busy));
        validate_page(page)?;

        tracing::debug!(page, source = self.source.name(), "Fetching page");
        let fetched = self.source.fetch_page(page).await.map_err(|source| {
            tracing::warn!(page, error = %source, "Page fetch failed");
            SelectionError::SourceUnavailable { page, source }
        })?;

        let mut state = self.lock();
        let count = fetched.records.len();
        state.page.replace(page, fetched.records);
        state.pagination.current_page = page;
        state.pagination.total_records = Some(fetched.total_count);
        tracing::info!(
            page,
            records = count,
            total = fetched.total_count,
            "Loaded page"
        );
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Bulk select
    // ─────────────────────────────────────────────────────────────────────────

    /// Grow the selection to `n` ids, scanning pages from `start_page` on
    ///
    /// `n` is a target total: ids that are already selected count toward it.
    /// Pages are fetched one at a time and each page is folded into the
    /// selection before the next one is requested. Stops mid-page once the
    /// target is met or the reported total is reached, after the last page,
    /// or at the first empty page.
    pub async fn select_first_n(
        &self,
        n: i64,
        start_page: u32,
    ) -> Result<BulkSelectReport, SelectionError> {
        self.validate_target(n)?;
        validate_page(start_page)?;
        let busy = self.try_begin()?;
        self.scan_first_n(n, start_page, busy).await
    }

    /// [`select_first_n`](Self::select_first_n) with the busy flag already held
    pub async fn scan_first_n(
        &self,
        n: i64,
        start_page: u32,
        busy: BusyGuard,
    ) -> Result<BulkSelectReport, SelectionError> {
        debug_assert!(busy.guards(&self.busy));
        let target = self.validate_target(n)?;
        validate_page(start_page)?;

        let page_size = self.source.page_size();
        let (mut selected, mut last_page) = {
            let state = self.lock();
            (state.selection.len(), state.pagination.last_page())
        };

        let mut report = BulkSelectReport {
            target,
            selected,
            newly_selected: 0,
            pages_fetched: 0,
            status: BulkSelectStatus::TargetReached,
        };

        let mut page = start_page;
        loop {
            if selected as u64 >= target {
                report.status = BulkSelectStatus::TargetReached;
                break;
            }
            if let Some(last) = last_page {
                if page > last {
                    report.status = BulkSelectStatus::Exhausted;
                    break;
                }
            }

            tracing::debug!(page, selected, goal = target, "Bulk select fetching page");
            let fetched = match self.source.fetch_page(page).await {
                Ok(fetched) => fetched,
                Err(error) => {
                    tracing::warn!(page, error = %error, "Bulk select stopped on fetch failure");
                    report.status = BulkSelectStatus::SourceUnavailable {
                        page,
                        error: error.to_string(),
                    };
                    break;
                }
            };
            report.pages_fetched += 1;
            last_page = Some(last_page_for(fetched.total_count, page_size));

            // Records past the reported total (a capped or shrinking
            // collection) are not part of it
            let offset = u64::from(page - 1) * u64::from(page_size);
            let in_range = fetched.total_count.saturating_sub(offset);
            let in_range = usize::try_from(in_range).unwrap_or(usize::MAX);
            let records = &fetched.records[..fetched.records.len().min(in_range)];

            if records.is_empty() {
                report.status = BulkSelectStatus::Exhausted;
                break;
            }

            {
                let mut state = self.lock();
                for record in records {
                    if state.selection.insert(record.id) {
                        report.newly_selected += 1;
                    }
                    if state.selection.len() as u64 >= target {
                        break;
                    }
                }
                selected = state.selection.len();
            }

            page = match page.checked_add(1) {
                Some(next) => next,
                None => {
                    report.status = BulkSelectStatus::Exhausted;
                    break;
                }
            };
        }

        report.selected = selected;
        tracing::info!(
            goal = target,
            selected = report.selected,
            newly_selected = report.newly_selected,
            pages = report.pages_fetched,
            status = ?report.status,
            "Bulk select finished"
        );
        Ok(report)
    }

    fn validate_target(&self, n: i64) -> Result<u64, SelectionError> {
        if n < 1 {
            return Err(SelectionError::InvalidArgument(format!(
                "row count must be at least 1 (got {})",
                n
            )));
        }
        let target = n as u64;
        if let Some(limit) = self.bulk_select_limit {
            if target > limit {
                return Err(SelectionError::InvalidArgument(format!(
                    "row count {} exceeds the limit of {}",
                    target, limit
                )));
            }
        }
        Ok(target)
    }
}

fn validate_page(page: u32) -> Result<(), SelectionError> {
    if page == 0 {
        return Err(SelectionError::InvalidArgument(
            "page numbers start at 1".to_string(),
        ));
    }
    Ok(())
}

fn log_delta(delta: &ReconcileDelta) {
    if !delta.is_empty() {
        tracing::debug!(
            added = delta.added,
            removed = delta.removed,
            "Reconciled page selection"
        );
    }
}
