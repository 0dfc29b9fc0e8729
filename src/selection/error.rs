// Controller errors and bulk-select outcomes

use crate::source::SourceError;
use serde::Serialize;
use std::fmt;

/// Errors returned by controller operations
///
/// `SourceUnavailable` from `go_to_page` means nothing changed. Bulk select
/// never returns it: a failed scan keeps its partial progress and reports the
/// failure through [`BulkSelectStatus::SourceUnavailable`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    /// Rejected before any mutation or fetch
    InvalidArgument(String),
    /// Another navigation or bulk select is in flight
    Busy,
    /// A selection change was reported against a page or selection that has
    /// since changed underneath it
    StaleView,
    /// Page fetch failed
    SourceUnavailable { page: u32, source: SourceError },
}

impl fmt::Display for SelectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Self::Busy => write!(f, "Another request is in progress"),
            Self::StaleView => write!(f, "Page changed before the selection was applied"),
            Self::SourceUnavailable { page, source } => {
                write!(f, "Page {} unavailable: {}", page, source)
            }
        }
    }
}

impl std::error::Error for SelectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::SourceUnavailable { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// How a bulk select ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BulkSelectStatus {
    /// Selection reached the requested size
    TargetReached,
    /// Ran out of pages before reaching the target
    Exhausted,
    /// A fetch failed; ids folded before the failure stay selected
    SourceUnavailable { page: u32, error: String },
}

/// Summary of a finished bulk select
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkSelectReport {
    /// Requested total selection size
    pub target: u64,
    /// Selection size when the scan stopped
    pub selected: usize,
    /// Ids this scan added
    pub newly_selected: usize,
    pub pages_fetched: u32,
    #[serde(flatten)]
    pub status: BulkSelectStatus,
}

impl BulkSelectReport {
    /// True unless a fetch failed
    pub fn is_success(&self) -> bool {
        !matches!(self.status, BulkSelectStatus::SourceUnavailable { .. })
    }

    /// One-line summary for toasts and logs
    pub fn summary(&self) -> String {
        match &self.status {
            BulkSelectStatus::TargetReached => format!(
                "Selected {} rows (+{} new)",
                self.selected, self.newly_selected
            ),
            BulkSelectStatus::Exhausted => format!(
                "Only {} rows available, all selected (+{} new)",
                self.selected, self.newly_selected
            ),
            BulkSelectStatus::SourceUnavailable { page, .. } => format!(
                "Stopped at page {}: {} rows selected (+{} new)",
                page, self.selected, self.newly_selected
            ),
        }
    }
}
