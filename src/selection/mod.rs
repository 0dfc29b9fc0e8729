//! Cross-page selection
//!
//! Keeps a set of selected record ids consistent while only one page of the
//! collection is held in memory at a time.
//!
//! - [`SelectionSet`]: the selected ids, independent of the loaded page
//! - [`PageCache`]: records of the single most recently loaded page
//! - [`PaginationState`]: page size, current page, reported total
//! - [`SelectionController`]: owns all three and the busy flag

mod controller;
mod error;
mod set;

#[cfg(test)]
mod tests;

pub use controller::{ControllerView, SelectionController};
pub use error::{BulkSelectReport, BulkSelectStatus, SelectionError};
pub use set::{ReconcileDelta, SelectionSet};

use crate::source::{Record, RecordId};
use std::collections::HashSet;

/// Records of exactly one page
///
/// Replaced wholesale on navigation, never merged with a previous page.
#[derive(Debug, Clone, Default)]
pub struct PageCache {
    page: Option<u32>,
    records: Vec<Record>,
}

impl PageCache {
    /// Page number of the cached records, None before the first load
    pub fn page(&self) -> Option<u32> {
        self.page
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn ids(&self) -> HashSet<RecordId> {
        self.records.iter().map(|r| r.id).collect()
    }

    pub fn replace(&mut self, page: u32, records: Vec<Record>) {
        self.page = Some(page);
        self.records = records;
    }
}

/// Page size, current page and total as reported by the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    pub page_size: u32,
    /// 1-based
    pub current_page: u32,
    /// Unknown until the first page arrives
    pub total_records: Option<u64>,
}

impl PaginationState {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size: page_size.max(1),
            current_page: 1,
            total_records: None,
        }
    }

    /// `ceil(total_records / page_size)`, None while the total is unknown
    pub fn last_page(&self) -> Option<u32> {
        self.total_records
            .map(|total| last_page_for(total, self.page_size))
    }
}

/// Number of pages needed for `total` records
pub(crate) fn last_page_for(total: u64, page_size: u32) -> u32 {
    let pages = total.div_ceil(u64::from(page_size.max(1)));
    u32::try_from(pages).unwrap_or(u32::MAX)
}
