// Selection set and per-page reconciliation

use crate::source::RecordId;
use std::collections::HashSet;

/// Result of folding one page's reported selection into the set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileDelta {
    pub added: usize,
    pub removed: usize,
}

impl ReconcileDelta {
    pub fn is_empty(&self) -> bool {
        self.added == 0 && self.removed == 0
    }
}

/// Authoritative set of selected record ids
///
/// Membership does not depend on which page is loaded: ids from pages the
/// user left long ago stay here until explicitly deselected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: HashSet<RecordId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.ids.contains(&id)
    }

    /// Insert `id`, returning true if it was not selected before
    pub fn insert(&mut self, id: RecordId) -> bool {
        self.ids.insert(id)
    }

    /// Remove `id`, returning true if it was selected
    pub fn remove(&mut self, id: RecordId) -> bool {
        self.ids.remove(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = RecordId> + '_ {
        self.ids.iter().copied()
    }

    /// All ids in ascending order
    pub fn sorted(&self) -> Vec<RecordId> {
        let mut ids: Vec<RecordId> = self.ids.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Make membership of every id in `page_ids` match `reported`
    ///
    /// Ids outside `page_ids` are left alone, including reported ids that are
    /// not on the page.
    pub fn reconcile(
        &mut self,
        page_ids: &HashSet<RecordId>,
        reported: &HashSet<RecordId>,
    ) -> ReconcileDelta {
        let mut delta = ReconcileDelta::default();
        for &id in page_ids {
            let was_selected = self.ids.contains(&id);
            let is_selected = reported.contains(&id);
            if was_selected && !is_selected {
                self.ids.remove(&id);
                delta.removed += 1;
            } else if !was_selected && is_selected {
                self.ids.insert(id);
                delta.added += 1;
            }
        }
        delta
    }
}

impl FromIterator<RecordId> for SelectionSet {
    fn from_iter<I: IntoIterator<Item = RecordId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}
