//! Building desired orders from a group of tabs and an insertion point.

use crate::tabs::{TabId, WindowSnapshot};

/// Insertion point for a group of tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsertAt {
    /// Zero-based slot, clamped to the length of the list it applies to.
    Index(usize),
    #[default]
    End,
}

impl InsertAt {
    /// From a 1-based position typed by a user. `None` means the end and
    /// anything below 1 is treated as 1.
    pub fn from_position(position: Option<usize>) -> Self {
        match position {
            Some(pos) => InsertAt::Index(pos.max(1) - 1),
            None => InsertAt::End,
        }
    }

    /// Concrete slot in a list of `len` entries.
    pub fn resolve(self, len: usize) -> usize {
        match self {
            InsertAt::Index(index) => index.min(len),
            InsertAt::End => len,
        }
    }
}

/// Desired order of a window after moving `moved` (already inside it) to `at`.
///
/// `at` counts slots among the tabs that stay put.
pub fn splice_within(current: &[TabId], moved: &[TabId], at: InsertAt) -> Vec<TabId> {
    let remaining: Vec<TabId> = current
        .iter()
        .copied()
        .filter(|id| !moved.contains(id))
        .collect();
    splice_into(&remaining, moved, at)
}

/// Desired order of a window after inserting `moved` (coming from elsewhere) at `at`.
pub fn splice_into(dest_current: &[TabId], moved: &[TabId], at: InsertAt) -> Vec<TabId> {
    let insert_at = at.resolve(dest_current.len());
    let mut desired = Vec::with_capacity(dest_current.len() + moved.len());
    desired.extend_from_slice(&dest_current[..insert_at]);
    desired.extend_from_slice(moved);
    desired.extend_from_slice(&dest_current[insert_at..]);
    desired
}

/// The selected tabs that still exist, ordered by their index inside their
/// window. Ties across windows keep window-list order.
pub fn order_by_position(selected: &[TabId], windows: &[WindowSnapshot]) -> Vec<TabId> {
    let mut found: Vec<(usize, TabId)> = Vec::with_capacity(selected.len());
    for window in windows {
        for (index, tab) in window.tabs.iter().enumerate() {
            if selected.contains(tab) {
                found.push((index, *tab));
            }
        }
    }
    found.sort_by_key(|(index, _)| *index);
    found.into_iter().map(|(_, tab)| tab).collect()
}
