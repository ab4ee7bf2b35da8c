use std::fmt;

use crate::drag::DropRequest;
use crate::tabs::{TabId, WindowId};

/// Destination for "move selected".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDestination {
    NewWindow,
    Window(WindowId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Refresh,
    // Selection
    ToggleSelect(TabId),
    SelectAllVisible,
    ClearSelection,
    ToggleCollapsed(WindowId),
    // Rearranging
    ApplyDrop(DropRequest),
    MoveSelected {
        destination: MoveDestination,
        /// 1-based slot typed by the user; `None` appends.
        position: Option<usize>,
    },
    // Closing / focus
    CloseTab(TabId),
    CloseSelected,
    ActivateTab(TabId),
    ActivateSelected,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::Refresh => "Refresh windows",
            Action::ToggleSelect(_) => "Toggle selection",
            Action::SelectAllVisible => "Select all visible",
            Action::ClearSelection => "Clear selection",
            Action::ToggleCollapsed(_) => "Collapse / expand window",
            Action::ApplyDrop(_) => "Drop dragged tabs",
            Action::MoveSelected { .. } => "Move selected",
            Action::CloseTab(_) => "Close tab",
            Action::CloseSelected => "Close selected",
            Action::ActivateTab(_) => "Jump to tab",
            Action::ActivateSelected => "Jump to selected",
        };
        write!(f, "{}", s)
    }
}
