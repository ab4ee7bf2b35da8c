//! The host tab service the reconciler and manager drive.
//!
//! Everything the crate knows about real tabs goes through [`TabHost`]. The
//! host is authoritative: callers re-query it after a batch of moves instead of
//! trusting any local mirror.

pub mod memory;

use std::fmt;

use thiserror::Error;

use crate::tabs::{Tab, TabId, WindowId};

pub use memory::{FaultRule, MemoryHost};

/// Destination position of a move request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DestIndex {
    /// Absolute index in the destination window after the tab left its old slot.
    At(usize),
    /// Append after the last tab.
    End,
}

impl fmt::Display for DestIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DestIndex::At(index) => write!(f, "{index}"),
            DestIndex::End => write!(f, "end"),
        }
    }
}

/// Where a single tab should go. `window: None` keeps it in its own window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MoveTarget {
    pub window: Option<WindowId>,
    pub index: DestIndex,
}

impl MoveTarget {
    pub fn within(index: usize) -> Self {
        Self {
            window: None,
            index: DestIndex::At(index),
        }
    }

    pub fn to_window(window: WindowId, index: DestIndex) -> Self {
        Self {
            window: Some(window),
            index,
        }
    }

    pub fn append_to(window: WindowId) -> Self {
        Self::to_window(window, DestIndex::End)
    }
}

impl fmt::Display for MoveTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.window {
            Some(window) => write!(f, "window {window} @ {}", self.index),
            None => write!(f, "@ {}", self.index),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("no tab with id {0}")]
    NoSuchTab(TabId),
    #[error("no window with id {0}")]
    NoSuchWindow(WindowId),
    #[error("index {index} out of range for window {window} ({len} tabs)")]
    IndexOutOfRange {
        window: WindowId,
        index: usize,
        len: usize,
    },
    #[error("host rejected request for tab {tab}: {reason}")]
    Rejected { tab: TabId, reason: String },
}

/// Tab and window operations provided by the browser (or a stand-in).
///
/// Every call is a single round-trip; implementations must apply a move fully
/// before returning so the next query observes the shifted indices.
pub trait TabHost {
    /// Ids of all open windows.
    fn windows(&mut self) -> Result<Vec<WindowId>, HostError>;

    /// The window the user is looking at, when known.
    fn current_window(&mut self) -> Option<WindowId>;

    /// Live tab order of `window`. Never cached by callers across operations.
    fn window_order(&mut self, window: WindowId) -> Result<Vec<TabId>, HostError>;

    fn tab(&mut self, tab: TabId) -> Result<Tab, HostError>;

    /// Remove `tab` from wherever it is and insert it at `target`.
    fn move_tab(&mut self, tab: TabId, target: MoveTarget) -> Result<(), HostError>;

    /// Open a new window holding `first_tab` (moved out of its old window).
    fn create_window(&mut self, first_tab: TabId) -> Result<WindowId, HostError>;

    fn remove_tab(&mut self, tab: TabId) -> Result<(), HostError>;

    /// Focus the window owning `tab` and make `tab` its active tab.
    fn activate_tab(&mut self, tab: TabId) -> Result<(), HostError>;

    /// Total number of open tabs across all windows.
    fn tab_count(&mut self) -> Result<usize, HostError> {
        let mut total = 0;
        for window in self.windows()? {
            total += self.window_order(window)?.len();
        }
        Ok(total)
    }
}
