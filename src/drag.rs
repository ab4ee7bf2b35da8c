//! Drag and drop as an explicit state machine.
//!
//! The session only decides *what* was dropped *where*; applying the drop is
//! the manager's job. Events that make no sense in the current state are
//! ignored.

use crate::plan::InsertAt;
use crate::tabs::{TabId, WindowId};

/// Tabs picked up by one drag gesture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragGroup {
    pub ids: Vec<TabId>,
    pub from_window: WindowId,
}

/// Where the pointer last indicated a drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropTarget {
    pub window: WindowId,
    /// Slot among the rows of the target list, excluding the dragged row.
    pub index: usize,
}

/// A completed gesture, ready to be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropRequest {
    pub ids: Vec<TabId>,
    pub from_window: WindowId,
    pub to_window: WindowId,
    pub insert_at: InsertAt,
}

impl DropRequest {
    pub fn is_same_window(&self) -> bool {
        self.from_window == self.to_window
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        group: DragGroup,
    },
    DropPending {
        group: DragGroup,
        target: DropTarget,
    },
    Applying {
        request: DropRequest,
    },
}

#[derive(Debug, Default)]
pub struct DragSession {
    state: DragState,
}

impl DragSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, DragState::Idle)
    }

    /// Pick up `tab`. Drags the whole selection when `tab` is part of it,
    /// otherwise just `tab`; returns the group so the caller can make the
    /// selection match.
    pub fn start(
        &mut self,
        tab: TabId,
        window: WindowId,
        selection: &[TabId],
    ) -> Option<&DragGroup> {
        if matches!(self.state, DragState::Applying { .. }) {
            tracing::debug!(tab = %tab, "drag start ignored while applying");
            return None;
        }
        let ids = if selection.contains(&tab) {
            selection.to_vec()
        } else {
            vec![tab]
        };
        self.state = DragState::Dragging {
            group: DragGroup {
                ids,
                from_window: window,
            },
        };
        match &self.state {
            DragState::Dragging { group } => Some(group),
            _ => None,
        }
    }

    /// Pointer is over slot `index` of `window`.
    pub fn hover(&mut self, window: WindowId, index: usize) {
        let target = DropTarget { window, index };
        self.state = match std::mem::take(&mut self.state) {
            DragState::Dragging { group } | DragState::DropPending { group, .. } => {
                DragState::DropPending { group, target }
            }
            other => {
                tracing::debug!(window = %window, index, "hover ignored outside a drag");
                other
            }
        };
    }

    /// Release. Without a hover target the group drops at the end of its own
    /// window.
    pub fn end(&mut self) -> Option<DropRequest> {
        let request = match std::mem::take(&mut self.state) {
            DragState::Dragging { group } => DropRequest {
                to_window: group.from_window,
                from_window: group.from_window,
                ids: group.ids,
                insert_at: InsertAt::End,
            },
            DragState::DropPending { group, target } => DropRequest {
                to_window: target.window,
                from_window: group.from_window,
                ids: group.ids,
                insert_at: InsertAt::Index(target.index),
            },
            other => {
                tracing::debug!("drag end ignored outside a drag");
                self.state = other;
                return None;
            }
        };
        self.state = DragState::Applying {
            request: request.clone(),
        };
        Some(request)
    }

    pub fn cancel(&mut self) {
        if !matches!(self.state, DragState::Applying { .. }) {
            self.state = DragState::Idle;
        }
    }

    /// The drop has been applied.
    pub fn finish(&mut self) {
        if matches!(self.state, DragState::Applying { .. }) {
            self.state = DragState::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tabs::tab_ids;

    #[test]
    fn selected_tab_drags_whole_selection() {
        let mut s = DragSession::new();
        let group = s.start(TabId(2), WindowId(1), &tab_ids([5, 2])).cloned();
        assert_eq!(group.map(|g| g.ids), Some(tab_ids([5, 2])));
    }

    #[test]
    fn unselected_tab_drags_alone() {
        let mut s = DragSession::new();
        let group = s.start(TabId(3), WindowId(1), &tab_ids([5, 2])).cloned();
        assert_eq!(group.map(|g| g.ids), Some(tab_ids([3])));
    }

    #[test]
    fn hover_then_end_targets_hovered_slot() {
        let mut s = DragSession::new();
        s.start(TabId(3), WindowId(1), &[]);
        s.hover(WindowId(2), 0);
        s.hover(WindowId(2), 1);
        let req = s.end().unwrap();
        assert_eq!(req.to_window, WindowId(2));
        assert_eq!(req.insert_at, InsertAt::Index(1));
        assert!(!req.is_same_window());
        assert!(matches!(s.state(), DragState::Applying { .. }));
        s.finish();
        assert!(s.is_idle());
    }

    #[test]
    fn end_without_hover_falls_back_to_end_of_source() {
        let mut s = DragSession::new();
        s.start(TabId(3), WindowId(4), &[]);
        let req = s.end().unwrap();
        assert_eq!(req.to_window, WindowId(4));
        assert_eq!(req.insert_at, InsertAt::End);
        assert!(req.is_same_window());
    }

    #[test]
    fn stray_events_are_ignored() {
        let mut s = DragSession::new();
        s.hover(WindowId(1), 2);
        assert!(s.is_idle());
        assert!(s.end().is_none());

        s.start(TabId(1), WindowId(1), &[]);
        s.end();
        // a new gesture cannot start while the previous drop is applied
        assert!(s.start(TabId(2), WindowId(1), &[]).is_none());
        s.cancel();
        assert!(matches!(s.state(), DragState::Applying { .. }));
        s.finish();

        s.start(TabId(2), WindowId(1), &[]);
        s.cancel();
        assert!(s.is_idle());
    }
}
