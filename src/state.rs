use std::collections::HashMap;

use crate::tabs::{TabId, WindowId, WindowSnapshot};

/// One line of feedback for the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Status {
    pub text: String,
    pub is_error: bool,
}

/// Everything the tab manager remembers between commands.
#[derive(Debug, Default, Clone)]
pub struct AppState {
    selection: Vec<TabId>,
    collapsed: HashMap<WindowId, bool>,
    current_window: Option<WindowId>,
    windows: Vec<WindowSnapshot>,
    status: Status,
    status_dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> &[TabId] {
        &self.selection
    }

    pub fn is_selected(&self, tab: TabId) -> bool {
        self.selection.contains(&tab)
    }

    pub fn select(&mut self, tab: TabId) {
        if !self.is_selected(tab) {
            self.selection.push(tab);
        }
    }

    pub fn deselect(&mut self, tab: TabId) {
        self.selection.retain(|id| *id != tab);
    }

    pub fn toggle_selected(&mut self, tab: TabId) {
        if self.is_selected(tab) {
            self.deselect(tab);
        } else {
            self.select(tab);
        }
    }

    pub fn select_all<I: IntoIterator<Item = TabId>>(&mut self, tabs: I) {
        for tab in tabs {
            self.select(tab);
        }
    }

    /// Replace the selection, keeping order and dropping duplicates.
    pub fn set_selection(&mut self, tabs: &[TabId]) {
        self.selection.clear();
        self.select_all(tabs.iter().copied());
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn current_window(&self) -> Option<WindowId> {
        self.current_window
    }

    pub fn windows(&self) -> &[WindowSnapshot] {
        &self.windows
    }

    pub fn window(&self, id: WindowId) -> Option<&WindowSnapshot> {
        self.windows.iter().find(|w| w.id == id)
    }

    pub fn window_of(&self, tab: TabId) -> Option<WindowId> {
        self.windows.iter().find(|w| w.contains(tab)).map(|w| w.id)
    }

    /// Install a fresh window list: current window first, the rest by id.
    /// Windows seen for the first time start collapsed unless current.
    pub fn set_windows(&mut self, mut windows: Vec<WindowSnapshot>, current: Option<WindowId>) {
        windows.sort_by_key(|w| (Some(w.id) != current, w.id));
        for w in &windows {
            self.collapsed
                .entry(w.id)
                .or_insert_with(|| Some(w.id) != current);
        }
        self.current_window = current;
        self.windows = windows;
    }

    pub fn is_collapsed(&self, window: WindowId) -> bool {
        self.collapsed.get(&window).copied().unwrap_or(true)
    }

    pub fn toggle_collapsed(&mut self, window: WindowId) {
        let collapsed = !self.is_collapsed(window);
        self.collapsed.insert(window, collapsed);
    }

    /// Tabs in windows that are expanded.
    pub fn visible_tabs(&self) -> Vec<TabId> {
        self.windows
            .iter()
            .filter(|w| !self.is_collapsed(w.id))
            .flat_map(|w| w.tabs.iter().copied())
            .collect()
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn set_status(&mut self, text: impl Into<String>) {
        self.status = Status {
            text: text.into(),
            is_error: false,
        };
        self.status_dirty = true;
    }

    pub fn set_error(&mut self, text: impl Into<String>) {
        self.status = Status {
            text: text.into(),
            is_error: true,
        };
        self.status_dirty = true;
    }

    /// The status line if it changed since the last call.
    pub fn take_status_change(&mut self) -> Option<&Status> {
        if self.status_dirty {
            self.status_dirty = false;
            Some(&self.status)
        } else {
            None
        }
    }
}
