use std::collections::{BTreeMap, HashMap};

use super::{DestIndex, HostError, MoveTarget, TabHost};
use crate::tabs::{Tab, TabId, WindowId};

/// Injected misbehaviour for a specific tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultRule {
    /// Every move of the tab is rejected.
    Reject(TabId),
    /// Moves to an absolute index are rejected, appends succeed.
    RejectIndexed(TabId),
    /// Another actor closes the tab at the moment its move is requested.
    VanishOnMove(TabId),
}

impl FaultRule {
    fn tab(&self) -> TabId {
        match *self {
            FaultRule::Reject(tab) | FaultRule::RejectIndexed(tab) | FaultRule::VanishOnMove(tab) => {
                tab
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
struct TabMeta {
    title: Option<String>,
    url: Option<String>,
}

/// In-memory host with browser-like move semantics.
///
/// Windows that lose their last tab are closed, mirroring how browsers behave.
#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
    windows: BTreeMap<WindowId, Vec<TabId>>,
    meta: HashMap<TabId, TabMeta>,
    faults: Vec<FaultRule>,
    move_log: Vec<(TabId, MoveTarget)>,
    current: Option<WindowId>,
    active: HashMap<WindowId, TabId>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`MemoryHost::insert_window`].
    pub fn with_window(mut self, window: WindowId, tabs: Vec<TabId>) -> Self {
        self.insert_window(window, tabs);
        self
    }

    pub fn insert_window(&mut self, window: WindowId, tabs: Vec<TabId>) {
        if tabs.is_empty() {
            return;
        }
        for tab in &tabs {
            self.meta.entry(*tab).or_default();
        }
        if let Some(first) = tabs.first() {
            self.active.insert(window, *first);
        }
        self.windows.insert(window, tabs);
        if self.current.is_none() {
            self.current = Some(window);
        }
    }

    pub fn set_current(&mut self, window: WindowId) {
        self.current = Some(window);
    }

    pub fn set_title(&mut self, tab: TabId, title: impl Into<String>) {
        self.meta.entry(tab).or_default().title = Some(title.into());
    }

    pub fn set_url(&mut self, tab: TabId, url: impl Into<String>) {
        self.meta.entry(tab).or_default().url = Some(url.into());
    }

    pub fn add_fault(&mut self, rule: FaultRule) {
        self.faults.push(rule);
    }

    pub fn clear_faults(&mut self) {
        self.faults.clear();
    }

    /// Every move request received, successful or not.
    pub fn move_log(&self) -> &[(TabId, MoveTarget)] {
        &self.move_log
    }

    pub fn clear_move_log(&mut self) {
        self.move_log.clear();
    }

    /// Read-only view of a window's order, for assertions.
    pub fn order(&self, window: WindowId) -> Option<&[TabId]> {
        self.windows.get(&window).map(Vec::as_slice)
    }

    pub fn active_tab(&self, window: WindowId) -> Option<TabId> {
        self.active.get(&window).copied()
    }

    fn locate(&self, tab: TabId) -> Option<(WindowId, usize)> {
        self.windows.iter().find_map(|(window, tabs)| {
            tabs.iter()
                .position(|id| *id == tab)
                .map(|index| (*window, index))
        })
    }

    fn fault_for(&self, tab: TabId) -> Option<FaultRule> {
        self.faults.iter().copied().find(|rule| rule.tab() == tab)
    }

    fn detach(&mut self, window: WindowId, index: usize) {
        let tabs = self.windows.entry(window).or_default();
        let tab = tabs.remove(index);
        if tabs.is_empty() {
            self.windows.remove(&window);
            self.active.remove(&window);
            if self.current == Some(window) {
                self.current = self.windows.keys().next().copied();
            }
        } else if self.active.get(&window) == Some(&tab) {
            let next = tabs[index.min(tabs.len() - 1)];
            self.active.insert(window, next);
        }
    }

    fn next_window_id(&self) -> WindowId {
        let max = self.windows.keys().map(|w| w.0).max().unwrap_or(0);
        WindowId(max + 1)
    }
}

impl TabHost for MemoryHost {
    fn windows(&mut self) -> Result<Vec<WindowId>, HostError> {
        Ok(self.windows.keys().copied().collect())
    }

    fn current_window(&mut self) -> Option<WindowId> {
        self.current
    }

    fn window_order(&mut self, window: WindowId) -> Result<Vec<TabId>, HostError> {
        self.windows
            .get(&window)
            .cloned()
            .ok_or(HostError::NoSuchWindow(window))
    }

    fn tab(&mut self, tab: TabId) -> Result<Tab, HostError> {
        let (window, index) = self.locate(tab).ok_or(HostError::NoSuchTab(tab))?;
        let meta = self.meta.get(&tab).cloned().unwrap_or_default();
        Ok(Tab {
            id: tab,
            window,
            index,
            title: meta.title,
            url: meta.url,
        })
    }

    fn move_tab(&mut self, tab: TabId, target: MoveTarget) -> Result<(), HostError> {
        self.move_log.push((tab, target));

        match self.fault_for(tab) {
            Some(FaultRule::Reject(_)) => {
                return Err(HostError::Rejected {
                    tab,
                    reason: "move not permitted".into(),
                });
            }
            Some(FaultRule::RejectIndexed(_)) if target.index != DestIndex::End => {
                return Err(HostError::Rejected {
                    tab,
                    reason: "indexed move not permitted".into(),
                });
            }
            Some(FaultRule::VanishOnMove(_)) => {
                if let Some((window, index)) = self.locate(tab) {
                    self.detach(window, index);
                    self.meta.remove(&tab);
                }
                return Err(HostError::NoSuchTab(tab));
            }
            _ => {}
        }

        let (from, from_index) = self.locate(tab).ok_or(HostError::NoSuchTab(tab))?;
        let dest = target.window.unwrap_or(from);
        if !self.windows.contains_key(&dest) {
            return Err(HostError::NoSuchWindow(dest));
        }

        let dest_len = self.windows[&dest].len() - usize::from(dest == from);
        let insert_at = match target.index {
            DestIndex::End => dest_len,
            DestIndex::At(index) if index <= dest_len => index,
            DestIndex::At(index) => {
                return Err(HostError::IndexOutOfRange {
                    window: dest,
                    index,
                    len: dest_len,
                });
            }
        };

        if dest == from {
            if let Some(tabs) = self.windows.get_mut(&dest) {
                tabs.remove(from_index);
                tabs.insert(insert_at, tab);
            }
            return Ok(());
        }

        self.detach(from, from_index);
        if let Some(tabs) = self.windows.get_mut(&dest) {
            tabs.insert(insert_at, tab);
        }
        Ok(())
    }

    fn create_window(&mut self, first_tab: TabId) -> Result<WindowId, HostError> {
        let (from, index) = self
            .locate(first_tab)
            .ok_or(HostError::NoSuchTab(first_tab))?;
        let window = self.next_window_id();
        self.detach(from, index);
        self.windows.insert(window, vec![first_tab]);
        self.active.insert(window, first_tab);
        self.current = Some(window);
        Ok(window)
    }

    fn remove_tab(&mut self, tab: TabId) -> Result<(), HostError> {
        let (window, index) = self.locate(tab).ok_or(HostError::NoSuchTab(tab))?;
        self.detach(window, index);
        self.meta.remove(&tab);
        Ok(())
    }

    fn activate_tab(&mut self, tab: TabId) -> Result<(), HostError> {
        let (window, _) = self.locate(tab).ok_or(HostError::NoSuchTab(tab))?;
        self.current = Some(window);
        self.active.insert(window, tab);
        Ok(())
    }
}
