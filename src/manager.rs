//! Command dispatch: the tab manager glues the host, the reconciler, the drag
//! session and the application state together.

use crate::actions::{Action, MoveDestination};
use crate::config::ReconcileConfig;
use crate::drag::{DragSession, DropRequest};
use crate::host::{HostError, MoveTarget, TabHost};
use crate::plan::{InsertAt, order_by_position, splice_within};
use crate::reconcile::{ReconcileReport, Reconciler};
use crate::state::{AppState, Status};
use crate::tabs::{TabId, WindowId, WindowSnapshot};

pub struct TabManager<H: TabHost> {
    host: H,
    state: AppState,
    drag: DragSession,
    config: ReconcileConfig,
}

impl<H: TabHost> TabManager<H> {
    pub fn new(host: H) -> Self {
        Self::with_config(host, ReconcileConfig::default())
    }

    pub fn with_config(host: H, config: ReconcileConfig) -> Self {
        Self {
            host,
            state: AppState::new(),
            drag: DragSession::new(),
            config,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    pub fn drag(&self) -> &DragSession {
        &self.drag
    }

    /// Run one command and return the resulting status line.
    pub fn dispatch(&mut self, action: Action) -> &Status {
        tracing::debug!(action = %action, "dispatch");
        match action {
            Action::Refresh => {
                if let Err(err) = self.refresh() {
                    self.state.set_error(format!("Error loading windows: {err}"));
                }
            }
            Action::ToggleSelect(tab) => self.state.toggle_selected(tab),
            Action::SelectAllVisible => {
                let visible = self.state.visible_tabs();
                self.state.select_all(visible);
                self.state.set_status("All visible tabs selected.");
            }
            Action::ClearSelection => {
                self.state.clear_selection();
                self.state.set_status("");
            }
            Action::ToggleCollapsed(window) => self.state.toggle_collapsed(window),
            Action::ApplyDrop(request) => self.apply_drop(request),
            Action::MoveSelected {
                destination,
                position,
            } => self.move_selected(destination, position),
            Action::CloseTab(tab) => self.close_tab(tab),
            Action::CloseSelected => self.close_selected(),
            Action::ActivateTab(tab) => self.activate_tab(tab),
            Action::ActivateSelected => self.activate_selected(),
        }
        self.state.status()
    }

    /// Reload every window from the host into the state.
    pub fn refresh(&mut self) -> Result<(), HostError> {
        let current = self.host.current_window();
        let mut windows = Vec::new();
        for id in self.host.windows()? {
            windows.push(WindowSnapshot::new(id, self.host.window_order(id)?));
        }
        let known: Vec<TabId> = windows.iter().flat_map(|w| w.tabs.clone()).collect();
        let stale: Vec<TabId> = self
            .state
            .selection()
            .iter()
            .copied()
            .filter(|tab| !known.contains(tab))
            .collect();
        for tab in stale {
            self.state.deselect(tab);
        }
        self.state.set_windows(windows, current);
        Ok(())
    }

    fn refresh_quietly(&mut self) {
        if let Err(err) = self.refresh() {
            tracing::warn!(error = %err, "refresh after command failed");
        }
    }

    fn finish_report(&mut self, report: &ReconcileReport) {
        let message = report.status_message();
        if report.is_clean() {
            self.state.set_status(message);
        } else {
            self.state.set_error(message);
        }
    }

    // --- drag & drop ----------------------------------------------------

    pub fn drag_start(&mut self, tab: TabId, window: WindowId) {
        let selection = self.state.selection().to_vec();
        if let Some(group) = self.drag.start(tab, window, &selection) {
            let ids = group.ids.clone();
            self.state.set_selection(&ids);
        }
    }

    pub fn drag_over(&mut self, window: WindowId, index: usize) {
        self.drag.hover(window, index);
    }

    pub fn drag_cancel(&mut self) {
        self.drag.cancel();
    }

    /// Release the drag and apply it right away.
    pub fn drag_end(&mut self) {
        if let Some(request) = self.drag.end() {
            self.apply_drop(request);
        }
        self.drag.finish();
    }

    fn apply_drop(&mut self, request: DropRequest) {
        let destination = match self.host.window_order(request.to_window) {
            Ok(order) => order,
            Err(err) => {
                self.state.set_error(format!("Drop failed: {err}"));
                self.refresh_quietly();
                return;
            }
        };

        tracing::debug!(
            from = %request.from_window,
            to = %request.to_window,
            same_window = request.is_same_window(),
            tabs = request.ids.len(),
            "applying drop"
        );
        let desired = splice_within(&destination, &request.ids, request.insert_at);
        let mut reconciler = Reconciler::with_config(&mut self.host, self.config);
        let report = if request.ids.iter().all(|id| destination.contains(id)) {
            reconciler.reorder_within_window(request.to_window, &request.ids, &desired)
        } else {
            reconciler.move_group_to_window(
                &request.ids,
                request.from_window,
                request.to_window,
                &desired,
            )
        };
        self.finish_report(&report);
        self.refresh_quietly();
    }

    // --- commands -------------------------------------------------------

    fn move_selected(&mut self, destination: MoveDestination, position: Option<usize>) {
        if self.state.selection().is_empty() {
            self.state.set_status("No tabs selected.");
            return;
        }
        self.refresh_quietly();
        let selected = self.state.selection().to_vec();

        match destination {
            MoveDestination::NewWindow => self.move_selected_to_new_window(&selected),
            MoveDestination::Window(target) => {
                let ordered = order_by_position(&selected, self.state.windows());
                let at = InsertAt::from_position(position);
                let same_window = ordered
                    .iter()
                    .all(|tab| self.state.window_of(*tab) == Some(target));
                let dest_current = self
                    .state
                    .window(target)
                    .map(|w| w.tabs.clone())
                    .unwrap_or_default();
                self.state.clear_selection();

                let desired = splice_within(&dest_current, &ordered, at);
                let (report, message) = if same_window {
                    let report = Reconciler::with_config(&mut self.host, self.config)
                        .reorder_within_window(target, &ordered, &desired);
                    let message = format!(
                        "Moved {} tab(s) within window {target}.",
                        selected.len()
                    );
                    (report, message)
                } else {
                    let remaining = desired.len() - ordered.len();
                    let insert_at = at.resolve(remaining);
                    let from = ordered
                        .first()
                        .and_then(|tab| self.state.window_of(*tab))
                        .unwrap_or(target);
                    let report = Reconciler::with_config(&mut self.host, self.config)
                        .move_group_to_window(&ordered, from, target, &desired);
                    let message = format!(
                        "Moved {} tab(s) to window {target} at position {}.",
                        selected.len(),
                        insert_at + 1
                    );
                    (report, message)
                };
                if report.is_clean() {
                    self.state.set_status(message);
                } else {
                    self.state
                        .set_error(format!("{message} {} move(s) failed.", report.failed()));
                }
            }
        }
        self.refresh_quietly();
    }

    fn move_selected_to_new_window(&mut self, selected: &[TabId]) {
        let Some((first, rest)) = selected.split_first() else {
            return;
        };
        let window = match self.host.create_window(*first) {
            Ok(window) => window,
            Err(err) => {
                self.state
                    .set_error(format!("Error moving tabs: {err}"));
                return;
            }
        };
        let mut failed = 0;
        for tab in rest {
            if let Err(err) = self.host.move_tab(*tab, MoveTarget::append_to(window)) {
                tracing::warn!(tab = %tab, window = %window, error = %err, "append to new window failed");
                failed += 1;
            }
        }
        self.state.clear_selection();
        let message = format!(
            "Moved {} tab(s) to new window ({window}).",
            selected.len()
        );
        if failed == 0 {
            self.state.set_status(message);
        } else {
            self.state
                .set_error(format!("{message} {failed} move(s) failed."));
        }
    }

    fn close_tab(&mut self, tab: TabId) {
        match self.host.remove_tab(tab) {
            Ok(()) => {
                self.state.deselect(tab);
                self.state.set_status("Tab closed.");
            }
            Err(err) => self.state.set_error(format!("Error closing tab: {err}")),
        }
        self.refresh_quietly();
    }

    fn close_selected(&mut self) {
        let selected = self.state.selection().to_vec();
        if selected.is_empty() {
            self.state.set_status("No tabs selected to close.");
            return;
        }
        let mut failed = 0;
        for tab in &selected {
            if let Err(err) = self.host.remove_tab(*tab) {
                tracing::warn!(tab = %tab, error = %err, "close failed");
                failed += 1;
            }
            self.state.deselect(*tab);
        }
        if failed == 0 {
            self.state
                .set_status(format!("Closed {} tab(s).", selected.len()));
        } else {
            self.state.set_error(format!(
                "Closed {} tab(s). {failed} could not be closed.",
                selected.len() - failed
            ));
        }
        self.refresh_quietly();
    }

    fn activate_tab(&mut self, tab: TabId) {
        match self.host.activate_tab(tab) {
            Ok(()) => self.state.set_status("Jumped to tab."),
            Err(err) => self
                .state
                .set_error(format!("Error jumping to tab: {err}")),
        }
    }

    fn activate_selected(&mut self) {
        let Some(tab) = self.state.selection().first().copied() else {
            self.state.set_status("No tabs selected to jump to.");
            return;
        };
        match self.host.activate_tab(tab) {
            Ok(()) => self.state.set_status("Jumped to selected tab."),
            Err(err) => self
                .state
                .set_error(format!("Error jumping to tab: {err}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{FaultRule, MemoryHost};
    use crate::tabs::tab_ids;

    fn manager() -> TabManager<MemoryHost> {
        let mut host = MemoryHost::new()
            .with_window(WindowId(1), tab_ids([1, 2, 3, 4]))
            .with_window(WindowId(2), tab_ids([10, 11]));
        host.set_current(WindowId(1));
        let mut m = TabManager::new(host);
        m.dispatch(Action::Refresh);
        m
    }

    #[test]
    fn refresh_puts_current_window_first() {
        let m = manager();
        let ids: Vec<WindowId> = m.state().windows().iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![WindowId(1), WindowId(2)]);
        assert!(m.state().is_collapsed(WindowId(2)));
    }

    #[test]
    fn move_selected_requires_selection() {
        let mut m = manager();
        let status = m.dispatch(Action::MoveSelected {
            destination: MoveDestination::Window(WindowId(2)),
            position: None,
        });
        assert_eq!(status.text, "No tabs selected.");
        assert!(m.host().move_log().is_empty());
    }

    #[test]
    fn move_selected_within_window_uses_position() {
        let mut m = manager();
        m.dispatch(Action::ToggleSelect(TabId(4)));
        m.dispatch(Action::ToggleSelect(TabId(3)));
        let status = m
            .dispatch(Action::MoveSelected {
                destination: MoveDestination::Window(WindowId(1)),
                position: Some(1),
            })
            .clone();
        assert_eq!(status.text, "Moved 2 tab(s) within window 1.");
        assert!(!status.is_error);
        assert_eq!(m.host().order(WindowId(1)).unwrap(), tab_ids([3, 4, 1, 2]));
        assert!(m.state().selection().is_empty());
    }

    #[test]
    fn move_selected_across_windows() {
        let mut m = manager();
        m.dispatch(Action::ToggleSelect(TabId(2)));
        m.dispatch(Action::ToggleSelect(TabId(1)));
        let status = m
            .dispatch(Action::MoveSelected {
                destination: MoveDestination::Window(WindowId(2)),
                position: Some(2),
            })
            .clone();
        assert_eq!(status.text, "Moved 2 tab(s) to window 2 at position 2.");
        assert_eq!(
            m.host().order(WindowId(2)).unwrap(),
            tab_ids([10, 1, 2, 11])
        );
        assert_eq!(m.state().window(WindowId(1)).unwrap().tabs, tab_ids([3, 4]));
    }

    #[test]
    fn move_selected_spanning_windows_keeps_group_contiguous() {
        let mut m = manager();
        m.dispatch(Action::ToggleSelect(TabId(1)));
        m.dispatch(Action::ToggleSelect(TabId(10)));
        let status = m
            .dispatch(Action::MoveSelected {
                destination: MoveDestination::Window(WindowId(2)),
                position: None,
            })
            .clone();
        assert_eq!(status.text, "Moved 2 tab(s) to window 2 at position 2.");
        assert!(!status.is_error);
        assert_eq!(m.host().order(WindowId(2)).unwrap(), tab_ids([11, 1, 10]));
        assert_eq!(m.host().order(WindowId(1)).unwrap(), tab_ids([2, 3, 4]));
    }

    #[test]
    fn move_selected_spanning_windows_at_position() {
        let mut m = manager();
        m.dispatch(Action::ToggleSelect(TabId(11)));
        m.dispatch(Action::ToggleSelect(TabId(3)));
        let status = m
            .dispatch(Action::MoveSelected {
                destination: MoveDestination::Window(WindowId(1)),
                position: Some(1),
            })
            .clone();
        assert_eq!(status.text, "Moved 2 tab(s) to window 1 at position 1.");
        assert_eq!(
            m.host().order(WindowId(1)).unwrap(),
            tab_ids([11, 3, 1, 2, 4])
        );
        assert_eq!(m.host().order(WindowId(2)).unwrap(), tab_ids([10]));
    }

    #[test]
    fn move_selected_to_new_window_keeps_selection_order() {
        let mut m = manager();
        m.dispatch(Action::ToggleSelect(TabId(11)));
        m.dispatch(Action::ToggleSelect(TabId(2)));
        let status = m
            .dispatch(Action::MoveSelected {
                destination: MoveDestination::NewWindow,
                position: None,
            })
            .clone();
        assert_eq!(status.text, "Moved 2 tab(s) to new window (3).");
        assert_eq!(m.host().order(WindowId(3)).unwrap(), tab_ids([11, 2]));
    }

    #[test]
    fn drop_within_window() {
        let mut m = manager();
        m.drag_start(TabId(1), WindowId(1));
        m.drag_over(WindowId(1), 2);
        m.drag_end();
        assert_eq!(m.host().order(WindowId(1)).unwrap(), tab_ids([2, 3, 1, 4]));
        assert!(m.drag().is_idle());
        assert_eq!(m.state().selection(), tab_ids([1]));
    }

    #[test]
    fn drop_across_windows_with_selection() {
        let mut m = manager();
        m.dispatch(Action::ToggleSelect(TabId(4)));
        m.dispatch(Action::ToggleSelect(TabId(2)));
        m.drag_start(TabId(2), WindowId(1));
        m.drag_over(WindowId(2), 1);
        m.drag_end();
        assert_eq!(
            m.host().order(WindowId(2)).unwrap(),
            tab_ids([10, 4, 2, 11])
        );
        assert_eq!(m.state().status().text, "Moved 2 tab(s) to window 2.");
    }

    #[test]
    fn drop_of_group_spanning_windows() {
        let mut m = manager();
        m.dispatch(Action::ToggleSelect(TabId(1)));
        m.dispatch(Action::ToggleSelect(TabId(10)));
        m.drag_start(TabId(1), WindowId(1));
        m.drag_over(WindowId(1), 2);
        m.drag_end();
        assert_eq!(
            m.host().order(WindowId(1)).unwrap(),
            tab_ids([2, 3, 1, 10, 4])
        );
        assert_eq!(m.host().order(WindowId(2)).unwrap(), tab_ids([11]));
        let status = m.state().status();
        assert!(!status.is_error);
        assert_eq!(status.text, "Moved 2 tab(s) to window 1.");
    }

    #[test]
    fn close_selected_counts_failures() {
        let mut m = manager();
        m.dispatch(Action::ToggleSelect(TabId(1)));
        m.dispatch(Action::ToggleSelect(TabId(99)));
        let status = m.dispatch(Action::CloseSelected).clone();
        assert!(status.is_error);
        assert_eq!(status.text, "Closed 1 tab(s). 1 could not be closed.");
        assert!(m.state().selection().is_empty());
        assert_eq!(m.host().order(WindowId(1)).unwrap(), tab_ids([2, 3, 4]));
    }

    #[test]
    fn close_tab_and_activate() {
        let mut m = manager();
        m.dispatch(Action::ToggleSelect(TabId(11)));
        m.dispatch(Action::CloseTab(TabId(10)));
        let status = m.dispatch(Action::ActivateSelected).clone();
        assert_eq!(status.text, "Jumped to selected tab.");
        assert_eq!(m.host().active_tab(WindowId(2)), Some(TabId(11)));
        assert_eq!(m.host_mut().current_window(), Some(WindowId(2)));
    }

    #[test]
    fn activate_tab_focuses_its_window() {
        let mut m = manager();
        let status = m.dispatch(Action::ActivateTab(TabId(11))).clone();
        assert_eq!(status.text, "Jumped to tab.");
        assert!(!status.is_error);
        assert_eq!(m.host().active_tab(WindowId(2)), Some(TabId(11)));
        assert_eq!(m.host_mut().current_window(), Some(WindowId(2)));

        let status = m.dispatch(Action::ActivateTab(TabId(99))).clone();
        assert!(status.is_error);
        assert_eq!(status.text, "Error jumping to tab: no tab with id 99");
    }

    #[test]
    fn failed_drop_is_reported_as_error() {
        let mut m = manager();
        m.host_mut().add_fault(FaultRule::Reject(TabId(3)));
        m.drag_start(TabId(3), WindowId(1));
        m.drag_over(WindowId(1), 0);
        m.drag_end();
        let status = m.state().status();
        assert!(status.is_error);
        assert_eq!(status.text, "Reordered 1 tab(s) in window 1. 1 move(s) failed.");
    }

    #[test]
    fn select_all_visible_skips_collapsed_windows() {
        let mut m = manager();
        m.dispatch(Action::SelectAllVisible);
        assert_eq!(m.state().selection(), tab_ids([1, 2, 3, 4]));
        m.dispatch(Action::ToggleCollapsed(WindowId(2)));
        m.dispatch(Action::SelectAllVisible);
        assert_eq!(m.state().selection(), tab_ids([1, 2, 3, 4, 10, 11]));
        m.dispatch(Action::ClearSelection);
        assert!(m.state().selection().is_empty());
    }
}
