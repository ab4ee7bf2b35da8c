//! Order reconciliation: turn a desired tab order into single-tab move requests.
//!
//! Moves are issued one at a time, left to right by target index, and the
//! local working model is updated after each successful move. Placing slot
//! `k` only ever shifts tabs at slots `>= k`, so the already placed prefix
//! stays put and every later `position` lookup reflects the real window.
//!
//! Failures never abort a batch. They are collected in a [`ReconcileReport`]
//! and the caller re-queries the host to see what actually happened.

use std::collections::HashMap;

use thiserror::Error;

use crate::config::{MirrorRecovery, ReconcileConfig};
use crate::host::{DestIndex, HostError, MoveTarget, TabHost};
use crate::tabs::{TabId, WindowId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileIssue {
    #[error("desired order has {expected} tabs but the window holds {actual}")]
    StaleSnapshotMismatch { expected: usize, actual: usize },
    #[error("could not read window {window}: {source}")]
    QueryFailed { window: WindowId, source: HostError },
    #[error("moving tab {tab} to index {index} failed: {source}")]
    MoveRejected {
        tab: TabId,
        index: usize,
        source: HostError,
    },
    #[error("moving tab {tab} into window {window} at {index} failed: {source}")]
    CrossWindowMoveRejected {
        tab: TabId,
        window: WindowId,
        index: DestIndex,
        source: HostError,
        /// The append retry succeeded.
        recovered: bool,
    },
}

impl ReconcileIssue {
    /// Whether the issue left a tab somewhere other than requested.
    pub fn is_failure(&self) -> bool {
        match self {
            ReconcileIssue::StaleSnapshotMismatch { .. } => false,
            ReconcileIssue::QueryFailed { .. } | ReconcileIssue::MoveRejected { .. } => true,
            ReconcileIssue::CrossWindowMoveRejected { recovered, .. } => !recovered,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileKind {
    /// Reorder inside one window.
    Reorder,
    /// Move a group into another window.
    Transfer,
}

/// A move the same-window loop would issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedMove {
    pub tab: TabId,
    pub index: usize,
}

/// Outcome of one reconciliation call.
///
/// `intended` is the optimistic count shown to users; the real positions are
/// only known by re-querying the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub kind: ReconcileKind,
    pub window: WindowId,
    pub intended: usize,
    pub issued: usize,
    pub skipped: usize,
    pub retried: usize,
    pub restarts: usize,
    pub degraded: bool,
    pub issues: Vec<ReconcileIssue>,
}

impl ReconcileReport {
    pub fn new(kind: ReconcileKind, window: WindowId, intended: usize) -> Self {
        Self {
            kind,
            window,
            intended,
            issued: 0,
            skipped: 0,
            retried: 0,
            restarts: 0,
            degraded: false,
            issues: Vec::new(),
        }
    }

    /// Number of issues that left a tab unplaced.
    pub fn failed(&self) -> usize {
        self.issues.iter().filter(|issue| issue.is_failure()).count()
    }

    pub fn is_clean(&self) -> bool {
        self.failed() == 0
    }

    fn query_error(&self) -> Option<&HostError> {
        self.issues.iter().find_map(|issue| match issue {
            ReconcileIssue::QueryFailed { source, .. } => Some(source),
            _ => None,
        })
    }

    pub fn status_message(&self) -> String {
        if let Some(err) = self.query_error() {
            return format!("Could not read window {}: {err}", self.window);
        }
        let mut msg = match self.kind {
            ReconcileKind::Reorder => format!(
                "Reordered {} tab(s) in window {}.",
                self.intended, self.window
            ),
            ReconcileKind::Transfer => {
                format!("Moved {} tab(s) to window {}.", self.intended, self.window)
            }
        };
        let failed = self.failed();
        if failed > 0 {
            msg.push_str(&format!(" {failed} move(s) failed."));
        }
        msg
    }
}

/// Receiver of the same-window loop's move requests.
trait MoveSink {
    fn move_to(&mut self, tab: TabId, index: usize) -> Result<(), HostError>;

    /// Fresh live order, when the sink can provide one.
    fn requery(&mut self) -> Option<Vec<TabId>>;
}

struct HostSink<'a, H: TabHost + ?Sized> {
    host: &'a mut H,
    window: WindowId,
}

impl<H: TabHost + ?Sized> MoveSink for HostSink<'_, H> {
    fn move_to(&mut self, tab: TabId, index: usize) -> Result<(), HostError> {
        self.host.move_tab(tab, MoveTarget::within(index))
    }

    fn requery(&mut self) -> Option<Vec<TabId>> {
        match self.host.window_order(self.window) {
            Ok(order) => Some(order),
            Err(err) => {
                tracing::warn!(window = %self.window, error = %err, "requery after failed move failed");
                None
            }
        }
    }
}

#[derive(Default)]
struct PlanSink {
    moves: Vec<PlannedMove>,
}

impl MoveSink for PlanSink {
    fn move_to(&mut self, tab: TabId, index: usize) -> Result<(), HostError> {
        self.moves.push(PlannedMove { tab, index });
        Ok(())
    }

    fn requery(&mut self) -> Option<Vec<TabId>> {
        None
    }
}

/// Desired order after the live set changed underneath us: the surviving
/// desired ids in their order, then any newcomers in live order.
fn rebuild_desired(desired: &[TabId], live: &[TabId]) -> Vec<TabId> {
    let mut rebuilt: Vec<TabId> = desired
        .iter()
        .copied()
        .filter(|id| live.contains(id))
        .collect();
    for id in live {
        if !rebuilt.contains(id) {
            rebuilt.push(*id);
        }
    }
    rebuilt
}

/// The same-window loop. `live` and `desired` have equal length.
fn converge<S: MoveSink>(
    mut live: Vec<TabId>,
    desired: &[TabId],
    recovery: MirrorRecovery,
    sink: &mut S,
    report: &mut ReconcileReport,
) {
    let mut desired = desired.to_vec();
    let mut restarts_left = desired.len();
    let mut target = 0;

    while target < desired.len() {
        let id = desired[target];
        let Some(current) = live.iter().position(|tab| *tab == id) else {
            target += 1;
            continue;
        };
        if current == target {
            report.skipped += 1;
            target += 1;
            continue;
        }

        report.issued += 1;
        match sink.move_to(id, target) {
            Ok(()) => {
                let tab = live.remove(current);
                live.insert(target, tab);
                tracing::debug!(tab = %id, from = current, to = target, "moved tab");
            }
            Err(source) => {
                tracing::warn!(tab = %id, index = target, error = %source, "move rejected, skipping");
                report.issues.push(ReconcileIssue::MoveRejected {
                    tab: id,
                    index: target,
                    source,
                });

                if recovery == MirrorRecovery::Requery && restarts_left > 0 {
                    if let Some(fresh) = sink.requery() {
                        if fresh != live {
                            tracing::debug!(
                                expected = live.len(),
                                actual = fresh.len(),
                                "window changed underneath reorder, restarting"
                            );
                            restarts_left -= 1;
                            report.restarts += 1;
                            desired = rebuild_desired(&desired, &fresh);
                            live = fresh;
                            target = 0;
                            continue;
                        }
                    }
                }
            }
        }
        target += 1;
    }
}

/// Moves the same-window loop would issue if every request succeeded.
///
/// Mismatched lengths yield the degraded pass: every desired id at its index.
pub fn plan_reorder(current: &[TabId], desired: &[TabId]) -> Vec<PlannedMove> {
    if current.len() != desired.len() {
        return desired
            .iter()
            .enumerate()
            .map(|(index, tab)| PlannedMove { tab: *tab, index })
            .collect();
    }
    let mut sink = PlanSink::default();
    let mut scratch = ReconcileReport::new(ReconcileKind::Reorder, WindowId(0), 0);
    converge(
        current.to_vec(),
        desired,
        MirrorRecovery::Keep,
        &mut sink,
        &mut scratch,
    );
    sink.moves
}

/// Applies desired orders to a host.
pub struct Reconciler<'h, H: TabHost + ?Sized> {
    host: &'h mut H,
    config: ReconcileConfig,
}

impl<'h, H: TabHost + ?Sized> Reconciler<'h, H> {
    pub fn new(host: &'h mut H) -> Self {
        Self::with_config(host, ReconcileConfig::default())
    }

    pub fn with_config(host: &'h mut H, config: ReconcileConfig) -> Self {
        Self { host, config }
    }

    pub fn config(&self) -> ReconcileConfig {
        self.config
    }

    /// Bring `window` into `desired` order. `moved` is what the user dragged
    /// or selected and only feeds the reported count.
    pub fn reorder_within_window(
        &mut self,
        window: WindowId,
        moved: &[TabId],
        desired: &[TabId],
    ) -> ReconcileReport {
        let mut report = ReconcileReport::new(ReconcileKind::Reorder, window, moved.len());

        let current = match self.host.window_order(window) {
            Ok(order) => order,
            Err(source) => {
                tracing::warn!(window = %window, error = %source, "could not query window for reorder");
                report
                    .issues
                    .push(ReconcileIssue::QueryFailed { window, source });
                return report;
            }
        };

        if current.len() != desired.len() {
            tracing::warn!(
                window = %window,
                expected = desired.len(),
                actual = current.len(),
                "stale desired order, falling back to index assignment"
            );
            report.degraded = true;
            report.issues.push(ReconcileIssue::StaleSnapshotMismatch {
                expected: desired.len(),
                actual: current.len(),
            });
            for (index, tab) in desired.iter().enumerate() {
                report.issued += 1;
                if let Err(source) = self.host.move_tab(*tab, MoveTarget::within(index)) {
                    tracing::debug!(tab = %tab, index, error = %source, "degraded move ignored");
                    report.issues.push(ReconcileIssue::MoveRejected {
                        tab: *tab,
                        index,
                        source,
                    });
                }
            }
            return report;
        }

        let mut sink = HostSink {
            host: &mut *self.host,
            window,
        };
        converge(
            current,
            desired,
            self.config.mirror_recovery,
            &mut sink,
            &mut report,
        );

        tracing::info!(
            window = %window,
            issued = report.issued,
            skipped = report.skipped,
            failed = report.failed(),
            "reorder finished"
        );
        report
    }

    /// Move `ids` out of `from` into `to` so they land where `desired_dest`
    /// puts them. Ids absent from `desired_dest` are appended.
    ///
    /// A group may already have members inside `to` (a selection spanning
    /// windows). Only the outside members are inserted; the destination is
    /// then brought into `desired_dest` order with the same-window loop.
    pub fn move_group_to_window(
        &mut self,
        ids: &[TabId],
        from: WindowId,
        to: WindowId,
        desired_dest: &[TabId],
    ) -> ReconcileReport {
        let mut report = ReconcileReport::new(ReconcileKind::Transfer, to, ids.len());

        let resident: Vec<TabId> = match self.host.window_order(to) {
            Ok(order) => ids.iter().copied().filter(|id| order.contains(id)).collect(),
            Err(err) => {
                tracing::debug!(window = %to, error = %err, "destination not readable before group move");
                Vec::new()
            }
        };

        let mut targets: HashMap<TabId, usize> = HashMap::new();
        for (index, id) in desired_dest.iter().enumerate() {
            if ids.contains(id) {
                targets.entry(*id).or_insert(index);
            }
        }

        // Stable: equal targets keep caller order, unknown ids go last.
        let mut ordered: Vec<TabId> = ids
            .iter()
            .copied()
            .filter(|id| !resident.contains(id))
            .collect();
        ordered.sort_by_key(|id| targets.get(id).copied().unwrap_or(usize::MAX));

        for id in ordered {
            let index = targets
                .get(&id)
                .map_or(DestIndex::End, |index| DestIndex::At(*index));
            report.issued += 1;
            let Err(source) = self.host.move_tab(id, MoveTarget::to_window(to, index)) else {
                tracing::debug!(tab = %id, from = %from, to = %to, index = %index, "moved tab across windows");
                continue;
            };

            tracing::warn!(tab = %id, window = %to, index = %index, error = %source, "cross-window move rejected");
            let mut recovered = false;
            if self.config.retry_append && index != DestIndex::End {
                report.issued += 1;
                report.retried += 1;
                match self.host.move_tab(id, MoveTarget::append_to(to)) {
                    Ok(()) => recovered = true,
                    Err(err) => {
                        tracing::warn!(tab = %id, window = %to, error = %err, "append retry rejected");
                    }
                }
            }
            report.issues.push(ReconcileIssue::CrossWindowMoveRejected {
                tab: id,
                window: to,
                index,
                source,
                recovered,
            });
        }

        if !resident.is_empty() {
            self.settle(to, desired_dest, &mut report);
        }

        tracing::info!(
            from = %from,
            to = %to,
            issued = report.issued,
            failed = report.failed(),
            "group move finished"
        );
        report
    }

    /// Same-window pass over whatever `window` holds now, aiming for
    /// `desired` restricted to the live tabs.
    fn settle(&mut self, window: WindowId, desired: &[TabId], report: &mut ReconcileReport) {
        let live = match self.host.window_order(window) {
            Ok(order) => order,
            Err(source) => {
                tracing::warn!(window = %window, error = %source, "could not query window after group move");
                report
                    .issues
                    .push(ReconcileIssue::QueryFailed { window, source });
                return;
            }
        };
        let desired = rebuild_desired(desired, &live);
        let mut sink = HostSink {
            host: &mut *self.host,
            window,
        };
        converge(live, &desired, self.config.mirror_recovery, &mut sink, report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{FaultRule, MemoryHost};
    use crate::plan::{InsertAt, splice_into, splice_within};
    use crate::tabs::tab_ids;

    const W: WindowId = WindowId(1);
    const DEST: WindowId = WindowId(2);

    fn permutations(items: &[u32]) -> Vec<Vec<u32>> {
        if items.len() <= 1 {
            return vec![items.to_vec()];
        }
        let mut out = Vec::new();
        for (i, head) in items.iter().enumerate() {
            let mut rest = items.to_vec();
            rest.remove(i);
            for mut tail in permutations(&rest) {
                tail.insert(0, *head);
                out.push(tail);
            }
        }
        out
    }

    #[test]
    fn example_scenario_issues_two_moves() {
        // A=1, B=2, C=3, D=4: [A,B,C,D] -> [D,A,C,B]
        let mut host = MemoryHost::new().with_window(W, tab_ids([1, 2, 3, 4]));
        let desired = tab_ids([4, 1, 3, 2]);
        let report = Reconciler::new(&mut host).reorder_within_window(W, &desired, &desired);

        assert_eq!(host.order(W).unwrap(), desired.as_slice());
        assert_eq!(
            host.move_log(),
            &[
                (TabId(4), MoveTarget::within(0)),
                (TabId(3), MoveTarget::within(2)),
            ]
        );
        assert_eq!(report.issued, 2);
        assert_eq!(report.skipped, 2);
        assert!(report.is_clean());
    }

    #[test]
    fn every_permutation_converges() {
        let start = [1, 2, 3, 4, 5];
        for perm in permutations(&start) {
            let mut host = MemoryHost::new().with_window(W, tab_ids(start));
            let desired = tab_ids(perm.iter().copied());
            let report = Reconciler::new(&mut host).reorder_within_window(W, &[], &desired);
            assert_eq!(host.order(W).unwrap(), desired.as_slice(), "perm {perm:?}");
            assert!(report.issued < start.len(), "perm {perm:?}");
        }
    }

    #[test]
    fn identical_order_issues_nothing() {
        let mut host = MemoryHost::new().with_window(W, tab_ids([7, 8, 9]));
        let desired = tab_ids([7, 8, 9]);
        let report = Reconciler::new(&mut host).reorder_within_window(W, &[], &desired);
        assert!(host.move_log().is_empty());
        assert_eq!(report.issued, 0);
        assert_eq!(report.skipped, 3);
        assert!(plan_reorder(&desired, &desired).is_empty());
    }

    #[test]
    fn single_rejected_tab_does_not_block_others() {
        let mut host = MemoryHost::new().with_window(W, tab_ids([1, 2, 3, 4, 5]));
        host.add_fault(FaultRule::Reject(TabId(2)));
        let desired = tab_ids([2, 1, 3, 5, 4]);
        let report = Reconciler::new(&mut host).reorder_within_window(W, &[TabId(2)], &desired);

        assert_eq!(host.order(W).unwrap(), desired.as_slice());
        assert_eq!(report.failed(), 1);
        assert_eq!(report.restarts, 0);
        assert!(matches!(
            report.issues[0],
            ReconcileIssue::MoveRejected { tab: TabId(2), index: 0, .. }
        ));
        assert_eq!(
            report.status_message(),
            "Reordered 1 tab(s) in window 1. 1 move(s) failed."
        );
    }

    #[test]
    fn length_mismatch_attempts_every_id() {
        let mut host = MemoryHost::new().with_window(W, tab_ids([1, 2, 3, 4]));
        let desired = tab_ids([3, 1, 2]);
        let report = Reconciler::new(&mut host).reorder_within_window(W, &desired, &desired);

        assert!(report.degraded);
        assert_eq!(report.issued, 3);
        let attempted: Vec<TabId> = host.move_log().iter().map(|(tab, _)| *tab).collect();
        assert_eq!(attempted, desired);
        assert_eq!(host.order(W).unwrap(), tab_ids([3, 1, 2, 4]));
        assert!(matches!(
            report.issues[0],
            ReconcileIssue::StaleSnapshotMismatch {
                expected: 3,
                actual: 4
            }
        ));
        assert!(report.is_clean());
    }

    #[test]
    fn requery_recovers_from_vanished_tab() {
        let mut host = MemoryHost::new().with_window(W, tab_ids([1, 2, 3, 4]));
        host.add_fault(FaultRule::VanishOnMove(TabId(2)));
        let desired = tab_ids([2, 4, 1, 3]);
        let report = Reconciler::new(&mut host).reorder_within_window(W, &[], &desired);

        assert_eq!(host.order(W).unwrap(), tab_ids([4, 1, 3]));
        assert_eq!(report.restarts, 1);
        assert_eq!(report.failed(), 1);
    }

    #[test]
    fn keeping_stale_mirror_drifts_after_vanished_tab() {
        let mut host = MemoryHost::new().with_window(W, tab_ids([1, 2, 3, 4]));
        host.add_fault(FaultRule::VanishOnMove(TabId(2)));
        let desired = tab_ids([2, 4, 1, 3]);
        let config = ReconcileConfig::new().with_mirror_recovery(MirrorRecovery::Keep);
        let report =
            Reconciler::with_config(&mut host, config).reorder_within_window(W, &[], &desired);

        assert_eq!(host.order(W).unwrap(), tab_ids([4, 3, 1]));
        assert_eq!(report.restarts, 0);
    }

    #[test]
    fn missing_window_reports_query_failure() {
        let mut host = MemoryHost::new();
        let report = Reconciler::new(&mut host).reorder_within_window(W, &[], &tab_ids([1]));
        assert_eq!(report.issued, 0);
        assert_eq!(report.failed(), 1);
        assert!(report.status_message().starts_with("Could not read window 1"));
    }

    #[test]
    fn cross_window_example_inserts_in_target_order() {
        // X=20, Y=21 in dest; P=1, Q=2 arrive: [X,P,Y,Q]
        let mut host = MemoryHost::new()
            .with_window(W, tab_ids([1, 2, 3]))
            .with_window(DEST, tab_ids([20, 21]));
        let ids = tab_ids([2, 1]);
        let desired = tab_ids([20, 1, 21, 2]);
        let report = Reconciler::new(&mut host).move_group_to_window(&ids, W, DEST, &desired);

        assert_eq!(host.order(DEST).unwrap(), desired.as_slice());
        assert_eq!(host.order(W).unwrap(), tab_ids([3]));
        assert_eq!(
            host.move_log(),
            &[
                (TabId(1), MoveTarget::to_window(DEST, DestIndex::At(1))),
                (TabId(2), MoveTarget::to_window(DEST, DestIndex::At(3))),
            ]
        );
        assert_eq!(report.status_message(), "Moved 2 tab(s) to window 2.");
    }

    #[test]
    fn cross_window_preserves_relative_orders_at_every_insertion_point() {
        let dest_tabs = tab_ids([20, 21, 22]);
        let ids = tab_ids([3, 1]);
        for at in 0..=dest_tabs.len() {
            let mut host = MemoryHost::new()
                .with_window(W, tab_ids([1, 2, 3]))
                .with_window(DEST, dest_tabs.clone());
            let desired = splice_into(&dest_tabs, &ids, InsertAt::Index(at));
            let report = Reconciler::new(&mut host).move_group_to_window(&ids, W, DEST, &desired);
            assert!(report.is_clean());
            assert_eq!(host.order(DEST).unwrap(), desired.as_slice(), "at {at}");
        }
    }

    #[test]
    fn cross_window_rejection_retries_as_append() {
        let mut host = MemoryHost::new()
            .with_window(W, tab_ids([1, 2, 3]))
            .with_window(DEST, tab_ids([20, 21]));
        host.add_fault(FaultRule::RejectIndexed(TabId(1)));
        let ids = tab_ids([1, 2]);
        let desired = tab_ids([20, 1, 21, 2]);
        let report = Reconciler::new(&mut host).move_group_to_window(&ids, W, DEST, &desired);

        assert_eq!(host.order(DEST).unwrap(), tab_ids([20, 21, 1, 2]));
        assert_eq!(report.retried, 1);
        assert_eq!(report.issued, 3);
        assert!(report.is_clean());
        assert!(matches!(
            report.issues[0],
            ReconcileIssue::CrossWindowMoveRejected {
                tab: TabId(1),
                recovered: true,
                ..
            }
        ));
    }

    #[test]
    fn cross_window_without_retry_leaves_tab_behind() {
        let mut host = MemoryHost::new()
            .with_window(W, tab_ids([1, 2]))
            .with_window(DEST, tab_ids([20]));
        host.add_fault(FaultRule::Reject(TabId(1)));
        let config = ReconcileConfig::new().with_retry_append(false);
        let report = Reconciler::with_config(&mut host, config).move_group_to_window(
            &tab_ids([1]),
            W,
            DEST,
            &tab_ids([1, 20]),
        );

        assert_eq!(report.issued, 1);
        assert_eq!(report.retried, 0);
        assert_eq!(report.failed(), 1);
        assert_eq!(host.order(W).unwrap(), tab_ids([1, 2]));
    }

    #[test]
    fn unknown_ids_are_appended_last() {
        let mut host = MemoryHost::new()
            .with_window(W, tab_ids([1, 2, 3]))
            .with_window(DEST, tab_ids([20, 21]));
        let report = Reconciler::new(&mut host).move_group_to_window(
            &tab_ids([3, 1]),
            W,
            DEST,
            &tab_ids([1, 20, 21]),
        );
        assert!(report.is_clean());
        assert_eq!(host.order(DEST).unwrap(), tab_ids([1, 20, 21, 3]));
    }

    #[test]
    fn group_with_members_already_in_destination_ends_contiguous() {
        let mut host = MemoryHost::new()
            .with_window(W, tab_ids([1, 2, 3, 4]))
            .with_window(DEST, tab_ids([10, 11]));
        let ids = tab_ids([1, 10]);
        let desired = splice_within(&tab_ids([10, 11]), &ids, InsertAt::End);
        assert_eq!(desired, tab_ids([11, 1, 10]));

        let report = Reconciler::new(&mut host).move_group_to_window(&ids, W, DEST, &desired);

        assert_eq!(host.order(DEST).unwrap(), tab_ids([11, 1, 10]));
        assert_eq!(host.order(W).unwrap(), tab_ids([2, 3, 4]));
        assert_eq!(
            host.move_log(),
            &[
                (TabId(1), MoveTarget::to_window(DEST, DestIndex::At(1))),
                (TabId(11), MoveTarget::within(0)),
                (TabId(1), MoveTarget::within(1)),
            ]
        );
        assert!(report.is_clean());
        assert_eq!(report.status_message(), "Moved 2 tab(s) to window 2.");
    }

    #[test]
    fn group_from_several_windows_into_a_third() {
        let mut host = MemoryHost::new()
            .with_window(W, tab_ids([1, 2]))
            .with_window(DEST, tab_ids([20, 21]))
            .with_window(WindowId(3), tab_ids([30, 31]));
        let ids = tab_ids([2, 31]);
        let desired = splice_within(&tab_ids([20, 21]), &ids, InsertAt::Index(1));
        let report = Reconciler::new(&mut host).move_group_to_window(&ids, W, DEST, &desired);

        assert!(report.is_clean());
        assert_eq!(host.order(DEST).unwrap(), tab_ids([20, 2, 31, 21]));
        assert_eq!(host.order(W).unwrap(), tab_ids([1]));
        assert_eq!(host.order(WindowId(3)).unwrap(), tab_ids([30]));
        assert_eq!(host.move_log().len(), 2);
    }

    /// Rejects every move and reports a rotated order on each query after
    /// the first. With `queries_left` set, queries fail once it runs out.
    struct ChurningHost {
        order: Vec<TabId>,
        queries_left: Option<usize>,
    }

    impl TabHost for ChurningHost {
        fn windows(&mut self) -> Result<Vec<WindowId>, HostError> {
            Ok(vec![W])
        }

        fn current_window(&mut self) -> Option<WindowId> {
            Some(W)
        }

        fn window_order(&mut self, window: WindowId) -> Result<Vec<TabId>, HostError> {
            if let Some(left) = self.queries_left.as_mut() {
                if *left == 0 {
                    return Err(HostError::NoSuchWindow(window));
                }
                *left -= 1;
            }
            let order = self.order.clone();
            self.order.rotate_left(1);
            Ok(order)
        }

        fn tab(&mut self, tab: TabId) -> Result<crate::tabs::Tab, HostError> {
            Err(HostError::NoSuchTab(tab))
        }

        fn move_tab(&mut self, tab: TabId, _target: MoveTarget) -> Result<(), HostError> {
            Err(HostError::Rejected {
                tab,
                reason: "busy".into(),
            })
        }

        fn create_window(&mut self, first_tab: TabId) -> Result<WindowId, HostError> {
            Err(HostError::NoSuchTab(first_tab))
        }

        fn remove_tab(&mut self, tab: TabId) -> Result<(), HostError> {
            Err(HostError::NoSuchTab(tab))
        }

        fn activate_tab(&mut self, tab: TabId) -> Result<(), HostError> {
            Err(HostError::NoSuchTab(tab))
        }
    }

    #[test]
    fn requery_restarts_are_capped_at_desired_length() {
        let mut host = ChurningHost {
            order: tab_ids([1, 2, 3]),
            queries_left: None,
        };
        let desired = tab_ids([3, 2, 1]);
        let report = Reconciler::new(&mut host).reorder_within_window(W, &[], &desired);

        assert_eq!(report.restarts, desired.len());
        assert_eq!(report.failed(), 5);
        assert_eq!(report.issued, 5);
    }

    #[test]
    fn failed_requery_continues_with_mirror() {
        let mut host = ChurningHost {
            order: tab_ids([1, 2, 3]),
            queries_left: Some(1),
        };
        let desired = tab_ids([3, 2, 1]);
        let report = Reconciler::new(&mut host).reorder_within_window(W, &[], &desired);

        assert_eq!(report.restarts, 0);
        assert_eq!(report.issued, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed(), 2);
        assert!(
            report
                .issues
                .iter()
                .all(|issue| matches!(issue, ReconcileIssue::MoveRejected { .. }))
        );
    }

    #[test]
    fn plan_matches_example() {
        let plan = plan_reorder(&tab_ids([1, 2, 3, 4]), &tab_ids([4, 1, 3, 2]));
        assert_eq!(
            plan,
            vec![
                PlannedMove {
                    tab: TabId(4),
                    index: 0
                },
                PlannedMove {
                    tab: TabId(3),
                    index: 2
                },
            ]
        );
    }
}
