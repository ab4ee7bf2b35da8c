/// What the same-window reorder does with its working model after a move fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MirrorRecovery {
    /// Re-query the window; when it no longer matches the mirror, rebuild the
    /// desired order from the live tabs and restart from the first slot.
    #[default]
    Requery,
    /// Keep going with the unchanged mirror.
    Keep,
}

/// Tunables for the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileConfig {
    pub mirror_recovery: MirrorRecovery,
    /// Retry a rejected cross-window move once as an append.
    pub retry_append: bool,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            mirror_recovery: MirrorRecovery::default(),
            retry_append: true,
        }
    }
}

impl ReconcileConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mirror_recovery(mut self, recovery: MirrorRecovery) -> Self {
        self.mirror_recovery = recovery;
        self
    }

    pub fn with_retry_append(mut self, enabled: bool) -> Self {
        self.retry_append = enabled;
        self
    }
}
