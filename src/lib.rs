//! Rearrange browser tabs within and across windows.
//!
//! The heart of the crate is [`reconcile`]: it turns a desired tab order into
//! the shortest left-to-right sequence of single-tab moves against a
//! [`host::TabHost`]. The remaining modules build desired orders from user
//! gestures and keep the state a tab-manager front end needs.

pub mod actions;
pub mod config;
pub mod drag;
pub mod host;
pub mod log_buffer;
pub mod manager;
pub mod plan;
pub mod reconcile;
pub mod state;
pub mod tabs;
pub mod tracing_sub;

pub use config::{MirrorRecovery, ReconcileConfig};
pub use host::{DestIndex, HostError, MemoryHost, MoveTarget, TabHost};
pub use manager::TabManager;
pub use reconcile::{ReconcileIssue, ReconcileReport, Reconciler, plan_reorder};
pub use tabs::{TabId, WindowId};
