use std::collections::HashSet;
use std::io;
use std::str::FromStr;

use clap::{Parser, Subcommand};
use indoc::indoc;
use thiserror::Error;
use tracing::Level;

use tab_wrangler::actions::{Action, MoveDestination};
use tab_wrangler::host::FaultRule;
use tab_wrangler::log_buffer::LogBufferHandle;
use tab_wrangler::tracing_sub::LogSink;
use tab_wrangler::{
    MemoryHost, MirrorRecovery, ReconcileConfig, Reconciler, TabHost, TabId, TabManager, WindowId,
    plan_reorder, tracing_sub,
};

const AFTER_HELP: &str = indoc! {"
    Windows are given as ID=TAB,TAB,... and simulated in memory.

    Examples:
      tab-wrangler -w 1=1,2,3,4 reorder --target 1 --desired 4,1,3,2
      tab-wrangler -w 1=1,2,3 -w 2=20,21 drop --ids 1,2 --from 1 --to 2 --at 1
      tab-wrangler -w 1=1,2,3 -w 2=20 --reject-indexed 2 move-selected --ids 2,3 --to 2 --position 1
"};

#[derive(Debug, Error)]
enum CliError {
    #[error("window spec `{0}` must look like ID=TAB,TAB,...")]
    MalformedWindow(String),
    #[error("window spec `{spec}`: {source}")]
    BadId {
        spec: String,
        source: std::num::ParseIntError,
    },
    #[error("tab {0} appears in more than one place")]
    DuplicateTab(TabId),
    #[error("window {0} is listed twice")]
    DuplicateWindow(WindowId),
}

#[derive(Debug, Clone)]
struct WindowSpec {
    id: WindowId,
    tabs: Vec<TabId>,
}

impl FromStr for WindowSpec {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, tabs) = s
            .split_once('=')
            .ok_or_else(|| CliError::MalformedWindow(s.to_string()))?;
        let bad_id = |source| CliError::BadId {
            spec: s.to_string(),
            source,
        };
        let id = id.parse::<WindowId>().map_err(bad_id)?;
        let tabs = tabs
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(|part| part.parse::<TabId>().map_err(bad_id))
            .collect::<Result<Vec<_>, _>>()?;
        if tabs.is_empty() {
            return Err(CliError::MalformedWindow(s.to_string()));
        }
        Ok(Self { id, tabs })
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "tab-wrangler",
    version = env!("CARGO_PKG_VERSION"),
    about = "Simulate tab reorders and moves against in-memory windows",
    after_help = AFTER_HELP
)]
struct Cli {
    /// A window and its tabs in order, e.g. `1=10,11,12`. Repeatable.
    #[arg(short = 'w', long = "window", value_name = "ID=TABS", required = true)]
    windows: Vec<WindowSpec>,

    /// Window treated as the one the user is looking at.
    #[arg(long, value_name = "ID")]
    current: Option<WindowId>,

    /// Reject every move of this tab.
    #[arg(long, value_name = "TAB")]
    reject: Vec<TabId>,

    /// Reject indexed moves of this tab but allow appends.
    #[arg(long, value_name = "TAB")]
    reject_indexed: Vec<TabId>,

    /// Close this tab behind the reconciler's back when it is moved.
    #[arg(long, value_name = "TAB")]
    vanish: Vec<TabId>,

    /// Continue with the stale working order after a failed move.
    #[arg(long)]
    keep_mirror: bool,

    /// Do not retry rejected cross-window moves as appends.
    #[arg(long)]
    no_retry_append: bool,

    /// Capture the debug log and print it after the report.
    #[arg(long)]
    log_buffer: bool,

    /// Log verbosity: error, warn, info, debug or trace. Defaults to debug
    /// with --log-buffer and warn otherwise.
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<Level>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Bring one window into the given order.
    Reorder {
        #[arg(long, value_name = "ID")]
        target: WindowId,
        #[arg(long, value_delimiter = ',', required = true)]
        desired: Vec<TabId>,
        /// Print the moves without applying them.
        #[arg(long)]
        dry_run: bool,
    },
    /// Drag tabs and drop them at a slot of a window.
    Drop {
        #[arg(long, value_delimiter = ',', required = true)]
        ids: Vec<TabId>,
        #[arg(long, value_name = "ID")]
        from: WindowId,
        #[arg(long, value_name = "ID")]
        to: WindowId,
        /// Zero-based slot among the rows that stay; omitted drops at the end.
        #[arg(long)]
        at: Option<usize>,
    },
    /// Select tabs and move them to a window or a new one.
    MoveSelected {
        #[arg(long, value_delimiter = ',', required = true)]
        ids: Vec<TabId>,
        #[arg(long, value_name = "ID", conflicts_with = "new_window", required_unless_present = "new_window")]
        to: Option<WindowId>,
        #[arg(long)]
        new_window: bool,
        /// 1-based position in the destination.
        #[arg(long)]
        position: Option<usize>,
    },
    /// Select tabs and close them.
    Close {
        #[arg(long, value_delimiter = ',', required = true)]
        ids: Vec<TabId>,
    },
}

impl Cli {
    fn config(&self) -> ReconcileConfig {
        let recovery = if self.keep_mirror {
            MirrorRecovery::Keep
        } else {
            MirrorRecovery::Requery
        };
        ReconcileConfig::new()
            .with_mirror_recovery(recovery)
            .with_retry_append(!self.no_retry_append)
    }

    fn build_host(&self) -> Result<MemoryHost, CliError> {
        let mut seen_tabs = HashSet::new();
        let mut seen_windows = HashSet::new();
        let mut host = MemoryHost::new();
        for spec in &self.windows {
            if !seen_windows.insert(spec.id) {
                return Err(CliError::DuplicateWindow(spec.id));
            }
            for tab in &spec.tabs {
                if !seen_tabs.insert(*tab) {
                    return Err(CliError::DuplicateTab(*tab));
                }
            }
            host.insert_window(spec.id, spec.tabs.clone());
        }
        if let Some(current) = self.current {
            host.set_current(current);
        }
        for tab in &self.reject {
            host.add_fault(FaultRule::Reject(*tab));
        }
        for tab in &self.reject_indexed {
            host.add_fault(FaultRule::RejectIndexed(*tab));
        }
        for tab in &self.vanish {
            host.add_fault(FaultRule::VanishOnMove(*tab));
        }
        Ok(host)
    }
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();

    let log = cli.log_buffer.then(LogBufferHandle::default);
    let (sink, default_level) = match &log {
        Some(handle) => (LogSink::Buffer(handle.clone()), Level::DEBUG),
        None => (LogSink::Stderr, Level::WARN),
    };
    tracing_sub::init(cli.log_level.unwrap_or(default_level), sink);

    let host = cli
        .build_host()
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err.to_string()))?;
    let config = cli.config();

    let (mut host, status) = match &cli.command {
        Command::Reorder {
            target,
            desired,
            dry_run,
        } => {
            let mut host = host;
            if *dry_run {
                let current = host
                    .window_order(*target)
                    .map_err(|err| io::Error::new(io::ErrorKind::NotFound, err.to_string()))?;
                for planned in plan_reorder(&current, desired) {
                    println!("would move {} -> {}", planned.tab, planned.index);
                }
                return Ok(());
            }
            let report = Reconciler::with_config(&mut host, config)
                .reorder_within_window(*target, desired, desired);
            let status = report.status_message();
            (host, status)
        }
        Command::Drop { ids, from, to, at } => {
            let mut manager = TabManager::with_config(host, config);
            manager.dispatch(Action::Refresh);
            manager.state_mut().set_selection(ids);
            if let Some(first) = ids.first() {
                manager.drag_start(*first, *from);
                if let Some(at) = at {
                    manager.drag_over(*to, *at);
                } else if to != from {
                    let len = manager.state().window(*to).map_or(0, |w| w.len());
                    manager.drag_over(*to, len);
                }
                manager.drag_end();
            }
            let status = manager.state().status().text.clone();
            (manager.into_host(), status)
        }
        Command::MoveSelected {
            ids,
            to,
            new_window,
            position,
        } => {
            let destination = match (to, new_window) {
                (Some(window), false) => MoveDestination::Window(*window),
                _ => MoveDestination::NewWindow,
            };
            let mut manager = TabManager::with_config(host, config);
            manager.dispatch(Action::Refresh);
            manager.state_mut().set_selection(ids);
            let status = manager
                .dispatch(Action::MoveSelected {
                    destination,
                    position: *position,
                })
                .text
                .clone();
            (manager.into_host(), status)
        }
        Command::Close { ids } => {
            let mut manager = TabManager::with_config(host, config);
            manager.dispatch(Action::Refresh);
            manager.state_mut().set_selection(ids);
            let status = manager.dispatch(Action::CloseSelected).text.clone();
            (manager.into_host(), status)
        }
    };

    for (tab, target) in host.move_log() {
        println!("move {tab} {target}");
    }
    println!("{status}");
    print_layout(&mut host)?;

    if let Some(handle) = log {
        println!("-- log --");
        for line in handle.lines() {
            println!("{line}");
        }
    }
    Ok(())
}

fn print_layout(host: &mut MemoryHost) -> io::Result<()> {
    let windows = host.windows().map_err(io::Error::other)?;
    let total = host.tab_count().map_err(io::Error::other)?;
    println!("{total} tab(s) in {} window(s)", windows.len());
    for window in windows {
        let tabs = host.window_order(window).map_err(io::Error::other)?;
        let tabs: Vec<String> = tabs.iter().map(ToString::to_string).collect();
        println!("window {window}: {}", tabs.join(" "));
    }
    Ok(())
}
