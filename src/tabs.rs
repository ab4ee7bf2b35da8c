//! Plain value types shared by the host, the reconciler and the manager.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Stable identifier of a browser tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TabId(pub u32);

/// Stable identifier of a browser window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WindowId(pub u32);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TabId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(TabId)
    }
}

impl FromStr for WindowId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(WindowId)
    }
}

/// A tab as reported by the host at query time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    pub id: TabId,
    pub window: WindowId,
    pub index: usize,
    pub title: Option<String>,
    pub url: Option<String>,
}

impl Tab {
    pub fn label(&self) -> String {
        self.title
            .clone()
            .or_else(|| self.url.clone())
            .unwrap_or_else(|| self.id.to_string())
    }
}

/// The ordered contents of one window at the time it was queried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSnapshot {
    pub id: WindowId,
    pub tabs: Vec<TabId>,
}

impl WindowSnapshot {
    pub fn new(id: WindowId, tabs: Vec<TabId>) -> Self {
        Self { id, tabs }
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn contains(&self, tab: TabId) -> bool {
        self.tabs.contains(&tab)
    }

    pub fn index_of(&self, tab: TabId) -> Option<usize> {
        self.tabs.iter().position(|id| *id == tab)
    }
}

/// Convenience for building id lists in tests and the CLI.
pub fn tab_ids<I: IntoIterator<Item = u32>>(ids: I) -> Vec<TabId> {
    ids.into_iter().map(TabId).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ids_trims_whitespace() {
        assert_eq!(" 42 ".parse::<TabId>(), Ok(TabId(42)));
        assert_eq!("7".parse::<WindowId>(), Ok(WindowId(7)));
        assert!("x".parse::<TabId>().is_err());
    }

    #[test]
    fn label_prefers_title_then_url() {
        let mut tab = Tab {
            id: TabId(3),
            window: WindowId(1),
            index: 0,
            title: None,
            url: Some("https://example.com".into()),
        };
        assert_eq!(tab.label(), "https://example.com");
        tab.title = Some("Example".into());
        assert_eq!(tab.label(), "Example");
        tab.title = None;
        tab.url = None;
        assert_eq!(tab.label(), "3");
    }

    #[test]
    fn snapshot_lookup() {
        let snap = WindowSnapshot::new(WindowId(1), tab_ids([5, 6, 7]));
        assert_eq!(snap.index_of(TabId(7)), Some(2));
        assert!(!snap.contains(TabId(8)));
        assert_eq!(snap.len(), 3);
    }
}
