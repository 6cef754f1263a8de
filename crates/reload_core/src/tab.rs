use serde::{Deserialize, Serialize};

pub type TabId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    #[default]
    Loading,
    Complete,
}

/// Read-only view of a browsing tab, taken fresh on every timer tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TabSnapshot {
    pub status: LoadStatus,
    pub pinned: bool,
    pub active: bool,
    pub discarded: bool,
    pub frozen: bool,
}

impl TabSnapshot {
    /// A fully loaded, focused tab.
    pub fn active_complete() -> Self {
        Self {
            status: LoadStatus::Complete,
            active: true,
            ..Self::default()
        }
    }

    /// Whether a scheduled refresh may run against this tab.
    ///
    /// The page must be loaded, and either pinned or in the foreground and resident.
    pub fn is_live(&self) -> bool {
        self.status == LoadStatus::Complete
            && (self.pinned || (self.active && !self.discarded && !self.frozen))
    }
}
