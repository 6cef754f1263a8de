use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use reload_core::{TabId, TabSnapshot};
use reload_engine::{BadgeReporter, TabQuery};

/// Prints badge changes to stdout.
pub struct ConsoleBadge;

impl BadgeReporter for ConsoleBadge {
    fn set_badge(&self, tab_id: TabId, text: &str) {
        if text.is_empty() {
            println!("[tab {tab_id}] badge cleared");
        } else {
            println!("[tab {tab_id}] badge: {text}");
        }
    }
}

/// Tabs opened by the CLI: always loaded and in the foreground.
#[derive(Default)]
pub struct HeadlessTabs {
    open: Mutex<HashSet<TabId>>,
}

impl HeadlessTabs {
    pub fn open(&self, tab_id: TabId) {
        self.open
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(tab_id);
    }
}

impl TabQuery for HeadlessTabs {
    fn snapshot(&self, tab_id: TabId) -> Option<TabSnapshot> {
        self.open
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&tab_id)
            .then(TabSnapshot::active_complete)
    }
}
