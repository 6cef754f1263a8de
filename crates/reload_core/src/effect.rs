use std::time::Duration;

use crate::{RefreshArgs, RefreshOrigin, TabId, TimeDuration, TimerId};

/// Glyph shown on the badge while a refresh is in flight.
pub const REFRESHING_GLYPH: &str = "🔃";

/// Side effects requested by [`crate::update`], executed by the host runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    StartTimer {
        tab_id: TabId,
        timer_id: TimerId,
        period: TimeDuration,
    },
    CancelTimer {
        tab_id: TabId,
        timer_id: TimerId,
    },
    ExecuteRefresh {
        tab_id: TabId,
        args: RefreshArgs,
        origin: RefreshOrigin,
    },
    SetBadge {
        tab_id: TabId,
        badge: Badge,
    },
    /// Return the badge to idle once `delay` has passed.
    ResetBadgeAfter { tab_id: TabId, delay: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge {
    Idle,
    Refreshing,
    Count(usize),
}

impl Badge {
    pub fn text(&self) -> String {
        match self {
            Badge::Idle => String::new(),
            Badge::Refreshing => REFRESHING_GLYPH.to_string(),
            Badge::Count(count) => count.to_string(),
        }
    }
}
