use std::time::Duration;

use crate::{Settings, TabId, TabSnapshot, TimerId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Stored settings were loaded or changed.
    SettingsChanged(Settings),
    /// Toggle command: start auto-refresh for a tab, or stop it if running.
    ToggleAutoRefresh { tab_id: TabId, duration_spec: String },
    /// A repeating timer fired, with the tab's state at that moment.
    TimerTick {
        tab_id: TabId,
        timer_id: TimerId,
        snapshot: TabSnapshot,
    },
    /// Direct user action: refresh once, ignoring the liveness gate.
    ManualRefresh { tab_id: TabId },
    /// The page executor returned. `count` is `None` when execution failed.
    RefreshFinished {
        tab_id: TabId,
        count: Option<usize>,
        elapsed: Duration,
    },
    /// The tab went away; drop its registration.
    TabClosed { tab_id: TabId },
    /// Host shutdown: release every timer.
    Teardown,
}
