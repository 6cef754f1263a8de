use crate::{Settings, TabId, TimeDuration};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchedulerView {
    /// Tabs with auto-refresh on, in tab id order, with their periods.
    pub auto_refreshing: Vec<(TabId, TimeDuration)>,
    pub settings: Settings,
}
