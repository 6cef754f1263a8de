use std::collections::BTreeMap;

use crate::view_model::SchedulerView;
use crate::{Settings, TabId, TimeDuration};

pub type TimerId = u64;

/// Presence of a registration means auto-refresh is on for that tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoRefreshRegistration {
    pub timer_id: TimerId,
    pub period: TimeDuration,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchedulerState {
    settings: Settings,
    registrations: BTreeMap<TabId, AutoRefreshRegistration>,
    next_timer_id: TimerId,
}

impl SchedulerState {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn view(&self) -> SchedulerView {
        SchedulerView {
            auto_refreshing: self
                .registrations
                .iter()
                .map(|(tab_id, registration)| (*tab_id, registration.period))
                .collect(),
            settings: self.settings.clone(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registration(&self, tab_id: TabId) -> Option<&AutoRefreshRegistration> {
        self.registrations.get(&tab_id)
    }

    pub fn is_auto_refreshing(&self, tab_id: TabId) -> bool {
        self.registrations.contains_key(&tab_id)
    }

    pub fn active_timer_count(&self) -> usize {
        self.registrations.len()
    }

    pub(crate) fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    /// Registers a tab and mints a fresh timer id for it.
    pub(crate) fn register(&mut self, tab_id: TabId, period: TimeDuration) -> TimerId {
        self.next_timer_id += 1;
        let timer_id = self.next_timer_id;
        self.registrations
            .insert(tab_id, AutoRefreshRegistration { timer_id, period });
        timer_id
    }

    pub(crate) fn unregister(&mut self, tab_id: TabId) -> Option<AutoRefreshRegistration> {
        self.registrations.remove(&tab_id)
    }

    pub(crate) fn drain(&mut self) -> Vec<(TabId, AutoRefreshRegistration)> {
        std::mem::take(&mut self.registrations).into_iter().collect()
    }
}
