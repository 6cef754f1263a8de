use std::time::Duration;

use reload_logging::{reload_debug, reload_info, reload_warn};

use crate::{
    parse_duration, Badge, Effect, Msg, RefreshOrigin, SchedulerState, TabId, TimeDuration,
};

/// Shortest time a refresh result stays on the badge before it returns to idle.
pub const MIN_BADGE_VISIBLE: Duration = Duration::from_millis(750);

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: SchedulerState, msg: Msg) -> (SchedulerState, Vec<Effect>) {
    let effects = match msg {
        Msg::SettingsChanged(settings) => {
            state.set_settings(settings);
            Vec::new()
        }
        Msg::ToggleAutoRefresh {
            tab_id,
            duration_spec,
        } => match state.unregister(tab_id) {
            Some(registration) => {
                reload_info!("Auto-refresh off for tab {}", tab_id);
                vec![
                    Effect::CancelTimer {
                        tab_id,
                        timer_id: registration.timer_id,
                    },
                    Effect::SetBadge {
                        tab_id,
                        badge: Badge::Idle,
                    },
                ]
            }
            None => {
                let period = resolve_period(&duration_spec);
                let timer_id = state.register(tab_id, period);
                reload_info!("Auto-refresh on for tab {} every {}", tab_id, period);
                let mut effects = refresh_effects(&state, tab_id, RefreshOrigin::Scheduled);
                effects.push(Effect::StartTimer {
                    tab_id,
                    timer_id,
                    period,
                });
                effects
            }
        },
        Msg::TimerTick {
            tab_id,
            timer_id,
            snapshot,
        } => {
            let current = state.registration(tab_id).map(|r| r.timer_id);
            if current != Some(timer_id) {
                reload_debug!("Ignoring stale tick for tab {} (timer {})", tab_id, timer_id);
                Vec::new()
            } else if !snapshot.is_live() {
                reload_debug!("Tab {} not live, skipping tick", tab_id);
                Vec::new()
            } else {
                refresh_effects(&state, tab_id, RefreshOrigin::Scheduled)
            }
        }
        Msg::ManualRefresh { tab_id } => refresh_effects(&state, tab_id, RefreshOrigin::Manual),
        Msg::RefreshFinished {
            tab_id,
            count,
            elapsed,
        } => match count {
            Some(count) => vec![
                Effect::SetBadge {
                    tab_id,
                    badge: Badge::Count(count),
                },
                Effect::ResetBadgeAfter {
                    tab_id,
                    delay: MIN_BADGE_VISIBLE.saturating_sub(elapsed),
                },
            ],
            None => {
                reload_warn!("Refresh of tab {} produced no result", tab_id);
                Vec::new()
            }
        },
        Msg::TabClosed { tab_id } => match state.unregister(tab_id) {
            Some(registration) => {
                reload_info!("Tab {} closed, auto-refresh released", tab_id);
                vec![Effect::CancelTimer {
                    tab_id,
                    timer_id: registration.timer_id,
                }]
            }
            None => Vec::new(),
        },
        Msg::Teardown => state
            .drain()
            .into_iter()
            .map(|(tab_id, registration)| Effect::CancelTimer {
                tab_id,
                timer_id: registration.timer_id,
            })
            .collect(),
    };

    (state, effects)
}

fn resolve_period(spec: &str) -> TimeDuration {
    match parse_duration(spec) {
        Ok(period) => period,
        Err(err) => {
            reload_warn!("{}; falling back to {}", err, TimeDuration::default_auto_refresh());
            TimeDuration::default_auto_refresh()
        }
    }
}

fn refresh_effects(state: &SchedulerState, tab_id: TabId, origin: RefreshOrigin) -> Vec<Effect> {
    vec![
        Effect::SetBadge {
            tab_id,
            badge: Badge::Refreshing,
        },
        Effect::ExecuteRefresh {
            tab_id,
            args: state.settings().refresh_args(origin),
            origin,
        },
    ]
}
