use std::collections::HashMap;
use std::sync::Arc;

use reload_core::{update, Badge, Effect, Msg, SchedulerState, Settings, TabId, TimerId};
use reload_logging::{reload_debug, reload_info, reload_warn};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, WeakUnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::{BadgeReporter, PageExecutor, TabQuery};

/// Host services the scheduler drives.
#[derive(Clone)]
pub struct Collaborators {
    pub executor: Arc<dyn PageExecutor>,
    pub badge: Arc<dyn BadgeReporter>,
    pub tabs: Arc<dyn TabQuery>,
}

/// Command surface of a running scheduler. Cheap to clone.
#[derive(Clone)]
pub struct SchedulerHandle {
    msg_tx: UnboundedSender<Msg>,
}

impl SchedulerHandle {
    /// Starts auto-refresh for `tab_id`, or stops it if already running.
    pub fn toggle(&self, tab_id: TabId, duration_spec: impl Into<String>) {
        self.send(Msg::ToggleAutoRefresh {
            tab_id,
            duration_spec: duration_spec.into(),
        });
    }

    /// Single refresh, regardless of the tab's state.
    pub fn refresh_now(&self, tab_id: TabId) {
        self.send(Msg::ManualRefresh { tab_id });
    }

    pub fn update_settings(&self, settings: Settings) {
        self.send(Msg::SettingsChanged(settings));
    }

    pub fn tab_closed(&self, tab_id: TabId) {
        self.send(Msg::TabClosed { tab_id });
    }

    /// Releases every timer and stops the scheduler loop.
    pub fn shutdown(&self) {
        self.send(Msg::Teardown);
    }

    fn send(&self, msg: Msg) {
        let _ = self.msg_tx.send(msg);
    }
}

/// Single task owning the scheduler state and the timer table.
///
/// Every state change and timer registration happens inside this task, between
/// awaits, so no lock guards the table.
pub struct SchedulerRuntime {
    state: SchedulerState,
    timers: HashMap<TimerId, JoinHandle<()>>,
    collaborators: Collaborators,
    msg_tx: WeakUnboundedSender<Msg>,
}

impl SchedulerRuntime {
    /// Spawns the scheduler loop on the current tokio runtime.
    ///
    /// The loop ends on [`SchedulerHandle::shutdown`] or once every handle is
    /// dropped; the join handle yields the final state.
    pub fn spawn(
        collaborators: Collaborators,
        settings: Settings,
    ) -> (SchedulerHandle, JoinHandle<SchedulerState>) {
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        let runtime = Self {
            state: SchedulerState::new(settings),
            timers: HashMap::new(),
            collaborators,
            msg_tx: msg_tx.downgrade(),
        };
        let task = tokio::spawn(runtime.run(msg_rx));
        (SchedulerHandle { msg_tx }, task)
    }

    async fn run(mut self, mut msg_rx: UnboundedReceiver<Msg>) -> SchedulerState {
        while let Some(msg) = msg_rx.recv().await {
            let teardown = matches!(msg, Msg::Teardown);
            self.dispatch(msg);
            if teardown {
                break;
            }
        }

        self.dispatch(Msg::Teardown);
        for (_, timer) in self.timers.drain() {
            timer.abort();
        }
        reload_info!("Scheduler stopped");
        self.state
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        for effect in effects {
            self.run_effect(effect);
        }
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::StartTimer {
                tab_id,
                timer_id,
                period,
            } => {
                let handle = spawn_timer(
                    tab_id,
                    timer_id,
                    period.as_duration(),
                    self.collaborators.tabs.clone(),
                    self.msg_tx.clone(),
                );
                if let Some(previous) = self.timers.insert(timer_id, handle) {
                    previous.abort();
                }
            }
            Effect::CancelTimer { tab_id, timer_id } => {
                if let Some(timer) = self.timers.remove(&timer_id) {
                    reload_debug!("Cancelling timer {} for tab {}", timer_id, tab_id);
                    timer.abort();
                }
            }
            Effect::ExecuteRefresh {
                tab_id,
                args,
                origin,
            } => {
                let executor = self.collaborators.executor.clone();
                let msg_tx = self.msg_tx.clone();
                tokio::spawn(async move {
                    let start = Instant::now();
                    let count = match executor.execute(tab_id, args).await {
                        Ok(count) => Some(count),
                        Err(err) => {
                            reload_warn!("{:?} refresh of tab {} failed: {}", origin, tab_id, err);
                            None
                        }
                    };
                    if let Some(msg_tx) = msg_tx.upgrade() {
                        let _ = msg_tx.send(Msg::RefreshFinished {
                            tab_id,
                            count,
                            elapsed: start.elapsed(),
                        });
                    }
                });
            }
            Effect::SetBadge { tab_id, badge } => {
                self.collaborators.badge.set_badge(tab_id, &badge.text());
            }
            Effect::ResetBadgeAfter { tab_id, delay } => {
                let badge = self.collaborators.badge.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    badge.set_badge(tab_id, &Badge::Idle.text());
                });
            }
        }
    }
}

fn spawn_timer(
    tab_id: TabId,
    timer_id: TimerId,
    period: std::time::Duration,
    tabs: Arc<dyn TabQuery>,
    msg_tx: WeakUnboundedSender<Msg>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let now = Instant::now();
        let Some(first_tick) = now.checked_add(period) else {
            reload_warn!("Period {:?} for tab {} cannot be scheduled", period, tab_id);
            let _ = msg_tx.upgrade().map(|tx| tx.send(Msg::TabClosed { tab_id }));
            return;
        };
        let mut interval = tokio::time::interval_at(first_tick, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let Some(msg_tx) = msg_tx.upgrade() else {
                break;
            };
            match tabs.snapshot(tab_id) {
                Some(snapshot) => {
                    let tick = Msg::TimerTick {
                        tab_id,
                        timer_id,
                        snapshot,
                    };
                    if msg_tx.send(tick).is_err() {
                        break;
                    }
                }
                None => {
                    let _ = msg_tx.send(Msg::TabClosed { tab_id });
                    break;
                }
            }
        }
    })
}
