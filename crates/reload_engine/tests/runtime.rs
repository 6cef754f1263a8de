use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;
use reload_core::{LoadStatus, RefreshArgs, Settings, TabId, TabSnapshot, REFRESHING_GLYPH};
use reload_engine::{
    BadgeReporter, Collaborators, DocumentExecutor, ExecutionError, MemoryDocument, PageExecutor,
    RefreshOrchestrator, SchedulerRuntime, SettleMode, TabQuery,
};
use tokio::time::sleep;

struct RecordingExecutor {
    result: Result<usize, ExecutionError>,
    calls: Mutex<Vec<(TabId, RefreshArgs)>>,
}

impl RecordingExecutor {
    fn new(result: Result<usize, ExecutionError>) -> Self {
        Self {
            result,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<(TabId, RefreshArgs)> {
        self.calls.lock().unwrap().clone()
    }

    fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl PageExecutor for RecordingExecutor {
    async fn execute(&self, tab_id: TabId, args: RefreshArgs) -> Result<usize, ExecutionError> {
        self.calls.lock().unwrap().push((tab_id, args));
        self.result.clone()
    }
}

#[derive(Default)]
struct RecordingBadge {
    texts: Mutex<Vec<(TabId, String)>>,
}

impl RecordingBadge {
    fn texts(&self) -> Vec<(TabId, String)> {
        self.texts.lock().unwrap().clone()
    }
}

impl BadgeReporter for RecordingBadge {
    fn set_badge(&self, tab_id: TabId, text: &str) {
        self.texts.lock().unwrap().push((tab_id, text.to_string()));
    }
}

#[derive(Default)]
struct FakeTabs {
    snapshots: Mutex<HashMap<TabId, TabSnapshot>>,
}

impl FakeTabs {
    fn set(&self, tab_id: TabId, snapshot: TabSnapshot) {
        self.snapshots.lock().unwrap().insert(tab_id, snapshot);
    }
}

impl TabQuery for FakeTabs {
    fn snapshot(&self, tab_id: TabId) -> Option<TabSnapshot> {
        self.snapshots.lock().unwrap().get(&tab_id).copied()
    }
}

struct Fakes {
    executor: Arc<RecordingExecutor>,
    badge: Arc<RecordingBadge>,
    tabs: Arc<FakeTabs>,
}

impl Fakes {
    fn new(result: Result<usize, ExecutionError>) -> Self {
        Self {
            executor: Arc::new(RecordingExecutor::new(result)),
            badge: Arc::new(RecordingBadge::default()),
            tabs: Arc::new(FakeTabs::default()),
        }
    }

    fn collaborators(&self) -> Collaborators {
        Collaborators {
            executor: self.executor.clone(),
            badge: self.badge.clone(),
            tabs: self.tabs.clone(),
        }
    }
}

fn background() -> TabSnapshot {
    TabSnapshot {
        status: LoadStatus::Complete,
        active: false,
        pinned: false,
        ..TabSnapshot::default()
    }
}

#[tokio::test(start_paused = true)]
async fn toggle_on_refreshes_now_and_on_every_tick() {
    let fakes = Fakes::new(Ok(2));
    fakes.tabs.set(1, TabSnapshot::active_complete());
    let (handle, task) = SchedulerRuntime::spawn(fakes.collaborators(), Settings::default());

    handle.toggle(1, "1s");
    sleep(Duration::from_millis(3_500)).await;
    assert_eq!(fakes.executor.count(), 4);
    assert!(fakes.executor.calls().iter().all(|(tab_id, args)| *tab_id == 1 && args.quiet));

    handle.toggle(1, "1s");
    sleep(Duration::from_secs(5)).await;
    assert_eq!(fakes.executor.count(), 4);

    handle.shutdown();
    let state = task.await.unwrap();
    assert_eq!(state.active_timer_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn on_off_twice_leaves_nothing_ticking() {
    let fakes = Fakes::new(Ok(1));
    fakes.tabs.set(1, TabSnapshot::active_complete());
    let (handle, task) = SchedulerRuntime::spawn(fakes.collaborators(), Settings::default());

    for _ in 0..2 {
        handle.toggle(1, "500ms");
        handle.toggle(1, "500ms");
    }
    sleep(Duration::from_secs(10)).await;

    assert_eq!(fakes.executor.count(), 2);
    handle.shutdown();
    assert_eq!(task.await.unwrap().active_timer_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn ticks_on_background_tab_do_nothing() {
    let fakes = Fakes::new(Ok(1));
    fakes.tabs.set(1, background());
    let (handle, _task) = SchedulerRuntime::spawn(fakes.collaborators(), Settings::default());

    handle.toggle(1, "1s");
    sleep(Duration::from_millis(3_500)).await;
    // Only the immediate refresh from toggling on.
    assert_eq!(fakes.executor.count(), 1);

    fakes.tabs.set(1, TabSnapshot::active_complete());
    sleep(Duration::from_secs(1)).await;
    assert_eq!(fakes.executor.count(), 2);
}

#[tokio::test(start_paused = true)]
async fn manual_refresh_shows_count_then_idle() {
    let fakes = Fakes::new(Ok(2));
    let settings = Settings {
        quiet: true,
        ..Settings::default()
    };
    let (handle, _task) = SchedulerRuntime::spawn(fakes.collaborators(), settings);

    handle.refresh_now(4);
    sleep(Duration::from_millis(100)).await;
    assert_eq!(
        fakes.badge.texts(),
        vec![(4, REFRESHING_GLYPH.to_string()), (4, "2".to_string())]
    );

    sleep(Duration::from_secs(1)).await;
    assert_eq!(
        fakes.badge.texts(),
        vec![
            (4, REFRESHING_GLYPH.to_string()),
            (4, "2".to_string()),
            (4, String::new()),
        ]
    );
    assert!(fakes.executor.calls()[0].1.quiet);
}

#[tokio::test(start_paused = true)]
async fn failed_execution_leaves_refreshing_glyph() {
    let fakes = Fakes::new(Err(ExecutionError::TabClosed(3)));
    let (handle, _task) = SchedulerRuntime::spawn(fakes.collaborators(), Settings::default());

    handle.refresh_now(3);
    sleep(Duration::from_secs(2)).await;

    assert_eq!(fakes.badge.texts(), vec![(3, REFRESHING_GLYPH.to_string())]);
}

#[tokio::test(start_paused = true)]
async fn vanished_tab_releases_its_registration() {
    let fakes = Fakes::new(Ok(1));
    let (handle, _task) = SchedulerRuntime::spawn(fakes.collaborators(), Settings::default());

    handle.toggle(8, "1s");
    sleep(Duration::from_millis(1_500)).await;
    assert_eq!(fakes.executor.count(), 1);

    // Registration is gone, so this toggle turns auto-refresh on again.
    fakes.tabs.set(8, TabSnapshot::active_complete());
    handle.toggle(8, "1s");
    sleep(Duration::from_millis(100)).await;
    assert_eq!(fakes.executor.count(), 2);
}

#[tokio::test(start_paused = true)]
async fn unschedulable_period_falls_back_to_default() {
    let fakes = Fakes::new(Ok(1));
    fakes.tabs.set(1, TabSnapshot::active_complete());
    let (handle, task) = SchedulerRuntime::spawn(fakes.collaborators(), Settings::default());

    handle.toggle(1, "200000000000000d");
    sleep(Duration::from_millis(5_500)).await;
    assert_eq!(fakes.executor.count(), 2);

    handle.shutdown();
    let state = task.await.unwrap();
    assert_eq!(state.active_timer_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn closing_a_tab_stops_its_timer() {
    let fakes = Fakes::new(Ok(1));
    fakes.tabs.set(1, TabSnapshot::active_complete());
    fakes.tabs.set(2, TabSnapshot::active_complete());
    let (handle, task) = SchedulerRuntime::spawn(fakes.collaborators(), Settings::default());

    handle.toggle(1, "1s");
    handle.toggle(2, "1s");
    sleep(Duration::from_millis(100)).await;
    handle.tab_closed(1);
    sleep(Duration::from_millis(2_000)).await;

    let calls = fakes.executor.calls();
    assert_eq!(calls.iter().filter(|(tab_id, _)| *tab_id == 1).count(), 1);
    assert_eq!(calls.iter().filter(|(tab_id, _)| *tab_id == 2).count(), 3);

    handle.shutdown();
    let state = task.await.unwrap();
    assert_eq!(state.active_timer_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn dropping_every_handle_stops_timers() {
    let fakes = Fakes::new(Ok(1));
    fakes.tabs.set(1, TabSnapshot::active_complete());
    let (handle, task) = SchedulerRuntime::spawn(fakes.collaborators(), Settings::default());

    handle.toggle(1, "1s");
    sleep(Duration::from_millis(100)).await;
    drop(handle);

    let state = task.await.unwrap();
    assert_eq!(state.active_timer_count(), 0);
    sleep(Duration::from_secs(5)).await;
    assert_eq!(fakes.executor.count(), 1);
}

#[tokio::test(start_paused = true)]
async fn settings_update_reaches_later_refreshes() {
    let fakes = Fakes::new(Ok(0));
    let (handle, _task) = SchedulerRuntime::spawn(fakes.collaborators(), Settings::default());

    handle.update_settings(Settings {
        blacklist: "vendor.css".to_string(),
        debug: true,
        ..Settings::default()
    });
    handle.refresh_now(1);
    sleep(Duration::from_millis(10)).await;

    let calls = fakes.executor.calls();
    assert_eq!(calls[0].1.blacklist, vec!["vendor.css".to_string()]);
    assert!(calls[0].1.debug);
}

#[tokio::test(start_paused = true)]
async fn document_executor_drives_a_real_refresh() {
    let doc = Arc::new(MemoryDocument::new(SettleMode::Load));
    doc.push_link("stylesheet", None, "https://site.test/a.css");
    doc.push_link("stylesheet", None, "https://site.test/b.css");
    let executor = Arc::new(DocumentExecutor::new(RefreshOrchestrator::default()));
    executor.attach(1, doc.clone());

    assert_eq!(
        executor.execute(2, RefreshArgs::default()).await,
        Err(ExecutionError::TabClosed(2))
    );

    let badge = Arc::new(RecordingBadge::default());
    let collaborators = Collaborators {
        executor: executor.clone(),
        badge: badge.clone(),
        tabs: Arc::new(FakeTabs::default()),
    };
    let (handle, _task) = SchedulerRuntime::spawn(collaborators, Settings::default());
    handle.refresh_now(1);
    sleep(Duration::from_millis(100)).await;

    assert_eq!(badge.texts()[1], (1, "2".to_string()));
    assert!(doc
        .link_hrefs()
        .iter()
        .all(|href| href.contains("reload_css=")));

    assert!(executor.detach(1).is_some());
    assert_eq!(
        executor.execute(1, RefreshArgs::default()).await,
        Err(ExecutionError::TabClosed(1))
    );
}
