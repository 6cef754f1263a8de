use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use reload_core::{parse_duration, RefreshArgs, RefreshOrigin, Settings, TabId, TimeDuration};
use reload_engine::{
    Collaborators, DocumentExecutor, MemoryDocument, PageExecutor, RefreshOrchestrator,
    SchedulerRuntime, SettleMode,
};
use reload_logging::reload_info;

use super::console::{ConsoleBadge, HeadlessTabs};
use super::persistence::SettingsStore;

const HEADLESS_TAB: TabId = 1;

/// An HTML page to load into a headless tab.
pub struct PageSource {
    pub html: PathBuf,
    pub base_url: Option<String>,
    /// Make every new stylesheet fail to load instead of succeeding.
    pub fail_loads: bool,
}

impl PageSource {
    fn load(&self) -> anyhow::Result<Arc<MemoryDocument>> {
        let html = fs::read_to_string(&self.html)
            .with_context(|| format!("reading {}", self.html.display()))?;
        let mode = if self.fail_loads {
            SettleMode::Error
        } else {
            SettleMode::Load
        };
        Ok(Arc::new(MemoryDocument::from_html(
            &html,
            self.base_url.as_deref(),
            mode,
        )))
    }
}

/// One manual refresh pass over a page, printing the resulting stylesheet links.
pub async fn run_refresh(
    store: &SettingsStore,
    page: &PageSource,
    quiet: bool,
) -> anyhow::Result<()> {
    let settings = store.load();
    let doc = page.load()?;
    let executor = DocumentExecutor::new(RefreshOrchestrator::default());
    executor.attach(HEADLESS_TAB, doc.clone());

    let count = executor
        .execute(HEADLESS_TAB, manual_args(&settings, quiet))
        .await?;

    println!("Refreshed {count} stylesheet(s)");
    for href in doc.link_hrefs() {
        println!("  {href}");
    }
    Ok(())
}

/// Arguments for a manual pass; `quiet` silences it even when the settings do not.
fn manual_args(settings: &Settings, quiet: bool) -> RefreshArgs {
    let mut args = settings.refresh_args(RefreshOrigin::Manual);
    args.quiet |= quiet;
    args
}

/// Turns auto-refresh on for a headless tab, lets `ticks` periods pass, then turns it off.
pub async fn run_watch(
    store: &SettingsStore,
    page: &PageSource,
    every: Option<String>,
    ticks: u32,
) -> anyhow::Result<()> {
    let settings = store.load();
    let spec = every.unwrap_or_else(|| settings.auto_refresh_timeout.clone());
    let period = parse_duration(&spec).unwrap_or_else(|_| TimeDuration::default_auto_refresh());

    let doc = page.load()?;
    let executor = Arc::new(DocumentExecutor::new(RefreshOrchestrator::default()));
    executor.attach(HEADLESS_TAB, doc.clone());
    let tabs = Arc::new(HeadlessTabs::default());
    tabs.open(HEADLESS_TAB);

    let collaborators = Collaborators {
        executor,
        badge: Arc::new(ConsoleBadge),
        tabs,
    };
    let (handle, task) = SchedulerRuntime::spawn(collaborators, settings);

    reload_info!("Watching {} every {} for {} tick(s)", page.html.display(), period, ticks);
    handle.toggle(HEADLESS_TAB, spec);
    tokio::time::sleep(watch_window(period, ticks)?).await;
    handle.toggle(HEADLESS_TAB, String::new());
    handle.shutdown();
    task.await.context("scheduler task")?;

    for href in doc.link_hrefs() {
        println!("  {href}");
    }
    Ok(())
}

/// How long to keep the scheduler running so `ticks` periods elapse.
fn watch_window(period: TimeDuration, ticks: u32) -> anyhow::Result<Duration> {
    period
        .as_duration()
        .checked_mul(ticks)
        .and_then(|window| window.checked_add(Duration::from_millis(100)))
        .with_context(|| format!("{ticks} tick(s) of {period} is too long to watch"))
}

pub fn run_parse_duration(spec: &str) -> anyhow::Result<()> {
    let duration = parse_duration(spec)?;
    println!("{spec:?} = {}ms", duration.as_millis_f64());
    Ok(())
}

/// Requested edits to the stored settings.
#[derive(Default)]
pub struct ConfigChanges {
    pub timeout: Option<String>,
    pub quiet: Option<bool>,
    pub debug: Option<bool>,
    pub add_rules: Vec<String>,
    pub remove_rules: Vec<String>,
}

impl ConfigChanges {
    fn is_empty(&self) -> bool {
        self.timeout.is_none()
            && self.quiet.is_none()
            && self.debug.is_none()
            && self.add_rules.is_empty()
            && self.remove_rules.is_empty()
    }

    fn apply(self, mut settings: Settings) -> anyhow::Result<Settings> {
        if let Some(timeout) = self.timeout {
            if let Err(err) = parse_duration(&timeout) {
                bail!("Invalid time string {timeout:?}: {err}");
            }
            settings.auto_refresh_timeout = timeout;
        }
        if let Some(quiet) = self.quiet {
            settings.quiet = quiet;
        }
        if let Some(debug) = self.debug {
            settings.debug = debug;
        }
        if !self.add_rules.is_empty() || !self.remove_rules.is_empty() {
            let mut rules: Vec<String> = settings.blacklist().rules().to_vec();
            rules.retain(|rule| !self.remove_rules.iter().any(|r| r.trim() == rule.as_str()));
            for rule in self.add_rules {
                let rule = rule.trim().to_string();
                if !rule.is_empty() && !rules.contains(&rule) {
                    rules.push(rule);
                }
            }
            settings.blacklist = rules.join("\n");
        }
        Ok(settings)
    }
}

/// Shows the stored settings, applying and saving `changes` first if any.
pub fn run_config(store: &SettingsStore, changes: ConfigChanges, json: bool) -> anyhow::Result<()> {
    let mut settings = store.load();
    if !changes.is_empty() {
        settings = changes.apply(settings)?;
        store
            .save(&settings)
            .with_context(|| format!("saving {}", store.path().display()))?;
        reload_info!("Saved settings to {:?}", store.path());
    }

    let rendered = if json {
        serde_json::to_string_pretty(&settings)?
    } else {
        ron::ser::to_string_pretty(&settings, ron::ser::PrettyConfig::new())?
    };
    println!("{rendered}");
    Ok(())
}
