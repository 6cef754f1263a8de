use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use reload_core::{Blacklist, RefreshArgs};
use reload_engine::{
    plan_refresh, Clock, Document, ElementId, LinkElement, MemoryDocument, RefreshOrchestrator,
    SessionMarker, SettleEvent, SettleMode, SettleWatch, SwapSettings,
};
use tokio::time::{sleep, Instant};

const STAMP: i64 = 1_700_000_000_000;

fn fixed_clock() -> Clock {
    Arc::new(|| Utc.timestamp_millis_opt(STAMP).unwrap())
}

fn orchestrator() -> RefreshOrchestrator {
    RefreshOrchestrator::new(SwapSettings::default()).with_clock(fixed_clock())
}

fn args(blacklist: &[&str]) -> RefreshArgs {
    RefreshArgs {
        blacklist: blacklist.iter().map(|rule| rule.to_string()).collect(),
        quiet: false,
        debug: false,
    }
}

fn busted(href: &str) -> String {
    format!("{href}?reload_css={STAMP}")
}

fn has_marker(doc: &MemoryDocument) -> bool {
    doc.elements().iter().any(|element| {
        element
            .classes
            .iter()
            .any(|class| class.starts_with("reload_css_auto_remove_"))
    })
}

fn link(id: u64, rel: Option<&str>, link_type: Option<&str>, href: Option<&str>) -> LinkElement {
    LinkElement {
        id: ElementId(id),
        rel: rel.map(str::to_string),
        link_type: link_type.map(str::to_string),
        href: href.map(str::to_string),
    }
}

#[test]
fn plan_classifies_and_filters_links() {
    let links = vec![
        link(1, Some("stylesheet"), None, Some("https://s.test/a.css")),
        link(2, Some("icon"), None, Some("https://s.test/favicon.ico")),
        link(3, Some("stylesheet"), Some(""), Some("https://s.test/b.css")),
        link(4, Some("stylesheet"), Some("text/less"), Some("https://s.test/c.less")),
        link(5, Some("StyleSheet"), Some("TEXT/CSS"), Some("https://s.test/d.css")),
        link(6, Some("stylesheet"), None, None),
        link(7, Some("stylesheet"), None, Some("https://cdn.test/e.css")),
    ];

    let plan = plan_refresh(&links, &Blacklist::new(["cdn.test"]));

    let targets: Vec<_> = plan
        .targets
        .iter()
        .map(|resource| (resource.id.0, resource.position))
        .collect();
    assert_eq!(targets, vec![(1, 0), (3, 2), (5, 4)]);
    assert_eq!(plan.skipped.len(), 1);
    assert_eq!(plan.skipped[0].href, "https://cdn.test/e.css");
}

#[tokio::test(start_paused = true)]
async fn blacklisted_stylesheet_is_never_cloned_or_tagged() {
    let doc = MemoryDocument::new(SettleMode::Load);
    let a = doc.push_link("stylesheet", None, "https://site.test/a.css");
    doc.push_link("stylesheet", None, "https://site.test/b.css");
    doc.push_link("stylesheet", None, "https://site.test/c.css");
    let a_before = doc.element(a);

    let count = orchestrator().refresh(&doc, &args(&["a.css"])).await;

    assert_eq!(count, 2);
    assert_eq!(doc.element(a), a_before);
    assert_eq!(
        doc.link_hrefs(),
        vec![
            "https://site.test/a.css".to_string(),
            busted("https://site.test/b.css"),
            busted("https://site.test/c.css"),
        ]
    );
    assert!(!has_marker(&doc));
}

#[tokio::test(start_paused = true)]
async fn document_without_stylesheets_is_left_alone() {
    let doc = MemoryDocument::new(SettleMode::Load);
    doc.push_link("icon", None, "https://site.test/favicon.ico");
    doc.push_link("stylesheet", Some("text/less"), "https://site.test/a.less");
    doc.push_link("alternate stylesheet", None, "https://site.test/alt.css");
    let before = doc.elements();

    let count = orchestrator().refresh(&doc, &args(&[])).await;

    assert_eq!(count, 0);
    assert_eq!(doc.elements(), before);
}

#[tokio::test(start_paused = true)]
async fn replacements_keep_cascade_order_and_query() {
    let doc = MemoryDocument::new(SettleMode::Load);
    doc.push_link("stylesheet", None, "https://site.test/base.css");
    doc.push_link("icon", None, "https://site.test/favicon.ico");
    doc.push_link("stylesheet", Some("text/css"), "https://site.test/theme.css?v=2&reload_css=1");
    doc.push_link("stylesheet", None, "https://site.test/print.css");

    let count = orchestrator().refresh(&doc, &args(&[])).await;

    assert_eq!(count, 3);
    assert_eq!(
        doc.link_hrefs(),
        vec![
            busted("https://site.test/base.css"),
            "https://site.test/favicon.ico".to_string(),
            format!("https://site.test/theme.css?v=2&reload_css={STAMP}"),
            busted("https://site.test/print.css"),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn failed_loads_still_retire_the_original() {
    let doc = MemoryDocument::new(SettleMode::Error);
    let a = doc.push_link("stylesheet", None, "https://site.test/a.css");
    let start = Instant::now();

    let count = orchestrator().refresh(&doc, &args(&[])).await;

    assert_eq!(count, 1);
    assert!(!doc.contains(a));
    assert_eq!(doc.link_hrefs(), vec![busted("https://site.test/a.css")]);
    assert!(start.elapsed() < Duration::from_millis(2_000));
}

#[tokio::test(start_paused = true)]
async fn silent_stylesheet_is_retired_only_after_timeout() {
    let doc = Arc::new(MemoryDocument::new(SettleMode::Manual));
    let a = doc.push_link("stylesheet", None, "https://site.test/a.css");
    let b = doc.push_link("stylesheet", None, "https://site.test/b.css");
    let c = doc.push_link("stylesheet", None, "https://site.test/c.css");
    let start = Instant::now();

    let task = tokio::spawn({
        let doc = doc.clone();
        async move { orchestrator().refresh(doc.as_ref(), &args(&[])).await }
    });
    sleep(Duration::from_millis(10)).await;

    let pending = doc.pending();
    assert_eq!(pending.len(), 3);
    assert!(doc.settle(pending[0], SettleEvent::Load));
    assert!(doc.settle(pending[1], SettleEvent::Error));
    sleep(Duration::from_millis(10)).await;

    assert!(!doc.contains(a));
    assert!(!doc.contains(b));
    assert!(doc.contains(c));

    sleep(Duration::from_millis(1_900)).await;
    assert!(doc.contains(c));
    assert!(!task.is_finished());

    let count = task.await.unwrap();
    assert_eq!(count, 3);
    assert!(!doc.contains(c));
    assert!(start.elapsed() >= Duration::from_millis(2_000));
    assert!(!doc.settle(pending[2], SettleEvent::Load));
    assert!(!has_marker(&doc));
}

#[tokio::test(start_paused = true)]
async fn custom_timeout_is_honoured() {
    let doc = MemoryDocument::new(SettleMode::Manual);
    doc.push_link("stylesheet", None, "https://site.test/a.css");
    let start = Instant::now();
    let orchestrator = RefreshOrchestrator::new(SwapSettings {
        timeout: Duration::from_millis(300),
    })
    .with_clock(fixed_clock());

    assert_eq!(orchestrator.refresh(&doc, &args(&[])).await, 1);
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(300));
    assert!(elapsed < Duration::from_millis(2_000));
}

#[tokio::test(start_paused = true)]
async fn unparseable_href_is_skipped() {
    let doc = MemoryDocument::new(SettleMode::Load);
    let relative = doc.push_link("stylesheet", None, "/relative.css");
    doc.push_link("stylesheet", None, "https://site.test/b.css");

    let count = orchestrator().refresh(&doc, &args(&[])).await;

    assert_eq!(count, 1);
    assert!(doc.contains(relative));
    assert!(!has_marker(&doc));
}

/// Refuses the first removal of every element, leaving stragglers for the sweep.
struct StubbornDocument {
    inner: MemoryDocument,
    refused: Mutex<HashSet<ElementId>>,
}

impl Document for StubbornDocument {
    fn link_elements(&self) -> Vec<LinkElement> {
        self.inner.link_elements()
    }

    fn insert_clone_after(&self, original: ElementId, href: &str) -> Option<(ElementId, SettleWatch)> {
        self.inner.insert_clone_after(original, href)
    }

    fn tag(&self, element: ElementId, marker: &SessionMarker) {
        self.inner.tag(element, marker)
    }

    fn tagged(&self, marker: &SessionMarker) -> Vec<ElementId> {
        self.inner.tagged(marker)
    }

    fn remove(&self, element: ElementId) -> bool {
        if self.refused.lock().unwrap().insert(element) {
            return false;
        }
        self.inner.remove(element)
    }
}

#[tokio::test(start_paused = true)]
async fn sweep_removes_originals_left_behind() {
    let doc = StubbornDocument {
        inner: MemoryDocument::new(SettleMode::Load),
        refused: Mutex::new(HashSet::new()),
    };
    let a = doc.inner.push_link("stylesheet", None, "https://site.test/a.css");
    let b = doc.inner.push_link("stylesheet", None, "https://site.test/b.css");

    let count = orchestrator().refresh(&doc, &args(&[])).await;

    assert_eq!(count, 2);
    assert!(!doc.inner.contains(a));
    assert!(!doc.inner.contains(b));
    assert!(!has_marker(&doc.inner));
    assert_eq!(doc.inner.link_hrefs().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn quiet_and_debug_passes_behave_the_same() {
    reload_logging::initialize_for_tests();
    for (quiet, debug) in [(true, false), (true, true), (false, false)] {
        let doc = MemoryDocument::new(SettleMode::Load);
        doc.push_link("stylesheet", None, "https://site.test/a.css");
        let args = RefreshArgs {
            blacklist: Vec::new(),
            quiet,
            debug,
        };
        assert_eq!(orchestrator().refresh(&doc, &args).await, 1);
    }
}
