use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use reload_core::{Blacklist, RefreshArgs};
use reload_logging::{diag_info, Diagnostics};

use crate::swap::{StylesheetSwapper, SwapSettings};
use crate::{Document, LinkElement, RefreshSession, SessionMarker, StylesheetResource, SwapOutcome};

/// Source of the timestamps used for session markers and cache-busting stamps.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

/// Result of classifying and filtering a document's link elements.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RefreshPlan {
    pub targets: Vec<StylesheetResource>,
    /// Stylesheets excluded by the blacklist.
    pub skipped: Vec<StylesheetResource>,
}

/// `rel="stylesheet"` with an absent, blank or css-like `type`, and a usable href.
pub fn is_stylesheet_link(link: &LinkElement) -> bool {
    let rel_ok = link
        .rel
        .as_deref()
        .is_some_and(|rel| rel.trim().eq_ignore_ascii_case("stylesheet"));
    let type_ok = match link.link_type.as_deref().map(str::trim) {
        None | Some("") => true,
        Some(kind) => kind.to_ascii_lowercase().contains("css"),
    };
    let href_ok = link.href.as_deref().is_some_and(|href| !href.trim().is_empty());
    rel_ok && type_ok && href_ok
}

/// Pure planning step: which stylesheets a pass will swap.
pub fn plan_refresh(links: &[LinkElement], blacklist: &Blacklist) -> RefreshPlan {
    let mut plan = RefreshPlan::default();
    for (position, link) in links.iter().enumerate() {
        if !is_stylesheet_link(link) {
            continue;
        }
        let Some(href) = link.href.clone() else {
            continue;
        };
        let resource = StylesheetResource {
            id: link.id,
            position,
            href,
        };
        if blacklist.should_refresh(&resource.href) {
            plan.targets.push(resource);
        } else {
            plan.skipped.push(resource);
        }
    }
    plan
}

/// Runs one refresh pass over a document.
#[derive(Clone)]
pub struct RefreshOrchestrator {
    swapper: StylesheetSwapper,
    clock: Clock,
}

impl RefreshOrchestrator {
    pub fn new(settings: SwapSettings) -> Self {
        Self {
            swapper: StylesheetSwapper::new(settings),
            clock: system_clock(),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    fn start_session(&self) -> RefreshSession {
        let now = (self.clock)();
        RefreshSession {
            marker: SessionMarker::from_micros(now.timestamp_micros()),
            stamp: now.timestamp_millis(),
        }
    }

    /// Swaps every non-blacklisted stylesheet and returns how many were swapped.
    ///
    /// All replacements are inserted before any of them is awaited, so cascade
    /// order holds however the loads complete.
    pub async fn refresh<D: Document + ?Sized>(&self, doc: &D, args: &RefreshArgs) -> usize {
        let diag = Diagnostics::new(args.quiet, args.debug);
        let plan = plan_refresh(&doc.link_elements(), &args.blacklist());
        if plan.targets.is_empty() {
            diag_info!(diag, "No stylesheet link elements to refresh");
            return 0;
        }

        let session = self.start_session();
        diag_info!(
            diag,
            "Refreshing {} stylesheet link elements ({} blacklisted)",
            plan.targets.len(),
            plan.skipped.len()
        );

        let pending: Vec<_> = plan
            .targets
            .iter()
            .filter_map(|resource| self.swapper.begin(doc, resource, &session, diag))
            .collect();
        let swapped = pending.len();

        diag_info!(diag, "  | awaiting all to be reloaded");
        let outcomes = join_all(pending.into_iter().map(|swap| swap.settle(doc, diag))).await;
        let timed_out = outcomes
            .iter()
            .filter(|outcome| **outcome == SwapOutcome::TimedOut)
            .count();

        diag_info!(
            diag,
            "  | all {} elements refreshed ({} timed out), removing remaining old elements",
            swapped,
            timed_out
        );
        sweep(doc, &session.marker);

        diag_info!(diag, "  | done!");
        swapped
    }
}

impl Default for RefreshOrchestrator {
    fn default() -> Self {
        Self::new(SwapSettings::default())
    }
}

/// Removes any element still carrying this pass's marker.
fn sweep<D: Document + ?Sized>(doc: &D, marker: &SessionMarker) {
    for element in doc.tagged(marker) {
        doc.remove(element);
    }
}
