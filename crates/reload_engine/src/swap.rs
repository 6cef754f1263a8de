use std::time::Duration;

use reload_logging::{diag_info, diag_warn, Diagnostics};

use crate::cache_bust::cache_busted_url;
use crate::{
    Document, ElementId, RefreshSession, SettleWatch, StylesheetResource, SwapOutcome,
};

pub const DEFAULT_SWAP_TIMEOUT: Duration = Duration::from_millis(2_000);

#[derive(Debug, Clone)]
pub struct SwapSettings {
    /// How long a new stylesheet may stay silent before the old one is retired anyway.
    pub timeout: Duration,
}

impl Default for SwapSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_SWAP_TIMEOUT,
        }
    }
}

/// Replaces one stylesheet in place with a cache-busted copy.
#[derive(Debug, Clone, Default)]
pub struct StylesheetSwapper {
    settings: SwapSettings,
}

impl StylesheetSwapper {
    pub fn new(settings: SwapSettings) -> Self {
        Self { settings }
    }

    /// Synchronous half of the swap: insert the replacement after the original and
    /// tag the original for retirement.
    ///
    /// Returns `None` when the resource is skipped (unparseable href or detached
    /// original); the original is then left untouched.
    pub fn begin<D: Document + ?Sized>(
        &self,
        doc: &D,
        resource: &StylesheetResource,
        session: &RefreshSession,
        diag: Diagnostics,
    ) -> Option<PendingSwap> {
        let href = match cache_busted_url(&resource.href, session.stamp) {
            Ok(href) => href,
            Err(err) => {
                diag_warn!(diag, "  | skipping {}: {}", resource.href, err);
                return None;
            }
        };

        let Some((replacement, watch)) = doc.insert_clone_after(resource.id, &href) else {
            diag_warn!(diag, "  | skipping {}: element detached", resource.href);
            return None;
        };
        doc.tag(resource.id, &session.marker);

        Some(PendingSwap {
            original: resource.id,
            replacement,
            href,
            watch,
            timeout: self.settings.timeout,
        })
    }
}

/// A swap whose replacement is in the document and waiting to settle.
#[derive(Debug)]
pub struct PendingSwap {
    original: ElementId,
    replacement: ElementId,
    href: String,
    watch: SettleWatch,
    timeout: Duration,
}

impl PendingSwap {
    pub fn original(&self) -> ElementId {
        self.original
    }

    pub fn replacement(&self) -> ElementId {
        self.replacement
    }

    pub fn href(&self) -> &str {
        &self.href
    }

    /// Waits for load, error or timeout, then detaches the original.
    ///
    /// A failed load still retires the original: a broken stylesheet wins over a stale one.
    pub async fn settle<D: Document + ?Sized>(self, doc: &D, diag: Diagnostics) -> SwapOutcome {
        let outcome = self.watch.race(self.timeout).await;
        match outcome {
            SwapOutcome::Loaded => {}
            SwapOutcome::Failed => diag_warn!(diag, "  | failed to load {}", self.href),
            SwapOutcome::TimedOut => diag_info!(
                diag,
                "  | {} did not settle within {:?}",
                self.href,
                self.timeout
            ),
        }
        doc.remove(self.original);
        outcome
    }
}
