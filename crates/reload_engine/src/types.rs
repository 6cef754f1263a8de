use std::fmt;

/// Opaque handle to an element inside a [`crate::Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

/// Snapshot of a `<link>` element as seen by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkElement {
    pub id: ElementId,
    pub rel: Option<String>,
    pub link_type: Option<String>,
    /// Resolved (absolute) URL.
    pub href: Option<String>,
}

/// A link element classified as an external stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StylesheetResource {
    pub id: ElementId,
    /// Index among the document's link elements.
    pub position: usize,
    pub href: String,
}

/// Class name applied to every original element retired during one pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionMarker(String);

impl SessionMarker {
    pub fn from_micros(micros: i64) -> Self {
        Self(format!("reload_css_auto_remove_{micros}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// State shared by every swap of one orchestration pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshSession {
    pub marker: SessionMarker,
    /// Value written into the cache-busting query parameter.
    pub stamp: i64,
}

/// Signal raised by a newly inserted stylesheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleEvent {
    Load,
    Error,
}

/// How a single swap was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapOutcome {
    Loaded,
    Failed,
    TimedOut,
}
