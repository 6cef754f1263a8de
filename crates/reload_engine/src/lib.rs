//! Reload engine: the stylesheet swap protocol, the refresh orchestrator and
//! the tokio runtime that executes scheduler effects.
mod cache_bust;
mod document;
mod host;
mod latch;
mod memory;
mod orchestrator;
mod runtime;
mod swap;
mod types;

pub use cache_bust::{cache_busted_url, CACHE_BUST_PARAM};
pub use document::Document;
pub use host::{BadgeReporter, DocumentExecutor, ExecutionError, PageExecutor, TabQuery};
pub use latch::{settle_channel, SettleLatch, SettleWatch};
pub use memory::{MemoryDocument, MemoryElement, SettleMode};
pub use orchestrator::{
    is_stylesheet_link, plan_refresh, system_clock, Clock, RefreshOrchestrator, RefreshPlan,
};
pub use runtime::{Collaborators, SchedulerHandle, SchedulerRuntime};
pub use swap::{PendingSwap, StylesheetSwapper, SwapSettings, DEFAULT_SWAP_TIMEOUT};
pub use types::{
    ElementId, LinkElement, RefreshSession, SessionMarker, SettleEvent, StylesheetResource,
    SwapOutcome,
};
