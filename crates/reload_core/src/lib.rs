//! Reload core: duration parsing, blacklist filtering and the pure
//! per-tab auto-refresh state machine.
mod blacklist;
mod duration;
mod effect;
mod msg;
mod settings;
mod state;
mod tab;
mod update;
mod view_model;

pub use blacklist::{Blacklist, DEFAULT_BLACKLIST};
pub use duration::{parse_duration, DurationError, TimeDuration, DEFAULT_AUTO_REFRESH_MS, MAX_PERIOD_MS};
pub use effect::{Badge, Effect, REFRESHING_GLYPH};
pub use msg::Msg;
pub use settings::{RefreshArgs, RefreshOrigin, Settings};
pub use state::{AutoRefreshRegistration, SchedulerState, TimerId};
pub use tab::{LoadStatus, TabId, TabSnapshot};
pub use update::{update, MIN_BADGE_VISIBLE};
pub use view_model::SchedulerView;
