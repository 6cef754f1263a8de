mod app;
mod console;
mod persistence;

pub use app::{run_config, run_parse_duration, run_refresh, run_watch, ConfigChanges, PageSource};
pub use persistence::SettingsStore;
