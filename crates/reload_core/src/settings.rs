use serde::{Deserialize, Serialize};

use crate::blacklist::{Blacklist, DEFAULT_BLACKLIST};

/// Persisted user configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Human time specification for the auto-refresh period, e.g. `"5s"`.
    pub auto_refresh_timeout: String,
    /// Newline-delimited blacklist rules.
    pub blacklist: String,
    /// Suppress page diagnostics for manual refreshes.
    pub quiet: bool,
    /// Force page diagnostics on for every refresh.
    pub debug: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_refresh_timeout: "5s".to_string(),
            blacklist: DEFAULT_BLACKLIST.join("\n"),
            quiet: false,
            debug: false,
        }
    }
}

impl Settings {
    pub fn blacklist(&self) -> Blacklist {
        Blacklist::from_lines(&self.blacklist)
    }

    /// Builds the orchestrator input for a refresh started from `origin`.
    ///
    /// Scheduled refreshes are always quiet unless debug mode is on.
    pub fn refresh_args(&self, origin: RefreshOrigin) -> RefreshArgs {
        let quiet = match origin {
            RefreshOrigin::Manual => self.quiet,
            RefreshOrigin::Scheduled => !self.debug,
        };
        RefreshArgs {
            blacklist: self.blacklist().rules().to_vec(),
            quiet,
            debug: self.debug,
        }
    }
}

/// What triggered a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshOrigin {
    Manual,
    Scheduled,
}

/// Input handed across the page executor boundary to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RefreshArgs {
    pub blacklist: Vec<String>,
    pub quiet: bool,
    pub debug: bool,
}

impl RefreshArgs {
    pub fn blacklist(&self) -> Blacklist {
        Blacklist::new(&self.blacklist)
    }
}
