#![deny(missing_docs)]
//! Shared logging utilities for the reload workspace.
//!
//! This crate provides the `reload_*` logging macros used across the codebase,
//! the [`Diagnostics`] gate used by page-side refresh code, and initializers
//! for the global logger.

use std::fs::File;
use std::path::Path;

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

#[doc(hidden)]
pub use log;

/// Log target used for diagnostics emitted from inside a page context.
pub const PAGE_TARGET: &str = "reload::page";

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! reload_trace {
    ($($arg:tt)*) => {{
        $crate::log::trace!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! reload_debug {
    ($($arg:tt)*) => {{
        $crate::log::debug!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! reload_info {
    ($($arg:tt)*) => {{
        $crate::log::info!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! reload_warn {
    ($($arg:tt)*) => {{
        $crate::log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! reload_error {
    ($($arg:tt)*) => {{
        $crate::log::error!($($arg)*);
    }};
}

/// Logs an info-level page diagnostic if the given [`Diagnostics`] gate is open.
#[macro_export]
macro_rules! diag_info {
    ($diag:expr, $($arg:tt)*) => {{
        if $diag.enabled() {
            $crate::log::info!(target: $crate::PAGE_TARGET, $($arg)*);
        }
    }};
}

/// Logs a warn-level page diagnostic if the given [`Diagnostics`] gate is open.
#[macro_export]
macro_rules! diag_warn {
    ($diag:expr, $($arg:tt)*) => {{
        if $diag.enabled() {
            $crate::log::warn!(target: $crate::PAGE_TARGET, $($arg)*);
        }
    }};
}

/// Gate for console diagnostics produced while refreshing a page.
///
/// Output is produced when the pass is not quiet, or when debug mode forces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Diagnostics {
    quiet: bool,
    debug: bool,
}

impl Diagnostics {
    /// Builds the gate from the `quiet` and `debug` flags of a refresh request.
    pub const fn new(quiet: bool, debug: bool) -> Self {
        Self { quiet, debug }
    }

    /// A gate that never lets output through.
    pub const fn silent() -> Self {
        Self::new(true, false)
    }

    /// Whether diagnostics should be emitted.
    pub const fn enabled(&self) -> bool {
        !self.quiet || self.debug
    }
}

/// File written by [`LogDestination::File`] and [`LogDestination::Both`].
pub const LOG_FILE: &str = "./reload.log";

/// Destination for log output.
pub enum LogDestination {
    /// Write to ./reload.log in current directory.
    File,
    /// Write to terminal (stdout).
    Terminal,
    /// Write to both file and terminal.
    Both,
}

/// Initialize the global logger with the specified destination and level.
///
/// For `LogDestination::File` or `Both`, creates `./reload.log` in the
/// current working directory. Repeated initialization is ignored.
pub fn initialize(destination: LogDestination, level: LevelFilter) {
    let config = build_config();

    let loggers: Vec<Box<dyn SharedLogger>> = match destination {
        LogDestination::File => match create_file_logger(level, config, Path::new(LOG_FILE)) {
            Some(file_logger) => vec![file_logger],
            None => return,
        },
        LogDestination::Terminal => {
            vec![TermLogger::new(
                level,
                config,
                TerminalMode::Mixed,
                ColorChoice::Auto,
            )]
        }
        LogDestination::Both => {
            let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
                level,
                config.clone(),
                TerminalMode::Mixed,
                ColorChoice::Auto,
            )];
            if let Some(file_logger) = create_file_logger(level, config, Path::new(LOG_FILE)) {
                loggers.push(file_logger);
            }
            loggers
        }
    };

    let _ = CombinedLogger::init(loggers);
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}

fn create_file_logger(
    level: LevelFilter,
    config: Config,
    log_path: &Path,
) -> Option<Box<WriteLogger<File>>> {
    match File::create(log_path) {
        Ok(file) => Some(WriteLogger::new(level, config, file)),
        Err(err) => {
            eprintln!("Warning: Could not create log file at {:?}: {}", log_path, err);
            None
        }
    }
}
