mod platform;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use reload_logging::LogDestination;

use platform::{ConfigChanges, PageSource, SettingsStore};

#[derive(Debug, Parser)]
#[command(name = "reload", about = "Hot stylesheet reload without a full page reload")]
struct Cli {
    /// Settings file (defaults to ./.reload/settings.ron).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Log at debug level.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Where log output goes; `file` and `both` write ./reload.log.
    #[arg(long, value_enum, default_value_t = LogTarget::Terminal, global = true)]
    log: LogTarget,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogTarget {
    Terminal,
    File,
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::File => LogDestination::File,
            LogTarget::Both => LogDestination::Both,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Refresh the stylesheets of an HTML page once.
    Refresh {
        html: PathBuf,
        /// Base URL for resolving relative stylesheet links.
        #[arg(long)]
        base_url: Option<String>,
        /// Simulate replacements that fail to load.
        #[arg(long)]
        fail_loads: bool,
        /// Suppress page diagnostics for this pass.
        #[arg(long)]
        quiet: bool,
    },
    /// Auto-refresh an HTML page for a number of ticks.
    Watch {
        html: PathBuf,
        #[arg(long)]
        base_url: Option<String>,
        /// Period such as "5s" or "2 minutes"; defaults to the stored setting.
        #[arg(long)]
        every: Option<String>,
        #[arg(long, default_value_t = 3)]
        ticks: u32,
    },
    /// Print the milliseconds a time specification resolves to.
    ParseDuration { spec: String },
    /// Show or edit the stored settings.
    Config {
        #[arg(long)]
        set_timeout: Option<String>,
        #[arg(long)]
        quiet: Option<bool>,
        #[arg(long)]
        debug: Option<bool>,
        /// Add a blacklist rule (repeatable).
        #[arg(long)]
        add_rule: Vec<String>,
        /// Remove a blacklist rule (repeatable).
        #[arg(long)]
        remove_rule: Vec<String>,
        /// Print as JSON instead of RON.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    reload_logging::initialize(cli.log.into(), level);

    let store = SettingsStore::new(cli.settings.unwrap_or_else(SettingsStore::default_location));

    match cli.command {
        Command::Refresh {
            html,
            base_url,
            fail_loads,
            quiet,
        } => {
            let page = PageSource {
                html,
                base_url,
                fail_loads,
            };
            platform::run_refresh(&store, &page, quiet).await
        }
        Command::Watch {
            html,
            base_url,
            every,
            ticks,
        } => {
            let page = PageSource {
                html,
                base_url,
                fail_loads: false,
            };
            platform::run_watch(&store, &page, every, ticks).await
        }
        Command::ParseDuration { spec } => platform::run_parse_duration(&spec),
        Command::Config {
            set_timeout,
            quiet,
            debug,
            add_rule,
            remove_rule,
            json,
        } => {
            let changes = ConfigChanges {
                timeout: set_timeout,
                quiet,
                debug,
                add_rules: add_rule,
                remove_rules: remove_rule,
            };
            platform::run_config(&store, changes, json)
        }
    }
}
