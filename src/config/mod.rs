pub mod cli;
pub mod toml_config;

pub use cli::LocalStorage;
pub use toml_config::{Settings, SkolmatConfig, SourceConfig};

#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "skolmat")]
#[command(about = "Fetch school and care home menus and print the day's summary")]
pub struct CliArgs {
    #[arg(long, default_value = "skolmat.toml")]
    pub config: String,

    #[arg(long, help = "Day to show (YYYY-MM-DD), defaults to today")]
    pub date: Option<chrono::NaiveDate>,

    #[arg(long, help = "Print meal/label keywords found in each menu")]
    pub keywords: bool,

    #[arg(long, help = "Print the summary without applying the day filter")]
    pub unfiltered: bool,

    #[arg(long, help = "List past days recorded in the history directory")]
    pub history: bool,

    #[arg(long, help = "Fetch even when the cached menu is still valid")]
    pub force: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log as JSON lines")]
    pub json_logs: bool,
}
