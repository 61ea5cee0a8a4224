mod platform;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;

/// Headless front end for browsing archived chat history.
#[derive(Debug, Parser)]
#[command(name = "chatlog", version, about)]
pub struct Cli {
    /// Database file to open or create
    pub database: PathBuf,
    /// Settings file
    #[arg(long, default_value = platform::config::CONFIG_FILE)]
    pub config: PathBuf,
    /// Legacy archive to import before counting (repeatable)
    #[arg(long = "import")]
    pub imports: Vec<PathBuf>,
    /// Only count messages sent on or after this day (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,
    /// Only count messages sent on or before this day (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<NaiveDate>,
    /// Only count messages in this channel (repeatable)
    #[arg(long = "channel")]
    pub channels: Vec<u64>,
    /// Only count messages from this user (repeatable)
    #[arg(long = "user")]
    pub users: Vec<u64>,
    /// Print the channel and user checklists
    #[arg(long)]
    pub list_choices: bool,
    /// Answer every prompt with its default instead of reading stdin
    #[arg(long, short = 'y')]
    pub yes: bool,
}

fn main() -> anyhow::Result<()> {
    platform::run_app(Cli::parse())
}
