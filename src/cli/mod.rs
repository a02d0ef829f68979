pub mod run;

use clap::Parser;

#[derive(Parser)]
#[command(name = "homework-notifier")]
#[command(
    author,
    version,
    about = "Relays homework review status changes to a Telegram chat"
)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Path to config file
    #[arg(short, long, env = "HOMEWORK_NOTIFIER_CONFIG")]
    pub config: Option<String>,

    /// Poll a single time and exit instead of looping
    #[arg(long)]
    pub once: bool,
}
