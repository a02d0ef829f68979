use anyhow::Result;
use clap::Parser;
use tracing::error;

use homework_notifier::config::{Config, Credentials};
use homework_notifier::logging;

mod cli;

use cli::Cli;

fn main() -> Result<()> {
    // A missing .env is fine; variables may come from the real environment
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // The poller is the only task, so a current-thread runtime is enough
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    let loaded = Config::load(cli.config.as_deref());

    // Initialize logging
    let log_config = loaded
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_default();
    logging::init(&log_config, cli.verbose);

    let config = loaded.inspect_err(|e| error!(severity = "critical", "{}", e))?;

    // Nothing touches the network until every credential is present
    let credentials =
        Credentials::from_env().inspect_err(|e| error!(severity = "critical", "{}", e))?;

    cli::run::run(&cli, config, credentials).await
}
