use anyhow::Result;
use tracing::info;

use homework_notifier::config::{Config, Credentials};
use homework_notifier::homework::PracticumClient;
use homework_notifier::poller::{CycleOutcome, Poller, SystemClock};
use homework_notifier::telegram::{TelegramClient, TelegramNotifier};

use super::Cli;

pub async fn run(args: &Cli, config: Config, credentials: Credentials) -> Result<()> {
    let interval = config.poll_interval()?;

    let source = PracticumClient::new(
        config.poller.endpoint.clone(),
        credentials.practicum_token.clone(),
    );
    let client = TelegramClient::with_api_base(
        credentials.telegram_token.clone(),
        config.telegram.api_base.clone(),
    );
    let notifier = TelegramNotifier::new(client, credentials.chat_id.clone());

    info!(
        "Watching {} for chat {}",
        source.endpoint(),
        notifier.chat_id()
    );

    let mut poller = Poller::new(source, notifier, SystemClock, interval);

    if args.once {
        match poller.poll_once().await {
            CycleOutcome::Status { message, .. } => info!("Current status: {}", message),
            CycleOutcome::Failure { message, .. } => info!("Poll failed: {}", message),
        }
        return Ok(());
    }

    tokio::select! {
        _ = poller.run() => {}
        res = tokio::signal::ctrl_c() => {
            res?;
            info!("Received Ctrl-C, stopping poller");
        }
    }

    Ok(())
}
