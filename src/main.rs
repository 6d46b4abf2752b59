use std::sync::Arc;

use anyhow::Context;
use pillbell::{
    appsettings::AppSettings,
    clock::{Clock, SystemClock},
    console::{ConsoleDeliveryChannel, ConsoleHost, HostCommand, LastDue, watch_data_file},
    scheduler::ReminderScheduler,
    storage::{JsonFileMedicineStore, MedicineStore},
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init();

    let settings = AppSettings::new().context("Could not load appsettings")?;
    log::info!(
        "Using data file {}",
        settings.storage.data_file.display()
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new(settings.scheduler.timezone));
    let store = Arc::new(JsonFileMedicineStore::new(&settings.storage.data_file));
    let last_due = LastDue::default();

    let scheduler = Arc::new(ReminderScheduler::start(
        Arc::new(ConsoleDeliveryChannel::new(last_due.clone())),
        clock.clone(),
        settings.scheduler.options(),
    ));

    let host = ConsoleHost::new(
        store.clone() as Arc<dyn MedicineStore>,
        scheduler.clone(),
        clock,
        last_due,
    );
    host.push_snapshot()
        .await
        .context("Could not load medicines")?;

    let cancellation_token = CancellationToken::new();
    let watcher = tokio::spawn(watch_data_file(
        store,
        host.clone(),
        settings.storage.reload_interval(),
        cancellation_token.clone(),
    ));

    println!("💊 pillbell is running. Type `help` for commands.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("Could not read from stdin")?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<HostCommand>() {
            Ok(command) => command,
            Err(error) => {
                println!("{error}");
                continue;
            }
        };
        if command == HostCommand::Quit {
            break;
        }

        match host.execute(command).await {
            Ok(output) => output.iter().for_each(|line| println!("{line}")),
            Err(error) => println!("⚠️ {error:#}"),
        }
    }

    cancellation_token.cancel();
    let _ = watcher.await;
    drop(host);

    match Arc::try_unwrap(scheduler) {
        Ok(scheduler) => scheduler.shutdown().await,
        Err(_) => log::warn!("Reminder scheduler is still shared, skipping graceful shutdown"),
    }

    Ok(())
}
