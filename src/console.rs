//! Terminal host: turns typed commands into store writes and scheduler messages, and
//! keeps the scheduler fed with a fresh snapshot whenever the data changes.

mod command;
mod delivery;

pub use command::{HELP, HostCommand};
pub use delivery::{ConsoleDeliveryChannel, LastDue, render_due};

use std::{sync::Arc, time::Duration};

use anyhow::anyhow;
use tokio_util::sync::CancellationToken;

use crate::{
    clock::Clock,
    dashboard::{format_countdown, group_by_period, logs_for_day, next_dose_preview, taken_today},
    error::StoreError,
    models::medicine::{Medicine, MedicineId},
    scheduler::DoseScheduler,
    storage::{JsonFileMedicineStore, MedicineStore},
};

#[derive(Clone)]
pub struct ConsoleHost {
    store: Arc<dyn MedicineStore>,
    scheduler: Arc<dyn DoseScheduler>,
    clock: Arc<dyn Clock>,
    last_due: LastDue,
}

impl ConsoleHost {
    pub fn new(
        store: Arc<dyn MedicineStore>,
        scheduler: Arc<dyn DoseScheduler>,
        clock: Arc<dyn Clock>,
        last_due: LastDue,
    ) -> Self {
        Self {
            store,
            scheduler,
            clock,
            last_due,
        }
    }

    /// Sends the full medicine list and history to the scheduler.
    pub async fn push_snapshot(&self) -> anyhow::Result<()> {
        let snapshot = self.store.snapshot().await?;
        self.scheduler
            .update_data(snapshot.medicines, snapshot.history)
            .await
    }

    pub async fn execute(&self, command: HostCommand) -> anyhow::Result<Vec<String>> {
        match command {
            HostCommand::Taken(id) => {
                let medicine = self.resolve(id).await?;
                self.store
                    .record_taken(&medicine.id, self.clock.now_utc())
                    .await?;
                self.dismiss(&medicine.id).await;
                self.push_snapshot().await?;

                Ok(vec![format!("✅ Marked {} as taken", medicine.name)])
            }
            HostCommand::Snooze(id) => {
                let medicine = self.resolve(id).await?;
                let name = medicine.name.clone();
                self.dismiss(&medicine.id).await;
                self.scheduler.snooze(medicine).await?;

                Ok(vec![format!("⏰ {name} snoozed")])
            }
            HostCommand::Add(new_medicine) => {
                let medicine = self
                    .store
                    .add_medicine(new_medicine, self.clock.now_utc())
                    .await?;
                self.push_snapshot().await?;

                Ok(vec![format!(
                    "Added {} ({}) at {}, {} [id {}]",
                    medicine.name, medicine.dosage, medicine.time, medicine.frequency, medicine.id
                )])
            }
            HostCommand::Delete(id) => {
                let medicine = self.store.delete_medicine(&id).await?;
                self.dismiss(&medicine.id).await;
                self.push_snapshot().await?;

                Ok(vec![format!("Removed {}", medicine.name)])
            }
            HostCommand::List => self.list().await,
            HostCommand::Next => self.next().await,
            HostCommand::History => self.history().await,
            HostCommand::Help => Ok(HELP.iter().map(|line| line.to_string()).collect()),
            HostCommand::Quit => Ok(Vec::new()),
        }
    }

    async fn list(&self) -> anyhow::Result<Vec<String>> {
        let snapshot = self.store.snapshot().await?;
        if snapshot.medicines.is_empty() {
            return Ok(vec!["No medicines yet. Try `add`".to_owned()]);
        }

        let grouped = group_by_period(&snapshot.medicines);
        let mut lines = Vec::new();
        for (title, medicines) in [
            ("Morning", grouped.morning),
            ("Afternoon", grouped.afternoon),
            ("Evening", grouped.evening),
        ] {
            if medicines.is_empty() {
                continue;
            }

            lines.push(format!("{title}:"));
            for medicine in medicines {
                let mark = if taken_today(&snapshot.history, &medicine.id, self.clock.as_ref()) {
                    "✅"
                } else {
                    "  "
                };
                lines.push(format!(
                    "  {mark} {} {} ({}) {} [id {}]",
                    medicine.time, medicine.name, medicine.dosage, medicine.frequency, medicine.id
                ));
            }
        }

        Ok(lines)
    }

    async fn next(&self) -> anyhow::Result<Vec<String>> {
        let snapshot = self.store.snapshot().await?;
        let now = self.clock.now();

        let line = match next_dose_preview(&snapshot.medicines, now) {
            Some(next) => format!(
                "Next: {} ({}) at {} in {}",
                next.medicine.name,
                next.medicine.dosage,
                next.fire_at.format("%a %H:%M"),
                format_countdown(next.fire_at - now)
            ),
            None => "No medicines scheduled".to_owned(),
        };

        Ok(vec![line])
    }

    async fn history(&self) -> anyhow::Result<Vec<String>> {
        let snapshot = self.store.snapshot().await?;
        let logs = logs_for_day(&snapshot.history, self.clock.today(), self.clock.as_ref());
        if logs.is_empty() {
            return Ok(vec!["Nothing taken today".to_owned()]);
        }

        Ok(logs
            .into_iter()
            .map(|log| {
                format!(
                    "{} {} ({})",
                    self.clock.to_local(&log.date).format("%H:%M"),
                    log.name,
                    log.dosage
                )
            })
            .collect())
    }

    /// An explicit id wins; otherwise the reminder currently showing.
    async fn resolve(&self, id: Option<MedicineId>) -> anyhow::Result<Medicine> {
        match id {
            Some(id) => Ok(self
                .store
                .get(&id)
                .await?
                .ok_or(StoreError::NotFound(id))?),
            None => self
                .last_due
                .lock()
                .await
                .clone()
                .ok_or_else(|| anyhow!("No reminder is showing. Pass a medicine id")),
        }
    }

    async fn dismiss(&self, id: &MedicineId) {
        let mut last_due = self.last_due.lock().await;
        if last_due.as_ref().is_some_and(|medicine| &medicine.id == id) {
            *last_due = None;
        }
    }
}

/// Polls the data file and pushes a new snapshot whenever its modification time changes,
/// so edits made outside this process reach the scheduler. Writes made through `store`
/// itself are already pushed by the host and are skipped. A file that fails to load is
/// retried on the next tick.
pub async fn watch_data_file(
    store: Arc<JsonFileMedicineStore>,
    host: ConsoleHost,
    interval: Duration,
    cancellation_token: CancellationToken,
) {
    let mut last_modified = store.modified().await.ok().flatten();
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancellation_token.cancelled() => {
                log::info!("Data file watcher shutting down");
                break;
            }
            _ = ticker.tick() => {}
        }

        let modified = match store.modified().await {
            Ok(modified) => modified,
            Err(error) => {
                log::warn!(
                    "Could not read data file metadata. [error = {error}, path = {}]",
                    store.path().display()
                );
                continue;
            }
        };

        if modified == last_modified {
            continue;
        }

        if modified.is_some() && modified == store.last_written().await {
            log::debug!("Skipping reload of our own write to {}", store.path().display());
            last_modified = modified;
            continue;
        }

        log::info!("[RELOAD] {} changed", store.path().display());
        match host.push_snapshot().await {
            Ok(()) => last_modified = modified,
            Err(error) => log::warn!("Could not reload data file. [error = {error:#}]"),
        }
    }
}
