//! The reminder engine. One background task owns the medicine list, the history log and
//! at most one armed trigger; the host talks to it only through [`DoseScheduler`].

mod trigger;

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{NaiveDateTime, TimeDelta};
use tokio::{
    sync::{mpsc, oneshot},
    task::{self, JoinHandle},
};

use crate::{
    clock::Clock,
    delivery::{DoseDeliveryChannel, DueReason},
    models::{
        history::HistoryLog,
        medicine::{Medicine, MedicineId},
    },
    schedule::select_next_due,
};

use trigger::{Generation, ScheduledTrigger};

pub const DEFAULT_SNOOZE_INTERVAL: Duration = Duration::from_secs(5 * 60);

const MESSAGE_BUFFER: usize = 64;
const CANCEL_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    Natural,
    Snooze,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerStatus {
    Idle,
    Armed {
        medicine_id: MedicineId,
        fire_at: NaiveDateTime,
        kind: TriggerKind,
    },
}

#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    pub snooze_interval: Duration,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            snooze_interval: DEFAULT_SNOOZE_INTERVAL,
        }
    }
}

#[async_trait]
pub trait DoseScheduler: Send + Sync + 'static {
    /// Replaces medicines and history wholesale, then re-arms for the soonest due dose.
    async fn update_data(
        &self,
        medicines: Vec<Medicine>,
        history: Vec<HistoryLog>,
    ) -> anyhow::Result<()>;

    /// Redelivers `medicine` after the snooze interval instead of the natural schedule.
    async fn snooze(&self, medicine: Medicine) -> anyhow::Result<()>;

    async fn status(&self) -> anyhow::Result<SchedulerStatus>;
}

#[derive(Debug)]
enum SchedulerMessage {
    UpdateData {
        medicines: Vec<Medicine>,
        history: Vec<HistoryLog>,
    },
    Snooze(Medicine),
    Status(oneshot::Sender<SchedulerStatus>),
}

pub struct ReminderSchedulerHandle {
    sender: mpsc::Sender<SchedulerMessage>,
    task_handle: JoinHandle<()>,
}

impl ReminderSchedulerHandle {
    /// Closes the inbox and waits for the engine to cancel its trigger and stop.
    pub async fn shutdown(self) {
        drop(self.sender);
        let _ = self.task_handle.await;
    }

    async fn send(&self, message: SchedulerMessage) -> anyhow::Result<()> {
        self.sender
            .send(message)
            .await
            .map_err(|_| anyhow::anyhow!("Reminder scheduler is not running"))
    }
}

#[async_trait]
impl DoseScheduler for ReminderSchedulerHandle {
    async fn update_data(
        &self,
        medicines: Vec<Medicine>,
        history: Vec<HistoryLog>,
    ) -> anyhow::Result<()> {
        self.send(SchedulerMessage::UpdateData { medicines, history })
            .await
    }

    async fn snooze(&self, medicine: Medicine) -> anyhow::Result<()> {
        self.send(SchedulerMessage::Snooze(medicine)).await
    }

    async fn status(&self) -> anyhow::Result<SchedulerStatus> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(SchedulerMessage::Status(reply_tx)).await?;
        Ok(reply_rx.await?)
    }
}

struct PendingTrigger {
    generation: Generation,
    medicine: Medicine,
    kind: TriggerKind,
    fire_at: NaiveDateTime,
    trigger: ScheduledTrigger,
}

pub struct ReminderScheduler {
    medicines: Vec<Medicine>,
    history: Vec<HistoryLog>,
    pending: Option<PendingTrigger>,
    generation: Generation,
    elapsed_tx: mpsc::UnboundedSender<Generation>,
    delivery_channel: Arc<dyn DoseDeliveryChannel>,
    clock: Arc<dyn Clock>,
    options: SchedulerOptions,
}

impl ReminderScheduler {
    pub fn start(
        delivery_channel: Arc<dyn DoseDeliveryChannel>,
        clock: Arc<dyn Clock>,
        options: SchedulerOptions,
    ) -> ReminderSchedulerHandle {
        let (sender, receiver) = mpsc::channel(MESSAGE_BUFFER);
        let (elapsed_tx, elapsed_rx) = mpsc::unbounded_channel();

        let scheduler = Self {
            medicines: Vec::new(),
            history: Vec::new(),
            pending: None,
            generation: 0,
            elapsed_tx,
            delivery_channel,
            clock,
            options,
        };

        log::info!("Starting reminder scheduler");
        let task_handle = task::spawn(scheduler.run(receiver, elapsed_rx));

        ReminderSchedulerHandle {
            sender,
            task_handle,
        }
    }

    async fn run(
        mut self,
        mut receiver: mpsc::Receiver<SchedulerMessage>,
        mut elapsed_rx: mpsc::UnboundedReceiver<Generation>,
    ) {
        loop {
            tokio::select! {
                biased;

                Some(generation) = elapsed_rx.recv() => {
                    self.handle_elapsed(generation).await;
                }
                message = receiver.recv() => match message {
                    Some(message) => self.handle_message(message).await,
                    None => break,
                },
            }
        }

        self.cancel_pending().await;
        log::info!("Reminder scheduler shutting down");
    }

    async fn handle_message(&mut self, message: SchedulerMessage) {
        match message {
            SchedulerMessage::UpdateData { medicines, history } => {
                log::info!(
                    "[UPDATE] Received {} medicines and {} history entries",
                    medicines.len(),
                    history.len()
                );
                self.medicines = medicines;
                self.history = history;
                self.cancel_pending().await;
                self.recompute_and_arm(self.clock.now()).await;
            }
            SchedulerMessage::Snooze(medicine) => self.snooze(medicine).await,
            SchedulerMessage::Status(reply_tx) => {
                let _ = reply_tx.send(self.status());
            }
        }
    }

    async fn snooze(&mut self, medicine: Medicine) {
        self.cancel_pending().await;

        let now = self.clock.now();
        let interval = self.options.snooze_interval;
        let Some(fire_at) = TimeDelta::from_std(interval)
            .ok()
            .and_then(|delta| now.checked_add_signed(delta))
        else {
            log::warn!("Snooze interval {interval:?} is out of range. MedicineId {}", medicine.id);
            return;
        };

        log::info!("[SNOOZE] Sleeping for {interval:?} delay. MedicineId {}", medicine.id);
        self.arm(medicine, TriggerKind::Snooze, fire_at, interval);
    }

    async fn handle_elapsed(&mut self, generation: Generation) {
        let Some(pending) = self
            .pending
            .take_if(|pending| pending.generation == generation)
        else {
            log::debug!("Ignoring superseded trigger. [generation = {generation}]");
            return;
        };

        let reason = match pending.kind {
            TriggerKind::Natural => DueReason::Scheduled,
            TriggerKind::Snooze => DueReason::Snoozed,
        };

        log::info!("[DUE] {:?} dose of {}. MedicineId {}", reason, pending.medicine.name, pending.medicine.id);

        if let Err(error) = self
            .delivery_channel
            .send_due_notification(&pending.medicine, reason)
            .await
        {
            log::warn!(
                "Could not deliver due dose. [error = {error:#}, medicine_id = {}]",
                pending.medicine.id
            );
        }

        let now = self.clock.now();
        let reference = match pending.kind {
            // A natural dose instant is spent once delivered: look strictly past it.
            TriggerKind::Natural => pending
                .fire_at
                .checked_add_signed(TimeDelta::seconds(1))
                .map_or(now, |after_delivery| now.max(after_delivery)),
            // Snoozes end at arbitrary sub-second points and must not skip a dose due just after.
            TriggerKind::Snooze => now,
        };
        self.recompute_and_arm(reference).await;
    }

    async fn recompute_and_arm(&mut self, reference: NaiveDateTime) {
        let Some(next) = select_next_due(
            &self.medicines,
            &self.history,
            reference,
            self.clock.as_ref(),
        ) else {
            log::info!("[IDLE] No medicine is due");
            return;
        };

        let medicine = next.medicine.clone();
        let fire_at = next.fire_at;

        let fire_at_utc = self.clock.to_utc(&fire_at);
        match (fire_at_utc - self.clock.now_utc()).to_std() {
            Ok(delay) if !delay.is_zero() => {
                log::info!("[ARMED] Sleeping for {delay:?} delay. MedicineId {}", medicine.id);
                self.arm(medicine, TriggerKind::Natural, fire_at, delay);
            }
            _ => log::debug!(
                "[IDLE] Next dose at {fire_at} is not in the future. MedicineId {}",
                medicine.id
            ),
        }
    }

    /// Callers cancel first, so there is never more than one live trigger.
    fn arm(&mut self, medicine: Medicine, kind: TriggerKind, fire_at: NaiveDateTime, delay: Duration) {
        self.generation += 1;
        let trigger = ScheduledTrigger::arm(self.generation, delay, self.elapsed_tx.clone());

        self.pending = Some(PendingTrigger {
            generation: self.generation,
            medicine,
            kind,
            fire_at,
            trigger,
        });
    }

    async fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            log::debug!(
                "Cancelling {:?} trigger for {}. MedicineId {}",
                pending.kind,
                pending.fire_at,
                pending.medicine.id
            );
            pending.trigger.cancel(CANCEL_TIMEOUT).await;
        }
    }

    fn status(&self) -> SchedulerStatus {
        match &self.pending {
            Some(pending) => SchedulerStatus::Armed {
                medicine_id: pending.medicine.id.clone(),
                fire_at: pending.fire_at,
                kind: pending.kind,
            },
            None => SchedulerStatus::Idle,
        }
    }
}
