use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use chrono_tz::Tz;

use crate::{
    clock::{Clock, resolve_local},
    delivery::{DoseDeliveryChannel, DueReason},
    scheduler::{DoseScheduler, SchedulerStatus},
    models::{
        history::HistoryLog,
        medicine::{DoseTime, Frequency, Medicine},
    },
};

/// Wall clock that only moves with tokio's (paused) clock. Local time is UTC unless a
/// zone is given.
pub struct PausedClock {
    origin: DateTime<Utc>,
    started: tokio::time::Instant,
    timezone: Option<Tz>,
}

impl PausedClock {
    pub fn starting_at(origin: NaiveDateTime) -> Self {
        Self {
            origin: origin.and_utc(),
            started: tokio::time::Instant::now(),
            timezone: None,
        }
    }

    /// Starts at `local_origin` on the wall clock of `timezone`.
    pub fn in_zone(timezone: Tz, local_origin: NaiveDateTime) -> Self {
        Self {
            origin: resolve_local(&timezone, &local_origin),
            started: tokio::time::Instant::now(),
            timezone: Some(timezone),
        }
    }
}

impl Clock for PausedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        let elapsed = TimeDelta::from_std(self.started.elapsed()).expect("Test runs are short.");
        self.origin + elapsed
    }

    fn to_local(&self, instant: &DateTime<Utc>) -> NaiveDateTime {
        match self.timezone {
            Some(tz) => instant.with_timezone(&tz).naive_local(),
            None => instant.naive_utc(),
        }
    }

    fn to_utc(&self, local: &NaiveDateTime) -> DateTime<Utc> {
        match self.timezone {
            Some(tz) => resolve_local(&tz, local),
            None => local.and_utc(),
        }
    }
}

/// Clock frozen at a single moment, UTC as local time.
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.0.and_utc()
    }

    fn to_local(&self, instant: &DateTime<Utc>) -> NaiveDateTime {
        instant.naive_utc()
    }

    fn to_utc(&self, local: &NaiveDateTime) -> DateTime<Utc> {
        local.and_utc()
    }
}

pub type ReceivedDoses = Arc<Mutex<Vec<(String, DueReason, NaiveDateTime)>>>;

/// Records every due event together with the wall-clock time it arrived.
pub struct TestDeliveryChannel {
    pub received: ReceivedDoses,
    clock: Arc<dyn Clock>,
}

impl TestDeliveryChannel {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            received: Arc::new(Mutex::new(Vec::new())),
            clock,
        }
    }
}

#[async_trait]
impl DoseDeliveryChannel for TestDeliveryChannel {
    async fn send_due_notification(
        &self,
        medicine: &Medicine,
        reason: DueReason,
    ) -> anyhow::Result<()> {
        self.received
            .lock()
            .unwrap()
            .push((medicine.id.clone(), reason, self.clock.now()));
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerCall {
    UpdateData { medicine_ids: Vec<String>, history_len: usize },
    Snooze(String),
}

/// Stands in for the engine and remembers what the host asked of it.
#[derive(Default)]
pub struct RecordingScheduler {
    pub calls: Mutex<Vec<SchedulerCall>>,
}

impl RecordingScheduler {
    pub fn calls(&self) -> Vec<SchedulerCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DoseScheduler for RecordingScheduler {
    async fn update_data(
        &self,
        medicines: Vec<Medicine>,
        history: Vec<HistoryLog>,
    ) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(SchedulerCall::UpdateData {
            medicine_ids: medicines.into_iter().map(|medicine| medicine.id).collect(),
            history_len: history.len(),
        });
        Ok(())
    }

    async fn snooze(&self, medicine: Medicine) -> anyhow::Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(SchedulerCall::Snooze(medicine.id));
        Ok(())
    }

    async fn status(&self) -> anyhow::Result<SchedulerStatus> {
        Ok(SchedulerStatus::Idle)
    }
}

/// 2025-06-04 is a Wednesday.
pub fn wednesday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 4).unwrap()
}

pub fn at(day: NaiveDate, hour: u32, minute: u32) -> NaiveDateTime {
    day.and_time(NaiveTime::from_hms_opt(hour, minute, 0).unwrap())
}

pub fn medicine(id: &str, time: &str, frequency: Frequency) -> Medicine {
    Medicine {
        id: id.to_owned(),
        name: format!("Medicine {id}"),
        dosage: "1 tablet".to_owned(),
        time: time.parse::<DoseTime>().unwrap(),
        frequency,
        notes: None,
    }
}

pub fn daily(id: &str, time: &str) -> Medicine {
    medicine(id, time, Frequency::Daily)
}

pub fn weekly(id: &str, time: &str) -> Medicine {
    medicine(id, time, Frequency::Weekly)
}

pub fn taken_at(medicine: &Medicine, when: NaiveDateTime) -> HistoryLog {
    HistoryLog::taken(medicine, when.and_utc())
}
