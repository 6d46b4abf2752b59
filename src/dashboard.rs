//! Read-only views over medicines and history for the host's dashboard.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

use crate::{
    clock::Clock,
    models::{
        history::HistoryLog,
        medicine::{Medicine, MedicineId},
    },
    schedule::{NextDose, earliest_dose, taken_on},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPeriod {
    Morning,
    Afternoon,
    Evening,
}

impl DayPeriod {
    pub fn of(medicine: &Medicine) -> Self {
        match medicine.time.hour() {
            0..12 => Self::Morning,
            12..17 => Self::Afternoon,
            _ => Self::Evening,
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct GroupedMedicines<'a> {
    pub morning: Vec<&'a Medicine>,
    pub afternoon: Vec<&'a Medicine>,
    pub evening: Vec<&'a Medicine>,
}

pub fn group_by_period(medicines: &[Medicine]) -> GroupedMedicines<'_> {
    let mut grouped = GroupedMedicines::default();
    for medicine in medicines {
        match DayPeriod::of(medicine) {
            DayPeriod::Morning => grouped.morning.push(medicine),
            DayPeriod::Afternoon => grouped.afternoon.push(medicine),
            DayPeriod::Evening => grouped.evening.push(medicine),
        }
    }
    grouped
}

/// Countdown target shown on the dashboard. Unlike the scheduler it ignores history.
pub fn next_dose_preview(medicines: &[Medicine], now: NaiveDateTime) -> Option<NextDose<'_>> {
    earliest_dose(medicines, now)
}

/// `"1d 02h 03m 04s"`, dropping the day part when zero; `"It's time!"` once due.
pub fn format_countdown(remaining: TimeDelta) -> String {
    if remaining <= TimeDelta::zero() {
        return "It's time!".to_owned();
    }

    let total_seconds = remaining.num_seconds();
    let days = total_seconds / 86_400;
    let hours = (total_seconds / 3_600) % 24;
    let minutes = (total_seconds / 60) % 60;
    let seconds = total_seconds % 60;

    let mut text = String::new();
    if days > 0 {
        text.push_str(&format!("{days}d "));
    }
    text.push_str(&format!("{hours:02}h {minutes:02}m {seconds:02}s"));
    text
}

pub fn logs_for_day<'a>(
    history: &'a [HistoryLog],
    day: NaiveDate,
    clock: &dyn Clock,
) -> Vec<&'a HistoryLog> {
    history
        .iter()
        .filter(|log| clock.local_date(&log.date) == day)
        .collect()
}

pub fn taken_today(history: &[HistoryLog], medicine_id: &MedicineId, clock: &dyn Clock) -> bool {
    taken_on(history, medicine_id, clock.today(), clock)
}
