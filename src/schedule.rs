//! Pure dose-time arithmetic. Everything here works on local wall-clock time and has no
//! side effects, so the scheduler can call it as often as it likes.

use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta, Weekday};

use crate::{
    clock::Clock,
    models::{
        history::HistoryLog,
        medicine::{DoseTime, Frequency, Medicine, MedicineId},
    },
};

/// Every weekly medicine is due on this day. Medicines carry no day of their own.
pub const WEEKLY_TARGET_DAY: Weekday = Weekday::Sun;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextDose<'a> {
    pub medicine: &'a Medicine,
    pub fire_at: NaiveDateTime,
}

pub fn next_dose_instant(medicine: &Medicine, now: NaiveDateTime) -> NaiveDateTime {
    next_occurrence(&medicine.time, medicine.frequency, now)
}

/// Next instant at or after `now` with the given time of day. An exact match with `now`
/// is still due and does not roll over.
pub fn next_occurrence(time: &DoseTime, frequency: Frequency, now: NaiveDateTime) -> NaiveDateTime {
    let candidate = now.date().and_time(*time.time());

    let days_ahead = match frequency {
        Frequency::Daily if candidate < now => 1,
        Frequency::Daily => 0,
        Frequency::Weekly => {
            let target = WEEKLY_TARGET_DAY.num_days_from_sunday();
            let current = now.weekday().num_days_from_sunday();
            match (target + 7 - current) % 7 {
                0 if candidate < now => 7,
                days => days,
            }
        }
    };

    candidate
        .checked_add_signed(TimeDelta::days(i64::from(days_ahead)))
        .expect("Not realistic to overflow")
}

/// True when `history` holds an entry for `medicine_id` on the local calendar `day`.
pub fn taken_on(
    history: &[HistoryLog],
    medicine_id: &MedicineId,
    day: NaiveDate,
    clock: &dyn Clock,
) -> bool {
    history
        .iter()
        .any(|log| &log.medicine_id == medicine_id && clock.local_date(&log.date) == day)
}

/// Soonest dose among `medicines`, without looking at history. Ties go to the medicine
/// listed first.
pub fn earliest_dose<'a>(
    medicines: impl IntoIterator<Item = &'a Medicine>,
    now: NaiveDateTime,
) -> Option<NextDose<'a>> {
    medicines
        .into_iter()
        .map(|medicine| NextDose {
            medicine,
            fire_at: next_dose_instant(medicine, now),
        })
        .fold(None, |closest: Option<NextDose>, dose| match closest {
            Some(current) if current.fire_at <= dose.fire_at => Some(current),
            _ => Some(dose),
        })
}

/// Soonest dose among the medicines not yet taken on the calendar day of `now`.
pub fn select_next_due<'a>(
    medicines: &'a [Medicine],
    history: &[HistoryLog],
    now: NaiveDateTime,
    clock: &dyn Clock,
) -> Option<NextDose<'a>> {
    let today = now.date();
    earliest_dose(
        medicines
            .iter()
            .filter(|medicine| !taken_on(history, &medicine.id, today, clock)),
        now,
    )
}
