use std::{fmt, str::FromStr};

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;

pub type MedicineId = String;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
}

impl FromStr for Frequency {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            other => Err(ScheduleError::InvalidFrequency(other.to_owned())),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Daily => write!(f, "daily"),
            Self::Weekly => write!(f, "weekly"),
        }
    }
}

/// Wall-clock time of day a dose is due, at minute precision.
///
/// Only constructed through [`DoseTime::new`] or by parsing `H:MM`/`HH:MM`, so a value
/// that reaches the schedule calculator is always well formed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DoseTime(NaiveTime);

impl DoseTime {
    pub fn new(inner: NaiveTime) -> Self {
        let normalized_time = inner
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .expect("Zero seconds and nanoseconds are always in bounds.");
        Self(normalized_time)
    }

    pub fn from_hm(hour: u32, minute: u32) -> Result<Self, ScheduleError> {
        NaiveTime::from_hms_opt(hour, minute, 0)
            .map(Self)
            .ok_or_else(|| ScheduleError::InvalidTime(format!("{hour}:{minute:02}")))
    }

    pub fn time(&self) -> &NaiveTime {
        &self.0
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn minute(&self) -> u32 {
        self.0.minute()
    }
}

impl FromStr for DoseTime {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ScheduleError::InvalidTime(s.to_owned());

        let (hour, minute) = s.split_once(':').ok_or_else(invalid)?;
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());

        if hour.is_empty() || hour.len() > 2 || !all_digits(hour) {
            return Err(invalid());
        }
        if minute.len() != 2 || !all_digits(minute) {
            return Err(invalid());
        }

        let hour: u32 = hour.parse().map_err(|_| invalid())?;
        let minute: u32 = minute.parse().map_err(|_| invalid())?;

        Self::from_hm(hour, minute).map_err(|_| invalid())
    }
}

impl TryFrom<String> for DoseTime {
    type Error = ScheduleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DoseTime> for String {
    fn from(value: DoseTime) -> Self {
        value.to_string()
    }
}

impl fmt::Display for DoseTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medicine {
    pub id: MedicineId,
    #[serde(alias = "medicineName")]
    pub name: String,
    pub dosage: String,
    pub time: DoseTime,
    pub frequency: Frequency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
