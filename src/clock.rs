use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;

/// Source of local wall-clock time for the scheduler.
pub trait Clock: Send + Sync + 'static {
    fn now_utc(&self) -> DateTime<Utc>;

    /// Converts a recorded instant into the wall-clock time it happened at.
    fn to_local(&self, instant: &DateTime<Utc>) -> NaiveDateTime;

    /// Maps a wall-clock time back to the instant it denotes. See [`resolve_local`].
    fn to_utc(&self, local: &NaiveDateTime) -> DateTime<Utc>;

    fn now(&self) -> NaiveDateTime {
        self.to_local(&self.now_utc())
    }

    fn today(&self) -> NaiveDate {
        self.now().date()
    }

    fn local_date(&self, instant: &DateTime<Utc>) -> NaiveDate {
        self.to_local(instant).date()
    }
}

/// A repeated local time resolves to its first occurrence. A skipped one (spring forward)
/// resolves to the instant an hour later on the wall clock, which is when the clocks
/// show it again.
pub fn resolve_local<Z: TimeZone>(zone: &Z, local: &NaiveDateTime) -> DateTime<Utc> {
    zone.from_local_datetime(local)
        .earliest()
        .or_else(|| {
            local
                .checked_add_signed(TimeDelta::hours(1))
                .and_then(|shifted| zone.from_local_datetime(&shifted).earliest())
        })
        .map(|resolved| resolved.with_timezone(&Utc))
        .unwrap_or_else(|| local.and_utc())
}

/// Reads the system clock in the configured zone, or the machine's local zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock {
    timezone: Option<Tz>,
}

impl SystemClock {
    pub fn new(timezone: Option<Tz>) -> Self {
        Self { timezone }
    }
}

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn to_local(&self, instant: &DateTime<Utc>) -> NaiveDateTime {
        match self.timezone {
            Some(tz) => instant.with_timezone(&tz).naive_local(),
            None => instant.with_timezone(&Local).naive_local(),
        }
    }

    fn to_utc(&self, local: &NaiveDateTime) -> DateTime<Utc> {
        match self.timezone {
            Some(tz) => resolve_local(&tz, local),
            None => resolve_local(&Local, local),
        }
    }
}
