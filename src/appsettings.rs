use std::{path::PathBuf, time::Duration};

use chrono_tz::Tz;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::scheduler::SchedulerOptions;

#[derive(Deserialize, Debug, Clone)]
pub struct SchedulerSettings {
    #[serde(default = "default_snooze_minutes")]
    pub snooze_minutes: u64,
    /// IANA zone name; the machine's local zone when absent.
    #[serde(default)]
    pub timezone: Option<Tz>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct StorageSettings {
    pub data_file: PathBuf,
    #[serde(default = "default_reload_interval_secs")]
    pub reload_interval_secs: u64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AppSettings {
    #[serde(default)]
    pub scheduler: SchedulerSettings,
    pub storage: StorageSettings,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            snooze_minutes: default_snooze_minutes(),
            timezone: None,
        }
    }
}

fn default_snooze_minutes() -> u64 {
    5
}

fn default_reload_interval_secs() -> u64 {
    2
}

impl AppSettings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("appsettings").required(true))
            .add_source(File::with_name("appsettings.local").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}

impl SchedulerSettings {
    pub fn options(&self) -> SchedulerOptions {
        SchedulerOptions {
            snooze_interval: Duration::from_secs(self.snooze_minutes.saturating_mul(60)),
        }
    }
}

impl StorageSettings {
    pub fn reload_interval(&self) -> Duration {
        Duration::from_secs(self.reload_interval_secs.max(1))
    }
}
