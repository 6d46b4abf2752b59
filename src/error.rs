use thiserror::Error;

use crate::models::medicine::MedicineId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Invalid time format (HH:MM): {0:?}")]
    InvalidTime(String),

    #[error("Unknown frequency {0:?}, expected daily or weekly")]
    InvalidFrequency(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Medicine does not exist {0}")]
    NotFound(MedicineId),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command {0:?}. Type `help` for the list of commands")]
    Unknown(String),

    #[error("Missing {0}")]
    MissingArgument(&'static str),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}
