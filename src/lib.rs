pub mod appsettings;
pub mod clock;
pub mod console;
pub mod dashboard;
pub mod delivery;
pub mod error;
pub mod models;
pub mod schedule;
pub mod scheduler;
pub mod storage;

#[cfg(test)]
mod test_utils;
