use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::medicine::{DoseTime, Medicine, MedicineId};

/// A dose the user confirmed as taken. Never mutated once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryLog {
    pub medicine_id: MedicineId,
    pub name: String,
    pub dosage: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<DoseTime>,
    pub date: DateTime<Utc>,
}

impl HistoryLog {
    pub fn taken(medicine: &Medicine, date: DateTime<Utc>) -> Self {
        Self {
            medicine_id: medicine.id.clone(),
            name: medicine.name.clone(),
            dosage: medicine.dosage.clone(),
            time: Some(medicine.time),
            date,
        }
    }
}
