mod in_memory;
mod json_file;

pub use in_memory::InMemoryMedicineStore;
pub use json_file::JsonFileMedicineStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::StoreError,
    models::{
        history::HistoryLog,
        medicine::{DoseTime, Frequency, Medicine, MedicineId},
    },
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMedicine {
    pub name: String,
    pub dosage: String,
    pub time: DoseTime,
    pub frequency: Frequency,
    pub notes: Option<String>,
}

/// Everything the scheduler needs, exactly as it is persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub medicines: Vec<Medicine>,
    #[serde(default)]
    pub history: Vec<HistoryLog>,
}

impl Snapshot {
    pub fn get(&self, id: &MedicineId) -> Option<&Medicine> {
        self.medicines.iter().find(|medicine| &medicine.id == id)
    }

    /// Ids are the creation time in milliseconds, bumped until unique.
    fn add(&mut self, new_medicine: NewMedicine, created_at: DateTime<Utc>) -> Medicine {
        let mut id = created_at.timestamp_millis();
        while self.get(&id.to_string()).is_some() {
            id += 1;
        }

        let medicine = Medicine {
            id: id.to_string(),
            name: new_medicine.name,
            dosage: new_medicine.dosage,
            time: new_medicine.time,
            frequency: new_medicine.frequency,
            notes: new_medicine.notes,
        };
        self.medicines.push(medicine.clone());

        medicine
    }

    /// History of a deleted medicine is kept.
    fn delete(&mut self, id: &MedicineId) -> Result<Medicine, StoreError> {
        let position = self
            .medicines
            .iter()
            .position(|medicine| &medicine.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        Ok(self.medicines.remove(position))
    }

    fn record_taken(
        &mut self,
        id: &MedicineId,
        taken_at: DateTime<Utc>,
    ) -> Result<HistoryLog, StoreError> {
        let medicine = self.get(id).ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let log = HistoryLog::taken(medicine, taken_at);
        self.history.push(log.clone());

        Ok(log)
    }
}

#[async_trait]
pub trait MedicineStore: Send + Sync {
    async fn snapshot(&self) -> Result<Snapshot, StoreError>;
    async fn add_medicine(
        &self,
        medicine: NewMedicine,
        created_at: DateTime<Utc>,
    ) -> Result<Medicine, StoreError>;
    async fn delete_medicine(&self, id: &MedicineId) -> Result<Medicine, StoreError>;
    async fn record_taken(
        &self,
        id: &MedicineId,
        taken_at: DateTime<Utc>,
    ) -> Result<HistoryLog, StoreError>;

    async fn get(&self, id: &MedicineId) -> Result<Option<Medicine>, StoreError> {
        Ok(self.snapshot().await?.get(id).cloned())
    }
}

#[cfg(test)]
mod tests;
