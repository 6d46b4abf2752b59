use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{
    error::StoreError,
    models::{
        history::HistoryLog,
        medicine::{Medicine, MedicineId},
    },
};

use super::{MedicineStore, NewMedicine, Snapshot};

#[derive(Default)]
pub struct InMemoryMedicineStore {
    store: RwLock<Snapshot>,
}

impl InMemoryMedicineStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            store: RwLock::new(snapshot),
        }
    }
}

#[async_trait]
impl MedicineStore for InMemoryMedicineStore {
    async fn snapshot(&self) -> Result<Snapshot, StoreError> {
        Ok(self.store.read().await.clone())
    }

    async fn add_medicine(
        &self,
        medicine: NewMedicine,
        created_at: DateTime<Utc>,
    ) -> Result<Medicine, StoreError> {
        let medicine = self.store.write().await.add(medicine, created_at);
        log::info!("Added medicine with id {}", medicine.id);
        Ok(medicine)
    }

    async fn delete_medicine(&self, id: &MedicineId) -> Result<Medicine, StoreError> {
        self.store.write().await.delete(id)
    }

    async fn record_taken(
        &self,
        id: &MedicineId,
        taken_at: DateTime<Utc>,
    ) -> Result<HistoryLog, StoreError> {
        self.store.write().await.record_taken(id, taken_at)
    }
}
