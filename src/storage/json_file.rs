use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    time::SystemTime,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::{fs, sync::Mutex};

use crate::{
    error::StoreError,
    models::{
        history::HistoryLog,
        medicine::{Medicine, MedicineId},
    },
};

use super::{MedicineStore, NewMedicine, Snapshot};

/// Keeps `{ "medicines": [...], "history": [...] }` in one JSON file. A missing file is
/// an empty store.
pub struct JsonFileMedicineStore {
    path: PathBuf,
    /// Held for a whole write; stores the modification time that write left behind.
    last_written: Mutex<Option<SystemTime>>,
}

impl JsonFileMedicineStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last_written: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last modification time, or `None` while the file does not exist.
    pub async fn modified(&self) -> Result<Option<SystemTime>, StoreError> {
        match fs::metadata(&self.path).await {
            Ok(metadata) => Ok(Some(metadata.modified()?)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    /// Modification time left by this store's own most recent write. Waits for a write
    /// in progress.
    pub async fn last_written(&self) -> Option<SystemTime> {
        *self.last_written.lock().await
    }

    async fn load(&self) -> Result<Snapshot, StoreError> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(Snapshot::default()),
            Err(error) => Err(error.into()),
        }
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(snapshot)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, bytes).await?;
        fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }

    async fn modify<T>(
        &self,
        change: impl FnOnce(&mut Snapshot) -> Result<T, StoreError> + Send,
    ) -> Result<T, StoreError> {
        let mut last_written = self.last_written.lock().await;
        let mut snapshot = self.load().await?;
        let result = change(&mut snapshot)?;
        self.save(&snapshot).await?;
        *last_written = self.modified().await?;
        Ok(result)
    }
}

#[async_trait]
impl MedicineStore for JsonFileMedicineStore {
    async fn snapshot(&self) -> Result<Snapshot, StoreError> {
        self.load().await
    }

    async fn add_medicine(
        &self,
        medicine: NewMedicine,
        created_at: DateTime<Utc>,
    ) -> Result<Medicine, StoreError> {
        let medicine = self
            .modify(|snapshot| Ok(snapshot.add(medicine, created_at)))
            .await?;
        log::info!("Added medicine with id {}", medicine.id);
        Ok(medicine)
    }

    async fn delete_medicine(&self, id: &MedicineId) -> Result<Medicine, StoreError> {
        self.modify(|snapshot| snapshot.delete(id)).await
    }

    async fn record_taken(
        &self,
        id: &MedicineId,
        taken_at: DateTime<Utc>,
    ) -> Result<HistoryLog, StoreError> {
        self.modify(|snapshot| snapshot.record_taken(id, taken_at))
            .await
    }
}
