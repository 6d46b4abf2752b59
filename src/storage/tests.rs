use chrono::TimeZone;

use super::*;

fn new_medicine(name: &str, time: &str) -> NewMedicine {
    NewMedicine {
        name: name.to_owned(),
        dosage: "10mg".to_owned(),
        time: time.parse().unwrap(),
        frequency: Frequency::Daily,
        notes: None,
    }
}

fn created_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 4, 7, 0, 0).unwrap()
}

#[tokio::test]
async fn ids_are_creation_millis_and_unique() {
    let store = InMemoryMedicineStore::new();

    let first = store
        .add_medicine(new_medicine("A", "08:00"), created_at())
        .await
        .unwrap();
    let second = store
        .add_medicine(new_medicine("B", "09:00"), created_at())
        .await
        .unwrap();

    assert_eq!(first.id, created_at().timestamp_millis().to_string());
    assert_eq!(second.id, (created_at().timestamp_millis() + 1).to_string());
}

#[tokio::test]
async fn delete_keeps_history() {
    let store = InMemoryMedicineStore::new();
    let medicine = store
        .add_medicine(new_medicine("A", "08:00"), created_at())
        .await
        .unwrap();
    store.record_taken(&medicine.id, created_at()).await.unwrap();

    let deleted = store.delete_medicine(&medicine.id).await.unwrap();
    let snapshot = store.snapshot().await.unwrap();

    assert_eq!(deleted, medicine);
    assert!(snapshot.medicines.is_empty());
    assert_eq!(snapshot.history.len(), 1);
    assert_eq!(snapshot.history[0].medicine_id, medicine.id);
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let store = InMemoryMedicineStore::new();
    let missing = "missing".to_owned();

    assert!(matches!(
        store.delete_medicine(&missing).await,
        Err(StoreError::NotFound(id)) if id == missing
    ));
    assert!(matches!(
        store.record_taken(&missing, created_at()).await,
        Err(StoreError::NotFound(_))
    ));
    assert_eq!(store.get(&missing).await.unwrap(), None);
}

#[tokio::test]
async fn record_taken_snapshots_medicine_details() {
    let store = InMemoryMedicineStore::new();
    let medicine = store
        .add_medicine(new_medicine("Aspirin", "21:15"), created_at())
        .await
        .unwrap();

    let log = store.record_taken(&medicine.id, created_at()).await.unwrap();

    assert_eq!(log.name, "Aspirin");
    assert_eq!(log.dosage, "10mg");
    assert_eq!(log.time, Some(medicine.time));
    assert_eq!(log.date, created_at());
}

#[tokio::test]
async fn json_file_store_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pillbell.json");
    let store = JsonFileMedicineStore::new(&path);

    assert_eq!(store.modified().await.unwrap(), None);
    assert_eq!(store.snapshot().await.unwrap(), Snapshot::default());

    let medicine = store
        .add_medicine(new_medicine("A", "08:00"), created_at())
        .await
        .unwrap();
    store.record_taken(&medicine.id, created_at()).await.unwrap();

    let reopened = JsonFileMedicineStore::new(&path);
    let snapshot = reopened.snapshot().await.unwrap();

    assert!(reopened.modified().await.unwrap().is_some());
    assert_eq!(snapshot.medicines, vec![medicine]);
    assert_eq!(snapshot.history.len(), 1);
}

#[tokio::test]
async fn json_file_store_reads_dashboard_export() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("export.json");
    tokio::fs::write(
        &path,
        r#"{
            "medicines": [
                {"id": "1", "medicineName": "Vitamin D", "dosage": "1000IU", "time": "9:00", "frequency": "weekly"}
            ]
        }"#,
    )
    .await
    .unwrap();

    let snapshot = JsonFileMedicineStore::new(&path).snapshot().await.unwrap();

    assert_eq!(snapshot.medicines[0].frequency, Frequency::Weekly);
    assert_eq!(snapshot.medicines[0].time.to_string(), "09:00");
    assert!(snapshot.history.is_empty());
}

#[tokio::test]
async fn json_file_store_rejects_invalid_time() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    tokio::fs::write(
        &path,
        r#"{"medicines": [{"id": "1", "name": "X", "dosage": "1", "time": "7pm", "frequency": "daily"}]}"#,
    )
    .await
    .unwrap();

    let result = JsonFileMedicineStore::new(&path).snapshot().await;

    assert!(matches!(result, Err(StoreError::Serialization(_))));
}

#[tokio::test]
async fn json_file_store_remembers_its_own_writes() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileMedicineStore::new(dir.path().join("pillbell.json"));

    assert_eq!(store.last_written().await, None);

    store
        .add_medicine(new_medicine("A", "08:00"), created_at())
        .await
        .unwrap();

    let modified = store.modified().await.unwrap();
    assert!(modified.is_some());
    assert_eq!(store.last_written().await, modified);
}
