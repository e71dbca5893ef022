// Dashboard registry - the only writer of durable dashboard state
use crate::application::key_value_store::{KeyValueStore, StoreError};
use crate::domain::dashboard::{CellRect, DashboardRecord};
use crate::domain::widget::WidgetKind;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

pub const DASHBOARDS_KEY: &str = "dashboards";
pub const CELL_SIZES_KEY: &str = "cell_sizes";
/// Holds the last unreadable `dashboards` blob before it was overwritten.
pub const CORRUPT_BACKUP_KEY: &str = "dashboards_corrupt";

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("dashboard `{0}` not found")]
    NotFound(String),
    #[error("dashboard `{0}` already exists")]
    DuplicateId(String),
    #[error("stored dashboards could not be parsed: {0}")]
    CorruptStore(#[source] serde_json::Error),
    #[error("invalid dashboard record: {0}")]
    InvalidRecord(String),
    #[error("failed to encode dashboards: {0}")]
    Encode(#[source] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Serialize)]
struct CellSize {
    w: i32,
    h: i32,
}

pub struct DashboardRegistry {
    store: Arc<dyn KeyValueStore>,
    write_lock: Mutex<()>,
}

impl DashboardRegistry {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// All records in insertion order. A missing or unreadable store reads as empty.
    pub fn list_all(&self) -> Vec<DashboardRecord> {
        match self.load() {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("Treating dashboard store as empty: {}", e);
                Vec::new()
            }
        }
    }

    pub fn find_by_id(&self, id: &str) -> Option<DashboardRecord> {
        self.list_all().into_iter().find(|record| record.id == id)
    }

    pub fn create(&self, record: DashboardRecord) -> Result<(), RegistryError> {
        validate(&record)?;
        let _guard = self.lock();
        let mut records = self.load_for_write()?;
        if records.iter().any(|existing| existing.id == record.id) {
            return Err(RegistryError::DuplicateId(record.id));
        }
        tracing::info!("Creating dashboard {} ({})", record.id, record.name);
        records.push(record);
        self.persist(&records)
    }

    /// Replace the record with `id` in place. Unseen ids must go through `create`.
    pub fn update(&self, id: &str, record: DashboardRecord) -> Result<(), RegistryError> {
        check_id(id, &record)?;
        validate(&record)?;
        let _guard = self.lock();
        let mut records = self.load_for_write()?;
        let slot = records
            .iter_mut()
            .find(|existing| existing.id == id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        *slot = record;
        tracing::info!("Updated dashboard {}", id);
        self.persist(&records)
    }

    /// Update if the id exists, otherwise append.
    pub fn upsert(&self, id: &str, record: DashboardRecord) -> Result<(), RegistryError> {
        check_id(id, &record)?;
        validate(&record)?;
        let _guard = self.lock();
        let mut records = self.load_for_write()?;
        match records.iter().position(|existing| existing.id == id) {
            Some(index) => records[index] = record,
            None => records.push(record),
        }
        tracing::info!("Saved dashboard {}", id);
        self.persist(&records)
    }

    /// Returns whether a record was removed. Unknown ids are not an error.
    pub fn delete(&self, id: &str) -> Result<bool, RegistryError> {
        let _guard = self.lock();
        let mut records = self.load_for_write()?;
        let before = records.len();
        records.retain(|record| record.id != id);
        if records.len() == before {
            tracing::debug!("Delete of unknown dashboard {} ignored", id);
            return Ok(false);
        }
        self.persist(&records)?;
        tracing::info!("Deleted dashboard {}", id);
        Ok(true)
    }

    /// Write the size side table for the last saved layout.
    pub fn record_cell_sizes(&self, layout: &[CellRect]) -> Result<(), RegistryError> {
        let sizes: BTreeMap<&str, CellSize> = layout
            .iter()
            .map(|cell| (cell.id.as_str(), CellSize { w: cell.w, h: cell.h }))
            .collect();
        let blob = serde_json::to_string(&sizes).map_err(RegistryError::Encode)?;
        self.store.set(CELL_SIZES_KEY, &blob)?;
        Ok(())
    }

    fn load(&self) -> Result<Vec<DashboardRecord>, RegistryError> {
        let Some(blob) = self.store.get(DASHBOARDS_KEY)? else {
            return Ok(Vec::new());
        };
        parse(&blob)
    }

    /// Like `load`, but an unreadable blob is copied aside first so the
    /// following write does not lose it.
    fn load_for_write(&self) -> Result<Vec<DashboardRecord>, RegistryError> {
        let Some(blob) = self.store.get(DASHBOARDS_KEY)? else {
            return Ok(Vec::new());
        };
        match parse(&blob) {
            Err(RegistryError::CorruptStore(e)) => {
                self.store.set(CORRUPT_BACKUP_KEY, &blob)?;
                tracing::warn!(
                    "Unreadable dashboard store moved to `{}`: {}",
                    CORRUPT_BACKUP_KEY,
                    e
                );
                Ok(Vec::new())
            }
            other => other,
        }
    }

    fn persist(&self, records: &[DashboardRecord]) -> Result<(), RegistryError> {
        let blob = serde_json::to_string(records).map_err(RegistryError::Encode)?;
        tracing::debug!("Writing {} dashboards ({} bytes)", records.len(), blob.len());
        self.store.set(DASHBOARDS_KEY, &blob)?;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn parse(blob: &str) -> Result<Vec<DashboardRecord>, RegistryError> {
    let records: Option<Vec<DashboardRecord>> =
        serde_json::from_str(blob).map_err(RegistryError::CorruptStore)?;
    Ok(records.unwrap_or_default())
}

fn check_id(id: &str, record: &DashboardRecord) -> Result<(), RegistryError> {
    if record.id != id {
        return Err(RegistryError::InvalidRecord(format!(
            "record id `{}` does not match `{}`",
            record.id, id
        )));
    }
    Ok(())
}

fn validate(record: &DashboardRecord) -> Result<(), RegistryError> {
    if record.id.is_empty() {
        return Err(RegistryError::InvalidRecord("id is empty".to_string()));
    }
    if record.name.trim().is_empty() {
        return Err(RegistryError::InvalidRecord("name is empty".to_string()));
    }
    let mut seen = HashSet::new();
    for cell in &record.layout {
        if WidgetKind::from_cell_id(&cell.id).is_none() {
            return Err(RegistryError::InvalidRecord(format!(
                "cell `{}` is not a known widget",
                cell.id
            )));
        }
        if !seen.insert(cell.id.as_str()) {
            return Err(RegistryError::InvalidRecord(format!(
                "cell `{}` appears twice",
                cell.id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::layout::default_layout;
    use crate::infrastructure::memory_store::MemoryStore;
    use chrono::NaiveDate;

    fn record(id: &str, name: &str) -> DashboardRecord {
        DashboardRecord::new(
            id.to_string(),
            name.to_string(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
            None,
            default_layout(),
        )
    }

    fn registry() -> (Arc<MemoryStore>, DashboardRegistry) {
        let store = Arc::new(MemoryStore::new());
        let registry = DashboardRegistry::new(store.clone());
        (store, registry)
    }

    #[test]
    fn test_create_then_find() {
        let (_, registry) = registry();
        let sales = record("abc123", "Sales");
        registry.create(sales.clone()).unwrap();

        assert_eq!(registry.find_by_id("abc123"), Some(sales));
        let all = registry.list_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Sales");
        assert_eq!(all[0].layout.len(), 4);
    }

    #[test]
    fn test_create_rejects_duplicate() {
        let (_, registry) = registry();
        registry.create(record("abc123", "Sales")).unwrap();
        let err = registry.create(record("abc123", "Other")).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateId(id) if id == "abc123"));
        assert_eq!(registry.find_by_id("abc123").unwrap().name, "Sales");
    }

    #[test]
    fn test_list_preserves_insertion_order() {
        let (_, registry) = registry();
        let ids = ["q1", "a2", "z3", "m4", "b5"];
        for id in ids {
            registry.create(record(id, "Board")).unwrap();
        }
        let listed: Vec<_> = registry.list_all().into_iter().map(|r| r.id).collect();
        assert_eq!(listed, ids);
    }

    #[test]
    fn test_delete() {
        let (_, registry) = registry();
        registry.create(record("a", "A")).unwrap();
        registry.create(record("b", "B")).unwrap();

        assert!(registry.delete("a").unwrap());
        assert_eq!(registry.find_by_id("a"), None);
        assert!(!registry.delete("a").unwrap());
        assert_eq!(registry.list_all().len(), 1);
    }

    #[test]
    fn test_update_missing_then_upsert() {
        let (_, registry) = registry();
        registry.create(record("first", "First")).unwrap();

        let missing = record("missing-id", "Late");
        let err = registry.update("missing-id", missing.clone()).unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(_)));

        registry.upsert("missing-id", missing).unwrap();
        let all = registry.list_all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].id, "missing-id");
    }

    #[test]
    fn test_upsert_twice_keeps_one() {
        let (_, registry) = registry();
        registry.create(record("x", "X")).unwrap();
        registry.upsert("k", record("k", "One")).unwrap();

        let mut second = record("k", "Two");
        second.layout.truncate(2);
        registry.upsert("k", second.clone()).unwrap();

        let all = registry.list_all();
        assert_eq!(all.iter().filter(|r| r.id == "k").count(), 1);
        assert_eq!(registry.find_by_id("k"), Some(second));
        assert_eq!(all[0].id, "x");
    }

    #[test]
    fn test_update_keeps_position() {
        let (_, registry) = registry();
        for id in ["a", "b", "c"] {
            registry.create(record(id, "Board")).unwrap();
        }
        registry.update("b", record("b", "Renamed")).unwrap();
        let all = registry.list_all();
        assert_eq!(all[1].name, "Renamed");
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_update_rejects_mismatched_id() {
        let (_, registry) = registry();
        registry.create(record("a", "A")).unwrap();
        let err = registry.update("a", record("b", "B")).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidRecord(_)));
    }

    #[test]
    fn test_rejects_invalid_layouts() {
        let (_, registry) = registry();

        let mut unknown = record("u", "Unknown");
        unknown.layout.push(CellRect::new("7", 0, 2, 1, 1));
        assert!(matches!(
            registry.create(unknown),
            Err(RegistryError::InvalidRecord(_))
        ));

        let mut repeated = record("r", "Repeated");
        repeated.layout.push(CellRect::new("1", 0, 2, 1, 1));
        assert!(matches!(
            registry.create(repeated),
            Err(RegistryError::InvalidRecord(_))
        ));

        assert!(matches!(
            registry.create(record("blank", "   ")),
            Err(RegistryError::InvalidRecord(_))
        ));
        assert!(registry.list_all().is_empty());
    }

    #[test]
    fn test_corrupt_store_reads_empty() {
        let (store, registry) = registry();
        store.set(DASHBOARDS_KEY, "{not json").unwrap();
        assert!(registry.list_all().is_empty());
        assert_eq!(registry.find_by_id("a"), None);

        registry.create(record("a", "A")).unwrap();
        assert_eq!(registry.list_all().len(), 1);
        assert_eq!(
            store.get(CORRUPT_BACKUP_KEY).unwrap().as_deref(),
            Some("{not json")
        );
    }

    #[test]
    fn test_readable_store_leaves_no_backup() {
        let (store, registry) = registry();
        registry.create(record("a", "A")).unwrap();
        registry.delete("a").unwrap();
        assert_eq!(store.get(CORRUPT_BACKUP_KEY).unwrap(), None);
    }

    #[test]
    fn test_null_store_reads_empty() {
        let (store, registry) = registry();
        store.set(DASHBOARDS_KEY, "null").unwrap();
        assert!(registry.list_all().is_empty());
    }

    #[test]
    fn test_every_mutation_rewrites_blob() {
        let (store, registry) = registry();
        registry.create(record("a", "A")).unwrap();
        registry.create(record("b", "B")).unwrap();
        registry.delete("a").unwrap();

        let blob = store.get(DASHBOARDS_KEY).unwrap().unwrap();
        let raw: serde_json::Value = serde_json::from_str(&blob).unwrap();
        let ids: Vec<_> = raw.as_array().unwrap().iter().map(|r| r["id"].clone()).collect();
        assert_eq!(ids, vec![serde_json::json!("b")]);
    }

    #[test]
    fn test_cell_sizes_side_table() {
        let (store, registry) = registry();
        let layout = vec![CellRect::new("2", 0, 0, 2, 1), CellRect::new("4", 0, 1, 1, 3)];
        registry.record_cell_sizes(&layout).unwrap();

        let blob = store.get(CELL_SIZES_KEY).unwrap().unwrap();
        assert_eq!(blob, r#"{"2":{"w":2,"h":1},"4":{"w":1,"h":3}}"#);
    }
}
