use crate::errors::MigrusResult;
use crate::store::{VersionRecord, VersionStoreProvider};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// In-memory implementation of a migration version store.
///
/// # Purpose
/// `InMemoryVersionStore` keeps the applied set in an ordered map guarded by
/// a read-write lock. It is suitable for unit tests and ephemeral runs where
/// persistence is not required; all records are lost when the store is
/// dropped.
///
/// # Characteristics
/// - **Ordered**: `fetch_all` returns records ascending by version for free
/// - **Conforming**: double `record_applied` and absent `record_reverted`
///   are safe no-ops
/// - **Schema-Aware**: tracks whether `init_schema` has run, so bootstrap
///   behavior can be exercised in tests
#[derive(Clone, Default)]
pub struct InMemoryVersionStore {
    inner: Arc<InMemoryStoreInner>,
}

impl InMemoryVersionStore {
    /// Creates an empty store with no schema; the engine initializes it on
    /// first use.
    pub fn new() -> Self {
        InMemoryVersionStore::default()
    }

    /// Creates an initialized store pre-seeded with applied records.
    pub fn with_applied(records: impl IntoIterator<Item = VersionRecord>) -> Self {
        let store = InMemoryVersionStore::new();
        store.inner.schema_ready.store(true, Ordering::SeqCst);
        {
            let mut applied = store.inner.applied.write();
            for record in records {
                applied.insert(record.version, record.name);
            }
        }
        store
    }
}

impl VersionStoreProvider for InMemoryVersionStore {
    fn fetch_all(&self) -> MigrusResult<Vec<VersionRecord>> {
        let applied = self.inner.applied.read();
        Ok(applied
            .iter()
            .map(|(version, name)| VersionRecord::new(*version, name))
            .collect())
    }

    fn record_applied(&self, version: u64, name: &str) -> MigrusResult<()> {
        let mut applied = self.inner.applied.write();
        applied.entry(version).or_insert_with(|| name.to_string());
        Ok(())
    }

    fn record_reverted(&self, version: u64) -> MigrusResult<()> {
        let mut applied = self.inner.applied.write();
        applied.remove(&version);
        Ok(())
    }

    fn has_schema(&self) -> MigrusResult<bool> {
        Ok(self.inner.schema_ready.load(Ordering::SeqCst))
    }

    fn init_schema(&self) -> MigrusResult<()> {
        self.inner.schema_ready.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
struct InMemoryStoreInner {
    schema_ready: AtomicBool,
    applied: RwLock<BTreeMap<u64, String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_store_has_no_schema() {
        let store = InMemoryVersionStore::new();
        assert!(!store.has_schema().unwrap());
        store.init_schema().unwrap();
        assert!(store.has_schema().unwrap());
    }

    #[test]
    fn test_with_applied_seeds_records() {
        let store = InMemoryVersionStore::with_applied(vec![
            VersionRecord::new(2, "Second"),
            VersionRecord::new(1, "First"),
        ]);

        assert!(store.has_schema().unwrap());
        let records = store.fetch_all().unwrap();
        assert_eq!(records.len(), 2);
        // ascending by version regardless of seed order
        assert_eq!(records[0].version, 1);
        assert_eq!(records[1].version, 2);
    }

    #[test]
    fn test_record_applied_and_reverted() {
        let store = InMemoryVersionStore::new();
        store.init_schema().unwrap();

        store.record_applied(10, "Ten").unwrap();
        assert_eq!(store.fetch_all().unwrap().len(), 1);

        store.record_reverted(10).unwrap();
        assert!(store.fetch_all().unwrap().is_empty());
    }

    #[test]
    fn test_record_applied_twice_keeps_first_name() {
        let store = InMemoryVersionStore::new();
        store.record_applied(5, "Original").unwrap();
        store.record_applied(5, "Renamed").unwrap();

        let records = store.fetch_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Original");
    }

    #[test]
    fn test_record_reverted_absent_is_noop() {
        let store = InMemoryVersionStore::new();
        assert!(store.record_reverted(99).is_ok());
    }

    #[test]
    fn test_fetch_all_ascending() {
        let store = InMemoryVersionStore::new();
        store.record_applied(30, "C").unwrap();
        store.record_applied(10, "A").unwrap();
        store.record_applied(20, "B").unwrap();

        let versions: Vec<u64> = store
            .fetch_all()
            .unwrap()
            .into_iter()
            .map(|r| r.version)
            .collect();
        assert_eq!(versions, vec![10, 20, 30]);
    }
}
