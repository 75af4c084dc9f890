use crate::errors::{ErrorKind, MigrusError, MigrusResult};
use indexmap::IndexMap;
use std::ops::Deref;
use std::sync::Arc;

/// One persisted record of an applied migration.
///
/// Logically the store holds a table of `(version, name)` pairs with
/// `version` unique; the physical representation is backend-specific.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRecord {
    pub version: u64,
    pub name: String,
}

impl VersionRecord {
    pub fn new(version: u64, name: &str) -> Self {
        VersionRecord {
            version,
            name: name.to_string(),
        }
    }
}

/// Low-level contract for a migration version-tracking backend.
///
/// # Purpose
/// Defines the capability set required of any backend that persists the set
/// of applied migration versions. The engine treats every failure from these
/// operations as fatal for the current operation; no retries are performed.
///
/// # Key Responsibilities
/// - **State Reads**: report the applied set, ascending by version
/// - **State Writes**: record one applied or reverted version at a time
/// - **Bootstrap**: report and create the bookkeeping structure
///
/// # Implementations
/// - `InMemoryVersionStore`: in-memory store for testing/ephemeral use
/// - `FlatFileStore`: plain-text ledger (`migrus-flat-adapter`)
///
/// # Thread Safety
/// Implementers must be `Send + Sync`; the engine itself runs strictly
/// sequentially against a single store.
pub trait VersionStoreProvider: Send + Sync {
    /// Returns all applied records, ascending by version.
    fn fetch_all(&self) -> MigrusResult<Vec<VersionRecord>>;

    /// Records a version as applied.
    ///
    /// The engine only calls this after deciding the version is not applied,
    /// but a conforming backend must not corrupt state if called twice
    /// (e.g., via a uniqueness constraint).
    fn record_applied(&self, version: u64, name: &str) -> MigrusResult<()>;

    /// Removes the record for a version. Must be a safe no-op if absent.
    fn record_reverted(&self, version: u64) -> MigrusResult<()>;

    /// Whether the store's bookkeeping structure exists.
    fn has_schema(&self) -> MigrusResult<bool>;

    /// Creates the bookkeeping structure.
    ///
    /// Called automatically once, before first use, when [`has_schema`]
    /// reports false.
    ///
    /// [`has_schema`]: VersionStoreProvider::has_schema
    fn init_schema(&self) -> MigrusResult<()>;
}

/// Shared handle to a version-store backend.
///
/// # Purpose
/// `VersionStore` wraps a concrete [`VersionStoreProvider`] in an `Arc` so
/// the same backend can be handed to the migrator, the status reporter, and
/// tests without further ceremony. Cloning only increments the reference
/// count.
#[derive(Clone)]
pub struct VersionStore {
    inner: Arc<dyn VersionStoreProvider>,
}

impl VersionStore {
    pub fn new<T: VersionStoreProvider + 'static>(inner: T) -> Self {
        VersionStore {
            inner: Arc::new(inner),
        }
    }
}

impl Deref for VersionStore {
    type Target = Arc<dyn VersionStoreProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl std::fmt::Debug for VersionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionStore").finish_non_exhaustive()
    }
}

/// Configured version-store backends: a single store or a named group.
///
/// A deployment either wires exactly one backend or a mapping of named
/// backends; the selection is resolved into one concrete [`VersionStore`]
/// handle once, at startup, before the migrator runs.
#[derive(Clone)]
pub enum AdapterSelection {
    Single(VersionStore),
    Grouped(IndexMap<String, VersionStore>),
}

impl AdapterSelection {
    /// Resolves the selection to one concrete store.
    ///
    /// A `Single` selection ignores the group name. A `Grouped` selection
    /// requires a group name that matches one of its entries.
    pub fn resolve(&self, group: Option<&str>) -> MigrusResult<VersionStore> {
        match self {
            AdapterSelection::Single(store) => Ok(store.clone()),
            AdapterSelection::Grouped(stores) => {
                let name = group.ok_or_else(|| {
                    MigrusError::new(
                        "A group name is required to resolve a grouped adapter selection",
                        ErrorKind::ValidationError,
                    )
                })?;
                stores.get(name).cloned().ok_or_else(|| {
                    MigrusError::new(
                        &format!("No adapter registered for group \"{}\"", name),
                        ErrorKind::ValidationError,
                    )
                })
            }
        }
    }

    /// Names of the known adapter groups, in registration order.
    pub fn group_names(&self) -> Vec<String> {
        match self {
            AdapterSelection::Single(_) => Vec::new(),
            AdapterSelection::Grouped(stores) => stores.keys().cloned().collect(),
        }
    }
}

impl std::fmt::Debug for AdapterSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdapterSelection::Single(_) => write!(f, "Single(<store>)"),
            AdapterSelection::Grouped(stores) => f
                .debug_map()
                .entries(stores.keys().map(|k| (k, "<store>")))
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockVersionStore;

    impl VersionStoreProvider for MockVersionStore {
        fn fetch_all(&self) -> MigrusResult<Vec<VersionRecord>> {
            Ok(vec![VersionRecord::new(1, "First")])
        }

        fn record_applied(&self, _version: u64, _name: &str) -> MigrusResult<()> {
            Ok(())
        }

        fn record_reverted(&self, _version: u64) -> MigrusResult<()> {
            Ok(())
        }

        fn has_schema(&self) -> MigrusResult<bool> {
            Ok(true)
        }

        fn init_schema(&self) -> MigrusResult<()> {
            Err(MigrusError::new(
                "schema already exists",
                ErrorKind::SchemaInitializationFailed,
            ))
        }
    }

    #[test]
    fn test_version_store_deref_access() {
        let store = VersionStore::new(MockVersionStore);
        let records = store.fetch_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0], VersionRecord::new(1, "First"));
    }

    #[test]
    fn test_version_store_cloning_shares_backend() {
        let store = VersionStore::new(MockVersionStore);
        let clone = store.clone();
        assert!(store.has_schema().unwrap());
        assert!(clone.has_schema().unwrap());
    }

    #[test]
    fn test_single_selection_resolves_without_group() {
        let selection = AdapterSelection::Single(VersionStore::new(MockVersionStore));
        assert!(selection.resolve(None).is_ok());
        assert!(selection.resolve(Some("ignored")).is_ok());
        assert!(selection.group_names().is_empty());
    }

    #[test]
    fn test_grouped_selection_resolves_named_store() {
        let mut stores = IndexMap::new();
        stores.insert("mysql".to_string(), VersionStore::new(MockVersionStore));
        stores.insert("sqlite".to_string(), VersionStore::new(MockVersionStore));
        let selection = AdapterSelection::Grouped(stores);

        assert!(selection.resolve(Some("sqlite")).is_ok());
        assert_eq!(selection.group_names(), vec!["mysql", "sqlite"]);
    }

    #[test]
    fn test_grouped_selection_rejects_unknown_group() {
        let mut stores = IndexMap::new();
        stores.insert("mysql".to_string(), VersionStore::new(MockVersionStore));
        let selection = AdapterSelection::Grouped(stores);

        let result = selection.resolve(Some("postgres"));
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::ValidationError);
    }

    #[test]
    fn test_grouped_selection_requires_group() {
        let mut stores = IndexMap::new();
        stores.insert("mysql".to_string(), VersionStore::new(MockVersionStore));
        let selection = AdapterSelection::Grouped(stores);

        assert!(selection.resolve(None).is_err());
    }
}
