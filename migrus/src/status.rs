use crate::errors::MigrusResult;
use crate::registry::Registry;
use crate::store::VersionStore;
use std::collections::BTreeMap;

/// One row of a status report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub version: u64,
    pub name: String,
}

impl StatusEntry {
    pub fn new(version: u64, name: &str) -> Self {
        StatusEntry {
            version,
            name: name.to_string(),
        }
    }
}

/// Snapshot of where a deployment stands, partitioned three ways.
///
/// - `applied`: registered and recorded as applied
/// - `pending`: registered but not recorded
/// - `orphaned`: recorded but no longer registered
///
/// Each partition is ascending by version. The report is a pure read;
/// building one never mutates the store, and orphans are only ever reported
/// here, never acted upon.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusReport {
    pub applied: Vec<StatusEntry>,
    pub pending: Vec<StatusEntry>,
    pub orphaned: Vec<StatusEntry>,
}

impl StatusReport {
    pub fn is_up_to_date(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Computes status reports from a registry and a store.
#[derive(Debug, Default)]
pub struct StatusReporter;

impl StatusReporter {
    /// Partitions registered and recorded versions into a [`StatusReport`].
    ///
    /// Reads the store exactly once; the report reflects that single
    /// snapshot.
    pub fn report(registry: &Registry, store: &VersionStore) -> MigrusResult<StatusReport> {
        let recorded: BTreeMap<u64, String> = store
            .fetch_all()?
            .into_iter()
            .map(|record| (record.version, record.name))
            .collect();

        let mut report = StatusReport::default();

        for migration in registry.iter() {
            let entry = StatusEntry::new(migration.version(), migration.name());
            if recorded.contains_key(&migration.version()) {
                report.applied.push(entry);
            } else {
                report.pending.push(entry);
            }
        }

        for (version, name) in &recorded {
            if !registry.contains(*version) {
                report.orphaned.push(StatusEntry::new(*version, name));
            }
        }

        Ok(report)
    }
}
