use migrus::errors::{ErrorKind, MigrusError, MigrusResult};
use migrus::store::{VersionRecord, VersionStoreProvider};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Flat-file implementation of a migration version store.
///
/// # Purpose
/// `FlatFileStore` persists the applied set as a plain-text ledger, one
/// `version<TAB>name` line per applied migration. The ledger is the whole
/// schema: a missing file means the store is uninitialized, an existing file
/// (even empty) means it is ready.
///
/// # Characteristics
/// - **Ordered**: `fetch_all` sorts by version, so the on-disk line order
///   never matters
/// - **Conforming**: double `record_applied` and absent `record_reverted`
///   are safe no-ops
/// - **Single-Writer**: file access is serialized through a mutex; the
///   engine itself never issues concurrent operations
///
/// # Ledger Format
/// ```text
/// 20141104210000\tTestOne
/// 20141104220000\tTestTwo
/// ```
#[derive(Clone)]
pub struct FlatFileStore {
    inner: Arc<FlatFileStoreInner>,
}

impl FlatFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FlatFileStore {
            inner: Arc::new(FlatFileStoreInner {
                path: path.into(),
                file_lock: Mutex::new(()),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    fn read_records(&self) -> MigrusResult<Vec<VersionRecord>> {
        let contents = std::fs::read_to_string(&self.inner.path)?;

        let mut records = Vec::new();
        for (index, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let (version, name) = match line.split_once('\t') {
                Some((version, name)) => (version, name),
                None => (line, ""),
            };

            let version: u64 = version.parse().map_err(|err| {
                MigrusError::new_with_cause(
                    &format!(
                        "Malformed ledger line {} in \"{}\"",
                        index + 1,
                        self.inner.path.display()
                    ),
                    ErrorKind::StoreOperationFailed,
                    MigrusError::from(err),
                )
            })?;

            records.push(VersionRecord::new(version, name));
        }

        records.sort_by_key(|record| record.version);
        Ok(records)
    }

    fn write_records(&self, records: &[VersionRecord]) -> MigrusResult<()> {
        let mut file = File::create(&self.inner.path)?;
        for record in records {
            writeln!(file, "{}\t{}", record.version, record.name)?;
        }
        Ok(())
    }
}

impl VersionStoreProvider for FlatFileStore {
    fn fetch_all(&self) -> MigrusResult<Vec<VersionRecord>> {
        let _guard = self.inner.file_lock.lock();
        self.read_records()
    }

    fn record_applied(&self, version: u64, name: &str) -> MigrusResult<()> {
        let _guard = self.inner.file_lock.lock();

        if self
            .read_records()?
            .iter()
            .any(|record| record.version == version)
        {
            return Ok(());
        }

        let mut file = OpenOptions::new().append(true).open(&self.inner.path)?;
        writeln!(file, "{}\t{}", version, name)?;
        Ok(())
    }

    fn record_reverted(&self, version: u64) -> MigrusResult<()> {
        let _guard = self.inner.file_lock.lock();

        let records: Vec<VersionRecord> = self
            .read_records()?
            .into_iter()
            .filter(|record| record.version != version)
            .collect();

        self.write_records(&records)
    }

    fn has_schema(&self) -> MigrusResult<bool> {
        Ok(self.inner.path.exists())
    }

    fn init_schema(&self) -> MigrusResult<()> {
        let _guard = self.inner.file_lock.lock();

        if let Some(parent) = self.inner.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|err| {
                    MigrusError::new_with_cause(
                        &format!(
                            "Failed to create ledger directory for \"{}\"",
                            self.inner.path.display()
                        ),
                        ErrorKind::SchemaInitializationFailed,
                        MigrusError::from(err),
                    )
                })?;
            }
        }

        log::debug!("creating ledger file {}", self.inner.path.display());
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.inner.path)
            .map_err(|err| {
                MigrusError::new_with_cause(
                    &format!(
                        "Failed to create ledger file \"{}\"",
                        self.inner.path.display()
                    ),
                    ErrorKind::SchemaInitializationFailed,
                    MigrusError::from(err),
                )
            })?;
        Ok(())
    }
}

impl std::fmt::Debug for FlatFileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlatFileStore")
            .field("path", &self.inner.path)
            .finish()
    }
}

struct FlatFileStoreInner {
    path: PathBuf,
    file_lock: Mutex<()>,
}
