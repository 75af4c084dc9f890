use crate::errors::{ErrorKind, MigrusError, MigrusResult};
use crate::migration::{Migration, MigrationContext};
use crate::registry::Registry;
use crate::store::VersionStore;
use itertools::Itertools;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Observer for migration execution events.
///
/// Callbacks fire around each individual hook execution; no-ops such as
/// applying an already-applied version never reach the listener. Default
/// implementations do nothing, so a listener only overrides what it cares
/// about.
pub trait MigrationListener: Send + Sync {
    fn on_apply_started(&self, _migration: &Migration) {}

    fn on_apply_finished(&self, _migration: &Migration) {}

    fn on_revert_started(&self, _migration: &Migration) {}

    fn on_revert_finished(&self, _migration: &Migration) {}
}

/// Listener that reports execution progress through the `log` facade.
#[derive(Debug, Default)]
pub struct LogListener;

impl MigrationListener for LogListener {
    fn on_apply_started(&self, migration: &Migration) {
        log::info!(" == {} {} migrating", migration.version(), migration.name());
    }

    fn on_apply_finished(&self, migration: &Migration) {
        log::info!(" == {} {} migrated", migration.version(), migration.name());
    }

    fn on_revert_started(&self, migration: &Migration) {
        log::info!(" == {} {} reverting", migration.version(), migration.name());
    }

    fn on_revert_finished(&self, migration: &Migration) {
        log::info!(" == {} {} reverted", migration.version(), migration.name());
    }
}

/// Sequential migration execution engine.
///
/// # Purpose
/// `Migrator` drives migrations against one resolved [`VersionStore`]. Every
/// operation re-reads the applied set from the store before acting, so the
/// store stays the single source of truth; nothing is cached across
/// operations. All execution is strictly sequential with no retries, and a
/// batch stops at the first failure, leaving earlier completed steps
/// recorded.
///
/// # Key Responsibilities
/// - **Bootstrap**: creates the store's bookkeeping structure once, before
///   first use
/// - **Single Steps**: [`apply_up`], [`apply_down`] are idempotent per
///   version
/// - **Batches**: [`migrate_all`] (ascending) and [`rollback`] (descending)
/// - **Targeted Runs**: [`up_version`], [`down_version`], [`redo`] treat an
///   unknown version as a successful no-op
///
/// # Concurrency
/// A deployment runs exactly one migrator against a store at a time;
/// concurrent runners are outside the engine's contract.
///
/// [`apply_up`]: Migrator::apply_up
/// [`apply_down`]: Migrator::apply_down
/// [`migrate_all`]: Migrator::migrate_all
/// [`rollback`]: Migrator::rollback
/// [`up_version`]: Migrator::up_version
/// [`down_version`]: Migrator::down_version
/// [`redo`]: Migrator::redo
pub struct Migrator {
    store: VersionStore,
    context: MigrationContext,
    listener: Arc<dyn MigrationListener>,
    bootstrapped: AtomicBool,
}

impl Migrator {
    pub fn new(store: VersionStore, context: MigrationContext) -> Self {
        Migrator {
            store,
            context,
            listener: Arc::new(LogListener),
            bootstrapped: AtomicBool::new(false),
        }
    }

    /// Replaces the default [`LogListener`].
    pub fn with_listener(mut self, listener: impl MigrationListener + 'static) -> Self {
        self.listener = Arc::new(listener);
        self
    }

    pub(crate) fn with_shared_listener(mut self, listener: Arc<dyn MigrationListener>) -> Self {
        self.listener = listener;
        self
    }

    pub fn store(&self) -> &VersionStore {
        &self.store
    }

    pub fn context(&self) -> &MigrationContext {
        &self.context
    }

    /// Creates the store's bookkeeping structure if it does not exist yet.
    ///
    /// Runs at most once per migrator instance; every public operation calls
    /// this before touching the store.
    fn ensure_schema(&self) -> MigrusResult<()> {
        if self.bootstrapped.load(Ordering::SeqCst) {
            return Ok(());
        }

        if !self.store.has_schema()? {
            log::info!("initializing version store schema");
            self.store.init_schema().map_err(|err| {
                MigrusError::new_with_cause(
                    "Failed to initialize the version store schema",
                    ErrorKind::SchemaInitializationFailed,
                    err,
                )
            })?;
        }

        self.bootstrapped.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn applied_versions(&self) -> MigrusResult<BTreeSet<u64>> {
        Ok(self
            .store
            .fetch_all()?
            .into_iter()
            .map(|record| record.version)
            .collect())
    }

    /// Applies one migration if its version is not yet recorded.
    ///
    /// The version is recorded only after the forward hook succeeds; a hook
    /// failure leaves the store untouched and propagates to the caller.
    /// Applying an already-applied version is a successful no-op.
    pub fn apply_up(&self, migration: &Migration) -> MigrusResult<()> {
        self.ensure_schema()?;

        if self.applied_versions()?.contains(&migration.version()) {
            return Ok(());
        }

        self.listener.on_apply_started(migration);
        migration.up(&self.context)?;
        self.store
            .record_applied(migration.version(), migration.name())?;
        self.listener.on_apply_finished(migration);
        Ok(())
    }

    /// Reverts one migration if its version is currently recorded.
    ///
    /// The record is removed only after the reverse hook succeeds. Reverting
    /// a version that is not applied is a successful no-op.
    pub fn apply_down(&self, migration: &Migration) -> MigrusResult<()> {
        self.ensure_schema()?;

        if !self.applied_versions()?.contains(&migration.version()) {
            return Ok(());
        }

        self.listener.on_revert_started(migration);
        migration.down(&self.context)?;
        self.store.record_reverted(migration.version())?;
        self.listener.on_revert_finished(migration);
        Ok(())
    }

    /// Applies every registered migration not yet recorded, ascending.
    ///
    /// Stops at the first failure; migrations completed before the failure
    /// stay recorded.
    ///
    /// # Returns
    /// The number of migrations actually executed.
    pub fn migrate_all(&self, registry: &Registry) -> MigrusResult<usize> {
        self.ensure_schema()?;

        let applied = self.applied_versions()?;
        let pending: Vec<&Migration> = registry
            .iter()
            .filter(|migration| !applied.contains(&migration.version()))
            .collect();

        for migration in &pending {
            self.apply_up(migration)?;
        }

        Ok(pending.len())
    }

    /// Reverts applied migrations in descending version order.
    ///
    /// Only versions present in the registry are reverted; an applied
    /// version with no registered migration is an orphan, reported via a
    /// warning and left recorded. Orphans do not consume a step.
    ///
    /// # Arguments
    /// * `steps` - Maximum number of reverts, `None` reverts everything
    ///
    /// # Returns
    /// The number of migrations actually reverted.
    pub fn rollback(&self, registry: &Registry, steps: Option<usize>) -> MigrusResult<usize> {
        self.ensure_schema()?;

        let mut reverted = 0;
        let limit = steps.unwrap_or(usize::MAX);

        for version in self.applied_versions()?.into_iter().rev().collect_vec() {
            if reverted >= limit {
                break;
            }

            match registry.get(version) {
                Some(migration) => {
                    self.apply_down(migration)?;
                    reverted += 1;
                }
                None => {
                    log::warn!(
                        "version {} is recorded as applied but has no registered migration, leaving it in place",
                        version
                    );
                }
            }
        }

        Ok(reverted)
    }

    /// Applies one version by number; unknown versions are a successful
    /// no-op.
    pub fn up_version(&self, registry: &Registry, version: u64) -> MigrusResult<()> {
        match registry.get(version) {
            Some(migration) => self.apply_up(migration),
            None => Ok(()),
        }
    }

    /// Reverts one version by number; unknown versions are a successful
    /// no-op.
    pub fn down_version(&self, registry: &Registry, version: u64) -> MigrusResult<()> {
        match registry.get(version) {
            Some(migration) => self.apply_down(migration),
            None => Ok(()),
        }
    }

    /// Reverts and immediately re-applies one version.
    ///
    /// A no-op unless the version is both registered and currently applied.
    /// The two halves are not atomic: if the re-apply fails after a
    /// successful revert, the version is left reverted and the failure
    /// propagates.
    pub fn redo(&self, registry: &Registry, version: u64) -> MigrusResult<()> {
        self.ensure_schema()?;

        let migration = match registry.get(version) {
            Some(migration) => migration,
            None => return Ok(()),
        };
        if !self.applied_versions()?.contains(&version) {
            return Ok(());
        }

        self.apply_down(migration)?;
        self.apply_up(migration)
    }
}

impl std::fmt::Debug for Migrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migrator")
            .field("store", &self.store)
            .field("bootstrapped", &self.bootstrapped.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}
