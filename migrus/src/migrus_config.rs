use crate::errors::{ErrorKind, MigrusError, MigrusResult};
use crate::migration::MigrationContext;
use crate::migrator::{MigrationListener, Migrator};
use crate::registry::GroupScope;
use crate::store::{AdapterSelection, VersionStore, VersionStoreProvider};
use indexmap::IndexMap;
use std::any::Any;
use std::sync::Arc;

/// Builder for a [`MigrusConfig`].
///
/// # Purpose
/// Collects the store wiring, group selection, execution context, and
/// listener for one deployment, then validates the whole lot in [`build`].
/// Wiring mistakes (no store, both a single and a grouped store, a grouped
/// store without an active group) surface at build time, before any
/// migration runs.
///
/// # Usage
/// ```ignore
/// let config = MigrusBuilder::new()
///     .with_adapter(InMemoryVersionStore::new())
///     .build()?;
/// let migrator = config.into_migrator();
/// ```
///
/// [`build`]: MigrusBuilder::build
#[derive(Default)]
pub struct MigrusBuilder {
    single: Option<VersionStore>,
    grouped: IndexMap<String, VersionStore>,
    active_group: Option<String>,
    context: MigrationContext,
    listener: Option<Arc<dyn MigrationListener>>,
}

impl MigrusBuilder {
    pub fn new() -> Self {
        MigrusBuilder::default()
    }

    /// Wires the single version-store backend for the deployment.
    ///
    /// Mutually exclusive with [`with_grouped_adapter`].
    ///
    /// [`with_grouped_adapter`]: MigrusBuilder::with_grouped_adapter
    pub fn with_adapter(mut self, store: impl VersionStoreProvider + 'static) -> Self {
        self.single = Some(VersionStore::new(store));
        self
    }

    /// Wires one named backend of a grouped deployment.
    ///
    /// May be called repeatedly, one call per group. Requires
    /// [`with_active_group`] before [`build`].
    ///
    /// [`with_active_group`]: MigrusBuilder::with_active_group
    /// [`build`]: MigrusBuilder::build
    pub fn with_grouped_adapter(
        mut self,
        group: &str,
        store: impl VersionStoreProvider + 'static,
    ) -> Self {
        self.grouped
            .insert(group.to_string(), VersionStore::new(store));
        self
    }

    /// Selects which group this run operates on.
    pub fn with_active_group(mut self, group: &str) -> Self {
        self.active_group = Some(group.to_string());
        self
    }

    /// Attaches the connection handle hooks will receive.
    pub fn with_connection<T: Any + Send + Sync>(mut self, connection: T) -> Self {
        self.context = self.context.with_connection(connection);
        self
    }

    /// Attaches the question/answer capability hooks will receive.
    pub fn with_ask(
        mut self,
        ask: impl Fn(&str) -> MigrusResult<String> + Send + Sync + 'static,
    ) -> Self {
        self.context = self.context.with_ask(ask);
        self
    }

    /// Replaces the whole execution context.
    pub fn with_context(mut self, context: MigrationContext) -> Self {
        self.context = context;
        self
    }

    /// Attaches an execution listener.
    pub fn with_listener(mut self, listener: impl MigrationListener + 'static) -> Self {
        self.listener = Some(Arc::new(listener));
        self
    }

    /// Validates the wiring and resolves it into a [`MigrusConfig`].
    ///
    /// # Errors
    /// [`ErrorKind::ValidationError`] when no store is wired, when both a
    /// single and a grouped store are wired, when a grouped deployment has
    /// no active group, or when the active group names no wired backend.
    pub fn build(self) -> MigrusResult<MigrusConfig> {
        let selection = match (self.single, self.grouped.is_empty()) {
            (Some(_), false) => {
                return Err(MigrusError::new(
                    "Wire either a single adapter or grouped adapters, not both",
                    ErrorKind::ValidationError,
                ))
            }
            (Some(store), true) => AdapterSelection::Single(store),
            (None, false) => AdapterSelection::Grouped(self.grouped),
            (None, true) => {
                return Err(MigrusError::new(
                    "No version store adapter has been wired",
                    ErrorKind::ValidationError,
                ))
            }
        };

        let scope = match &selection {
            AdapterSelection::Single(_) => GroupScope::ungrouped(),
            AdapterSelection::Grouped(_) => {
                let active = self.active_group.as_deref().ok_or_else(|| {
                    MigrusError::new(
                        "Grouped adapters require an active group",
                        ErrorKind::ValidationError,
                    )
                })?;
                GroupScope::grouped(active, selection.group_names())
            }
        };

        let store = selection.resolve(self.active_group.as_deref())?;

        Ok(MigrusConfig {
            store,
            scope,
            context: self.context,
            listener: self.listener,
        })
    }
}

impl std::fmt::Debug for MigrusBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrusBuilder")
            .field("single", &self.single.is_some())
            .field("groups", &self.grouped.keys().collect::<Vec<_>>())
            .field("active_group", &self.active_group)
            .finish_non_exhaustive()
    }
}

/// A validated deployment configuration.
///
/// Holds the one resolved store this run operates on, the group scope that
/// discovery must use, and the execution context for hooks. Produced by
/// [`MigrusBuilder::build`]; the selection is resolved exactly once, here,
/// never during execution.
pub struct MigrusConfig {
    store: VersionStore,
    scope: GroupScope,
    context: MigrationContext,
    listener: Option<Arc<dyn MigrationListener>>,
}

impl MigrusConfig {
    pub fn store(&self) -> &VersionStore {
        &self.store
    }

    /// The group scope discovery must run under.
    pub fn group_scope(&self) -> &GroupScope {
        &self.scope
    }

    pub fn context(&self) -> &MigrationContext {
        &self.context
    }

    /// Consumes the configuration into a ready-to-run [`Migrator`].
    pub fn into_migrator(self) -> Migrator {
        let migrator = Migrator::new(self.store, self.context);
        match self.listener {
            Some(listener) => migrator.with_shared_listener(listener),
            None => migrator,
        }
    }
}

impl std::fmt::Debug for MigrusConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrusConfig")
            .field("store", &self.store)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}
