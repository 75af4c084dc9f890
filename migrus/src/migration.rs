use crate::errors::{ErrorKind, MigrusError, MigrusResult};
use std::any::Any;
use std::sync::Arc;

/// Hook signature for the forward and reverse behavior of a migration.
pub type MigrationHook = Box<dyn Fn(&MigrationContext) -> MigrusResult<()> + Send + Sync>;

/// Question/answer capability injected into hooks that need user input.
pub type AskFn = Arc<dyn Fn(&str) -> MigrusResult<String> + Send + Sync>;

/// Execution context handed to every migration hook.
///
/// # Purpose
/// Carries the capabilities a migration legitimately needs while it runs: a
/// type-erased connection handle to the target backend and an optional
/// question/answer function for interactive input. Hooks receive this
/// context instead of reaching for ambient global state, which keeps them
/// testable without a real backend or terminal.
///
/// # Characteristics
/// - Clone-able: capabilities are shared via `Arc`, not copied
/// - Every capability is optional; accessing an absent one is a structured
///   error, never a panic
#[derive(Clone, Default)]
pub struct MigrationContext {
    connection: Option<Arc<dyn Any + Send + Sync>>,
    ask: Option<AskFn>,
}

impl MigrationContext {
    pub fn new() -> Self {
        MigrationContext::default()
    }

    /// Attaches a connection handle to the context.
    ///
    /// The handle is type-erased; hooks recover it with [`connection`].
    ///
    /// [`connection`]: MigrationContext::connection
    pub fn with_connection<T: Any + Send + Sync>(mut self, connection: T) -> Self {
        self.connection = Some(Arc::new(connection));
        self
    }

    /// Attaches a question/answer function to the context.
    pub fn with_ask(
        mut self,
        ask: impl Fn(&str) -> MigrusResult<String> + Send + Sync + 'static,
    ) -> Self {
        self.ask = Some(Arc::new(ask));
        self
    }

    /// Downcasts the connection handle to the expected type.
    ///
    /// # Returns
    /// `Ok(Arc<T>)` - the shared handle if present and of type `T`
    /// `Err(MigrusError)` - if no connection is attached or the type differs
    pub fn connection<T: Any + Send + Sync>(&self) -> MigrusResult<Arc<T>> {
        let connection = self.connection.as_ref().ok_or_else(|| {
            MigrusError::new(
                "No connection handle attached to the migration context",
                ErrorKind::ValidationError,
            )
        })?;

        Arc::clone(connection).downcast::<T>().map_err(|_| {
            MigrusError::new(
                "Failed to downcast connection handle to the requested type",
                ErrorKind::ValidationError,
            )
        })
    }

    /// Asks the injected question/answer capability.
    ///
    /// # Returns
    /// `Ok(String)` - the answer
    /// `Err(MigrusError)` - if no capability was injected, or it fails
    pub fn ask(&self, question: &str) -> MigrusResult<String> {
        match &self.ask {
            Some(ask) => ask(question),
            None => Err(MigrusError::new(
                "No ask capability attached to the migration context",
                ErrorKind::ValidationError,
            )),
        }
    }
}

impl std::fmt::Debug for MigrationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationContext")
            .field("connection", &self.connection.is_some())
            .field("ask", &self.ask.is_some())
            .finish()
    }
}

/// A named, versioned schema change with forward and reverse behavior.
///
/// # Purpose
/// Represents one migration unit discovered by the registry: an ordinal
/// version, a canonical name, and the up/down hooks that perform and undo
/// the change. Immutable once constructed; the version never changes after
/// discovery.
///
/// # Characteristics
/// - Clone-able: clones share the same underlying unit via `Arc`
/// - Owned by the [`Registry`](crate::registry::Registry) that discovered
///   it; handed by reference to the migrator for execution
///
/// # Usage
/// ```ignore
/// let migration = Migration::new(20141104210000, "TestOne",
///     |ctx| { /* apply */ Ok(()) },
///     |ctx| { /* revert */ Ok(()) });
/// ```
#[derive(Clone)]
pub struct Migration {
    inner: Arc<MigrationInner>,
}

impl Migration {
    /// Creates a new migration unit.
    ///
    /// # Arguments
    /// * `version` - Ordinal version, defines execution order
    /// * `name` - Canonical name of the change
    /// * `up` - Forward hook
    /// * `down` - Reverse hook
    pub fn new(
        version: u64,
        name: &str,
        up: impl Fn(&MigrationContext) -> MigrusResult<()> + Send + Sync + 'static,
        down: impl Fn(&MigrationContext) -> MigrusResult<()> + Send + Sync + 'static,
    ) -> Self {
        Migration {
            inner: Arc::new(MigrationInner {
                version,
                name: name.to_string(),
                up: Box::new(up),
                down: Box::new(down),
            }),
        }
    }

    pub fn version(&self) -> u64 {
        self.inner.version
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Runs the forward hook. Failures propagate verbatim to the caller.
    pub fn up(&self, context: &MigrationContext) -> MigrusResult<()> {
        (self.inner.up)(context)
    }

    /// Runs the reverse hook. Failures propagate verbatim to the caller.
    pub fn down(&self, context: &MigrationContext) -> MigrusResult<()> {
        (self.inner.down)(context)
    }
}

impl std::fmt::Debug for Migration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migration")
            .field("version", &self.inner.version)
            .field("name", &self.inner.name)
            .finish()
    }
}

struct MigrationInner {
    version: u64,
    name: String,
    up: MigrationHook,
    down: MigrationHook,
}
