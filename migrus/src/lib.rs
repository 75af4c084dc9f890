//! # Migrus - Deterministic Schema Migration Engine
//!
//! Migrus discovers versioned migrations, validates the whole set before
//! anything runs, and executes them strictly sequentially against a
//! pluggable version store.
//!
//! ## Key Features
//!
//! - **Deterministic Ordering**: migrations run ascending by version,
//!   roll back descending, with no reordering
//! - **Eager Validation**: duplicate versions, duplicate names, and
//!   malformed identifiers fail the run before any hook executes
//! - **Pluggable Stores**: any backend implementing [`VersionStoreProvider`]
//!   tracks the applied set; in-memory and flat-file stores ship out of the
//!   box
//! - **Grouped Deployments**: a deployment can wire several named stores and
//!   scope each run to one group
//! - **Explicit Context**: hooks receive their connection handle and
//!   interactive-input capability through a [`MigrationContext`], never
//!   through ambient globals
//! - **Idempotent Steps**: applying an applied version or reverting an
//!   absent one is a successful no-op
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use migrus::migrus_config::MigrusBuilder;
//! use migrus::registry::{GroupScope, Registry, StaticSourceSet};
//! use migrus::migration::Migration;
//! use migrus::store::memory::InMemoryVersionStore;
//!
//! # fn main() -> migrus::errors::MigrusResult<()> {
//! let sources = StaticSourceSet::new()
//!     .with_source("20141104210000_CreateUsers", |v, n| {
//!         Ok(Migration::new(v, n,
//!             |_ctx| { /* apply */ Ok(()) },
//!             |_ctx| { /* revert */ Ok(()) }))
//!     });
//!
//! let config = MigrusBuilder::new()
//!     .with_adapter(InMemoryVersionStore::new())
//!     .build()?;
//!
//! let registry = Registry::discover(&sources, config.group_scope())?;
//! let migrator = config.into_migrator();
//! migrator.migrate_all(&registry)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`errors`] - Error types and result definitions
//! - [`migration`] - Migration units and the execution context
//! - [`migrator`] - Sequential execution engine and listeners
//! - [`migrus_config`] - Deployment configuration and builder
//! - [`registry`] - Discovery, identifier parsing, and validation
//! - [`status`] - Applied/pending/orphaned status reporting
//! - [`store`] - Version store abstractions and the in-memory backend
//!
//! [`VersionStoreProvider`]: store::VersionStoreProvider
//! [`MigrationContext`]: migration::MigrationContext

pub mod errors;
pub mod migration;
pub mod migrator;
pub mod migrus_config;
pub mod registry;
pub mod status;
pub mod store;

pub use errors::{ErrorKind, MigrusError, MigrusResult};
pub use migration::{Migration, MigrationContext};
pub use migrator::{LogListener, MigrationListener, Migrator};
pub use migrus_config::{MigrusBuilder, MigrusConfig};
pub use registry::{GroupScope, Registry};
pub use status::{StatusReport, StatusReporter};
pub use store::{AdapterSelection, VersionRecord, VersionStore, VersionStoreProvider};
