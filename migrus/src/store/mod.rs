//! Version store backends and abstractions.
//!
//! This module defines the contract every version-tracking backend must
//! satisfy. The store is the single source of truth for "is this migration
//! applied"; the engine re-reads it before every decision and never caches
//! its contents across operations.
//!
//! # Store Providers
//!
//! Backends implement [`VersionStoreProvider`] and are wrapped in a
//! [`VersionStore`] handle:
//! - **In-Memory Store**: [`memory::InMemoryVersionStore`] for testing and
//!   ephemeral use
//! - **Flat-File Store**: `migrus-flat-adapter` for a plain-text version
//!   ledger
//!
//! # Adapter Selection
//!
//! A deployment either configures one backend or a named group of backends;
//! [`AdapterSelection`] models both and resolves to a single concrete
//! [`VersionStore`] before the migrator ever runs.

pub mod memory;
mod version_store;

pub use version_store::*;
