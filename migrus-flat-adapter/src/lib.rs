//! # Migrus Flat-File Adapter
//!
//! A plain-text version store for Migrus. The applied set is kept in a
//! single human-readable ledger file with one `version<TAB>name` line per
//! applied migration, which makes the migration state trivially inspectable
//! and diffable.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use migrus::migrus_config::MigrusBuilder;
//! use migrus_flat_adapter::FlatFileStore;
//!
//! let config = MigrusBuilder::new()
//!     .with_adapter(FlatFileStore::new("migrations.log"))
//!     .build()?;
//! ```

mod store;

pub use store::FlatFileStore;
