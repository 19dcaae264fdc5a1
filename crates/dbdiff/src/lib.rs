//! Compare two database schemas and print the DDL that upgrades the older
//! one to match the newer one.
//!
//! `dbdiff` wraps the [`dbdiff_core`] engine with schema acquisition:
//!
//! - **mysql** - reads `information_schema` from two live MySQL servers
//! - **snapshot** - reads two JSON snapshot files written by `dbdiff dump`
//!
//! Backends implement [`Differ`](differ::Differ) and are opened by name
//! through a [`DifferRegistry`](differ::DifferRegistry).
//!
//! # Example
//!
//! ```rust,ignore
//! use dbdiff::prelude::*;
//!
//! let registry = DifferRegistry::with_defaults();
//! let config = DifferConfig::new(
//!     "mysql://root@localhost/app_v2",
//!     "mysql://root@localhost/app_v1",
//! );
//! let differ = registry.open("mysql", config).await?;
//! let delta = differ.diff().await?;
//! for sql in differ.generate(&delta)? {
//!     println!("{sql}");
//! }
//! differ.close().await?;
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Print the upgrade script between two databases
//! dbdiff diff -t mysql -n mysql://root@localhost/app_v2 -o mysql://root@localhost/app_v1
//!
//! # Capture a database structure to a file
//! dbdiff dump -d mysql://root@localhost/app_v2 --output app_v2.json
//!
//! # Diff two captured structures
//! dbdiff diff -t snapshot -n app_v2.json -o app_v1.json
//! ```

pub mod differ;
pub mod error;
pub mod mysql;
pub mod snapshot;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::differ::{Differ, DifferConfig, DifferRegistry};
    pub use crate::error::{DbDiffError, Result};
    pub use crate::mysql::MySqlDiffer;
    pub use crate::snapshot::SnapshotDiffer;
    pub use dbdiff_core::{AttributePolicy, Delta, SchemaSnapshot};
}
