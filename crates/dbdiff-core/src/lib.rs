//! # dbdiff-core
//!
//! Schema diff and DDL synthesis for relational databases.
//!
//! Given two already-fetched [`SchemaSnapshot`]s, this crate:
//! - computes a [`Delta`] at table, column and index granularity
//!   ([`Comparator`]), and
//! - renders that delta into a correctly ordered list of DDL statements
//!   ([`MySqlDialect`]).
//!
//! The engine never talks to a database. Both steps are pure functions
//! over immutable inputs, so independent diffs can run concurrently.
//!
//! ## Example
//!
//! ```rust
//! use dbdiff_core::{compare, Field, Index, MySqlDialect, SchemaSnapshot, Table};
//!
//! let older = SchemaSnapshot::new().table(
//!     Table::new("users")
//!         .field(Field::new("id", "int").not_null())
//!         .field(Field::new("name", "varchar(255)")),
//! );
//! let newer = SchemaSnapshot::new().table(
//!     Table::new("users")
//!         .field(Field::new("id", "int").not_null())
//!         .field(Field::new("name", "varchar(255)"))
//!         .field(Field::new("email", "varchar(255)"))
//!         .index(Index::new("users", "email_idx", ["email"]).unique()),
//! );
//!
//! let delta = compare(&older, &newer);
//! let statements = MySqlDialect::new().generate(&delta).unwrap();
//! assert_eq!(
//!     statements,
//!     vec![
//!         "ALTER TABLE `users` ADD `email` VARCHAR(255) NULL AFTER `name`;",
//!         "ALTER TABLE `users` ADD UNIQUE `email_idx` (`email`);",
//!     ]
//! );
//! ```

pub mod compare;
pub mod delta;
pub mod dialect;
pub mod error;
pub mod schema;

pub use compare::{compare, AttributePolicy, Comparator, ComparatorOptions};
pub use delta::{Delta, DeltaSummary, FieldDiff, IndexDiff, TableAttributes, TableChange};
pub use dialect::MySqlDialect;
pub use error::{DiffError, Result};
pub use schema::{Field, Index, NamedList, SchemaSnapshot, Table, PRIMARY_KEY_NAME};
