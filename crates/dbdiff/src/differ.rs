//! Backend abstraction and registry.
//!
//! A [`Differ`] owns access to two schemas (a "newer" reference and an
//! "older" target), produces the [`Delta`] between them and renders it.
//! Backends are looked up by identifier in a [`DifferRegistry`].

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use dbdiff_core::{AttributePolicy, ComparatorOptions, Delta, MySqlDialect};
use futures::future::{BoxFuture, FutureExt};
use tracing::debug;

use crate::error::{DbDiffError, Result};
use crate::mysql::MySqlDiffer;
use crate::snapshot::SnapshotDiffer;

/// A schema diff backend.
#[async_trait]
pub trait Differ: Send + Sync {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Releases any connection held by the backend.
    async fn close(&self) -> Result<()>;

    /// Fetches both schemas and compares them.
    async fn diff(&self) -> Result<Delta>;

    /// Renders a delta into ordered DDL statements.
    fn generate(&self, delta: &Delta) -> Result<Vec<String>> {
        Ok(MySqlDialect::new().generate(delta)?)
    }
}

/// Settings handed to a backend constructor.
#[derive(Debug, Clone)]
pub struct DifferConfig {
    /// Descriptor of the reference schema (DSN or file path).
    pub newer: String,
    /// Descriptor of the schema to upgrade.
    pub older: String,
    /// Only tables whose names start with this prefix are compared.
    pub table_prefix: Option<String>,
    /// Upper bound on pooled connections per database.
    pub max_connections: u32,
    /// Comparator settings.
    pub comparator: ComparatorOptions,
}

impl DifferConfig {
    /// Creates a config for the given newer/older descriptors.
    #[must_use]
    pub fn new(newer: impl Into<String>, older: impl Into<String>) -> Self {
        Self {
            newer: newer.into(),
            older: older.into(),
            table_prefix: None,
            max_connections: 2,
            comparator: ComparatorOptions::default(),
        }
    }

    /// Restricts the comparison to tables with this name prefix.
    #[must_use]
    pub fn table_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.table_prefix = (!prefix.is_empty()).then_some(prefix);
        self
    }

    /// Sets the pool size per database.
    #[must_use]
    pub const fn max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Sets how changed table attributes are recorded.
    #[must_use]
    pub fn attribute_policy(mut self, policy: AttributePolicy) -> Self {
        self.comparator = self.comparator.with_attribute_policy(policy);
        self
    }
}

/// Async constructor for a backend.
pub type Constructor =
    Arc<dyn Fn(DifferConfig) -> BoxFuture<'static, Result<Box<dyn Differ>>> + Send + Sync>;

/// Maps backend identifiers to their constructors.
#[derive(Clone, Default)]
pub struct DifferRegistry {
    constructors: BTreeMap<String, Constructor>,
}

impl DifferRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in `mysql` and `snapshot` backends.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(MySqlDiffer::NAME, |config| async move {
            let differ = MySqlDiffer::connect(&config).await?;
            Ok(Box::new(differ) as Box<dyn Differ>)
        });
        registry.register(SnapshotDiffer::NAME, |config| async move {
            let differ = SnapshotDiffer::open(&config).await?;
            Ok(Box::new(differ) as Box<dyn Differ>)
        });
        registry
    }

    /// Registers a backend, replacing any earlier one with the same name.
    pub fn register<F, Fut>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn(DifferConfig) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Box<dyn Differ>>> + Send + 'static,
    {
        let constructor: Constructor = Arc::new(move |config| constructor(config).boxed());
        self.constructors.insert(name.into(), constructor);
    }

    /// Returns the registered identifiers in sorted order.
    #[must_use]
    pub fn driver_names(&self) -> Vec<String> {
        self.constructors.keys().cloned().collect()
    }

    /// Returns whether a backend is registered under `kind`.
    #[must_use]
    pub fn supports(&self, kind: &str) -> bool {
        self.constructors.contains_key(kind)
    }

    /// Opens the backend registered under `kind`.
    pub async fn open(&self, kind: &str, config: DifferConfig) -> Result<Box<dyn Differ>> {
        let Some(constructor) = self.constructors.get(kind) else {
            return Err(DbDiffError::UnsupportedDriver {
                kind: kind.to_string(),
                available: self.driver_names(),
            });
        };
        debug!(driver = kind, "Opening backend");
        constructor(config).await
    }
}

impl std::fmt::Debug for DifferRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DifferRegistry")
            .field("drivers", &self.driver_names())
            .finish()
    }
}
