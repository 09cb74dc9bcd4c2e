//! The database handle tying registry, dialect, accessor and executor
//! together.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::accessor::AccessorKind;
use crate::builder::{Deleter, Inserter, Query, Selector, Updater};
use crate::dialect::{Dialect, DialectKind};
use crate::error::Result;
use crate::executor::{ExecResult, Executor};
use crate::model::{Model, Registry, Schema};

/// Strategy settings that can be loaded from a configuration file.
///
/// ```rust
/// use oxide_mapper::{AccessorKind, DbConfig, DialectKind};
///
/// let config: DbConfig = serde_json::from_str(r#"{"dialect": "sqlite"}"#).unwrap();
/// assert_eq!(config.dialect, DialectKind::Sqlite);
/// assert_eq!(config.accessor, AccessorKind::Unsafe);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// SQL dialect.
    pub dialect: DialectKind,
    /// Field access strategy.
    pub accessor: AccessorKind,
}

/// Entry point for building and running statements.
///
/// A `Db` owns the schema registry, the dialect, the field access strategy
/// and the executor that runs compiled statements. Defaults are the `MySQL`
/// dialect, the offset-based accessor and a private registry.
pub struct Db<E> {
    executor: E,
    registry: Arc<Registry>,
    dialect: Arc<dyn Dialect>,
    accessor: AccessorKind,
}

impl<E> Db<E> {
    /// Creates a handle with the default settings.
    pub fn new(executor: E) -> Self {
        Self::from_config(executor, &DbConfig::default())
    }

    /// Creates a handle from configuration.
    pub fn from_config(executor: E, config: &DbConfig) -> Self {
        Self {
            executor,
            registry: Arc::new(Registry::new()),
            dialect: config.dialect.dialect(),
            accessor: config.accessor,
        }
    }

    /// Uses `registry` instead of a private one, sharing cached schemas.
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = registry;
        self
    }

    /// Sets the dialect.
    #[must_use]
    pub fn with_dialect(mut self, dialect: Arc<dyn Dialect>) -> Self {
        self.dialect = dialect;
        self
    }

    /// Sets the field access strategy.
    #[must_use]
    pub const fn with_accessor(mut self, accessor: AccessorKind) -> Self {
        self.accessor = accessor;
        self
    }

    /// Returns the executor.
    pub const fn executor(&self) -> &E {
        &self.executor
    }

    /// Returns the schema registry.
    #[must_use]
    pub const fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Returns the dialect.
    #[must_use]
    pub fn dialect(&self) -> &dyn Dialect {
        &*self.dialect
    }

    /// Returns the field access strategy.
    #[must_use]
    pub const fn accessor(&self) -> AccessorKind {
        self.accessor
    }

    /// Returns the schema of `T` from the registry.
    ///
    /// # Errors
    ///
    /// Fails if the schema cannot be derived.
    pub fn schema<T: Model>(&self) -> Result<Arc<Schema>> {
        self.registry.get::<T>()
    }

    /// Starts a SELECT.
    pub const fn select<T: Model>(&self) -> Selector<'_, T, E> {
        Selector::new(self)
    }

    /// Starts an INSERT.
    pub const fn insert<T: Model>(&self) -> Inserter<'_, T, E> {
        Inserter::new(self)
    }

    /// Starts an UPDATE.
    pub const fn update<T: Model>(&self) -> Updater<'_, T, E> {
        Updater::new(self)
    }

    /// Starts a DELETE.
    pub const fn delete<T: Model>(&self) -> Deleter<'_, T, E> {
        Deleter::new(self)
    }
}

impl<E: Executor> Db<E> {
    #[allow(clippy::future_not_send)]
    pub(crate) async fn execute(&self, query: &Query) -> Result<ExecResult> {
        debug!(sql = %query.sql, args = query.args.len(), "executing statement");
        let result = self.executor.execute(query).await?;
        debug!(
            rows_affected = result.rows_affected(),
            last_insert_id = result.last_insert_id(),
            "statement executed"
        );
        Ok(result)
    }

    #[allow(clippy::future_not_send)]
    pub(crate) async fn fetch(&self, query: &Query) -> Result<E::Rows> {
        debug!(sql = %query.sql, args = query.args.len(), "running query");
        self.executor.query(query).await
    }
}

impl<E: fmt::Debug> fmt::Debug for Db<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Db")
            .field("executor", &self.executor)
            .field("dialect", &self.dialect.name())
            .field("accessor", &self.accessor)
            .finish_non_exhaustive()
    }
}
