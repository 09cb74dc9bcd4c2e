use super::{build_on_conflict, Dialect};
use crate::builder::{SqlBuilder, Upsert};
use crate::error::Result;

/// Postgres dialect.
///
/// Shares `SQLite`'s upsert grammar but quotes identifiers with `"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn identifier_quote(&self) -> char {
        '"'
    }

    fn build_upsert(&self, b: &mut SqlBuilder<'_>, upsert: &Upsert) -> Result<()> {
        build_on_conflict(b, upsert)
    }
}
