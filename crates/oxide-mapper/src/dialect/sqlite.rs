use super::{build_on_conflict, Dialect};
use crate::builder::{SqlBuilder, Upsert};
use crate::error::Result;

/// `SQLite` dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn build_upsert(&self, b: &mut SqlBuilder<'_>, upsert: &Upsert) -> Result<()> {
        build_on_conflict(b, upsert)
    }
}
