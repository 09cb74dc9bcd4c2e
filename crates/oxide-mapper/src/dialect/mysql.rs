use super::Dialect;
use crate::builder::{SqlBuilder, Upsert};
use crate::error::Result;
use crate::expr::Assignable;

/// `MySQL` dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl Dialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    /// `MySQL` ignores the conflict target: any unique key triggers the update.
    /// A bare column takes the inserted value via `VALUES(col)`.
    fn build_upsert(&self, b: &mut SqlBuilder<'_>, upsert: &Upsert) -> Result<()> {
        b.push_str(" ON DUPLICATE KEY UPDATE ");
        for (i, assign) in upsert.assigns.iter().enumerate() {
            if i > 0 {
                b.push(',');
            }
            match assign {
                Assignable::Assign(a) => {
                    b.write_column(&a.column)?;
                    b.push('=');
                    b.push_placeholder(a.value.clone());
                }
                Assignable::Column(c) => {
                    let column = b.field(&c.name)?.column.as_str();
                    b.quote(column);
                    b.push_str("=VALUES(");
                    b.quote(column);
                    b.push(')');
                }
            }
        }
        Ok(())
    }
}
