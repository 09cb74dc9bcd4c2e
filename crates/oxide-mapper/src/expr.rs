//! Expression tree used by the statement builders.
//!
//! Expressions are plain values. Combinators such as [`Predicate::and`] and
//! [`not`] take their operands by value and return a new node, so any
//! expression can be cloned and reused in several statements.

use crate::value::{SqlValue, ToSqlValue};

/// A node of the expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A column, referenced by logical field name.
    Column(Column),
    /// A literal, compiled to a `?` placeholder.
    Value(SqlValue),
    /// A comparison or logical combination.
    Predicate(Predicate),
    /// Verbatim SQL with its own arguments.
    Raw(RawExpr),
    /// An aggregate function over a column.
    Aggregate(Aggregate),
    /// A `column = value` pair.
    Assignment(Assignment),
}

impl From<Column> for Expr {
    fn from(column: Column) -> Self {
        Self::Column(column)
    }
}

impl From<SqlValue> for Expr {
    fn from(value: SqlValue) -> Self {
        Self::Value(value)
    }
}

impl From<Predicate> for Expr {
    fn from(predicate: Predicate) -> Self {
        Self::Predicate(predicate)
    }
}

impl From<RawExpr> for Expr {
    fn from(raw: RawExpr) -> Self {
        Self::Raw(raw)
    }
}

impl From<Aggregate> for Expr {
    fn from(aggregate: Aggregate) -> Self {
        Self::Aggregate(aggregate)
    }
}

impl From<Assignment> for Expr {
    fn from(assignment: Assignment) -> Self {
        Self::Assignment(assignment)
    }
}

/// Creates a column reference.
#[must_use]
pub fn col(name: &str) -> Column {
    Column {
        name: String::from(name),
    }
}

/// A column reference.
///
/// The name is the logical field name of the record; it is resolved to the
/// physical column when the statement is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Logical field name.
    pub name: String,
}

impl Column {
    /// Creates an equality predicate.
    #[must_use]
    pub fn eq<T: ToSqlValue>(self, value: T) -> Predicate {
        Predicate::binary(self, Op::Eq, value.to_sql_value())
    }

    /// Creates a less-than predicate.
    #[must_use]
    pub fn lt<T: ToSqlValue>(self, value: T) -> Predicate {
        Predicate::binary(self, Op::Lt, value.to_sql_value())
    }

    /// Creates a greater-than predicate.
    #[must_use]
    pub fn gt<T: ToSqlValue>(self, value: T) -> Predicate {
        Predicate::binary(self, Op::Gt, value.to_sql_value())
    }
}

/// Predicate operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Eq,
    Lt,
    Gt,
    And,
    Or,
    Not,
}

impl Op {
    /// Returns the SQL keyword or symbol.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
        }
    }
}

/// A comparison or logical combination.
///
/// Either operand may be absent: `NOT` has no left operand, and a raw
/// fragment turned into a predicate has neither an operator nor a right
/// operand.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    /// Left operand.
    pub left: Option<Box<Expr>>,
    /// Operator.
    pub op: Option<Op>,
    /// Right operand.
    pub right: Option<Box<Expr>>,
}

impl Predicate {
    /// Creates a predicate with both operands.
    #[must_use]
    pub fn binary(left: impl Into<Expr>, op: Op, right: impl Into<Expr>) -> Self {
        Self {
            left: Some(Box::new(left.into())),
            op: Some(op),
            right: Some(Box::new(right.into())),
        }
    }

    /// Combines with `other` using `AND`.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self::binary(self, Op::And, other)
    }

    /// Combines with `other` using `OR`.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::binary(self, Op::Or, other)
    }
}

/// Negates a predicate.
#[must_use]
pub fn not(predicate: Predicate) -> Predicate {
    Predicate {
        left: None,
        op: Some(Op::Not),
        right: Some(Box::new(predicate.into())),
    }
}

/// Creates a raw SQL fragment.
///
/// **Warning**: the text is emitted verbatim. Only use this for fragments
/// that don't contain user input; pass values through [`RawExpr::arg`].
#[must_use]
pub fn raw(sql: impl Into<String>) -> RawExpr {
    RawExpr {
        sql: sql.into(),
        args: Vec::new(),
    }
}

/// Verbatim SQL with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct RawExpr {
    /// SQL text.
    pub sql: String,
    /// Arguments for the placeholders in `sql`.
    pub args: Vec<SqlValue>,
}

impl RawExpr {
    /// Appends an argument.
    #[must_use]
    pub fn arg<T: ToSqlValue>(mut self, value: T) -> Self {
        self.args.push(value.to_sql_value());
        self
    }

    /// Uses the fragment as a predicate.
    #[must_use]
    pub fn as_predicate(self) -> Predicate {
        Predicate {
            left: Some(Box::new(self.into())),
            op: None,
            right: None,
        }
    }
}

/// Aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunc {
    Avg,
    Min,
    Max,
    Count,
    Sum,
}

impl AggregateFunc {
    /// Returns the SQL function name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Avg => "AVG",
            Self::Min => "MIN",
            Self::Max => "MAX",
            Self::Count => "COUNT",
            Self::Sum => "SUM",
        }
    }
}

/// An aggregate function applied to a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    /// Function.
    pub func: AggregateFunc,
    /// Logical field name of the argument.
    pub column: String,
}

fn aggregate(func: AggregateFunc, column: &str) -> Aggregate {
    Aggregate {
        func,
        column: String::from(column),
    }
}

/// `AVG(column)`.
#[must_use]
pub fn avg(column: &str) -> Aggregate {
    aggregate(AggregateFunc::Avg, column)
}

/// `MIN(column)`.
#[must_use]
pub fn min(column: &str) -> Aggregate {
    aggregate(AggregateFunc::Min, column)
}

/// `MAX(column)`.
#[must_use]
pub fn max(column: &str) -> Aggregate {
    aggregate(AggregateFunc::Max, column)
}

/// `COUNT(column)`.
#[must_use]
pub fn count(column: &str) -> Aggregate {
    aggregate(AggregateFunc::Count, column)
}

/// `SUM(column)`.
#[must_use]
pub fn sum(column: &str) -> Aggregate {
    aggregate(AggregateFunc::Sum, column)
}

/// A `column = value` pair for upsert updates.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// Logical field name.
    pub column: String,
    /// New value.
    pub value: SqlValue,
}

/// Creates an assignment.
#[must_use]
pub fn assign<T: ToSqlValue>(column: &str, value: T) -> Assignment {
    Assignment {
        column: String::from(column),
        value: value.to_sql_value(),
    }
}

/// An entry of a SELECT list.
#[derive(Debug, Clone, PartialEq)]
pub enum Selectable {
    Column(Column),
    Aggregate(Aggregate),
    Raw(RawExpr),
}

impl From<Column> for Selectable {
    fn from(column: Column) -> Self {
        Self::Column(column)
    }
}

impl From<Aggregate> for Selectable {
    fn from(aggregate: Aggregate) -> Self {
        Self::Aggregate(aggregate)
    }
}

impl From<RawExpr> for Selectable {
    fn from(raw: RawExpr) -> Self {
        Self::Raw(raw)
    }
}

/// An entry of an upsert update list.
///
/// An explicit [`Assignment`] binds a new value; a bare [`Column`] means
/// "take the value that was about to be inserted".
#[derive(Debug, Clone, PartialEq)]
pub enum Assignable {
    Assign(Assignment),
    Column(Column),
}

impl From<Assignment> for Assignable {
    fn from(assignment: Assignment) -> Self {
        Self::Assign(assignment)
    }
}

impl From<Column> for Assignable {
    fn from(column: Column) -> Self {
        Self::Column(column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_comparisons() {
        let p = col("age").gt(18);
        assert_eq!(p.op, Some(Op::Gt));
        assert_eq!(p.left.as_deref(), Some(&Expr::Column(col("age"))));
        assert_eq!(p.right.as_deref(), Some(&Expr::Value(SqlValue::Int(18))));
    }

    #[test]
    fn test_combinators_do_not_mutate_operands() {
        let a = col("id").eq(12);
        let b = col("first_name").eq("Tom");
        let both = a.clone().and(b.clone());

        assert_eq!(both.op, Some(Op::And));
        assert_eq!(both.left.as_deref(), Some(&Expr::Predicate(a.clone())));
        assert_eq!(both.right.as_deref(), Some(&Expr::Predicate(b)));
        assert_eq!(a.op, Some(Op::Eq));
    }

    #[test]
    fn test_not_has_no_left_operand() {
        let negated = not(col("age").lt(3));
        assert!(negated.left.is_none());
        assert_eq!(negated.op, Some(Op::Not));
    }

    #[test]
    fn test_raw_as_predicate() {
        let p = raw("`age` > ?").arg(18).as_predicate();
        assert!(p.op.is_none());
        assert!(p.right.is_none());
        assert_eq!(
            p.left.as_deref(),
            Some(&Expr::Raw(RawExpr {
                sql: String::from("`age` > ?"),
                args: vec![SqlValue::Int(18)],
            }))
        );
    }

    #[test]
    fn test_aggregate_names() {
        assert_eq!(count("id").func.as_str(), "COUNT");
        assert_eq!(avg("age").column, "age");
    }
}
