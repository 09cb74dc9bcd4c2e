//! DELETE building.

mod common;

use common::{db, db_with, MockExecutor, TestModel};
use oxide_mapper::{col, not, AccessorKind, Error, ExecResult, SqlValue};

#[test]
fn test_delete_all() {
    let db = db();
    let query = db.delete::<TestModel>().build().unwrap();
    assert_eq!(query.sql, "DELETE FROM `test_model`;");
    assert!(query.args.is_empty());
}

#[test]
fn test_delete_with_where() {
    let db = db();
    let query = db
        .delete::<TestModel>()
        .where_clause([col("id").eq(12)])
        .build()
        .unwrap();
    assert_eq!(query.sql, "DELETE FROM `test_model` WHERE `id` = ?;");
    assert_eq!(query.args, vec![SqlValue::Int(12)]);
}

#[test]
fn test_delete_with_combined_where() {
    let db = db();
    let query = db
        .delete::<TestModel>()
        .where_clause([not(col("age").gt(18)), col("first_name").eq("Tom")])
        .build()
        .unwrap();
    assert_eq!(
        query.sql,
        "DELETE FROM `test_model` WHERE NOT (`age` > ?) AND (`first_name` = ?);"
    );
}

#[test]
fn test_delete_unknown_field() {
    let db = db();
    let err = db
        .delete::<TestModel>()
        .where_clause([col("email").eq("a@b.c")])
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::UnknownField(ref f) if f == "email"));
}

#[tokio::test]
async fn test_delete_exec() {
    let db = db_with(
        MockExecutor::new().with_result(ExecResult::new(1, 0)),
        AccessorKind::Unsafe,
    );
    let result = db
        .delete::<TestModel>()
        .where_clause([col("id").eq(12)])
        .exec()
        .await
        .unwrap();
    assert_eq!(result.rows_affected(), 1);
    assert_eq!(db.executor().seen()[0].args, vec![SqlValue::Int(12)]);
}
