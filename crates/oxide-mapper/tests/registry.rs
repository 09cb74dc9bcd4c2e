//! Schema derivation, registration options and caching.

mod common;

use std::sync::Arc;
use std::thread;

use common::{db, MockExecutor, TestModel};
use oxide_mapper::model::{Shape, ShapeKind};
use oxide_mapper::{col, Db, Error, Model, ModelOption, Registry};

#[derive(Debug, Default, Model)]
#[table(name = "accounts")]
struct Account {
    #[column(name = "account_id")]
    id: i64,
    display_name: String,
    balance: Option<f64>,
}

#[derive(Debug, Default, Model)]
struct Empty {}

#[derive(Debug, Default, Model)]
struct Contact {
    #[column(name = "")]
    first_name: String,
}

#[test]
fn test_default_names() {
    let registry = Registry::new();
    let schema = registry.get::<TestModel>().unwrap();

    assert_eq!(schema.table_name(), "test_model");
    let columns: Vec<_> = schema.fields().iter().map(|f| f.column.as_str()).collect();
    assert_eq!(columns, ["id", "first_name", "age", "last_name"]);
    assert_eq!(schema.field_by_column("first_name").unwrap().name, "first_name");
}

#[test]
fn test_annotations() {
    let registry = Registry::new();
    let schema = registry.get::<Account>().unwrap();

    assert_eq!(schema.table_name(), "accounts");
    assert_eq!(schema.field("id").unwrap().column, "account_id");
    assert_eq!(schema.field_by_column("account_id").unwrap().name, "id");
    assert_eq!(schema.field("display_name").unwrap().column, "display_name");
}

#[test]
fn test_record_without_fields() {
    let registry = Registry::new();
    let schema = registry.get::<Empty>().unwrap();
    assert_eq!(schema.table_name(), "empty");
    assert_eq!(schema.column_count(), 0);
}

#[test]
fn test_get_is_cached() {
    let registry = Registry::new();
    let first = registry.get::<TestModel>().unwrap();
    let second = registry.get::<TestModel>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_register_options() {
    let registry = Registry::new();
    let schema = registry
        .register::<TestModel, _>([
            ModelOption::table_name("people"),
            ModelOption::column_name("first_name", "given_name"),
        ])
        .unwrap();

    assert_eq!(schema.table_name(), "people");
    assert_eq!(schema.field("first_name").unwrap().column, "given_name");
    assert_eq!(schema.field_by_column("given_name").unwrap().name, "first_name");
    assert!(schema.field_by_column("first_name").is_none());
    assert_eq!(schema.column_count(), 4);

    let cached = registry.get::<TestModel>().unwrap();
    assert!(Arc::ptr_eq(&schema, &cached));
}

#[test]
fn test_register_column_collision() {
    let registry = Registry::new();
    let err = registry
        .register::<TestModel, _>([ModelOption::column_name("age", "id")])
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateColumn(ref c) if c == "id"));

    // Swapping two columns is fine once both options are applied.
    let schema = registry
        .register::<TestModel, _>([
            ModelOption::column_name("age", "id"),
            ModelOption::column_name("id", "age"),
        ])
        .unwrap();
    assert_eq!(schema.field_by_column("id").unwrap().name, "age");
    assert_eq!(schema.field_by_column("age").unwrap().name, "id");
    assert_eq!(schema.column_count(), 4);
}

#[test]
fn test_empty_column_name_keeps_derived_name() {
    let registry = Registry::new();
    let schema = registry.get::<Contact>().unwrap();
    assert_eq!(schema.field("first_name").unwrap().column, "first_name");

    let schema = registry
        .register::<TestModel, _>([ModelOption::column_name("first_name", "")])
        .unwrap();
    assert_eq!(schema.field("first_name").unwrap().column, "first_name");
}

#[test]
fn test_register_empty_table_name() {
    let registry = Registry::new();
    let err = registry
        .register::<TestModel, _>([ModelOption::table_name("")])
        .unwrap_err();
    assert!(matches!(err, Error::EmptyTableName));
}

#[test]
fn test_register_unknown_field() {
    let registry = Registry::new();
    let err = registry
        .register::<TestModel, _>([ModelOption::column_name("FirstName", "x")])
        .unwrap_err();
    assert!(matches!(err, Error::UnknownField(ref f) if f == "FirstName"));
    // A failed registration leaves the cache untouched.
    assert_eq!(registry.get::<TestModel>().unwrap().table_name(), "test_model");
}

#[test]
fn test_shape_checks() {
    let registry = Registry::new();
    assert!(matches!(registry.get_shape(None), Err(Error::InputNil)));
    assert!(matches!(
        registry.get_shape(Some(&Shape::opaque::<Vec<i64>>())),
        Err(Error::PointerOnly)
    ));

    let shape = TestModel::shape();
    assert_eq!(shape.kind(), ShapeKind::Record);
    let schema = registry.get_shape(Some(&shape)).unwrap();
    assert_eq!(schema.type_name(), "TestModel");
}

#[test]
fn test_concurrent_get_shares_one_schema() {
    let registry = Arc::new(Registry::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.get::<TestModel>().unwrap())
        })
        .collect();
    let schemas: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let cached = registry.get::<TestModel>().unwrap();
    for schema in &schemas {
        assert!(Arc::ptr_eq(schema, &cached));
    }
}

#[test]
fn test_registered_schema_drives_builders() {
    let registry = Arc::new(Registry::new());
    registry
        .register::<TestModel, _>([
            ModelOption::table_name("people"),
            ModelOption::column_name("first_name", "given_name"),
        ])
        .unwrap();

    let shared = Db::new(MockExecutor::new()).with_registry(Arc::clone(&registry));
    let query = shared
        .select::<TestModel>()
        .where_clause([col("first_name").eq("Tom")])
        .build()
        .unwrap();
    assert_eq!(query.sql, "SELECT * FROM `people` WHERE `given_name` = ?;");

    // Handles with their own registry are not affected.
    let query = db().select::<TestModel>().build().unwrap();
    assert_eq!(query.sql, "SELECT * FROM `test_model`;");
}
