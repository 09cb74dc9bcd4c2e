#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use oxide_mapper::{
    AccessorKind, BufferedRows, Db, Error, ExecResult, Executor, Model, Query, Result, SqlValue,
};

#[derive(Debug, Default, Clone, PartialEq, Model)]
pub struct TestModel {
    pub id: i64,
    pub first_name: String,
    pub age: i8,
    pub last_name: Option<String>,
}

/// Plays the database: hands out queued row sets and exec results, and
/// records every statement it receives.
#[derive(Debug, Default)]
pub struct MockExecutor {
    rows: Mutex<VecDeque<BufferedRows>>,
    results: Mutex<VecDeque<ExecResult>>,
    seen: Mutex<Vec<Query>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(self, rows: BufferedRows) -> Self {
        self.rows.lock().unwrap().push_back(rows);
        self
    }

    pub fn with_result(self, result: ExecResult) -> Self {
        self.results.lock().unwrap().push_back(result);
        self
    }

    pub fn seen(&self) -> Vec<Query> {
        self.seen.lock().unwrap().clone()
    }
}

impl Executor for MockExecutor {
    type Rows = BufferedRows;

    async fn execute(&self, query: &Query) -> Result<ExecResult> {
        self.seen.lock().unwrap().push(query.clone());
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::driver("unexpected exec"))
    }

    async fn query(&self, query: &Query) -> Result<BufferedRows> {
        self.seen.lock().unwrap().push(query.clone());
        self.rows
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::driver("unexpected query"))
    }
}

/// Routes mapper logs to the test output. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

pub fn db() -> Db<MockExecutor> {
    Db::new(MockExecutor::new())
}

pub fn db_with(executor: MockExecutor, accessor: AccessorKind) -> Db<MockExecutor> {
    Db::new(executor).with_accessor(accessor)
}

pub fn text(s: &str) -> SqlValue {
    SqlValue::Text(String::from(s))
}

pub fn bytes(s: &str) -> SqlValue {
    SqlValue::Blob(s.as_bytes().to_vec())
}

pub fn tom() -> TestModel {
    TestModel {
        id: 12,
        first_name: String::from("Tom"),
        age: 18,
        last_name: Some(String::from("Jerry")),
    }
}
