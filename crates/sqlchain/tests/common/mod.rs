//! In-memory executor that records every statement it is handed.

#![allow(dead_code)]

use sqlchain::{Bindings, Dialect, Executor, QbError, QbResult, Row};
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub struct Call {
    pub sql: String,
    pub bindings: Bindings,
}

#[derive(Default)]
pub struct MockExecutor {
    dialect: Dialect,
    calls: Mutex<Vec<Call>>,
    responses: Mutex<VecDeque<QbResult<Vec<Row>>>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn postgres() -> Self {
        Self {
            dialect: Dialect::Postgres,
            ..Self::default()
        }
    }

    /// Queue rows for the next fetch. Unqueued fetches return no rows.
    pub fn respond(&self, rows: Vec<Row>) -> &Self {
        self.responses.lock().unwrap().push_back(Ok(rows));
        self
    }

    /// Make the next fetch fail.
    pub fn fail(&self, message: &str) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(QbError::execution(message)));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_sql(&self) -> String {
        self.calls
            .lock()
            .unwrap()
            .last()
            .map(|c| c.sql.clone())
            .unwrap_or_default()
    }

    fn record(&self, sql: &str, bindings: &Bindings) {
        self.calls.lock().unwrap().push(Call {
            sql: sql.to_string(),
            bindings: bindings.clone(),
        });
    }
}

impl Executor for MockExecutor {
    type Statement = String;

    fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn fetch_all(&self, sql: &str, bindings: &Bindings) -> QbResult<Vec<Row>> {
        self.record(sql, bindings);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn execute(&self, sql: &str, bindings: &Bindings) -> QbResult<u64> {
        self.record(sql, bindings);
        Ok(1)
    }

    async fn prepare(&self, sql: &str) -> QbResult<String> {
        Ok(sql.to_string())
    }
}
