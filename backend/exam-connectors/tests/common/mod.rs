#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use exam_connectors::{
    models::{AnswerKey, RawLogEntry, SqlRow, SqlValue, TaskRef},
    services::{ObjectSource, SqlExecutor},
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub fn log(task: i64, num: i64, answer: &str, date: &str, user: &str) -> RawLogEntry {
    RawLogEntry {
        task: TaskRef::Number(task),
        num: num.into(),
        answer: Some(answer.to_string()),
        date: date.to_string(),
        username: Some(user.to_string()),
    }
}

pub fn answer_key(entries: &[(&str, i64, &str)]) -> AnswerKey {
    let mut key = AnswerKey::new();
    for (task, num, answer) in entries {
        key.insert(*task, *num, *answer);
    }
    key
}

/// Object storage stand-in backed by a map.
#[derive(Default)]
pub struct MemoryStorage {
    objects: HashMap<String, Vec<u8>>,
}

impl MemoryStorage {
    pub fn with_object(mut self, key: &str, body: &str) -> Self {
        self.objects.insert(key.to_string(), body.as_bytes().to_vec());
        self
    }
}

#[async_trait]
impl ObjectSource for MemoryStorage {
    async fn get_object(&self, key: &str) -> Result<Vec<u8>> {
        self.objects
            .get(key)
            .cloned()
            .ok_or_else(|| anyhow!("NoSuchKey: {}", key))
    }
}

/// What a [`FakeExecutor`] saw, shared with the test after the executor is
/// moved into a repository.
#[derive(Clone, Default)]
pub struct Journal {
    statements: Arc<Mutex<Vec<(String, Vec<SqlValue>)>>>,
    closed: Arc<AtomicBool>,
}

impl Journal {
    pub fn statements(&self) -> Vec<(String, Vec<SqlValue>)> {
        self.statements.lock().unwrap().clone()
    }

    pub fn closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Keeps `Main` rows in memory; a row matches a query when its values equal
/// the bound parameters.
pub struct FakeExecutor {
    rows: Vec<SqlRow>,
    fail_queries: bool,
    journal: Journal,
}

impl FakeExecutor {
    pub fn new(journal: Journal) -> Self {
        Self {
            rows: Vec::new(),
            fail_queries: false,
            journal,
        }
    }

    pub fn with_row(mut self, student: i64, subject: i64, variant: i64, num: i64) -> Self {
        self.rows.push(vec![
            SqlValue::Int(student),
            SqlValue::Int(subject),
            SqlValue::Int(variant),
            SqlValue::Int(num),
        ]);
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_queries = true;
        self
    }

    fn record(&self, sql: &str, params: &[SqlValue]) {
        self.journal
            .statements
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
    }
}

#[async_trait]
impl SqlExecutor for FakeExecutor {
    async fn execute_query(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<SqlRow>> {
        self.record(sql, params);
        if self.fail_queries {
            return Err(anyhow!("Lost connection to MySQL server during query"));
        }
        Ok(self
            .rows
            .iter()
            .filter(|row| row.as_slice() == params)
            .cloned()
            .collect())
    }

    async fn execute_commit(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        self.record(sql, params);
        if self.fail_queries {
            return Err(anyhow!("Lost connection to MySQL server during query"));
        }
        self.rows.push(params.to_vec());
        Ok(1)
    }

    async fn close(self) -> Result<()> {
        self.journal.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
