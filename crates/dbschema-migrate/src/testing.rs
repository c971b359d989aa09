//! Scripted transport for tests.
//!
//! [`ScriptedConnection`] answers queries by substring match against a list
//! of canned responses and records every statement it sees, so
//! introspectors, synthesizers and the orchestrator can be exercised without
//! a live database.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::config::DbConfig;
use crate::core::traits::{Connection, Connector};
use crate::core::value::Row;
use crate::error::{MigrateError, Result};

#[derive(Debug, Clone)]
enum Reply {
    Rows(Vec<Row>),
    Fail(String),
}

#[derive(Debug, Default)]
struct Script {
    queries: Vec<(String, Reply)>,
    executes: Vec<(String, String)>,
    log: Vec<String>,
}

fn lock(m: &Mutex<Script>) -> MutexGuard<'_, Script> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A fake connection driven by substring rules.
#[derive(Debug)]
pub struct ScriptedConnection {
    name: String,
    dialect: String,
    script: Mutex<Script>,
    closed: AtomicBool,
}

impl ScriptedConnection {
    pub fn new(name: impl Into<String>, dialect: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dialect: dialect.into(),
            script: Mutex::new(Script::default()),
            closed: AtomicBool::new(false),
        }
    }

    /// Answer any query containing `needle` with `rows`. Earlier rules win.
    pub fn on_query(self, needle: impl Into<String>, rows: Vec<Row>) -> Self {
        lock(&self.script)
            .queries
            .push((needle.into(), Reply::Rows(rows)));
        self
    }

    /// Fail any query containing `needle`.
    pub fn fail_query(self, needle: impl Into<String>, message: impl Into<String>) -> Self {
        lock(&self.script)
            .queries
            .push((needle.into(), Reply::Fail(message.into())));
        self
    }

    /// Fail any statement containing `needle`.
    pub fn fail_execute(self, needle: impl Into<String>, message: impl Into<String>) -> Self {
        lock(&self.script)
            .executes
            .push((needle.into(), message.into()));
        self
    }

    /// Every statement and query seen so far, in order.
    pub fn log(&self) -> Vec<String> {
        lock(&self.script).log.clone()
    }

    /// Statements passed to `execute`, in order.
    pub fn executed(&self) -> Vec<String> {
        lock(&self.script)
            .log
            .iter()
            .filter_map(|s| s.strip_prefix("EXEC ").map(str::to_string))
            .collect()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Build a row from `(label, value)` string pairs.
pub fn row(pairs: &[(&str, &str)]) -> Row {
    Row::from_pairs(pairs.iter().map(|(k, v)| (*k, Some(*v))))
}

#[async_trait]
impl Connection for ScriptedConnection {
    fn name(&self) -> &str {
        &self.name
    }

    fn dialect(&self) -> &str {
        &self.dialect
    }

    async fn execute(&self, sql: &str) -> Result<u64> {
        let mut script = lock(&self.script);
        script.log.push(format!("EXEC {}", sql));
        if let Some((_, msg)) = script.executes.iter().find(|(n, _)| sql.contains(n.as_str())) {
            return Err(MigrateError::query(&self.dialect, msg));
        }
        Ok(0)
    }

    async fn query(&self, sql: &str) -> Result<Vec<Row>> {
        let mut script = lock(&self.script);
        script.log.push(format!("QUERY {}", sql));
        match script.queries.iter().find(|(n, _)| sql.contains(n.as_str())) {
            Some((_, Reply::Rows(rows))) => Ok(rows.clone()),
            Some((_, Reply::Fail(msg))) => Err(MigrateError::query(&self.dialect, msg)),
            None => Ok(Vec::new()),
        }
    }

    async fn ping(&self) -> Result<()> {
        if self.is_closed() {
            return Err(MigrateError::connection(&self.name, "connection is closed"));
        }
        Ok(())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Hands out one prepared connection and counts how often it was asked.
pub struct ScriptedConnector {
    conn: Arc<ScriptedConnection>,
    connects: AtomicUsize,
    gate: Option<Arc<Notify>>,
}

impl ScriptedConnector {
    pub fn new(conn: Arc<ScriptedConnection>) -> Self {
        Self {
            conn,
            connects: AtomicUsize::new(0),
            gate: None,
        }
    }

    /// Hold every connect until `gate` is notified.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, _config: &DbConfig) -> Result<Arc<dyn Connection>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        Ok(self.conn.clone())
    }
}

/// A connector that always fails, for connection-error paths.
pub struct FailingConnector(pub String);

#[async_trait]
impl Connector for FailingConnector {
    async fn connect(&self, config: &DbConfig) -> Result<Arc<dyn Connection>> {
        Err(MigrateError::connection(&config.db_name, &self.0))
    }
}
