//! Append-only audit trail of executed steps.
//!
//! Records are written as JSON lines, by default under
//! `%LOCALAPPDATA%\deskpilot\audit.jsonl`. Writing is best effort: a failing
//! sink is logged and never fails the plan.

use crate::plan::{StepResult, StepStatus};
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, error, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: String,
    pub action: String,
    pub args: Map<String, Value>,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub user: String,
    pub duration_ms: u64,
}

impl AuditRecord {
    pub fn from_result(result: &StepResult, duration_ms: u64) -> Self {
        Self {
            timestamp: Local::now().to_rfc3339(),
            action: result.action.clone(),
            args: result.args.clone(),
            status: result.status,
            output: (!result.output.is_null()).then(|| result.output.clone()),
            error: result.error.clone(),
            user: current_user(),
            duration_ms,
        }
    }
}

fn current_user() -> String {
    std::env::var("USERNAME")
        .or_else(|_| std::env::var("USER"))
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Receives one record per executed step.
pub trait AuditSink: Send + Sync {
    fn record(&self, record: &AuditRecord);
}

/// JSON-lines file sink.
pub struct JsonlAuditLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonlAuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if let Some(dir) = path.parent() {
            if let Err(e) = fs::create_dir_all(dir) {
                error!("[audit] Failed to create {}: {}", dir.display(), e);
            }
        }
        info!("[audit] Audit records will be written to: {}", path.display());
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back every record, skipping lines that do not parse.
    pub fn read_all(&self) -> std::io::Result<Vec<AuditRecord>> {
        let raw = fs::read_to_string(&self.path)?;
        Ok(raw
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect())
    }

    fn append(&self, record: &AuditRecord) -> std::io::Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())
    }
}

impl AuditSink for JsonlAuditLog {
    fn record(&self, record: &AuditRecord) {
        match self.append(record) {
            Ok(()) => debug!("[audit] {} -> {:?}", record.action, record.status),
            Err(e) => error!("[audit] Failed to write {}: {}", self.path.display(), e),
        }
    }
}
