//! Fire-and-forget audit trail.
//!
//! Services hand an [`AuditEntry`] to an [`AuditSink`] after their transaction
//! commits. A sink must never block or fail the business operation, so
//! delivery problems are only logged.

use chrono::{NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;

/// Caller identity, already verified upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub id: String,
    pub role: Option<String>,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Option<String>) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }

    /// Identity used by maintenance jobs.
    pub fn system() -> Self {
        Self::new("system", Some("system".to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub actor: Actor,
    pub action: AuditAction,
    pub resource_type: &'static str,
    pub resource_id: String,
    pub before: Option<Value>,
    pub after: Option<Value>,
    pub at: NaiveDateTime,
}

impl AuditEntry {
    pub fn new(
        actor: &Actor,
        action: AuditAction,
        resource_type: &'static str,
        resource_id: impl ToString,
    ) -> Self {
        Self {
            actor: actor.clone(),
            action,
            resource_type,
            resource_id: resource_id.to_string(),
            before: None,
            after: None,
            at: Utc::now().naive_utc(),
        }
    }

    pub fn before<T: Serialize>(mut self, value: &T) -> Self {
        self.before = serde_json::to_value(value).ok();
        self
    }

    pub fn after<T: Serialize>(mut self, value: &T) -> Self {
        self.after = serde_json::to_value(value).ok();
        self
    }
}

pub trait AuditSink: Send + Sync {
    fn record(&self, entry: AuditEntry);
}

/// Queues entries on a bounded channel drained by a background task.
#[derive(Clone)]
pub struct ChannelAuditSink {
    tx: mpsc::Sender<AuditEntry>,
}

impl ChannelAuditSink {
    /// Must be called from inside a tokio runtime.
    pub fn spawn(buffer: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<AuditEntry>(buffer.max(1));

        tokio::spawn(async move {
            while let Some(entry) = rx.recv().await {
                let payload = serde_json::to_string(&entry).unwrap_or_default();
                tracing::info!(
                    target: "audit",
                    actor = %entry.actor.id,
                    action = ?entry.action,
                    resource_type = entry.resource_type,
                    resource_id = %entry.resource_id,
                    payload = %payload,
                    "audit entry"
                );
            }
            tracing::debug!("audit channel closed");
        });

        Self { tx }
    }
}

impl AuditSink for ChannelAuditSink {
    fn record(&self, entry: AuditEntry) {
        if let Err(err) = self.tx.try_send(entry) {
            tracing::warn!("dropping audit entry: {}", err);
        }
    }
}

/// Keeps entries in memory, used by tests to assert on emitted audit events.
#[derive(Default)]
pub struct MemoryAuditSink {
    entries: std::sync::Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditSink {
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, entry: AuditEntry) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry);
        }
    }
}
