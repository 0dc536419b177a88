//! Realtime change notifications
//!
//! Stores publish committed row changes into a [`ChangeFeed`]. Callers
//! register callbacks scoped by table and an optional `column = value` row
//! filter, and get back a [`Subscription`] that stops delivery when
//! unsubscribed or dropped.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Tables that emit change events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeTable {
    GroupBuys,
    GroupParticipants,
}

impl ChangeTable {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeTable::GroupBuys => "group_buys",
            ChangeTable::GroupParticipants => "group_participants",
        }
    }
}

impl fmt::Display for ChangeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// One committed row change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: ChangeTable,
    pub kind: ChangeKind,
    pub record: serde_json::Value,
}

impl ChangeEvent {
    pub fn new<T: Serialize>(table: ChangeTable, kind: ChangeKind, record: &T) -> crate::Result<Self> {
        Ok(Self {
            table,
            kind,
            record: serde_json::to_value(record)?,
        })
    }
}

/// Equality predicate on one column of the changed row
#[derive(Debug, Clone, PartialEq)]
pub struct RowFilter {
    pub column: String,
    pub value: String,
}

impl RowFilter {
    pub fn eq(column: impl Into<String>, value: impl ToString) -> Self {
        Self {
            column: column.into(),
            value: value.to_string(),
        }
    }

    fn matches(&self, record: &serde_json::Value) -> bool {
        match record.get(&self.column) {
            Some(serde_json::Value::String(s)) => *s == self.value,
            Some(serde_json::Value::Null) | None => false,
            Some(other) => other.to_string() == self.value,
        }
    }
}

/// Which events a subscription receives
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeFilter {
    pub table: ChangeTable,
    pub row: Option<RowFilter>,
}

impl ChangeFilter {
    pub fn table(table: ChangeTable) -> Self {
        Self { table, row: None }
    }

    pub fn with_row(mut self, row: RowFilter) -> Self {
        self.row = Some(row);
        self
    }

    pub fn matches(&self, event: &ChangeEvent) -> bool {
        event.table == self.table && self.row.as_ref().map_or(true, |row| row.matches(&event.record))
    }
}

/// Fan-out point for committed changes
#[derive(Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event; having no subscribers is not an error
    pub fn publish(&self, event: ChangeEvent) {
        let receivers = self.sender.send(event).unwrap_or(0);
        debug!(receivers = receivers, "Change event published");
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Invoke `callback` for every future event matching `filter`
    ///
    /// # Panics
    ///
    /// Spawns the delivery task, so it panics outside a tokio runtime.
    pub fn subscribe<F>(&self, filter: ChangeFilter, callback: F) -> Subscription
    where
        F: Fn(ChangeEvent) + Send + Sync + 'static,
    {
        let mut receiver = self.sender.subscribe();
        let table = filter.table;

        let task = tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        if filter.matches(&event) {
                            callback(event);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(table = %filter.table, skipped = skipped, "Subscriber lagged, change events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        debug!(table = %table, "Change subscription registered");
        Subscription { task: Some(task) }
    }
}

impl fmt::Debug for ChangeFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeFeed")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Handle returned by subscription calls
#[derive(Debug)]
pub struct Subscription {
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Stop delivering events to the callback
    pub fn unsubscribe(mut self) {
        self.stop();
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().map_or(false, |task| !task.is_finished())
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.stop();
    }
}
