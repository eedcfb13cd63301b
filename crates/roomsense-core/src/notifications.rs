//! Observable notification store with read/unread and soft-delete state.
//!
//! The store owns every [`NotificationRecord`] in the process. Observers
//! subscribe through a watch channel and receive the current non-deleted
//! record set, ordered newest first, on every mutation - push-based
//! observation rather than polling.
//!
//! Inserts are deduplicated: a descriptor for a room and metric that
//! already has a non-deleted record within the dedup window is suppressed.

use tokio::sync::{watch, RwLock};
use tracing::debug;
use uuid::Uuid;

use roomsense_types::{AlertDescriptor, NotificationRecord};

/// Configuration for the notification store.
#[derive(Debug, Clone)]
pub struct NotificationStoreConfig {
    /// Two alerts for the same room and metric closer together than this
    /// are considered duplicates. Default: 5 minutes. An adjustable
    /// parameter, not a tuned invariant.
    pub dedup_window_ms: i64,
}

impl Default for NotificationStoreConfig {
    fn default() -> Self {
        Self {
            dedup_window_ms: 300_000,
        }
    }
}

/// Observable collection of alert notifications.
///
/// Construct one per process and share it behind an `Arc`; there is no
/// module-level singleton.
pub struct NotificationStore {
    config: NotificationStoreConfig,
    /// Full record set, including soft-deleted records.
    records: RwLock<Vec<NotificationRecord>>,
    /// Publishes the visible (non-deleted, newest-first) view.
    tx: watch::Sender<Vec<NotificationRecord>>,
}

impl NotificationStore {
    /// Create a store with default configuration.
    pub fn new() -> Self {
        Self::with_config(NotificationStoreConfig::default())
    }

    /// Create a store with custom configuration.
    pub fn with_config(config: NotificationStoreConfig) -> Self {
        let (tx, _rx) = watch::channel(Vec::new());
        Self {
            config,
            records: RwLock::new(Vec::new()),
            tx,
        }
    }

    /// Insert a notification for an alert, unless a duplicate exists.
    ///
    /// A duplicate is a non-deleted record for the same room and metric
    /// whose timestamp is within the dedup window of the descriptor's.
    /// Returns the generated id, or `None` if the insert was suppressed.
    pub async fn add(&self, alert: AlertDescriptor) -> Option<String> {
        let mut records = self.records.write().await;

        let duplicate = records.iter().any(|r| {
            !r.is_deleted
                && r.room_id == alert.room_id
                && r.metric == alert.metric
                && (r.timestamp - alert.timestamp).abs() < self.config.dedup_window_ms
        });

        if duplicate {
            debug!(
                "Suppressing duplicate {} notification for {}",
                alert.metric, alert.room_id
            );
            return None;
        }

        let id = Uuid::new_v4().to_string();
        records.push(NotificationRecord::from_alert(id.clone(), alert));
        self.publish(&records);
        Some(id)
    }

    /// Mark a notification as read. No-op if the id is unknown.
    pub async fn mark_as_read(&self, id: &str) {
        let mut records = self.records.write().await;
        if let Some(record) = records.iter_mut().find(|r| r.id == id) {
            record.is_read = true;
            self.publish(&records);
        }
    }

    /// Mark all non-deleted notifications as read.
    pub async fn mark_all_as_read(&self) {
        let mut records = self.records.write().await;
        for record in records.iter_mut().filter(|r| !r.is_deleted) {
            record.is_read = true;
        }
        self.publish(&records);
    }

    /// Soft-delete a notification. The record stays in storage but is
    /// excluded from every read view. No-op if the id is unknown.
    pub async fn delete(&self, id: &str) {
        let mut records = self.records.write().await;
        if let Some(record) = records.iter_mut().find(|r| r.id == id) {
            record.is_deleted = true;
            self.publish(&records);
        }
    }

    /// Subscribe to the visible record set.
    ///
    /// The receiver holds the current set immediately and is notified on
    /// every subsequent mutation.
    pub fn subscribe(&self) -> watch::Receiver<Vec<NotificationRecord>> {
        self.tx.subscribe()
    }

    /// The current visible record set: non-deleted, newest first.
    pub fn visible(&self) -> Vec<NotificationRecord> {
        self.tx.borrow().clone()
    }

    /// Number of visible unread notifications.
    pub fn unread_count(&self) -> usize {
        self.tx.borrow().iter().filter(|r| !r.is_read).count()
    }

    /// Total number of stored records, including soft-deleted ones.
    pub async fn stored_count(&self) -> usize {
        self.records.read().await.len()
    }

    fn publish(&self, records: &[NotificationRecord]) {
        let mut visible: Vec<NotificationRecord> =
            records.iter().filter(|r| !r.is_deleted).cloned().collect();
        visible.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        self.tx.send_replace(visible);
    }
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new()
    }
}
