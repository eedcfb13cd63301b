//! Realtime synchronization of room sensor feeds.
//!
//! The [`SyncEngine`] subscribes to per-room remote feeds and, on each
//! inbound snapshot, writes to the local cache, evaluates thresholds,
//! pushes resulting alerts into the notification store, publishes a
//! process-wide [`SyncStatus`] and invokes the room's data callback.
//!
//! Feed failures are recovered with a linear backoff (5 s, 10 s, 15 s by
//! default); once the retry budget is exhausted the engine waits for
//! connectivity to return. The retry timer is an explicit, tracked,
//! cancellable task - it is cleared on reconnection, on shutdown, and when
//! the last room is stopped, so a timer never fires for rooms nobody
//! watches anymore.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokio::sync::Mutex;
//! use roomsense_core::{MockFeed, NotificationStore, SyncEngine};
//! use roomsense_store::SnapshotCache;
//!
//! # async fn example() -> roomsense_core::Result<()> {
//! let feed = Arc::new(MockFeed::new());
//! let cache = Arc::new(Mutex::new(SnapshotCache::open_default()?));
//! let notifications = Arc::new(NotificationStore::new());
//!
//! let engine = Arc::new(SyncEngine::new(feed, cache, notifications));
//! engine
//!     .start_sync("b204", |snapshot| println!("CO2: {} ppm", snapshot.co2))
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use tokio::sync::{watch, Mutex};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use roomsense_store::SnapshotCache;
use roomsense_types::{now_ms, SensorSnapshot, SyncState, SyncStatus};

use crate::error::{Error, Result};
use crate::feed::RoomFeed;
use crate::notifications::NotificationStore;
use crate::notify::{alert_notice, raise, NotificationSurface};
use crate::thresholds::Thresholds;

/// Callback invoked with each snapshot delivered for a room.
pub type OnData = Arc<dyn Fn(SensorSnapshot) + Send + Sync>;

/// Options for the sync engine.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Maximum automatic retries after feed errors. Once exhausted, the
    /// engine stops retrying until connectivity returns.
    pub max_retries: u32,
    /// Base step of the linear backoff; attempt `n` waits `n * retry_step`.
    pub retry_step: Duration,
    /// How far back the cache is searched when replaying a snapshot after
    /// reconnection.
    pub replay_window: Duration,
    /// Status message published when connectivity is lost.
    pub offline_message: String,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_step: Duration::from_secs(5),
            replay_window: Duration::from_secs(24 * 60 * 60),
            offline_message: "internet connection lost".to_string(),
        }
    }
}

impl SyncOptions {
    /// Delay before retry attempt `attempt` (1-based).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.retry_step * attempt
    }

    /// Validate the options and return an error if invalid.
    ///
    /// Checks that:
    /// - `retry_step` is > 0
    /// - `replay_window` is > 0
    pub fn validate(&self) -> Result<()> {
        if self.retry_step.is_zero() {
            return Err(Error::invalid_config("retry_step must be > 0".to_string()));
        }
        if self.replay_window.is_zero() {
            return Err(Error::invalid_config(
                "replay_window must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Bookkeeping for one watched room.
struct RoomWatch {
    on_data: OnData,
    cancel: CancellationToken,
    task: Option<tokio::task::JoinHandle<()>>,
}

/// A scheduled, cancellable retry.
struct RetryTimer {
    cancel: CancellationToken,
    task: tokio::task::JoinHandle<()>,
}

/// Engine that keeps per-room feed subscriptions alive and runs the
/// cache/evaluate/notify pipeline on every inbound snapshot.
///
/// One engine instance owns the room map, the retry counter and the retry
/// timer; nothing else mutates them.
pub struct SyncEngine {
    feed: Arc<dyn RoomFeed>,
    cache: Arc<Mutex<SnapshotCache>>,
    notifications: Arc<NotificationStore>,
    thresholds: Thresholds,
    surface: Option<Arc<dyn NotificationSurface>>,
    options: SyncOptions,
    rooms: Mutex<HashMap<String, RoomWatch>>,
    status_tx: watch::Sender<SyncStatus>,
    retry_count: AtomicU32,
    retry_timer: Mutex<Option<RetryTimer>>,
}

impl SyncEngine {
    /// Create an engine with default thresholds and options.
    pub fn new(
        feed: Arc<dyn RoomFeed>,
        cache: Arc<Mutex<SnapshotCache>>,
        notifications: Arc<NotificationStore>,
    ) -> Self {
        let (status_tx, _rx) = watch::channel(SyncStatus::default());
        Self {
            feed,
            cache,
            notifications,
            thresholds: Thresholds::default(),
            surface: None,
            options: SyncOptions::default(),
            rooms: Mutex::new(HashMap::new()),
            status_tx,
            retry_count: AtomicU32::new(0),
            retry_timer: Mutex::new(None),
        }
    }

    /// Replace the sync options.
    #[must_use]
    pub fn with_options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the threshold evaluator.
    #[must_use]
    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Attach a notification surface for user-facing alert notices.
    #[must_use]
    pub fn with_surface(mut self, surface: Arc<dyn NotificationSurface>) -> Self {
        self.surface = Some(surface);
        self
    }

    /// Start watching a room.
    ///
    /// Idempotent per room: a second call for a room already being watched
    /// is a no-op, so a feed tick never triggers duplicate cache writes.
    /// A failing subscription is not an error here - it enters the same
    /// status/retry path as any other feed failure, and the room stays
    /// registered so re-arming picks it up.
    pub async fn start_sync<F>(self: &Arc<Self>, room_id: &str, on_data: F) -> Result<()>
    where
        F: Fn(SensorSnapshot) + Send + Sync + 'static,
    {
        {
            let mut rooms = self.rooms.lock().await;
            if rooms.contains_key(room_id) {
                debug!("Already watching {}", room_id);
                return Ok(());
            }
            rooms.insert(
                room_id.to_string(),
                RoomWatch {
                    on_data: Arc::new(on_data),
                    cancel: CancellationToken::new(),
                    task: None,
                },
            );
        }

        info!("Watching {}", room_id);
        self.arm(room_id).await;
        Ok(())
    }

    /// Stop watching a room. Idempotent if the room is not being watched.
    ///
    /// Cancels future delivery; an in-flight tick past its suspension point
    /// still completes. Stopping the last room also clears any pending
    /// retry timer, so it cannot fire for rooms nobody watches.
    pub async fn stop_sync(&self, room_id: &str) {
        let (removed, empty) = {
            let mut rooms = self.rooms.lock().await;
            let removed = rooms.remove(room_id);
            (removed, rooms.is_empty())
        };

        if let Some(entry) = removed {
            entry.cancel.cancel();
            info!("Stopped watching {}", room_id);
        }

        if empty {
            self.cancel_retry_timer().await;
        }
    }

    /// Connectivity returned: reset the retry counter, cancel any pending
    /// retry and re-arm every room, replaying the freshest cached snapshot
    /// so consumers see a value before the next feed tick.
    pub async fn handle_online(self: &Arc<Self>) {
        info!("Connectivity restored");
        self.retry_count.store(0, Ordering::SeqCst);
        self.cancel_retry_timer().await;
        self.resync().await;
    }

    /// Connectivity lost: publish the fixed offline status. Independent of
    /// the retry logic.
    pub async fn handle_offline(&self) {
        let message = self.options.offline_message.clone();
        self.publish_offline(message);
    }

    /// Stop everything: retry timer and all room tasks.
    pub async fn shutdown(&self) {
        self.cancel_retry_timer().await;
        let mut rooms = self.rooms.lock().await;
        for (room_id, entry) in rooms.drain() {
            debug!("Shutting down watch for {}", room_id);
            entry.cancel.cancel();
        }
    }

    /// Subscribe to sync status transitions.
    pub fn subscribe_status(&self) -> watch::Receiver<SyncStatus> {
        self.status_tx.subscribe()
    }

    /// The current sync status.
    pub fn current_status(&self) -> SyncStatus {
        self.status_tx.borrow().clone()
    }

    /// Rooms currently being watched.
    pub async fn watched_rooms(&self) -> Vec<String> {
        self.rooms.lock().await.keys().cloned().collect()
    }

    /// Whether a room is currently being watched.
    pub async fn is_watching(&self, room_id: &str) -> bool {
        self.rooms.lock().await.contains_key(room_id)
    }

    /// Number of retry attempts made since the last connectivity reset.
    pub fn retry_attempts(&self) -> u32 {
        self.retry_count.load(Ordering::SeqCst)
    }

    /// Whether a retry is currently scheduled.
    pub async fn retry_pending(&self) -> bool {
        self.retry_timer
            .lock()
            .await
            .as_ref()
            .map(|timer| !timer.task.is_finished())
            .unwrap_or(false)
    }

    /// (Re)subscribe a room and spawn its pump task, replacing any
    /// previous one.
    async fn arm(self: &Arc<Self>, room_id: &str) {
        let (on_data, cancel) = {
            let mut rooms = self.rooms.lock().await;
            let Some(entry) = rooms.get_mut(room_id) else {
                return;
            };
            entry.cancel.cancel();
            if let Some(old) = entry.task.take() {
                if !old.is_finished() {
                    debug!("Replacing live watch task for {}", room_id);
                }
            }
            entry.cancel = CancellationToken::new();
            (entry.on_data.clone(), entry.cancel.clone())
        };

        let engine = Arc::clone(self);
        let room = room_id.to_string();
        let task = tokio::spawn(async move {
            engine.pump(room, on_data, cancel).await;
        });

        let mut rooms = self.rooms.lock().await;
        if let Some(entry) = rooms.get_mut(room_id) {
            entry.task = Some(task);
        } else {
            // Room was stopped while we were arming it
            task.abort();
        }
    }

    /// Per-room consumption loop.
    async fn pump(self: Arc<Self>, room_id: String, on_data: OnData, cancel: CancellationToken) {
        let mut sub = match self.feed.subscribe(&room_id).await {
            Ok(sub) => sub,
            Err(e) => {
                warn!("Subscribing to {} failed: {}", room_id, e);
                self.handle_sync_error(&e.to_string()).await;
                return;
            }
        };

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Watch for {} cancelled", room_id);
                    return;
                }
                item = sub.next() => match item {
                    Some(Ok(snapshot)) => {
                        if let Err(e) = self.process_tick(&room_id, &on_data, snapshot).await {
                            warn!("Sync tick for {} failed: {}", room_id, e);
                            self.handle_sync_error(&e.to_string()).await;
                        }
                    }
                    Some(Err(e)) => {
                        warn!("Feed error for {}: {}", room_id, e);
                        self.handle_sync_error(&e.to_string()).await;
                        return;
                    }
                    None => {
                        warn!("Feed for {} ended", room_id);
                        self.handle_sync_error("room feed ended").await;
                        return;
                    }
                }
            }
        }
    }

    /// One inbound snapshot: cache, evaluate, notify, publish, deliver.
    async fn process_tick(
        &self,
        room_id: &str,
        on_data: &OnData,
        snapshot: SensorSnapshot,
    ) -> Result<()> {
        {
            let cache = self.cache.lock().await;
            cache.put(room_id, &snapshot)?;
        }

        let alerts = self.thresholds.evaluate(room_id, &snapshot);
        if !alerts.is_empty() {
            debug!("{} alert(s) for {}", alerts.len(), room_id);
            for alert in &alerts {
                let _ = self.notifications.add(alert.clone()).await;
            }
            if let Some(surface) = &self.surface {
                if let Some(notice) = alert_notice(&alerts) {
                    raise(surface.as_ref(), &notice).await;
                }
            }
        }

        self.status_tx.send_replace(SyncStatus {
            state: SyncState::Online,
            last_sync_at: Some(OffsetDateTime::now_utc()),
            error: None,
        });

        (on_data)(snapshot);
        Ok(())
    }

    /// Error path shared by feed failures and failed ticks.
    async fn handle_sync_error(self: &Arc<Self>, message: &str) {
        self.publish_offline(message.to_string());

        let count = self.retry_count.load(Ordering::SeqCst);
        if count < self.options.max_retries {
            let attempt = count + 1;
            self.retry_count.store(attempt, Ordering::SeqCst);
            self.schedule_retry(attempt).await;
        } else {
            debug!("Retry budget exhausted; waiting for connectivity");
        }
    }

    /// Replace the pending retry timer with one firing after the backoff
    /// delay for `attempt`.
    async fn schedule_retry(self: &Arc<Self>, attempt: u32) {
        let delay = self.options.delay_for_attempt(attempt);
        info!("Scheduling sync retry {} in {:?}", attempt, delay);

        let token = CancellationToken::new();
        let task_token = token.clone();
        let engine = Arc::clone(self);
        let task = tokio::spawn(async move {
            tokio::select! {
                _ = task_token.cancelled() => {}
                _ = sleep(delay) => {
                    engine.resync().await;
                }
            }
        });

        let mut timer = self.retry_timer.lock().await;
        if let Some(old) = timer.take() {
            old.cancel.cancel();
        }
        *timer = Some(RetryTimer {
            cancel: token,
            task,
        });
    }

    async fn cancel_retry_timer(&self) {
        if let Some(timer) = self.retry_timer.lock().await.take() {
            timer.cancel.cancel();
        }
    }

    /// Re-arm every registered room and replay the freshest cached
    /// snapshot within the replay window.
    fn resync(
        self: &Arc<Self>,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            self.status_tx.send_modify(|status| {
                status.state = SyncState::Syncing;
                status.error = None;
            });

            let room_ids: Vec<String> = self.rooms.lock().await.keys().cloned().collect();
            for room_id in room_ids {
                self.arm(&room_id).await;
                self.replay_cached(&room_id).await;
            }
        })
    }

    /// Deliver the most recent cached snapshot (if fresh enough) to a
    /// room's callback, so consumers see a value before the next tick.
    async fn replay_cached(&self, room_id: &str) {
        let from = now_ms() - self.options.replay_window.as_millis() as i64;
        let cached = {
            let cache = self.cache.lock().await;
            cache.latest_since(room_id, from)
        };

        match cached {
            Ok(Some(snapshot)) => {
                let on_data = {
                    let rooms = self.rooms.lock().await;
                    rooms.get(room_id).map(|entry| entry.on_data.clone())
                };
                if let Some(on_data) = on_data {
                    debug!("Replaying cached snapshot for {}", room_id);
                    (on_data)(snapshot);
                }
            }
            Ok(None) => {}
            Err(e) => warn!("Cache replay for {} failed: {}", room_id, e),
        }
    }

    fn publish_offline(&self, message: String) {
        // last_sync_at keeps the time of the last successful tick
        self.status_tx.send_modify(|status| {
            status.state = SyncState::Offline;
            status.error = Some(message);
        });
    }
}
