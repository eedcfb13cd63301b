//! Integration tests for roomsense-core.
//!
//! These tests drive the full pipeline - mock feed, sync engine, in-memory
//! snapshot cache, notification store - on a paused tokio clock, so the
//! backoff timers fire deterministically.

use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::advance;

use roomsense_core::{MockFeed, NotificationStore, SyncEngine, SyncState};
use roomsense_store::SnapshotCache;
use roomsense_types::{now_ms, Metric, SensorSnapshot, Severity};

struct Harness {
    feed: Arc<MockFeed>,
    cache: Arc<Mutex<SnapshotCache>>,
    notifications: Arc<NotificationStore>,
    engine: Arc<SyncEngine>,
    received: Arc<StdMutex<Vec<SensorSnapshot>>>,
}

impl Harness {
    fn new() -> Self {
        let feed = Arc::new(MockFeed::new());
        let cache = Arc::new(Mutex::new(
            SnapshotCache::open_in_memory().expect("in-memory cache"),
        ));
        let notifications = Arc::new(NotificationStore::new());
        let engine = Arc::new(SyncEngine::new(
            Arc::clone(&feed) as Arc<dyn roomsense_core::RoomFeed>,
            Arc::clone(&cache),
            Arc::clone(&notifications),
        ));

        Self {
            feed,
            cache,
            notifications,
            engine,
            received: Arc::new(StdMutex::new(Vec::new())),
        }
    }

    async fn watch(&self, room_id: &str) {
        let received = Arc::clone(&self.received);
        self.engine
            .start_sync(room_id, move |snapshot| {
                received.lock().expect("received lock").push(snapshot);
            })
            .await
            .expect("start_sync");
        settle().await;
    }

    fn received(&self) -> Vec<SensorSnapshot> {
        self.received.lock().expect("received lock").clone()
    }
}

/// Let spawned tasks run to quiescence without advancing the clock.
async fn settle() {
    for _ in 0..25 {
        tokio::task::yield_now().await;
    }
}

fn snapshot(co2: f64, timestamp: i64) -> SensorSnapshot {
    SensorSnapshot::builder()
        .co2(co2)
        .temperature(22.0)
        .humidity(50.0)
        .timestamp(timestamp)
        .label("Test Room")
        .build()
}

#[tokio::test(start_paused = true)]
async fn tick_runs_cache_evaluate_notify_pipeline() {
    let h = Harness::new();
    h.watch("b204").await;

    let ts = now_ms();
    h.feed.push("b204", snapshot(1300.0, ts)).await;
    settle().await;

    // Cache write happened
    {
        let cache = h.cache.lock().await;
        assert_eq!(cache.count(Some("b204")).unwrap(), 1);
        assert!(cache.last_sync("b204").unwrap().is_some());
    }

    // CO2 1300 > 720 produced a critical notification
    let visible = h.notifications.visible();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].metric, Metric::Co2);
    assert_eq!(visible[0].severity, Severity::Critical);

    // Status went online with a sync time
    let status = h.engine.current_status();
    assert_eq!(status.state, SyncState::Online);
    assert!(status.last_sync_at.is_some());

    // Callback saw the snapshot
    assert_eq!(h.received().len(), 1);
    assert_eq!(h.received()[0].co2, 1300.0);
}

#[tokio::test(start_paused = true)]
async fn in_band_tick_raises_no_notification() {
    let h = Harness::new();
    h.watch("b204").await;

    h.feed.push("b204", snapshot(500.0, now_ms())).await;
    settle().await;

    assert!(h.notifications.visible().is_empty());
    assert_eq!(h.received().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn duplicate_alerts_within_window_collapse() {
    let h = Harness::new();
    h.watch("b204").await;

    let ts = now_ms();
    h.feed.push("b204", snapshot(900.0, ts)).await;
    h.feed.push("b204", snapshot(950.0, ts + 100_000)).await;
    settle().await;

    // Both ticks cached, one notification survives the 5-minute window
    assert_eq!(h.cache.lock().await.count(Some("b204")).unwrap(), 2);
    assert_eq!(h.notifications.visible().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn second_start_sync_does_not_duplicate_writes() {
    let h = Harness::new();
    h.watch("b204").await;
    h.watch("b204").await;

    assert_eq!(h.feed.subscription_count("b204").await, 1);

    h.feed.push("b204", snapshot(500.0, now_ms())).await;
    settle().await;

    // One subscription means one cache write per tick
    assert_eq!(h.cache.lock().await.count(Some("b204")).unwrap(), 1);
    assert_eq!(h.received().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn feed_errors_back_off_linearly_then_stop() {
    let h = Harness::new();
    h.watch("b204").await;
    assert_eq!(h.feed.total_subscribes(), 1);

    // First error: status offline, retry 1 scheduled at 5s
    h.feed.emit_error("b204", "backend unavailable").await;
    settle().await;
    assert_eq!(h.engine.current_status().state, SyncState::Offline);
    assert_eq!(h.engine.retry_attempts(), 1);
    assert!(h.engine.retry_pending().await);

    // Not yet: 4s in, the timer has not fired
    advance(Duration::from_secs(4)).await;
    settle().await;
    assert_eq!(h.feed.total_subscribes(), 1);

    // 5s reached: resubscribed, status syncing until the next tick
    advance(Duration::from_millis(1_100)).await;
    settle().await;
    assert_eq!(h.feed.total_subscribes(), 2);
    assert_eq!(h.engine.current_status().state, SyncState::Syncing);

    // Second error: retry 2 at 10s
    h.feed.emit_error("b204", "backend unavailable").await;
    settle().await;
    assert_eq!(h.engine.retry_attempts(), 2);
    advance(Duration::from_millis(10_100)).await;
    settle().await;
    assert_eq!(h.feed.total_subscribes(), 3);

    // Third error: retry 3 at 15s
    h.feed.emit_error("b204", "backend unavailable").await;
    settle().await;
    assert_eq!(h.engine.retry_attempts(), 3);
    advance(Duration::from_millis(15_100)).await;
    settle().await;
    assert_eq!(h.feed.total_subscribes(), 4);

    // Fourth error: budget exhausted, nothing further is scheduled
    h.feed.emit_error("b204", "backend unavailable").await;
    settle().await;
    assert_eq!(h.engine.retry_attempts(), 3);
    assert!(!h.engine.retry_pending().await);

    advance(Duration::from_secs(120)).await;
    settle().await;
    assert_eq!(h.feed.total_subscribes(), 4);
    assert_eq!(h.engine.current_status().state, SyncState::Offline);
}

#[tokio::test(start_paused = true)]
async fn online_event_resets_retries_and_replays_cache() {
    let h = Harness::new();

    // Seed the cache with a recent snapshot
    let cached_ts = now_ms() - 60_000;
    h.cache
        .lock()
        .await
        .put("b204", &snapshot(480.0, cached_ts))
        .unwrap();

    h.watch("b204").await;

    // Exhaust the retry budget
    for _ in 0..4 {
        h.feed.emit_error("b204", "backend unavailable").await;
        settle().await;
        advance(Duration::from_secs(20)).await;
        settle().await;
    }
    assert_eq!(h.engine.retry_attempts(), 3);

    let received_before = h.received().len();
    h.engine.handle_online().await;
    settle().await;

    // Counter reset, room re-armed, cached snapshot replayed to the callback
    assert_eq!(h.engine.retry_attempts(), 0);
    assert!(!h.engine.retry_pending().await);
    let received = h.received();
    assert_eq!(received.len(), received_before + 1);
    assert_eq!(received.last().unwrap().timestamp, cached_ts);

    // The feed is live again: a new tick flows through
    h.feed.push("b204", snapshot(520.0, now_ms())).await;
    settle().await;
    assert_eq!(h.engine.current_status().state, SyncState::Online);
}

#[tokio::test(start_paused = true)]
async fn stale_cache_entries_are_not_replayed() {
    let h = Harness::new();

    // Older than the 24h replay window
    let stale_ts = now_ms() - 25 * 60 * 60 * 1000;
    h.cache
        .lock()
        .await
        .put("b204", &snapshot(480.0, stale_ts))
        .unwrap();

    h.watch("b204").await;
    h.engine.handle_online().await;
    settle().await;

    assert!(h.received().is_empty());
}

#[tokio::test(start_paused = true)]
async fn subscribe_failure_enters_retry_path() {
    let h = Harness::new();
    h.feed.fail_subscribes(1);

    h.watch("b204").await;

    // The room is registered even though the subscription failed
    assert!(h.engine.is_watching("b204").await);
    assert_eq!(h.engine.current_status().state, SyncState::Offline);
    assert_eq!(h.engine.retry_attempts(), 1);

    // The retry re-subscribes successfully
    advance(Duration::from_millis(5_100)).await;
    settle().await;
    assert_eq!(h.feed.subscription_count("b204").await, 1);

    h.feed.push("b204", snapshot(500.0, now_ms())).await;
    settle().await;
    assert_eq!(h.engine.current_status().state, SyncState::Online);
}

#[tokio::test(start_paused = true)]
async fn offline_event_is_independent_of_retries() {
    let h = Harness::new();
    h.watch("b204").await;

    h.engine.handle_offline().await;

    let status = h.engine.current_status();
    assert_eq!(status.state, SyncState::Offline);
    assert_eq!(status.error.as_deref(), Some("internet connection lost"));
    // No retry was scheduled by the connectivity transition itself
    assert_eq!(h.engine.retry_attempts(), 0);
    assert!(!h.engine.retry_pending().await);
}

#[tokio::test(start_paused = true)]
async fn stopping_last_room_clears_pending_retry() {
    let h = Harness::new();
    h.watch("b204").await;

    h.feed.emit_error("b204", "backend unavailable").await;
    settle().await;
    assert!(h.engine.retry_pending().await);

    h.engine.stop_sync("b204").await;
    settle().await;
    assert!(!h.engine.retry_pending().await);

    // The cancelled timer never fires
    advance(Duration::from_secs(60)).await;
    settle().await;
    assert_eq!(h.feed.total_subscribes(), 1);
}

#[tokio::test(start_paused = true)]
async fn stopped_room_receives_nothing() {
    let h = Harness::new();
    h.watch("b204").await;

    h.engine.stop_sync("b204").await;
    settle().await;

    h.feed.push("b204", snapshot(500.0, now_ms())).await;
    settle().await;

    assert!(h.received().is_empty());
    assert_eq!(h.cache.lock().await.count(Some("b204")).unwrap(), 0);
}

#[tokio::test(start_paused = true)]
async fn rooms_are_watched_independently() {
    let h = Harness::new();
    h.watch("b204").await;
    h.watch("c101").await;

    let ts = now_ms();
    h.feed.push("b204", snapshot(900.0, ts)).await;
    h.feed.push("c101", snapshot(500.0, ts)).await;
    settle().await;

    let cache = h.cache.lock().await;
    assert_eq!(cache.count(Some("b204")).unwrap(), 1);
    assert_eq!(cache.count(Some("c101")).unwrap(), 1);
    drop(cache);

    // Only the out-of-band room raised a notification
    let visible = h.notifications.visible();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].room_id, "b204");

    assert_eq!(h.received().len(), 2);
}
