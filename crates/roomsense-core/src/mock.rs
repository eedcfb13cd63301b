//! Mock room feed for testing.
//!
//! This module provides a feed implementation that can be driven from
//! tests without a remote backend.
//!
//! # Features
//!
//! - **Manual delivery**: Push snapshots or errors to a room's subscribers
//! - **Failure injection**: Make upcoming subscribe calls fail
//! - **Bookkeeping**: Count live subscriptions per room for idempotence
//!   assertions

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use tokio::sync::{mpsc, RwLock};

use roomsense_types::SensorSnapshot;

use crate::error::{Error, Result};
use crate::feed::{FeedItem, FeedSubscription, RoomFeed};

/// A mock room feed for testing.
///
/// Implements [`RoomFeed`] for use in generic code and tests.
///
/// # Example
///
/// ```
/// use roomsense_core::{MockFeed, RoomFeed};
/// use roomsense_types::SensorSnapshot;
///
/// #[tokio::main]
/// async fn main() {
///     let feed = MockFeed::new();
///     let mut sub = feed.subscribe("b204").await.unwrap();
///
///     feed.push("b204", SensorSnapshot::default()).await;
///     assert!(sub.next().await.unwrap().is_ok());
/// }
/// ```
pub struct MockFeed {
    senders: RwLock<HashMap<String, Vec<mpsc::Sender<FeedItem>>>>,
    total_subscribes: AtomicU32,
    /// Number of upcoming subscribe calls to fail (decremented on each failure).
    remaining_subscribe_failures: AtomicU32,
    buffer: usize,
}

impl std::fmt::Debug for MockFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockFeed")
            .field(
                "total_subscribes",
                &self.total_subscribes.load(Ordering::Relaxed),
            )
            .finish()
    }
}

impl MockFeed {
    /// Create a new mock feed.
    pub fn new() -> Self {
        Self {
            senders: RwLock::new(HashMap::new()),
            total_subscribes: AtomicU32::new(0),
            remaining_subscribe_failures: AtomicU32::new(0),
            buffer: 16,
        }
    }

    /// Make the next `count` subscribe calls fail.
    pub fn fail_subscribes(&self, count: u32) {
        self.remaining_subscribe_failures
            .store(count, Ordering::SeqCst);
    }

    /// Deliver a snapshot to every live subscriber of a room.
    pub async fn push(&self, room_id: &str, snapshot: SensorSnapshot) {
        self.broadcast(room_id, || Ok(snapshot.clone())).await;
    }

    /// Deliver a feed error to every live subscriber of a room.
    pub async fn emit_error(&self, room_id: &str, message: &str) {
        self.broadcast(room_id, || Err(Error::feed(message))).await;
    }

    /// End the feed for a room; subscribers observe a closed stream.
    pub async fn close(&self, room_id: &str) {
        self.senders.write().await.remove(room_id);
    }

    /// Number of live subscriptions for a room.
    pub async fn subscription_count(&self, room_id: &str) -> usize {
        let mut senders = self.senders.write().await;
        match senders.get_mut(room_id) {
            Some(room) => {
                room.retain(|tx| !tx.is_closed());
                room.len()
            }
            None => 0,
        }
    }

    /// Total number of subscribe calls made, including failed ones.
    pub fn total_subscribes(&self) -> u32 {
        self.total_subscribes.load(Ordering::SeqCst)
    }

    async fn broadcast<F>(&self, room_id: &str, make_item: F)
    where
        F: Fn() -> FeedItem,
    {
        let mut senders = self.senders.write().await;
        if let Some(room) = senders.get_mut(room_id) {
            room.retain(|tx| !tx.is_closed());
            for tx in room.iter() {
                let _ = tx.send(make_item()).await;
            }
        }
    }
}

impl Default for MockFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoomFeed for MockFeed {
    async fn subscribe(&self, room_id: &str) -> Result<FeedSubscription> {
        self.total_subscribes.fetch_add(1, Ordering::SeqCst);

        if self.remaining_subscribe_failures.load(Ordering::SeqCst) > 0 {
            self.remaining_subscribe_failures
                .fetch_sub(1, Ordering::SeqCst);
            return Err(Error::feed("injected subscribe failure"));
        }

        let (tx, sub) = FeedSubscription::channel(self.buffer);
        self.senders
            .write()
            .await
            .entry(room_id.to_string())
            .or_default()
            .push(tx);

        Ok(sub)
    }
}
