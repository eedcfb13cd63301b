//! Room feed contract.
//!
//! The remote feed is an external collaborator that pushes JSON snapshots
//! keyed by room. This module defines the trait seam the sync engine
//! consumes; implementations adapt whatever transport hosts the data.

use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures::stream::Stream;
use tokio::sync::mpsc;

use roomsense_types::SensorSnapshot;

use crate::error::Result;

/// Item delivered by a room feed subscription: a snapshot, or a feed-side
/// failure for the engine's error path.
pub type FeedItem = Result<SensorSnapshot>;

/// A push subscription to one room's snapshot stream.
///
/// Dropping the subscription unsubscribes; the implementation observes the
/// closed channel and stops delivering. A channel closed from the feed side
/// means the feed ended.
pub struct FeedSubscription {
    receiver: mpsc::Receiver<FeedItem>,
}

impl FeedSubscription {
    /// Wrap a receiver produced by a feed implementation.
    pub fn new(receiver: mpsc::Receiver<FeedItem>) -> Self {
        Self { receiver }
    }

    /// Create a bounded channel and the subscription that drains it.
    ///
    /// Convenience for feed implementations.
    pub fn channel(buffer: usize) -> (mpsc::Sender<FeedItem>, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (tx, Self::new(rx))
    }

    /// Receive the next item, or `None` once the feed has ended.
    pub async fn next(&mut self) -> Option<FeedItem> {
        self.receiver.recv().await
    }
}

impl Stream for FeedSubscription {
    type Item = FeedItem;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.receiver).poll_recv(cx)
    }
}

/// Remote per-room snapshot feed.
///
/// This trait enables writing code that works with both real remote feeds
/// and the [`MockFeed`](crate::MockFeed) for testing.
#[async_trait]
pub trait RoomFeed: Send + Sync {
    /// Subscribe to a room's snapshot stream.
    ///
    /// Each subscription is independent; subscribing twice yields two
    /// streams. Idempotence per room is the sync engine's concern, not the
    /// feed's.
    async fn subscribe(&self, room_id: &str) -> Result<FeedSubscription>;
}
