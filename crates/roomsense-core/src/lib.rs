//! Realtime sync and alerting core for roomsense environmental monitoring.
//!
//! This crate wires a remote per-room snapshot feed into a durable local
//! cache, a threshold evaluator and an observable notification store, and
//! publishes a process-wide sync status with reconnect-and-backoff
//! handling.
//!
//! # Features
//!
//! - **Realtime sync**: per-room feed subscriptions with idempotent
//!   start/stop and cached replay after reconnection
//! - **Threshold alerts**: configurable bands with warning/critical
//!   severities
//! - **Notifications**: deduplicated, observable records with read/unread
//!   and soft-delete state
//! - **Recommendations**: pure analysis of indoor/outdoor conditions
//! - **Advisory lookups** (feature `advisory`): weather forecast and
//!   electricity-tariff clients
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokio::sync::Mutex;
//! use roomsense_core::{MockFeed, NotificationStore, SyncEngine};
//! use roomsense_store::SnapshotCache;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let feed = Arc::new(MockFeed::new());
//!     let cache = Arc::new(Mutex::new(SnapshotCache::open_default()?));
//!     let notifications = Arc::new(NotificationStore::new());
//!
//!     let engine = Arc::new(SyncEngine::new(feed, cache, Arc::clone(&notifications)));
//!     engine
//!         .start_sync("b204", |snapshot| println!("CO2: {} ppm", snapshot.co2))
//!         .await?;
//!
//!     let mut status = engine.subscribe_status();
//!     status.changed().await?;
//!     println!("sync is {}", status.borrow().state);
//!
//!     Ok(())
//! }
//! ```

#[cfg(feature = "advisory")]
pub mod advisory;
pub mod error;
pub mod feed;
pub mod mock;
pub mod notifications;
pub mod notify;
pub mod recommend;
pub mod sync;
pub mod thresholds;

// Core exports
pub use error::{Error, Result};
pub use feed::{FeedItem, FeedSubscription, RoomFeed};
pub use mock::MockFeed;
pub use notifications::{NotificationStore, NotificationStoreConfig};
pub use notify::{alert_notice, LogSurface, Notice, NotificationSurface, Permission};
pub use recommend::analyze;
pub use sync::{OnData, SyncEngine, SyncOptions};
pub use thresholds::{ThresholdConfig, Thresholds};

#[cfg(feature = "advisory")]
pub use advisory::{TariffClient, TariffDay, TariffDays, Weather, WeatherClient};

// Re-export from roomsense-types
pub use roomsense_types::{
    AlertDescriptor, Band, EnvironmentalConditions, Metric, NotificationRecord, Priority,
    Recommendation, RecommendedAction, SensorSnapshot, Severity, SyncState, SyncStatus, TimeOfDay,
};
