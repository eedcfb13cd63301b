//! Durable local cache for roomsense sensor snapshots.
//!
//! This crate provides SQLite-based storage for per-room sensor snapshots,
//! enabling offline access and replay after connectivity loss.
//!
//! # Features
//!
//! - Upsert snapshots keyed by (room, reading timestamp)
//! - Range queries over a room's recent snapshots
//! - Age-based eviction across all rooms
//! - Per-room last-sync tracking
//!
//! # Example
//!
//! ```no_run
//! use roomsense_store::SnapshotCache;
//! use roomsense_types::SensorSnapshot;
//!
//! let cache = SnapshotCache::open_default()?;
//!
//! let snapshot = SensorSnapshot::builder()
//!     .co2(640.0)
//!     .temperature(22.0)
//!     .humidity(48.0)
//!     .timestamp(1_700_000_000_000)
//!     .label("B-204")
//!     .build();
//! cache.put("b204", &snapshot)?;
//!
//! let recent = cache.get_range("b204", 1_700_000_000_000)?;
//! # Ok::<(), roomsense_store::Error>(())
//! ```

mod error;
mod models;
mod schema;
mod store;

pub use error::{Error, Result};
pub use models::{CachedEntry, LastSync};
pub use store::SnapshotCache;

/// Default database path following platform conventions.
///
/// - Linux: `~/.local/share/roomsense/cache.db`
/// - macOS: `~/Library/Application Support/roomsense/cache.db`
/// - Windows: `C:\Users\<user>\AppData\Local\roomsense\cache.db`
pub fn default_db_path() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("roomsense")
        .join("cache.db")
}
