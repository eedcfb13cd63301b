//! Data models for cached data.

use serde::{Deserialize, Serialize};

use roomsense_types::SensorSnapshot;

/// A cached snapshot row, keyed by room and reading timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedEntry {
    /// Composite key, unique per (room, timestamp).
    pub key: String,
    /// Room identifier.
    pub room_id: String,
    /// The cached snapshot.
    pub snapshot: SensorSnapshot,
}

impl CachedEntry {
    /// Build the composite key for a room and reading timestamp.
    #[must_use]
    pub fn key_for(room_id: &str, timestamp: i64) -> String {
        format!("{room_id}-{timestamp}")
    }

    /// Create an entry from a room id and snapshot.
    #[must_use]
    pub fn new(room_id: &str, snapshot: SensorSnapshot) -> Self {
        Self {
            key: Self::key_for(room_id, snapshot.timestamp),
            room_id: room_id.to_string(),
            snapshot,
        }
    }
}

/// Per-room last-sync record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastSync {
    /// Room identifier.
    pub room_id: String,
    /// Wall-clock time of the last cache write for this room,
    /// in milliseconds since the Unix epoch.
    pub synced_at: i64,
}
