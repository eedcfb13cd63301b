//! Main cache implementation.

use std::path::Path;

use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};

use roomsense_types::{now_ms, SensorSnapshot};

use crate::error::{Error, Result};
use crate::models::{CachedEntry, LastSync};
use crate::schema;

/// SQLite-backed cache of room sensor snapshots.
///
/// Entries are keyed by (room, reading timestamp); each write also stamps a
/// per-room last-sync record with the current wall-clock time, so consumers
/// can tell how fresh a room's cache is independently of reading timestamps.
pub struct SnapshotCache {
    conn: Connection,
}

impl SnapshotCache {
    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| Error::CreateDirectory {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        info!("Opening snapshot cache at {}", path.display());
        let conn = Connection::open(path)?;

        // WAL mode for better concurrent read behavior
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        // Initialize schema
        schema::initialize(&conn)?;

        Ok(Self { conn })
    }

    /// Open the default database location.
    pub fn open_default() -> Result<Self> {
        Self::open(crate::default_db_path())
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    /// Upsert a snapshot for a room and stamp the room's last-sync record.
    ///
    /// Writing the same (room, timestamp) twice replaces the stored values
    /// rather than creating a second entry.
    pub fn put(&self, room_id: &str, snapshot: &SensorSnapshot) -> Result<()> {
        let key = CachedEntry::key_for(room_id, snapshot.timestamp);

        self.conn.execute(
            "INSERT INTO snapshots (key, room_id, timestamp, co2, temperature, humidity, label)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(key) DO UPDATE SET
                co2 = ?4,
                temperature = ?5,
                humidity = ?6,
                label = ?7",
            rusqlite::params![
                key,
                room_id,
                snapshot.timestamp,
                snapshot.co2,
                snapshot.temperature,
                snapshot.humidity,
                snapshot.label,
            ],
        )?;

        let synced_at = now_ms();
        self.conn.execute(
            "INSERT INTO sync_meta (room_id, synced_at) VALUES (?1, ?2)
             ON CONFLICT(room_id) DO UPDATE SET synced_at = ?2",
            rusqlite::params![room_id, synced_at],
        )?;

        debug!("Cached snapshot {} (synced_at={})", key, synced_at);
        Ok(())
    }

    /// Snapshots for a room with reading timestamp in `[from_ts, now]`,
    /// ordered by timestamp ascending.
    ///
    /// Returns an empty vec (not an error) when nothing matches.
    pub fn get_range(&self, room_id: &str, from_ts: i64) -> Result<Vec<SensorSnapshot>> {
        let now = now_ms();

        let mut stmt = self.conn.prepare(
            "SELECT co2, temperature, humidity, timestamp, label
             FROM snapshots
             WHERE room_id = ?1 AND timestamp >= ?2 AND timestamp <= ?3
             ORDER BY timestamp ASC",
        )?;

        let snapshots = stmt
            .query_map(rusqlite::params![room_id, from_ts, now], |row| {
                Ok(SensorSnapshot {
                    co2: row.get(0)?,
                    temperature: row.get(1)?,
                    humidity: row.get(2)?,
                    timestamp: row.get(3)?,
                    label: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(snapshots)
    }

    /// The most recent cached snapshot for a room with reading timestamp
    /// in `[from_ts, now]`, if any.
    pub fn latest_since(&self, room_id: &str, from_ts: i64) -> Result<Option<SensorSnapshot>> {
        let mut snapshots = self.get_range(room_id, from_ts)?;
        Ok(snapshots.pop())
    }

    /// Delete all entries with reading timestamp at or before `cutoff_ts`,
    /// across all rooms. Returns the number of deleted entries.
    pub fn evict_older_than(&self, cutoff_ts: i64) -> Result<usize> {
        let deleted = self
            .conn
            .execute("DELETE FROM snapshots WHERE timestamp <= ?1", [cutoff_ts])?;

        if deleted > 0 {
            info!("Evicted {} cached snapshots at or before {}", deleted, cutoff_ts);
        }
        Ok(deleted)
    }

    /// The last-sync record for a room, if the room has ever been written.
    pub fn last_sync(&self, room_id: &str) -> Result<Option<LastSync>> {
        let mut stmt = self
            .conn
            .prepare("SELECT room_id, synced_at FROM sync_meta WHERE room_id = ?1")?;

        let record = stmt
            .query_row([room_id], |row| {
                Ok(LastSync {
                    room_id: row.get(0)?,
                    synced_at: row.get(1)?,
                })
            })
            .optional()?;

        Ok(record)
    }

    /// Count cached entries, optionally restricted to one room.
    pub fn count(&self, room_id: Option<&str>) -> Result<u64> {
        let count: i64 = match room_id {
            Some(id) => self.conn.query_row(
                "SELECT COUNT(*) FROM snapshots WHERE room_id = ?1",
                [id],
                |row| row.get(0),
            )?,
            None => self
                .conn
                .query_row("SELECT COUNT(*) FROM snapshots", [], |row| row.get(0))?,
        };

        Ok(count as u64)
    }
}
