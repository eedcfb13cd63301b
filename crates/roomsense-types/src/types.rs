//! Core types for roomsense sensor data.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use time::OffsetDateTime;

use crate::error::ParseError;

/// Current wall-clock time as milliseconds since the Unix epoch.
///
/// Feed snapshots, cache keys and deduplication windows all live in the
/// epoch-millisecond domain; this is the single conversion point.
#[must_use]
pub fn now_ms() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// Sensor metric measured in a room.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new metrics
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[non_exhaustive]
pub enum Metric {
    /// CO2 concentration in ppm.
    Co2,
    /// Temperature in degrees Celsius.
    Temperature,
    /// Relative humidity percentage.
    Humidity,
}

impl Metric {
    /// Unit suffix for display purposes.
    #[must_use]
    pub fn unit(&self) -> &'static str {
        match self {
            Metric::Co2 => "ppm",
            Metric::Temperature => "°C",
            Metric::Humidity => "%",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Co2 => write!(f, "CO2"),
            Metric::Temperature => write!(f, "temperature"),
            Metric::Humidity => write!(f, "humidity"),
        }
    }
}

/// Alert severity.
///
/// # Ordering
///
/// Severities are ordered `Warning < Critical`, which allows threshold
/// comparisons like `if alert.severity >= Severity::Critical { ... }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Severity {
    /// Value is outside its band.
    Warning,
    /// Value is far outside its band.
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// Acceptable `[low, high]` range for a metric.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Band {
    /// Lower bound (inclusive).
    pub low: f64,
    /// Upper bound (inclusive).
    pub high: f64,
}

impl Band {
    /// Create a new band.
    #[must_use]
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Whether a value lies within the band (inclusive on both ends).
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.low, self.high)
    }
}

/// One timestamped reading of CO2, temperature and humidity for a room.
///
/// Snapshots are produced by the remote room feed, one per room per update
/// tick, and are immutable once created. The wire contract uses `title`
/// for the room label; both spellings deserialize.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SensorSnapshot {
    /// CO2 concentration in ppm.
    pub co2: f64,
    /// Temperature in degrees Celsius.
    pub temperature: f64,
    /// Relative humidity percentage (0-100).
    pub humidity: f64,
    /// When the reading was taken, in milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Human-readable room label.
    #[cfg_attr(feature = "serde", serde(alias = "title"))]
    pub label: String,
}

impl SensorSnapshot {
    /// Create a builder for constructing `SensorSnapshot` values.
    pub fn builder() -> SensorSnapshotBuilder {
        SensorSnapshotBuilder::default()
    }
}

impl Default for SensorSnapshot {
    fn default() -> Self {
        Self {
            co2: 0.0,
            temperature: 0.0,
            humidity: 0.0,
            timestamp: 0,
            label: String::new(),
        }
    }
}

/// Builder for constructing `SensorSnapshot` values.
///
/// Use [`build`](Self::build) for unchecked construction, or
/// [`try_build`](Self::try_build) for validation of field values.
#[derive(Debug, Default)]
#[must_use]
pub struct SensorSnapshotBuilder {
    snapshot: SensorSnapshot,
}

impl SensorSnapshotBuilder {
    /// Set CO2 concentration.
    pub fn co2(mut self, co2: f64) -> Self {
        self.snapshot.co2 = co2;
        self
    }

    /// Set temperature.
    pub fn temperature(mut self, temperature: f64) -> Self {
        self.snapshot.temperature = temperature;
        self
    }

    /// Set humidity (0-100).
    pub fn humidity(mut self, humidity: f64) -> Self {
        self.snapshot.humidity = humidity;
        self
    }

    /// Set the reading timestamp (epoch milliseconds).
    pub fn timestamp(mut self, timestamp: i64) -> Self {
        self.snapshot.timestamp = timestamp;
        self
    }

    /// Set the room label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.snapshot.label = label.into();
        self
    }

    /// Build the `SensorSnapshot` without validation.
    #[must_use]
    pub fn build(self) -> SensorSnapshot {
        self.snapshot
    }

    /// Build the `SensorSnapshot` with validation.
    ///
    /// Validates:
    /// - `humidity` is 0-100
    /// - `temperature` is within a plausible sensor range (-40 to 100°C)
    /// - `co2` is non-negative
    /// - `timestamp` is positive
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidValue`] if any field has an invalid value.
    pub fn try_build(self) -> Result<SensorSnapshot, ParseError> {
        let s = &self.snapshot;

        if !(0.0..=100.0).contains(&s.humidity) {
            return Err(ParseError::InvalidValue(format!(
                "humidity {} is outside valid range (0-100)",
                s.humidity
            )));
        }

        if !(-40.0..=100.0).contains(&s.temperature) {
            return Err(ParseError::InvalidValue(format!(
                "temperature {} is outside valid range (-40 to 100°C)",
                s.temperature
            )));
        }

        if s.co2 < 0.0 {
            return Err(ParseError::InvalidValue(format!(
                "co2 {} must be non-negative",
                s.co2
            )));
        }

        if s.timestamp <= 0 {
            return Err(ParseError::InvalidValue(format!(
                "timestamp {} must be positive",
                s.timestamp
            )));
        }

        Ok(self.snapshot)
    }
}

/// One out-of-band metric, produced by the threshold evaluator.
///
/// Descriptors are ephemeral: they are handed to the notification store
/// immediately and not retained.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AlertDescriptor {
    /// The metric that is out of band.
    pub metric: Metric,
    /// The observed value.
    pub value: f64,
    /// The band the value violated.
    pub band: Band,
    /// How far out of band the value is.
    pub severity: Severity,
    /// Room the reading came from.
    pub room_id: String,
    /// Timestamp of the offending reading (epoch milliseconds).
    pub timestamp: i64,
}

/// A persisted notification with read/unread and soft-delete state.
///
/// Records are created from [`AlertDescriptor`]s by the notification store
/// and are never physically removed; deletion flips `is_deleted`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NotificationRecord {
    /// Unique identifier, generated on insert.
    pub id: String,
    /// The metric that triggered the notification.
    pub metric: Metric,
    /// The observed value.
    pub value: f64,
    /// The violated band.
    pub band: Band,
    /// Timestamp of the offending reading (epoch milliseconds).
    pub timestamp: i64,
    /// Room the reading came from.
    pub room_id: String,
    /// Alert severity.
    pub severity: Severity,
    /// Whether the user has seen this notification.
    pub is_read: bool,
    /// Soft-delete flag; deleted records are hidden from all read views.
    pub is_deleted: bool,
}

impl NotificationRecord {
    /// Create a record from an alert descriptor with a freshly assigned id.
    ///
    /// New records start unread and not deleted.
    #[must_use]
    pub fn from_alert(id: impl Into<String>, alert: AlertDescriptor) -> Self {
        Self {
            id: id.into(),
            metric: alert.metric,
            value: alert.value,
            band: alert.band,
            timestamp: alert.timestamp,
            room_id: alert.room_id,
            severity: alert.severity,
            is_read: false,
            is_deleted: false,
        }
    }
}

/// Connectivity state of the sync engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SyncState {
    /// Feed updates are flowing.
    Online,
    /// The feed or the network is down.
    Offline,
    /// Re-arming subscriptions after an interruption.
    Syncing,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncState::Online => write!(f, "online"),
            SyncState::Offline => write!(f, "offline"),
            SyncState::Syncing => write!(f, "syncing"),
        }
    }
}

/// Process-wide sync status, republished on every state transition.
///
/// No history is retained; observers see only the latest value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SyncStatus {
    /// Current connectivity state.
    pub state: SyncState,
    /// When the last successful sync tick completed.
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339::option"))]
    pub last_sync_at: Option<OffsetDateTime>,
    /// Error message for the current outage, if any.
    pub error: Option<String>,
}

impl Default for SyncStatus {
    fn default() -> Self {
        Self {
            state: SyncState::Online,
            last_sync_at: None,
            error: None,
        }
    }
}

/// Day/night phase used by the recommendation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TimeOfDay {
    Day,
    Night,
}

/// Recommendation priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Sort weight: high sorts before medium, medium before low.
    #[must_use]
    pub fn weight(&self) -> u8 {
        match self {
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::High => write!(f, "high"),
            Priority::Medium => write!(f, "medium"),
            Priority::Low => write!(f, "low"),
        }
    }
}

/// Machine-readable action attached to a recommendation.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new actions
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[non_exhaustive]
pub enum RecommendedAction {
    ReduceHeating,
    ActivateVentilation,
    Ventilate,
    ScheduleHeating,
    NaturalVentilation,
}

/// An advisory message produced by the recommendation analyzer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Recommendation {
    /// Human-readable advice.
    pub message: String,
    /// Display priority.
    pub priority: Priority,
    /// Optional machine-readable action.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub action: Option<RecommendedAction>,
}

/// Combined indoor/outdoor conditions fed to the recommendation analyzer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EnvironmentalConditions {
    /// Indoor temperature in °C.
    pub room_temp: f64,
    /// Outdoor temperature in °C.
    pub exterior_temp: f64,
    /// Temperature change per forecast period, in °C.
    pub temp_trend: f64,
    /// Indoor relative humidity percentage.
    pub humidity: f64,
    /// Indoor CO2 concentration in ppm.
    pub co2: f64,
    /// Current precipitation in mm.
    pub precipitation: f64,
    /// Day/night phase.
    pub time_of_day: TimeOfDay,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_contains() {
        let band = Band::new(300.0, 600.0);
        assert!(band.contains(300.0));
        assert!(band.contains(600.0));
        assert!(band.contains(450.0));
        assert!(!band.contains(299.9));
        assert!(!band.contains(600.1));
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::Warning);
    }

    #[test]
    fn test_priority_weights() {
        assert_eq!(Priority::High.weight(), 1);
        assert_eq!(Priority::Medium.weight(), 2);
        assert_eq!(Priority::Low.weight(), 3);
    }

    #[test]
    fn test_snapshot_builder() {
        let snapshot = SensorSnapshot::builder()
            .co2(820.0)
            .temperature(22.5)
            .humidity(45.0)
            .timestamp(1_700_000_000_000)
            .label("B-204")
            .build();

        assert_eq!(snapshot.co2, 820.0);
        assert_eq!(snapshot.label, "B-204");
    }

    #[test]
    fn test_snapshot_try_build_rejects_bad_humidity() {
        let result = SensorSnapshot::builder()
            .humidity(120.0)
            .timestamp(1)
            .try_build();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("humidity"));
    }

    #[test]
    fn test_snapshot_try_build_rejects_bad_temperature() {
        let result = SensorSnapshot::builder()
            .temperature(150.0)
            .humidity(50.0)
            .timestamp(1)
            .try_build();
        assert!(result.is_err());
    }

    #[test]
    fn test_snapshot_try_build_accepts_valid() {
        let result = SensorSnapshot::builder()
            .co2(500.0)
            .temperature(21.0)
            .humidity(50.0)
            .timestamp(1_700_000_000_000)
            .label("lab")
            .try_build();
        assert!(result.is_ok());
    }

    #[test]
    fn test_notification_record_from_alert() {
        let alert = AlertDescriptor {
            metric: Metric::Co2,
            value: 900.0,
            band: Band::new(300.0, 600.0),
            severity: Severity::Critical,
            room_id: "b204".to_string(),
            timestamp: 1_700_000_000_000,
        };

        let record = NotificationRecord::from_alert("n-1", alert);
        assert_eq!(record.id, "n-1");
        assert_eq!(record.metric, Metric::Co2);
        assert!(!record.is_read);
        assert!(!record.is_deleted);
    }

    #[test]
    fn test_sync_status_default() {
        let status = SyncStatus::default();
        assert_eq!(status.state, SyncState::Online);
        assert!(status.last_sync_at.is_none());
        assert!(status.error.is_none());
    }

    #[test]
    fn test_metric_display() {
        assert_eq!(Metric::Co2.to_string(), "CO2");
        assert_eq!(Metric::Temperature.to_string(), "temperature");
        assert_eq!(Metric::Co2.unit(), "ppm");
    }

    #[test]
    fn test_now_ms_is_plausible() {
        // 2020-01-01 in epoch ms
        assert!(now_ms() > 1_577_836_800_000);
    }
}
