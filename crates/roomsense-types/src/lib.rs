//! Platform-agnostic types for roomsense environmental monitoring.
//!
//! This crate provides shared types used by the sync/alerting core
//! (roomsense-core) and the local snapshot cache (roomsense-store).
//!
//! # Features
//!
//! - Sensor snapshot and alert types
//! - Notification records with read/unread and soft-delete state
//! - Sync status published by the realtime sync engine
//! - Environmental conditions and recommendations for advisory surfaces
//!
//! # Example
//!
//! ```
//! use roomsense_types::{SensorSnapshot, Band};
//!
//! let snapshot = SensorSnapshot::builder()
//!     .co2(640.0)
//!     .temperature(22.0)
//!     .humidity(48.0)
//!     .timestamp(1_700_000_000_000)
//!     .label("B-204")
//!     .build();
//!
//! assert!(!Band::new(300.0, 600.0).contains(snapshot.co2));
//! ```

pub mod error;
pub mod types;

pub use error::{ParseError, ParseResult};
pub use types::{
    now_ms, AlertDescriptor, Band, EnvironmentalConditions, Metric, NotificationRecord, Priority,
    Recommendation, RecommendedAction, SensorSnapshot, SensorSnapshotBuilder, Severity, SyncState,
    SyncStatus, TimeOfDay,
};

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_deserializes_wire_shape() {
        // The feed labels rooms with `title`.
        let json = r#"{"co2":820,"humidity":45,"temperature":22.5,"timestamp":1700000000000,"title":"B-204"}"#;

        let snapshot: SensorSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.co2, 820.0);
        assert_eq!(snapshot.humidity, 45.0);
        assert_eq!(snapshot.label, "B-204");
    }

    #[test]
    fn test_snapshot_deserializes_label_field() {
        let json = r#"{"co2":500,"humidity":50,"temperature":20,"timestamp":1,"label":"lab"}"#;

        let snapshot: SensorSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.label, "lab");
    }

    #[test]
    fn test_metric_serialization() {
        assert_eq!(serde_json::to_string(&Metric::Co2).unwrap(), "\"co2\"");
        assert_eq!(
            serde_json::to_string(&Metric::Temperature).unwrap(),
            "\"temperature\""
        );
    }

    #[test]
    fn test_severity_serialization() {
        assert_eq!(
            serde_json::to_string(&Severity::Critical).unwrap(),
            "\"critical\""
        );
    }

    #[test]
    fn test_sync_state_serialization() {
        assert_eq!(
            serde_json::to_string(&SyncState::Syncing).unwrap(),
            "\"syncing\""
        );
    }

    #[test]
    fn test_recommendation_serialization_skips_empty_action() {
        let rec = Recommendation {
            message: "test".to_string(),
            priority: Priority::Low,
            action: None,
        };
        let json = serde_json::to_string(&rec).unwrap();
        assert!(!json.contains("action"));

        let rec = Recommendation {
            action: Some(RecommendedAction::Ventilate),
            ..rec
        };
        let json = serde_json::to_string(&rec).unwrap();
        assert!(json.contains("\"ventilate\""));
    }

    #[test]
    fn test_notification_record_roundtrip() {
        let record = NotificationRecord {
            id: "n-1".to_string(),
            metric: Metric::Humidity,
            value: 76.0,
            band: Band::new(40.0, 60.0),
            timestamp: 1_700_000_000_000,
            room_id: "b204".to_string(),
            severity: Severity::Critical,
            is_read: false,
            is_deleted: false,
        };

        let json = serde_json::to_string(&record).unwrap();
        let back: NotificationRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
