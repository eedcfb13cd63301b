//! Threshold bands and alert evaluation.
//!
//! This module maps a sensor snapshot to zero or more alert descriptors by
//! comparing each metric against its configured band.
//!
//! # Example
//!
//! ```
//! use roomsense_core::Thresholds;
//! use roomsense_types::{SensorSnapshot, Severity};
//!
//! let thresholds = Thresholds::default();
//!
//! let snapshot = SensorSnapshot::builder()
//!     .co2(820.0)
//!     .temperature(22.0)
//!     .humidity(50.0)
//!     .timestamp(1_700_000_000_000)
//!     .label("B-204")
//!     .build();
//!
//! let alerts = thresholds.evaluate("b204", &snapshot);
//! assert_eq!(alerts.len(), 1);
//! assert_eq!(alerts[0].severity, Severity::Critical);
//! ```

use serde::{Deserialize, Serialize};

use roomsense_types::{AlertDescriptor, Band, Metric, SensorSnapshot, Severity};

use crate::error::{Error, Result};

/// Configuration for threshold bands and critical margins.
///
/// The defaults are conventional indoor-comfort values, not tuned
/// constants; treat them as adjustable parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Acceptable CO2 range in ppm.
    pub co2: Band,
    /// Acceptable temperature range in °C.
    pub temperature: Band,
    /// Acceptable humidity range in %.
    pub humidity: Band,
    /// CO2 is critical above `co2.high * co2_critical_factor`.
    pub co2_critical_factor: f64,
    /// Temperature is critical when `|value - temperature.high|` exceeds this.
    pub temperature_critical_margin: f64,
    /// Humidity is critical when `|value - humidity.high|` exceeds this.
    pub humidity_critical_margin: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            co2: Band::new(300.0, 600.0),
            temperature: Band::new(18.0, 26.0),
            humidity: Band::new(40.0, 60.0),
            co2_critical_factor: 1.2,
            temperature_critical_margin: 5.0,
            humidity_critical_margin: 15.0,
        }
    }
}

impl ThresholdConfig {
    /// Validate the configuration and return an error if invalid.
    ///
    /// Checks that:
    /// - every band has `low < high`
    /// - `co2_critical_factor` is >= 1.0
    /// - critical margins are non-negative
    pub fn validate(&self) -> Result<()> {
        for (name, band) in [
            ("co2", &self.co2),
            ("temperature", &self.temperature),
            ("humidity", &self.humidity),
        ] {
            if band.low >= band.high {
                return Err(Error::invalid_config(format!(
                    "{name} band must have low < high, got {band}"
                )));
            }
        }
        if self.co2_critical_factor < 1.0 {
            return Err(Error::invalid_config(
                "co2_critical_factor must be >= 1.0".to_string(),
            ));
        }
        if self.temperature_critical_margin < 0.0 || self.humidity_critical_margin < 0.0 {
            return Err(Error::invalid_config(
                "critical margins must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Threshold evaluator for sensor snapshots.
///
/// Evaluation is pure: the same snapshot always yields the same alerts and
/// no state is touched.
#[derive(Debug, Clone, Default)]
pub struct Thresholds {
    config: ThresholdConfig,
}

impl Thresholds {
    /// Create a new threshold evaluator with the given configuration.
    pub fn new(config: ThresholdConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &ThresholdConfig {
        &self.config
    }

    /// Evaluate a snapshot against the configured bands.
    ///
    /// For each metric outside its band, one [`AlertDescriptor`] is emitted;
    /// metrics within band emit nothing. Output order is CO2, temperature,
    /// humidity.
    pub fn evaluate(&self, room_id: &str, snapshot: &SensorSnapshot) -> Vec<AlertDescriptor> {
        let mut alerts = Vec::new();
        let c = &self.config;

        if !c.co2.contains(snapshot.co2) {
            let severity = if snapshot.co2 > c.co2.high * c.co2_critical_factor {
                Severity::Critical
            } else {
                Severity::Warning
            };
            alerts.push(self.alert(room_id, snapshot, Metric::Co2, snapshot.co2, c.co2, severity));
        }

        if !c.temperature.contains(snapshot.temperature) {
            let severity =
                if (snapshot.temperature - c.temperature.high).abs() > c.temperature_critical_margin
                {
                    Severity::Critical
                } else {
                    Severity::Warning
                };
            alerts.push(self.alert(
                room_id,
                snapshot,
                Metric::Temperature,
                snapshot.temperature,
                c.temperature,
                severity,
            ));
        }

        if !c.humidity.contains(snapshot.humidity) {
            let severity = if (snapshot.humidity - c.humidity.high).abs() > c.humidity_critical_margin
            {
                Severity::Critical
            } else {
                Severity::Warning
            };
            alerts.push(self.alert(
                room_id,
                snapshot,
                Metric::Humidity,
                snapshot.humidity,
                c.humidity,
                severity,
            ));
        }

        alerts
    }

    fn alert(
        &self,
        room_id: &str,
        snapshot: &SensorSnapshot,
        metric: Metric,
        value: f64,
        band: Band,
        severity: Severity,
    ) -> AlertDescriptor {
        AlertDescriptor {
            metric,
            value,
            band,
            severity,
            room_id: room_id.to_string(),
            timestamp: snapshot.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(co2: f64, temperature: f64, humidity: f64) -> SensorSnapshot {
        SensorSnapshot::builder()
            .co2(co2)
            .temperature(temperature)
            .humidity(humidity)
            .timestamp(1_700_000_000_000)
            .label("Test Room")
            .build()
    }

    fn in_band() -> SensorSnapshot {
        snapshot(500.0, 22.0, 50.0)
    }

    #[test]
    fn test_in_band_snapshot_yields_nothing() {
        let t = Thresholds::default();
        assert!(t.evaluate("b204", &in_band()).is_empty());
    }

    #[test]
    fn test_co2_boundaries() {
        let t = Thresholds::default();

        // 600 is the inclusive upper bound
        assert!(t.evaluate("b204", &snapshot(600.0, 22.0, 50.0)).is_empty());

        let alerts = t.evaluate("b204", &snapshot(601.0, 22.0, 50.0));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].metric, Metric::Co2);
        assert_eq!(alerts[0].severity, Severity::Warning);

        // 720 = 600 * 1.2 is still a warning; critical starts above it
        let alerts = t.evaluate("b204", &snapshot(720.0, 22.0, 50.0));
        assert_eq!(alerts[0].severity, Severity::Warning);

        let alerts = t.evaluate("b204", &snapshot(721.0, 22.0, 50.0));
        assert_eq!(alerts[0].severity, Severity::Critical);
    }

    #[test]
    fn test_co2_below_band_is_warning() {
        let t = Thresholds::default();
        let alerts = t.evaluate("b204", &snapshot(250.0, 22.0, 50.0));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, Severity::Warning);
    }

    #[test]
    fn test_temperature_severity() {
        let t = Thresholds::default();

        let alerts = t.evaluate("b204", &snapshot(500.0, 27.0, 50.0));
        assert_eq!(alerts[0].metric, Metric::Temperature);
        assert_eq!(alerts[0].severity, Severity::Warning);

        let alerts = t.evaluate("b204", &snapshot(500.0, 32.0, 50.0));
        assert_eq!(alerts[0].severity, Severity::Critical);

        // Far below the band also measures distance from the upper bound
        let alerts = t.evaluate("b204", &snapshot(500.0, 12.0, 50.0));
        assert_eq!(alerts[0].severity, Severity::Critical);
    }

    #[test]
    fn test_humidity_severity() {
        let t = Thresholds::default();

        let alerts = t.evaluate("b204", &snapshot(500.0, 22.0, 65.0));
        assert_eq!(alerts[0].metric, Metric::Humidity);
        assert_eq!(alerts[0].severity, Severity::Warning);

        // |75 - 60| = 15 is not above the margin
        let alerts = t.evaluate("b204", &snapshot(500.0, 22.0, 75.0));
        assert_eq!(alerts[0].severity, Severity::Warning);

        let alerts = t.evaluate("b204", &snapshot(500.0, 22.0, 76.0));
        assert_eq!(alerts[0].severity, Severity::Critical);
    }

    #[test]
    fn test_output_order_is_co2_temperature_humidity() {
        let t = Thresholds::default();
        let alerts = t.evaluate("b204", &snapshot(1200.0, 30.0, 80.0));

        assert_eq!(alerts.len(), 3);
        assert_eq!(alerts[0].metric, Metric::Co2);
        assert_eq!(alerts[1].metric, Metric::Temperature);
        assert_eq!(alerts[2].metric, Metric::Humidity);
    }

    #[test]
    fn test_alert_carries_room_and_timestamp() {
        let t = Thresholds::default();
        let alerts = t.evaluate("c101", &snapshot(900.0, 22.0, 50.0));

        assert_eq!(alerts[0].room_id, "c101");
        assert_eq!(alerts[0].timestamp, 1_700_000_000_000);
        assert_eq!(alerts[0].band, Band::new(300.0, 600.0));
    }

    #[test]
    fn test_config_validate() {
        assert!(ThresholdConfig::default().validate().is_ok());

        let bad = ThresholdConfig {
            co2: Band::new(600.0, 300.0),
            ..Default::default()
        };
        assert!(bad.validate().is_err());

        let bad = ThresholdConfig {
            co2_critical_factor: 0.5,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
