//! Environmental recommendations.
//!
//! Pure analysis of combined indoor/outdoor conditions into prioritized
//! advisory messages. Each rule is evaluated independently, so several may
//! fire for the same conditions.

use roomsense_types::{
    EnvironmentalConditions, Priority, Recommendation, RecommendedAction, TimeOfDay,
};

/// Analyze conditions and return recommendations sorted by priority.
///
/// The sort is stable: recommendations with equal priority keep
/// rule-evaluation order.
pub fn analyze(conditions: &EnvironmentalConditions) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    // Rising temperatures in an already warm room
    if conditions.temp_trend > 2.0 && conditions.room_temp > 21.0 {
        recommendations.push(Recommendation {
            message: "Reduce heating - temperatures are trending upward".to_string(),
            priority: Priority::High,
            action: Some(RecommendedAction::ReduceHeating),
        });
    }

    // Muggy room
    if conditions.humidity > 70.0 && conditions.room_temp > 23.0 {
        recommendations.push(Recommendation {
            message: "High humidity level - activating ventilation is advised".to_string(),
            priority: Priority::Medium,
            action: Some(RecommendedAction::ActivateVentilation),
        });
    }

    // Stale air
    if conditions.co2 > 1000.0 {
        recommendations.push(Recommendation {
            message: "High CO2 level - airing out is needed".to_string(),
            priority: Priority::High,
            action: Some(RecommendedAction::Ventilate),
        });
    }

    // Cold night ahead
    if conditions.time_of_day == TimeOfDay::Night && conditions.exterior_temp < 15.0 {
        recommendations.push(Recommendation {
            message: "Scheduling overnight heating is advised".to_string(),
            priority: Priority::Medium,
            action: Some(RecommendedAction::ScheduleHeating),
        });
    }

    // Mild and dry outside
    if (18.0..=24.0).contains(&conditions.exterior_temp) && conditions.precipitation < 0.1 {
        recommendations.push(Recommendation {
            message: "Ideal conditions for natural ventilation".to_string(),
            priority: Priority::Low,
            action: Some(RecommendedAction::NaturalVentilation),
        });
    }

    recommendations.sort_by_key(|r| r.priority.weight());
    recommendations
}
