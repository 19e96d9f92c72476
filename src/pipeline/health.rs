//! Equipment health score and performance trend.

use crate::models::PerformanceTrend;

use super::round2;

/// Temperature above which a device's average starts costing health points.
const HOT_LIMIT: f64 = 90.0;
/// Temperature below which a device's average starts costing health points.
const COLD_LIMIT: f64 = 10.0;

/// Efficiency capped at 100, minus a penalty for an average temperature
/// outside `[COLD_LIMIT, HOT_LIMIT]`. Never negative.
pub fn health_score(efficiency: f64, average_temperature: Option<f64>) -> f64 {
    // ---
    let penalty = match average_temperature {
        Some(t) if t > HOT_LIMIT => (t - HOT_LIMIT) * 0.5,
        Some(t) if t < COLD_LIMIT => (COLD_LIMIT - t) * 0.3,
        _ => 0.0,
    };
    round2((efficiency.min(100.0) - penalty).max(0.0))
}

pub fn trend(efficiency: f64) -> PerformanceTrend {
    // ---
    if efficiency > 90.0 {
        PerformanceTrend::Improving
    } else if efficiency > 75.0 {
        PerformanceTrend::Stable
    } else {
        PerformanceTrend::Declining
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_no_penalty_inside_limits() {
        assert_eq!(health_score(87.5, Some(60.0)), 87.5);
        assert_eq!(health_score(87.5, None), 87.5);
    }

    #[test]
    fn test_temperature_penalties() {
        // ---
        assert_eq!(health_score(100.0, Some(100.0)), 95.0);
        assert_eq!(health_score(50.0, Some(0.0)), 47.0);
        assert_eq!(health_score(1.0, Some(200.0)), 0.0);
    }

    #[test]
    fn test_trend_bands() {
        // ---
        assert_eq!(trend(100.0), PerformanceTrend::Improving);
        assert_eq!(trend(90.0), PerformanceTrend::Stable);
        assert_eq!(trend(75.0), PerformanceTrend::Declining);
    }
}
