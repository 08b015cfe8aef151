///! Direction of change between the two most recent readings

use poolcare_common::{Chemical, ChemicalReading, Trend, TrendDirection};

/// Changes smaller than this, in the field's native unit, count as stable
pub const TREND_NOISE_THRESHOLD: f64 = 0.1;

/// Compare the two most recent readings that carry `chemical`.
///
/// Input order does not matter. A zero baseline reports 100% for any rise
/// instead of an infinite percentage.
pub fn compute_trend(readings: &[ChemicalReading], chemical: Chemical) -> Trend {
    let mut series: Vec<(&ChemicalReading, f64)> = readings
        .iter()
        .filter_map(|reading| {
            reading
                .value(chemical)
                .filter(|value| value.is_finite())
                .map(|value| (reading, value))
        })
        .collect();

    if series.len() < 2 {
        return Trend::stable();
    }

    // Most recent first
    series.sort_by(|a, b| b.0.timestamp.cmp(&a.0.timestamp));

    let current = series[0].1;
    let previous = series[1].1;
    let change = current - previous;

    if change.abs() < TREND_NOISE_THRESHOLD {
        return Trend::stable();
    }

    let direction = if change > 0.0 {
        TrendDirection::Up
    } else {
        TrendDirection::Down
    };

    let percentage = if previous == 0.0 {
        100.0
    } else {
        ((change / previous).abs() * 100.0 * 10.0).round() / 10.0
    };

    Trend {
        direction,
        percentage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use poolcare_common::Measurements;

    fn chlorine_at(hours: i64, chlorine: f64) -> ChemicalReading {
        let base = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        ChemicalReading::new(
            base + Duration::hours(hours),
            Measurements {
                chlorine: Some(chlorine),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_fewer_than_two_readings_is_stable() {
        assert_eq!(compute_trend(&[], Chemical::Chlorine), Trend::stable());
        assert_eq!(
            compute_trend(&[chlorine_at(0, 2.0)], Chemical::Chlorine),
            Trend::stable()
        );
    }

    #[test]
    fn test_noise_level_change_is_stable() {
        let readings = vec![chlorine_at(0, 2.0), chlorine_at(1, 2.05)];
        assert_eq!(compute_trend(&readings, Chemical::Chlorine), Trend::stable());
    }

    #[test]
    fn test_rise_and_fall_with_percentage() {
        let rising = vec![chlorine_at(0, 2.0), chlorine_at(1, 3.0)];
        let trend = compute_trend(&rising, Chemical::Chlorine);
        assert_eq!(trend.direction, TrendDirection::Up);
        assert_eq!(trend.percentage, 50.0);

        let falling = vec![chlorine_at(0, 3.0), chlorine_at(1, 2.0)];
        let trend = compute_trend(&falling, Chemical::Chlorine);
        assert_eq!(trend.direction, TrendDirection::Down);
        assert_eq!(trend.percentage, 33.3);
    }

    #[test]
    fn test_input_order_is_irrelevant() {
        // Newest reading listed first, oldest in the middle
        let readings = vec![chlorine_at(5, 1.0), chlorine_at(0, 9.0), chlorine_at(4, 2.0)];
        let trend = compute_trend(&readings, Chemical::Chlorine);
        assert_eq!(trend.direction, TrendDirection::Down);
        assert_eq!(trend.percentage, 50.0);
    }

    #[test]
    fn test_zero_baseline_is_finite() {
        let readings = vec![chlorine_at(0, 0.0), chlorine_at(1, 1.5)];
        let trend = compute_trend(&readings, Chemical::Chlorine);
        assert_eq!(trend.direction, TrendDirection::Up);
        assert!(trend.percentage.is_finite());
        assert_eq!(trend.percentage, 100.0);
    }

    #[test]
    fn test_readings_without_the_field_are_ignored() {
        let mut ph_only = chlorine_at(2, 0.0);
        ph_only.measurements = Measurements {
            ph: Some(7.4),
            ..Default::default()
        };
        let readings = vec![chlorine_at(0, 2.0), chlorine_at(1, 2.5), ph_only];
        let trend = compute_trend(&readings, Chemical::Chlorine);
        assert_eq!(trend.direction, TrendDirection::Up);
        assert_eq!(trend.percentage, 25.0);
    }
}
