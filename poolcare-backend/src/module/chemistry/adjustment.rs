///! Dosing direction and amount toward the ideal value

use poolcare_common::{
    Adjustment, AdjustmentAction, Adjustments, Band, Chemical, Measurements, RangeConfig, classify,
};

use super::validation::physical_error;

/// Chemicals that can be corrected by dosing
const DOSABLE: [Chemical; 3] = [Chemical::Chlorine, Chemical::Ph, Chemical::Alkalinity];

/// Compute adjustments for every present, out-of-band dosable chemical.
///
/// In-band chemicals get no entry; absence means no action is needed.
pub fn compute_adjustments(measurements: &Measurements, ranges: &RangeConfig) -> Adjustments {
    let mut adjustments = Adjustments::new();

    for chemical in DOSABLE {
        let Some(value) = measurements.get(chemical) else {
            continue;
        };
        if physical_error(chemical, value).is_some() {
            continue;
        }

        let tier = ranges.tier(chemical);
        let (action, delta) = match classify(value, tier) {
            Band::Low => (AdjustmentAction::Increase, tier.ideal - value),
            Band::High => (AdjustmentAction::Decrease, value - tier.ideal),
            Band::Ok => continue,
        };

        adjustments.insert(
            chemical,
            Adjustment {
                action,
                amount: round_for_display(chemical, delta),
                unit: dosing_unit(chemical).to_string(),
            },
        );
    }

    adjustments
}

fn round_for_display(chemical: Chemical, amount: f64) -> f64 {
    match chemical {
        Chemical::Alkalinity => amount.round(),
        _ => (amount * 10.0).round() / 10.0,
    }
}

fn dosing_unit(chemical: Chemical) -> &'static str {
    match chemical {
        Chemical::Ph => "pH",
        other => other.unit(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_chlorine_increase() {
        let measurements = Measurements {
            chlorine: Some(0.5),
            ..Default::default()
        };
        let adjustments = compute_adjustments(&measurements, &RangeConfig::default());
        assert_eq!(
            adjustments.get(&Chemical::Chlorine),
            Some(&Adjustment {
                action: AdjustmentAction::Increase,
                amount: 1.5,
                unit: "ppm".to_string(),
            })
        );
    }

    #[test]
    fn test_high_ph_decrease_rounded_to_one_decimal() {
        let measurements = Measurements {
            ph: Some(7.83),
            ..Default::default()
        };
        let adjustments = compute_adjustments(&measurements, &RangeConfig::default());
        let ph = adjustments.get(&Chemical::Ph).unwrap();
        assert_eq!(ph.action, AdjustmentAction::Decrease);
        assert_eq!(ph.amount, 0.4);
        assert_eq!(ph.unit, "pH");
    }

    #[test]
    fn test_alkalinity_rounds_to_integer() {
        let measurements = Measurements {
            alkalinity: Some(67.4),
            ..Default::default()
        };
        let adjustments = compute_adjustments(&measurements, &RangeConfig::default());
        let alk = adjustments.get(&Chemical::Alkalinity).unwrap();
        assert_eq!(alk.action, AdjustmentAction::Increase);
        assert_eq!(alk.amount, 33.0);
    }

    #[test]
    fn test_in_band_and_temperature_produce_no_entry() {
        let adjustments = compute_adjustments(
            &Measurements::new(2.5, 7.3, 110.0, 95.0),
            &RangeConfig::default(),
        );
        assert!(adjustments.is_empty());
    }

    #[test]
    fn test_physically_invalid_values_are_not_dosed() {
        let measurements = Measurements {
            chlorine: Some(-1.0),
            ph: Some(15.0),
            ..Default::default()
        };
        assert!(compute_adjustments(&measurements, &RangeConfig::default()).is_empty());
    }
}
