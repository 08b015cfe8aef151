///! Reading validation against physical bounds and acceptable bands

use poolcare_common::{Band, Chemical, Measurements, RangeConfig, ValidationResult, classify};

/// Validate every present field of a (possibly partial) reading.
///
/// Physical-bound violations go to `errors` and skip the band check for
/// that field. In-bounds values outside `[min, max]` go to `warnings`.
pub fn validate(measurements: &Measurements, ranges: &RangeConfig) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for (chemical, value) in measurements.present() {
        if let Some(error) = physical_error(chemical, value) {
            errors.push(error);
            continue;
        }

        if let Some(warning) = band_warning(chemical, value, ranges) {
            warnings.push(warning);
        }
    }

    ValidationResult::new(errors, warnings)
}

/// Error text for a value that cannot physically occur, if any
pub fn physical_error(chemical: Chemical, value: f64) -> Option<String> {
    if !value.is_finite() {
        return Some(format!("{} must be a finite number", chemical.display_name()));
    }

    let name = chemical.display_name();
    match chemical.physical_bounds() {
        (Some(min), Some(max)) if value < min || value > max => {
            let unit = chemical.unit();
            Some(format!(
                "{} must be between {}{} and {}{}",
                name, min, unit, max, unit
            ))
        }
        (Some(min), None) if value < min => Some(format!("{} cannot be negative", name)),
        _ => None,
    }
}

fn band_warning(chemical: Chemical, value: f64, ranges: &RangeConfig) -> Option<String> {
    let tier = ranges.tier(chemical);
    let observed = chemical.format_value(value);

    match classify(value, tier) {
        Band::Low => Some(format!(
            "{} {} is below minimum {}",
            chemical.display_name(),
            observed,
            chemical.format_value(tier.min)
        )),
        Band::High => Some(format!(
            "{} {} is above maximum {}",
            chemical.display_name(),
            observed,
            chemical.format_value(tier.max)
        )),
        Band::Ok => None,
    }
}
