///! Pool status aggregation

use poolcare_common::{Band, Measurements, PoolStatus, RangeConfig, StatusReport, classify};

use super::validation::validate;

/// Derive the overall pool status for a reading.
///
/// Hard validation errors always yield `Critical` with the errors as issues.
/// Otherwise the level is a function of how many fields are out of band.
pub fn derive_status(measurements: &Measurements, ranges: &RangeConfig) -> StatusReport {
    let validation = validate(measurements, ranges);
    if !validation.errors.is_empty() {
        return StatusReport {
            level: PoolStatus::Critical,
            message: "Invalid readings detected".to_string(),
            issues: validation.errors,
        };
    }

    let issues: Vec<String> = measurements
        .present()
        .filter(|(chemical, value)| classify(*value, ranges.tier(*chemical)) != Band::Ok)
        .map(|(chemical, value)| {
            format!("{}: {}", chemical.display_name(), chemical.format_value(value))
        })
        .collect();

    let level = PoolStatus::from_issue_count(issues.len());

    StatusReport {
        level,
        message: status_message(level).to_string(),
        issues,
    }
}

fn status_message(level: PoolStatus) -> &'static str {
    match level {
        PoolStatus::Excellent => "All chemical levels are within range",
        PoolStatus::Good => "One chemical needs attention",
        PoolStatus::Caution => "Two chemicals need attention",
        PoolStatus::Critical => "Multiple chemicals out of range - immediate attention required",
    }
}
