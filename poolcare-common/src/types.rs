use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Measured field of a reading, in the fixed field order used for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chemical {
    Chlorine,
    Ph,
    Alkalinity,
    Temperature,
}

impl Chemical {
    pub const ALL: [Chemical; 4] = [
        Chemical::Chlorine,
        Chemical::Ph,
        Chemical::Alkalinity,
        Chemical::Temperature,
    ];

    /// Human-readable name used in messages and issue lists
    pub fn display_name(&self) -> &'static str {
        match self {
            Chemical::Chlorine => "Chlorine",
            Chemical::Ph => "pH",
            Chemical::Alkalinity => "Alkalinity",
            Chemical::Temperature => "Temperature",
        }
    }

    /// Key used in serialized records and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            Chemical::Chlorine => "chlorine",
            Chemical::Ph => "ph",
            Chemical::Alkalinity => "alkalinity",
            Chemical::Temperature => "temperature",
        }
    }

    /// Display unit; pH is dimensionless
    pub fn unit(&self) -> &'static str {
        match self {
            Chemical::Chlorine | Chemical::Alkalinity => "ppm",
            Chemical::Ph => "",
            Chemical::Temperature => "°F",
        }
    }

    /// Absolute physical bounds `(min, max)`; `None` means unbounded
    pub fn physical_bounds(&self) -> (Option<f64>, Option<f64>) {
        match self {
            Chemical::Chlorine | Chemical::Alkalinity => (Some(0.0), None),
            Chemical::Ph => (Some(0.0), Some(14.0)),
            Chemical::Temperature => (Some(32.0), Some(120.0)),
        }
    }

    /// Format a value with its unit, e.g. `0.5 ppm`, `7.9`, `86 °F`
    pub fn format_value(&self, value: f64) -> String {
        match self.unit() {
            "" => format!("{}", value),
            unit => format!("{} {}", value, unit),
        }
    }
}

impl std::fmt::Display for Chemical {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for Chemical {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chlorine" | "cl" => Ok(Chemical::Chlorine),
            "ph" => Ok(Chemical::Ph),
            "alkalinity" | "ta" => Ok(Chemical::Alkalinity),
            "temperature" | "temp" => Ok(Chemical::Temperature),
            other => Err(format!("Unknown chemical: {}", other)),
        }
    }
}

/// Acceptable band and target value for one chemical
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeTier {
    pub min: f64,
    pub max: f64,
    pub ideal: f64,
}

impl RangeTier {
    pub const fn new(min: f64, max: f64, ideal: f64) -> Self {
        Self { min, max, ideal }
    }
}

/// Where a value sits relative to its acceptable band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Low,
    Ok,
    High,
}

/// Band membership shared by validation, status and dosing.
///
/// Bounds are inclusive: a value equal to `min` or `max` is in band.
pub fn classify(value: f64, tier: &RangeTier) -> Band {
    if value < tier.min {
        Band::Low
    } else if value > tier.max {
        Band::High
    } else {
        Band::Ok
    }
}

/// Range configuration for all four chemicals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeConfig {
    #[serde(default = "default_chlorine")]
    pub chlorine: RangeTier,

    #[serde(default = "default_ph")]
    pub ph: RangeTier,

    #[serde(default = "default_alkalinity")]
    pub alkalinity: RangeTier,

    #[serde(default = "default_temperature")]
    pub temperature: RangeTier,
}

fn default_chlorine() -> RangeTier {
    RangeTier::new(1.0, 3.0, 2.0)
}

fn default_ph() -> RangeTier {
    RangeTier::new(7.2, 7.6, 7.4)
}

fn default_alkalinity() -> RangeTier {
    RangeTier::new(80.0, 120.0, 100.0)
}

fn default_temperature() -> RangeTier {
    RangeTier::new(78.0, 84.0, 80.0)
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            chlorine: default_chlorine(),
            ph: default_ph(),
            alkalinity: default_alkalinity(),
            temperature: default_temperature(),
        }
    }
}

impl RangeConfig {
    pub fn tier(&self, chemical: Chemical) -> &RangeTier {
        match chemical {
            Chemical::Chlorine => &self.chlorine,
            Chemical::Ph => &self.ph,
            Chemical::Alkalinity => &self.alkalinity,
            Chemical::Temperature => &self.temperature,
        }
    }
}

/// Outcome of validating a (possibly partial) reading
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    /// Physically impossible or non-numeric input
    pub errors: Vec<String>,
    /// Physically valid but outside the acceptable band
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Overall pool condition, ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolStatus {
    Excellent,
    Good,
    Caution,
    Critical,
}

impl PoolStatus {
    /// Map an out-of-band field count to a level
    pub fn from_issue_count(count: usize) -> Self {
        match count {
            0 => PoolStatus::Excellent,
            1 => PoolStatus::Good,
            2 => PoolStatus::Caution,
            _ => PoolStatus::Critical,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PoolStatus::Excellent => "excellent",
            PoolStatus::Good => "good",
            PoolStatus::Caution => "caution",
            PoolStatus::Critical => "critical",
        }
    }
}

impl std::fmt::Display for PoolStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub level: PoolStatus,
    pub message: String,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentAction {
    Increase,
    Decrease,
}

/// Suggested correction toward a chemical's ideal value.
///
/// Amounts are rounded for display and are not dosing instructions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    pub action: AdjustmentAction,
    pub amount: f64,
    pub unit: String,
}

/// Only chemicals needing action are present
pub type Adjustments = BTreeMap<Chemical, Adjustment>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub direction: TrendDirection,
    pub percentage: f64,
}

impl Trend {
    pub fn stable() -> Self {
        Self {
            direction: TrendDirection::Stable,
            percentage: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_inclusive_bounds() {
        let tier = RangeTier::new(1.0, 3.0, 2.0);
        assert_eq!(classify(0.99, &tier), Band::Low);
        assert_eq!(classify(1.0, &tier), Band::Ok);
        assert_eq!(classify(3.0, &tier), Band::Ok);
        assert_eq!(classify(3.01, &tier), Band::High);
    }

    #[test]
    fn test_status_from_issue_count() {
        assert_eq!(PoolStatus::from_issue_count(0), PoolStatus::Excellent);
        assert_eq!(PoolStatus::from_issue_count(1), PoolStatus::Good);
        assert_eq!(PoolStatus::from_issue_count(2), PoolStatus::Caution);
        assert_eq!(PoolStatus::from_issue_count(3), PoolStatus::Critical);
        assert_eq!(PoolStatus::from_issue_count(4), PoolStatus::Critical);
        assert!(PoolStatus::Good < PoolStatus::Critical);
    }

    #[test]
    fn test_chemical_parse_and_format() {
        assert_eq!("pH".parse::<Chemical>(), Ok(Chemical::Ph));
        assert_eq!("Temp".parse::<Chemical>(), Ok(Chemical::Temperature));
        assert!("salt".parse::<Chemical>().is_err());

        assert_eq!(Chemical::Chlorine.format_value(0.5), "0.5 ppm");
        assert_eq!(Chemical::Ph.format_value(7.9), "7.9");
        assert_eq!(Chemical::Temperature.format_value(86.0), "86 °F");
    }

    #[test]
    fn test_range_config_partial_toml_style_json() {
        let config: RangeConfig =
            serde_json::from_str(r#"{"chlorine":{"min":2.0,"max":4.0,"ideal":3.0}}"#).unwrap();
        assert_eq!(config.chlorine, RangeTier::new(2.0, 4.0, 3.0));
        assert_eq!(config.ph, RangeConfig::default().ph);
    }

    #[test]
    fn test_adjustments_serialize_with_chemical_keys() {
        let mut adjustments = Adjustments::new();
        adjustments.insert(
            Chemical::Ph,
            Adjustment {
                action: AdjustmentAction::Decrease,
                amount: 0.4,
                unit: String::new(),
            },
        );
        let json = serde_json::to_value(&adjustments).unwrap();
        assert_eq!(json["ph"]["action"], "decrease");
    }
}
