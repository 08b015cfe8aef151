///! Pool chemistry analysis
///!
///! Pure functions over readings and an injected `RangeConfig`:
///! - `validate`: physical bounds (errors) and acceptable bands (warnings)
///! - `derive_status`: overall pool status with an issue list
///! - `compute_adjustments`: dosing direction toward the ideal value
///! - `compute_trend`: change between the two most recent readings

mod validation;
pub use validation::{physical_error, validate};

mod status;
pub use status::derive_status;

mod adjustment;
pub use adjustment::compute_adjustments;

mod trend;
pub use trend::{TREND_NOISE_THRESHOLD, compute_trend};
