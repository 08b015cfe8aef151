//! Shared data model for pool chemistry readings.
//!
//! Types only: chemicals, readings, range tiers and the result shapes
//! produced by the backend analysis functions.

pub mod reading;
pub mod types;

pub use reading::{ChemicalReading, Measurements, ReadingError, format_timestamp, parse_timestamp};
pub use types::*;
