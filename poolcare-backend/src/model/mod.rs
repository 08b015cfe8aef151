pub mod readings;
pub mod storage;

pub use readings::{DEFAULT_READINGS_NAMESPACE, ReadingLog};
