//! Pool chemistry record keeping.
//!
//! - `module::chemistry`: validation, status, dosing and trend analysis
//! - `model::storage`: namespaced, TTL-aware key-value persistence
//! - `service::PoolService`: the reading workflow tying both together

pub mod command;
pub mod config;
pub mod logging;
pub mod model;
pub mod module;
pub mod service;
