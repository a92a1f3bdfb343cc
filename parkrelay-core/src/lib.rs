//! Core types and service wiring for the parkrelay parking data relay.

/// City table and endpoint settings.
pub mod config;
/// Error returned to callers of the service.
pub mod error;
/// Domain models and identifiers.
pub mod model;
/// Occupancy overlay onto the sensor table.
pub mod occupancy;
/// Fetch port implemented by HTTP backends.
pub mod ports;
/// Sensor table fan-out across all zones.
pub mod sensors;
/// High-level service facade used by clients.
pub mod service;
/// Shared sensor table with a readiness gate.
pub mod store;
/// Parser for the pipe-delimited occupancy summary.
pub mod summary;
/// Vacancy fan-out for a city's zones.
pub mod vacancy;

pub use config::*;
pub use error::*;
pub use model::*;
pub use ports::*;
pub use service::*;
pub use store::*;
