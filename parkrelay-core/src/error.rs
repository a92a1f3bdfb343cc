//! Error surfaced to callers of the service.
//!
//! Callers only ever see one generic message per flow. The underlying
//! [`PortError`] stays reachable through [`std::error::Error::source`] for
//! logging.

use crate::ports::PortError;

#[derive(thiserror::Error, Debug)]
/// Failure of one service operation.
pub enum RelayError {
    /// The city has no entry in the city table.
    #[error("Unsupported city")]
    UnsupportedCity,
    /// The sensor table could not be built.
    #[error("Sensor table unavailable: {0}")]
    TableUnavailable(String),
    /// Building the sensor table failed.
    #[error("Error building sensor table")]
    SensorTable(#[source] PortError),
    /// Fetching or parsing the occupancy summary failed.
    #[error("Error parsing occupancies")]
    Occupancies(#[source] PortError),
    /// Fetching a zone vacancy failed.
    #[error("Error retrieving vacancies")]
    Vacancies(#[source] PortError),
}
