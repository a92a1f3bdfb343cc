//! Occupancy updater: overlays a city's summary onto the sensor table.

use tracing::{debug, warn};

use crate::config::{CityConfig, RelayConfig};
use crate::error::RelayError;
use crate::model::{CityId, SensorTable};
use crate::ports::{Fetcher, PortError};
use crate::store::SensorStore;
use crate::summary::{OccupancyEntry, parse_summary};

/// Fetch the city's occupancy summary and overlay it onto the stored table.
///
/// The summary is parsed completely before the table is touched, so a
/// failed fetch or a malformed body leaves the table unchanged. Readings
/// for unknown sensors are ignored.
///
/// # Errors
///
/// Returns [`RelayError::UnsupportedCity`] for unknown cities,
/// [`RelayError::TableUnavailable`] when the table could not be built, and
/// [`RelayError::Occupancies`] when fetching or parsing fails.
pub async fn update_occupancies(
    fetcher: &dyn Fetcher,
    config: &RelayConfig,
    store: &SensorStore,
    city: &CityId,
) -> Result<SensorTable, RelayError> {
    let city_config = config.city(city)?;
    store.wait_ready().await?;

    let entries = fetch_entries(fetcher, config, city_config).await.map_err(|err| {
        warn!(%city, error = %err, "occupancy summary failed");
        RelayError::Occupancies(err)
    })?;

    let (report, table) = store
        .overlay(
            entries
                .iter()
                .map(|entry| (entry.sensor_id.as_str(), entry.occupancy.as_str())),
        )
        .await?;
    debug!(%city, applied = report.applied, ignored = report.ignored, "occupancies overlaid");

    Ok(table)
}

async fn fetch_entries(
    fetcher: &dyn Fetcher,
    config: &RelayConfig,
    city: &CityConfig,
) -> Result<Vec<OccupancyEntry>, PortError> {
    let option = config.summary_option(city)?;
    let body = fetcher.fetch(&option).await?.into_text();
    Ok(parse_summary(&body)?)
}
