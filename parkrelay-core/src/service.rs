//! High-level service facade combining the fetch backend, city table and
//! sensor store.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::model::{CityId, CityMeta, SensorTable, TimeWindow, ZoneVacancy};
use crate::occupancy::update_occupancies;
use crate::ports::Fetcher;
use crate::sensors::build_sensor_table;
use crate::store::SensorStore;
use crate::vacancy::zone_vacancies;

/// Public entry point for the sensor, occupancy and vacancy flows.
pub struct ParkingService {
    fetcher: Arc<dyn Fetcher>,
    config: Arc<RelayConfig>,
    store: Arc<SensorStore>,
}

impl ParkingService {
    /// Create a new service with an empty sensor store.
    #[must_use]
    pub fn new(fetcher: Arc<dyn Fetcher>, config: Arc<RelayConfig>) -> Self {
        Self {
            fetcher,
            config,
            store: Arc::new(SensorStore::new()),
        }
    }

    /// List all configured cities.
    #[must_use]
    pub fn cities(&self) -> Vec<CityMeta> {
        self.config
            .cities()
            .iter()
            .map(|city| city.meta.clone())
            .collect()
    }

    /// Handle to the shared sensor store.
    #[must_use]
    pub fn sensor_store(&self) -> Arc<SensorStore> {
        Arc::clone(&self.store)
    }

    /// Build the sensor table from every zone and publish it.
    ///
    /// A failure is recorded in the store so waiting readers are released.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::SensorTable`] when any zone fails.
    pub async fn build_sensor_table(&self) -> Result<(), RelayError> {
        match build_sensor_table(self.fetcher.as_ref(), &self.config).await {
            Ok(table) => {
                info!(sensors = table.len(), "sensor table published");
                self.store.publish(table).await;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "sensor table build failed");
                self.store.fail(err.to_string());
                Err(RelayError::SensorTable(err))
            }
        }
    }

    /// Start the sensor table build on the runtime.
    #[must_use]
    pub fn spawn_sensor_build(self: &Arc<Self>) -> JoinHandle<Result<(), RelayError>> {
        let service = Arc::clone(self);
        tokio::spawn(async move { service.build_sensor_table().await })
    }

    /// Overlay the city's latest occupancies onto the sensor table.
    ///
    /// # Errors
    ///
    /// Returns a [`RelayError`] if the city is unsupported, the table is
    /// unavailable, or the summary cannot be fetched or parsed.
    pub async fn update_occupancies(&self, city: &CityId) -> Result<SensorTable, RelayError> {
        update_occupancies(self.fetcher.as_ref(), &self.config, &self.store, city).await
    }

    /// Ranked vacancies of the city's zones within a time window.
    ///
    /// # Errors
    ///
    /// Returns a [`RelayError`] if the city is unsupported or any zone query fails.
    pub async fn vacancies(
        &self,
        city: &CityId,
        window: TimeWindow,
    ) -> Result<Vec<ZoneVacancy>, RelayError> {
        zone_vacancies(self.fetcher.as_ref(), &self.config, city, window).await
    }
}
