//! Shared sensor table guarded by a readiness gate.

use tokio::sync::{RwLock, watch};

use crate::error::RelayError;
use crate::model::{OverlayReport, SensorTable};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Build state of a [`SensorStore`].
pub enum Readiness {
    /// The first build has not finished.
    Building,
    /// A table has been published.
    Ready,
    /// The build failed before any table was published.
    Failed(String),
}

/// Sensor table shared between the table builder and the occupancy updater.
///
/// Readers never observe a missing or half-built table: every access waits
/// until the store leaves [`Readiness::Building`].
#[derive(Debug)]
pub struct SensorStore {
    table: RwLock<SensorTable>,
    state: watch::Sender<Readiness>,
}

impl Default for SensorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorStore {
    /// Empty store waiting for its first table.
    #[must_use]
    pub fn new() -> Self {
        let (state, _initial) = watch::channel(Readiness::Building);
        Self {
            table: RwLock::new(SensorTable::new()),
            state,
        }
    }

    /// Current build state without waiting.
    #[must_use]
    pub fn readiness(&self) -> Readiness {
        self.state.borrow().clone()
    }

    /// Replace the table and open the gate.
    pub async fn publish(&self, table: SensorTable) {
        *self.table.write().await = table;
        self.state.send_replace(Readiness::Ready);
    }

    /// Record a failed build.
    ///
    /// A store that already holds a table keeps serving it.
    pub fn fail(&self, reason: impl Into<String>) {
        let reason = reason.into();
        self.state.send_if_modified(|state| {
            if *state == Readiness::Ready {
                false
            } else {
                *state = Readiness::Failed(reason);
                true
            }
        });
    }

    /// Wait until a table is published or the build fails.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::TableUnavailable`] when the build failed.
    pub async fn wait_ready(&self) -> Result<(), RelayError> {
        let mut receiver = self.state.subscribe();
        let state = receiver
            .wait_for(|state| *state != Readiness::Building)
            .await
            .map(|state| (*state).clone())
            .map_err(|closed| RelayError::TableUnavailable(closed.to_string()))?;

        match state {
            Readiness::Failed(reason) => Err(RelayError::TableUnavailable(reason)),
            Readiness::Building | Readiness::Ready => Ok(()),
        }
    }

    /// Copy of the table once it is ready.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::TableUnavailable`] when the build failed.
    pub async fn snapshot(&self) -> Result<SensorTable, RelayError> {
        self.wait_ready().await?;
        Ok(self.table.read().await.clone())
    }

    /// Overlay occupancy readings once the table is ready and return the
    /// updated table.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::TableUnavailable`] when the build failed.
    pub async fn overlay<'entry, I>(
        &self,
        readings: I,
    ) -> Result<(OverlayReport, SensorTable), RelayError>
    where
        I: IntoIterator<Item = (&'entry str, &'entry str)>,
    {
        self.wait_ready().await?;
        let mut table = self.table.write().await;
        let report = table.overlay(readings);
        Ok((report, table.clone()))
    }
}
