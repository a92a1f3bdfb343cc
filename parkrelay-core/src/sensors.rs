//! Sensor table builder: fans out over every sensor zone and merges the
//! listings into one table.

use futures::future::try_join_all;
use serde::Deserialize;
use tracing::debug;

use crate::config::RelayConfig;
use crate::model::{SensorId, SensorRecord, SensorTable};
use crate::ports::{Fetcher, PortError};

/// Listing returned by a sensor zone endpoint.
#[derive(Debug, Deserialize)]
struct ZoneListing {
    #[serde(rename = "sensorId", default)]
    sensors: Vec<SensorEntry>,
}

/// Single sensor inside a zone listing.
#[derive(Debug, Deserialize)]
struct SensorEntry {
    guid: String,
    /// `"lat, long"` strings; only the first one is used.
    #[serde(rename = "gpsCoord", default)]
    gps_coords: Vec<String>,
}

impl SensorEntry {
    fn into_record(self) -> Result<SensorRecord, PortError> {
        let (latitude, longitude) = self
            .gps_coords
            .first()
            .and_then(|coord| coord.split_once(','))
            .map(|(lat, long)| (lat.trim().to_owned(), long.trim().to_owned()))
            .ok_or_else(|| PortError::MalformedSensor(self.guid.clone()))?;

        Ok(SensorRecord::new(SensorId(self.guid), latitude, longitude))
    }
}

/// Fetch every sensor zone in parallel and merge the listings.
///
/// Later zones win when two listings share a sensor id.
///
/// # Errors
///
/// Returns a [`PortError`] as soon as any zone fails to fetch or decode.
pub async fn build_sensor_table(
    fetcher: &dyn Fetcher,
    config: &RelayConfig,
) -> Result<SensorTable, PortError> {
    let options = config.sensor_options()?;
    debug!(zones = options.len(), "fetching sensor zones");

    let bodies = try_join_all(options.iter().map(|option| fetcher.fetch(option))).await?;

    let mut table = SensorTable::new();
    for body in bodies {
        let listing = body.into_json::<ZoneListing>()?;
        for entry in listing.sensors {
            table.insert(entry.into_record()?);
        }
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(coords: &[&str]) -> SensorEntry {
        SensorEntry {
            guid: "g-1".into(),
            gps_coords: coords.iter().map(|coord| (*coord).to_owned()).collect(),
        }
    }

    #[test]
    fn first_coordinate_is_split_and_trimmed() {
        let record = entry(&[" 37.4437 ,  -122.1602 ", "0, 0"])
            .into_record()
            .expect("coordinate present");

        assert_eq!(record.latitude, "37.4437");
        assert_eq!(record.longitude, "-122.1602");
        assert!(record.occupancy.is_empty());
    }

    #[test]
    fn missing_coordinate_is_malformed() {
        assert!(matches!(
            entry(&[]).into_record(),
            Err(PortError::MalformedSensor(guid)) if guid == "g-1"
        ));
        assert!(matches!(
            entry(&["37.4437"]).into_record(),
            Err(PortError::MalformedSensor(_))
        ));
    }
}
