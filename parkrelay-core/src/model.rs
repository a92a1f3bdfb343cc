//! Domain data structures for cities, sensors, and zone vacancies.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::collections::hash_map::Values;
use std::fmt;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Format of the `startdate` / `enddate` query parameters.
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Identifier for a city known to parkrelay.
pub struct CityId(pub String);

impl fmt::Display for CityId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl From<&str> for CityId {
    fn from(slug: &str) -> Self {
        CityId(slug.to_owned())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Metadata describing a city and its human-friendly name.
pub struct CityMeta {
    /// Unique identifier.
    pub id: CityId,
    /// Display name.
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
/// Upstream identifier (`guid`) of a parking sensor.
pub struct SensorId(pub String);

impl Borrow<str> for SensorId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SensorId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A single parking sensor located by GPS coordinates.
pub struct SensorRecord {
    /// Upstream identifier.
    pub id: SensorId,
    /// Latitude exactly as reported upstream.
    pub latitude: String,
    /// Longitude exactly as reported upstream.
    pub longitude: String,
    /// Latest occupancy reading, empty until an overlay sets it.
    pub occupancy: String,
}

impl SensorRecord {
    /// Create a record with no occupancy reading yet.
    #[must_use]
    pub fn new(id: SensorId, latitude: String, longitude: String) -> Self {
        Self {
            id,
            latitude,
            longitude,
            occupancy: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
/// Outcome of overlaying occupancy readings onto a sensor table.
pub struct OverlayReport {
    /// Readings written to an existing sensor.
    pub applied: usize,
    /// Readings for sensors the table does not know.
    pub ignored: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
/// Sensors keyed by their upstream identifier.
pub struct SensorTable {
    sensors: HashMap<SensorId, SensorRecord>,
}

impl SensorTable {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, replacing any previous record with the same id.
    pub fn insert(&mut self, record: SensorRecord) -> Option<SensorRecord> {
        self.sensors.insert(record.id.clone(), record)
    }

    /// Look up a sensor by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&SensorRecord> {
        self.sensors.get(id)
    }

    /// Number of sensors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    /// True when no sensor is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    /// Iterator over all records in arbitrary order.
    pub fn records(&self) -> Values<'_, SensorId, SensorRecord> {
        self.sensors.values()
    }

    /// Write `occupancy` into the sensor `id`. Unknown ids are left alone.
    ///
    /// Returns whether the sensor existed.
    pub fn set_occupancy(&mut self, id: &str, occupancy: &str) -> bool {
        match self.sensors.get_mut(id) {
            Some(record) => {
                occupancy.clone_into(&mut record.occupancy);
                true
            }
            None => false,
        }
    }

    /// Overlay `(id, occupancy)` pairs, never inserting new sensors.
    pub fn overlay<'entry, I>(&mut self, readings: I) -> OverlayReport
    where
        I: IntoIterator<Item = (&'entry str, &'entry str)>,
    {
        let mut report = OverlayReport::default();
        for (id, occupancy) in readings {
            if self.set_occupancy(id, occupancy) {
                report.applied += 1;
            } else {
                report.ignored += 1;
            }
        }
        report
    }
}

impl FromIterator<SensorRecord> for SensorTable {
    fn from_iter<T: IntoIterator<Item = SensorRecord>>(iter: T) -> Self {
        let mut table = Self::new();
        for record in iter {
            table.insert(record);
        }
        table
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Vacancy reading for one zone, labelled for display.
pub struct ZoneVacancy {
    /// Display label of the zone.
    pub name: String,
    /// Vacancy reading as reported upstream (numeric text).
    pub vacancy: String,
}

impl ZoneVacancy {
    /// Numeric value used for ranking. Unparseable readings rank last.
    #[must_use]
    pub fn value(&self) -> f64 {
        self.vacancy
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| !value.is_nan())
            .unwrap_or(f64::NEG_INFINITY)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Start/end pair for vacancy queries.
pub struct TimeWindow {
    /// Start of the window.
    pub start: NaiveDateTime,
    /// End of the window.
    pub end: NaiveDateTime,
}

impl TimeWindow {
    /// The hour ending at `now`.
    #[must_use]
    pub fn last_hour(now: NaiveDateTime) -> Self {
        Self {
            start: now - Duration::hours(1),
            end: now,
        }
    }

    /// Value of the `startdate` query parameter.
    #[must_use]
    pub fn start_param(&self) -> String {
        self.start.format(TIME_FORMAT).to_string()
    }

    /// Value of the `enddate` query parameter.
    #[must_use]
    pub fn end_param(&self) -> String {
        self.end.format(TIME_FORMAT).to_string()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn record(id: &str) -> SensorRecord {
        SensorRecord::new(SensorId(id.to_owned()), "37.44".into(), "-122.16".into())
    }

    #[test]
    fn overlay_only_touches_known_sensors() {
        let mut table: SensorTable = [record("a"), record("b")].into_iter().collect();

        let report = table.overlay([("a", "1"), ("zzz", "0"), ("b", "0")]);

        assert_eq!(report, OverlayReport { applied: 2, ignored: 1 });
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("a").map(|rec| rec.occupancy.as_str()), Some("1"));
        assert_eq!(table.get("b").map(|rec| rec.occupancy.as_str()), Some("0"));
        assert!(table.get("zzz").is_none());
    }

    #[test]
    fn unparseable_vacancy_ranks_last() {
        let junk = ZoneVacancy {
            name: "x".into(),
            vacancy: "n/a".into(),
        };
        let zero = ZoneVacancy {
            name: "y".into(),
            vacancy: " 0 ".into(),
        };
        assert!(junk.value() < zero.value());
        assert!((zero.value() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn last_hour_formats_query_params() {
        let now = NaiveDate::from_ymd_opt(2015, 6, 3)
            .and_then(|date| date.and_hms_opt(0, 30, 5))
            .expect("valid timestamp");

        let window = TimeWindow::last_hour(now);

        assert_eq!(window.start_param(), "2015-06-02T23:30:05");
        assert_eq!(window.end_param(), "2015-06-03T00:30:05");
    }
}
