//! Declarative city table and endpoint settings.
//!
//! Every city is described by one [`CityConfig`]; flows never branch on a
//! particular city. Endpoint templates contain [`ZONE_TOKEN`], which is
//! replaced by the 1-based zone number.

use std::collections::HashSet;

use reqwest::Url;

use crate::error::RelayError;
use crate::model::{CityId, CityMeta, TimeWindow};
use crate::ports::{FetchOption, PortError};

/// Placeholder for the zone number inside endpoint templates.
pub const ZONE_TOKEN: &str = "{zone}";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
/// Problems found while validating a [`RelayConfig`].
pub enum ConfigError {
    /// The base URL does not parse or cannot carry paths.
    #[error("Invalid base url {0:?}")]
    InvalidBaseUrl(String),
    /// No city configured.
    #[error("No cities configured")]
    NoCities,
    /// Two cities share an id.
    #[error("Duplicate city id {0}")]
    DuplicateCity(CityId),
    /// A template lacks the zone placeholder.
    #[error("Template for {0} is missing the {{zone}} placeholder")]
    MissingZoneToken(CityId),
    /// A city has no zones for one of the flows.
    #[error("City {0} has no zones configured")]
    NoZones(CityId),
}

#[derive(Debug, Clone)]
/// Endpoints and zones of a single city.
pub struct CityConfig {
    /// Id and display name.
    pub meta: CityMeta,
    /// Sensor listing path, relative to the base url, containing [`ZONE_TOKEN`].
    pub sensor_template: String,
    /// Number of sensor listing zones.
    pub sensor_zone_count: u32,
    /// Occupancy summary path, relative to the base url.
    pub summary_path: String,
    /// Vacancy query path, relative to the base url, containing [`ZONE_TOKEN`].
    pub vacancy_template: String,
    /// Display names of the vacancy zones, in zone order.
    pub vacancy_zones: Vec<String>,
}

impl CityConfig {
    /// Sensor listing paths for zones `1..=sensor_zone_count`.
    pub fn sensor_paths(&self) -> impl Iterator<Item = String> + '_ {
        (1..=self.sensor_zone_count).map(|zone| expand_zone(&self.sensor_template, zone))
    }

    /// Vacancy query paths paired with their zone number and display name.
    pub fn vacancy_paths(&self) -> impl Iterator<Item = (u32, &str, String)> + '_ {
        (1_u32..).zip(&self.vacancy_zones).map(|(zone, name)| {
            (zone, name.as_str(), expand_zone(&self.vacancy_template, zone))
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let id = &self.meta.id;
        if !self.sensor_template.contains(ZONE_TOKEN) || !self.vacancy_template.contains(ZONE_TOKEN)
        {
            return Err(ConfigError::MissingZoneToken(id.clone()));
        }
        if self.sensor_zone_count == 0 || self.vacancy_zones.is_empty() {
            return Err(ConfigError::NoZones(id.clone()));
        }
        Ok(())
    }
}

/// Substitute `zone` for [`ZONE_TOKEN`] in `template`.
#[must_use]
pub fn expand_zone(template: &str, zone: u32) -> String {
    template.replace(ZONE_TOKEN, &zone.to_string())
}

#[derive(Debug, Clone)]
/// Validated city table together with the API endpoint settings.
pub struct RelayConfig {
    base_url: Url,
    api_key: String,
    cities: Vec<CityConfig>,
}

impl RelayConfig {
    /// Validate and build a configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the base url is unusable or the city
    /// table is inconsistent.
    pub fn new<K: Into<String>>(
        base_url: &str,
        api_key: K,
        cities: Vec<CityConfig>,
    ) -> Result<Self, ConfigError> {
        // Url::join drops the last path segment unless it ends with a slash.
        let normalized = if base_url.ends_with('/') {
            base_url.to_owned()
        } else {
            format!("{base_url}/")
        };
        let base_url = Url::parse(&normalized)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ConfigError::InvalidBaseUrl(normalized.clone()))?;

        if cities.is_empty() {
            return Err(ConfigError::NoCities);
        }
        let mut seen = HashSet::new();
        for city in &cities {
            if !seen.insert(&city.meta.id) {
                return Err(ConfigError::DuplicateCity(city.meta.id.clone()));
            }
            city.validate()?;
        }

        Ok(Self {
            base_url,
            api_key: api_key.into(),
            cities,
        })
    }

    /// All configured cities in table order.
    #[must_use]
    pub fn cities(&self) -> &[CityConfig] {
        &self.cities
    }

    /// Look up a city.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::UnsupportedCity`] when the id is not configured.
    pub fn city(&self, id: &CityId) -> Result<&CityConfig, RelayError> {
        self.cities
            .iter()
            .find(|city| &city.meta.id == id)
            .ok_or(RelayError::UnsupportedCity)
    }

    /// Base url every path is resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// True when an API key is configured.
    #[must_use]
    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Resolve `path` and append the API key.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::InvalidUri`] when `path` cannot be joined onto the base url.
    pub fn endpoint(&self, path: &str) -> Result<Url, PortError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|err| PortError::InvalidUri(format!("{path}: {err}")))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }

    /// One JSON request per sensor zone of every city.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::InvalidUri`] when a path cannot be resolved.
    pub fn sensor_options(&self) -> Result<Vec<FetchOption>, PortError> {
        self.cities
            .iter()
            .flat_map(CityConfig::sensor_paths)
            .map(|path| self.endpoint(&path).map(FetchOption::json))
            .collect()
    }

    /// Text request for the city's occupancy summary.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::InvalidUri`] when the path cannot be resolved.
    pub fn summary_option(&self, city: &CityConfig) -> Result<FetchOption, PortError> {
        self.endpoint(&city.summary_path).map(FetchOption::text)
    }

    /// One JSON request per vacancy zone of `city`, limited to `window`.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::InvalidUri`] when a path cannot be resolved.
    pub fn vacancy_options(
        &self,
        city: &CityConfig,
        window: TimeWindow,
    ) -> Result<Vec<FetchOption>, PortError> {
        let start = window.start_param();
        let end = window.end_param();
        city.vacancy_paths()
            .map(|(_zone, _name, path)| {
                let mut url = self.endpoint(&path)?;
                url.query_pairs_mut()
                    .append_pair("startdate", &start)
                    .append_pair("enddate", &end);
                Ok::<_, PortError>(FetchOption::json(url))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn city(id: &str) -> CityConfig {
        CityConfig {
            meta: CityMeta {
                id: CityId::from(id),
                name: id.to_uppercase(),
            },
            sensor_template: format!("zone/{id}_{ZONE_TOKEN}/"),
            sensor_zone_count: 2,
            summary_path: format!("site/{id}/query/summary/"),
            vacancy_template: format!("zone/{id}_{ZONE_TOKEN}/query/vacancy/"),
            vacancy_zones: vec!["North".into(), "South".into(), "East".into()],
        }
    }

    fn config() -> RelayConfig {
        RelayConfig::new("http://api.example.test/rest/v1", "secret", vec![city("pa"), city("lg")])
            .expect("valid config")
    }

    #[test]
    fn sensor_options_cover_every_zone_of_every_city() {
        let uris = config()
            .sensor_options()
            .expect("paths resolve")
            .into_iter()
            .map(|option| option.uri.to_string())
            .collect::<Vec<_>>();

        assert_eq!(
            uris,
            vec![
                "http://api.example.test/rest/v1/zone/pa_1/?key=secret",
                "http://api.example.test/rest/v1/zone/pa_2/?key=secret",
                "http://api.example.test/rest/v1/zone/lg_1/?key=secret",
                "http://api.example.test/rest/v1/zone/lg_2/?key=secret",
            ]
        );
    }

    #[test]
    fn vacancy_options_carry_the_time_window() {
        let config = config();
        let now = NaiveDate::from_ymd_opt(2015, 6, 3)
            .and_then(|date| date.and_hms_opt(10, 0, 0))
            .expect("valid timestamp");
        let city = config.city(&CityId::from("pa")).expect("configured");

        let options = config
            .vacancy_options(city, TimeWindow::last_hour(now))
            .expect("paths resolve");

        assert_eq!(options.len(), 3);
        let last = options.last().expect("three options");
        assert_eq!(last.uri.path(), "/rest/v1/zone/pa_3/query/vacancy/");
        let query = last
            .uri
            .query_pairs()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>();
        assert_eq!(
            query,
            vec![
                "key=secret",
                "startdate=2015-06-03T09:00:00",
                "enddate=2015-06-03T10:00:00",
            ]
        );
    }

    #[test]
    fn summary_option_is_text() {
        let config = config();
        let city = config.city(&CityId::from("lg")).expect("configured");

        let option = config.summary_option(city).expect("path resolves");

        assert_eq!(option.format, crate::ports::ResponseFormat::Text);
        assert_eq!(option.uri.path(), "/rest/v1/site/lg/query/summary/");
    }

    #[test]
    fn unknown_city_is_unsupported() {
        assert!(matches!(
            config().city(&CityId::from("berlin")),
            Err(RelayError::UnsupportedCity)
        ));
    }

    #[test]
    fn rejects_inconsistent_tables() {
        let base = "http://api.example.test/";

        assert_eq!(
            RelayConfig::new(base, "", Vec::new()).err(),
            Some(ConfigError::NoCities)
        );
        assert_eq!(
            RelayConfig::new(base, "", vec![city("pa"), city("pa")]).err(),
            Some(ConfigError::DuplicateCity(CityId::from("pa")))
        );

        let mut tokenless = city("pa");
        tokenless.vacancy_template = "zone/pa_1/query/vacancy/".into();
        assert_eq!(
            RelayConfig::new(base, "", vec![tokenless]).err(),
            Some(ConfigError::MissingZoneToken(CityId::from("pa")))
        );

        let mut zoneless = city("pa");
        zoneless.vacancy_zones.clear();
        assert_eq!(
            RelayConfig::new(base, "", vec![zoneless]).err(),
            Some(ConfigError::NoZones(CityId::from("pa")))
        );

        assert!(matches!(
            RelayConfig::new("not a url", "", vec![city("pa")]),
            Err(ConfigError::InvalidBaseUrl(_))
        ));
    }
}
