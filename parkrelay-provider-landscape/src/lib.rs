//! Backend for the Landscape Computing (VIMOC) parking API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tracing::debug;

use parkrelay_core::{
    config::{CityConfig, ConfigError, RelayConfig, ZONE_TOKEN},
    model::{CityId, CityMeta},
    ports::{FetchBody, FetchOption, Fetcher, PortError, ResponseFormat},
};

/// Root of the REST API; every endpoint path is relative to it.
pub const BASE_URL: &str = "http://api.landscape-computing.com/nboxws/rest/v1/";

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("parkrelay/", env!("CARGO_PKG_VERSION"));

/// [`Fetcher`] that talks to the API over HTTP.
pub struct LandscapeFetcher {
    client: Client,
}

impl LandscapeFetcher {
    /// Create a fetcher bound to the given HTTP client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for LandscapeFetcher {
    async fn fetch(&self, option: &FetchOption) -> Result<FetchBody, PortError> {
        // the query string carries the API key, keep it out of the logs
        debug!(path = option.uri.path(), format = ?option.format, "fetching");

        let req = self.client.get(option.uri.clone());
        match option.format {
            ResponseFormat::Json => fetch_json(req).await.map(FetchBody::Json),
            ResponseFormat::Text => fetch_text(req).await.map(FetchBody::Text),
        }
    }
}

/// Build the shared HTTP client.
///
/// # Errors
///
/// Returns the underlying [`reqwest::Error`] when the TLS backend cannot be initialised.
pub fn client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
}

/// Build the fetch backend for the service.
#[must_use]
pub fn fetcher(client: Client) -> Arc<dyn Fetcher> {
    Arc::new(LandscapeFetcher::new(client))
}

/// Validated configuration covering every city served by the API.
///
/// `base_url` overrides [`BASE_URL`], e.g. for a staging deployment.
///
/// # Errors
///
/// Returns a [`ConfigError`] when `base_url` is not a usable URL.
pub fn config(api_key: &str, base_url: Option<&str>) -> Result<RelayConfig, ConfigError> {
    RelayConfig::new(base_url.unwrap_or(BASE_URL), api_key, cities())
}

/// City table of the API. Sites are addressed by a two-letter code.
#[must_use]
pub fn cities() -> Vec<CityConfig> {
    vec![
        city(
            "palo-alto",
            "Palo Alto",
            "pa",
            2,
            &["University Avenue", "California Avenue", "Downtown North"],
        ),
        city(
            "newcastle",
            "Newcastle",
            "lg",
            4,
            &["Hunter Street", "King Street"],
        ),
    ]
}

fn city(id: &str, name: &str, site: &str, sensor_zones: u32, vacancy_zones: &[&str]) -> CityConfig {
    CityConfig {
        meta: CityMeta {
            id: CityId::from(id),
            name: name.to_owned(),
        },
        sensor_template: format!("zone/{site}_{ZONE_TOKEN}/"),
        sensor_zone_count: sensor_zones,
        summary_path: format!("site/{site}/query/summary/"),
        vacancy_template: format!("zone/{site}_{ZONE_TOKEN}/query/vacancy/"),
        vacancy_zones: vacancy_zones.iter().map(|zone| (*zone).to_owned()).collect(),
    }
}

// Small helpers to fetch and decode bodies with status handling.
async fn fetch_json(req: RequestBuilder) -> Result<Value, PortError> {
    req.send()
        .await
        .map_err(PortError::from)?
        .error_for_status()
        .map_err(PortError::from)?
        .json()
        .await
        .map_err(PortError::from)
}

async fn fetch_text(req: RequestBuilder) -> Result<String, PortError> {
    req.send()
        .await
        .map_err(PortError::from)?
        .error_for_status()
        .map_err(PortError::from)?
        .text()
        .await
        .map_err(PortError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn city_table_is_valid() {
        let config = config("", None).expect("built-in table validates");

        assert!(!config.has_api_key());
        assert_eq!(config.base_url().as_str(), BASE_URL);
        assert_eq!(config.cities().len(), 2);
    }

    #[test]
    fn sensor_zones_match_the_api() {
        let config = config("k", None).expect("built-in table validates");

        let paths = config
            .sensor_options()
            .expect("paths resolve")
            .into_iter()
            .map(|option| option.uri.path().to_owned())
            .collect::<Vec<_>>();

        assert_eq!(
            paths,
            vec![
                "/nboxws/rest/v1/zone/pa_1/",
                "/nboxws/rest/v1/zone/pa_2/",
                "/nboxws/rest/v1/zone/lg_1/",
                "/nboxws/rest/v1/zone/lg_2/",
                "/nboxws/rest/v1/zone/lg_3/",
                "/nboxws/rest/v1/zone/lg_4/",
            ]
        );
    }

    #[test]
    fn vacancy_zone_counts() {
        let config = config("k", None).expect("built-in table validates");

        let counts = config
            .cities()
            .iter()
            .map(|city| (city.meta.id.0.as_str(), city.vacancy_zones.len()))
            .collect::<Vec<_>>();

        assert_eq!(counts, vec![("palo-alto", 3), ("newcastle", 2)]);
    }

    #[test]
    fn summary_endpoint_per_site() {
        let config = config("k", Some("http://staging.test/api")).expect("override parses");
        let city = config
            .city(&CityId::from("newcastle"))
            .expect("configured");

        let option = config.summary_option(city).expect("path resolves");

        assert_eq!(
            option.uri.as_str(),
            "http://staging.test/api/site/lg/query/summary/?key=k"
        );
    }
}
