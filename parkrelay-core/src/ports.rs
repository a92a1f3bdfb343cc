//! Fetch port describing how flows talk to the upstream API.

use async_trait::async_trait;
use reqwest::Error as ReqwestError;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::Error as JsonError;
use serde_json::Value;

use crate::summary::SummaryError;

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while fetching or decoding upstream data.
pub enum PortError {
    /// Network layer failed or the upstream answered with an error status.
    #[error("Network error: {0}")]
    Network(#[from] ReqwestError),
    /// Response body was not the expected JSON shape.
    #[error("Decode error: {0}")]
    Decode(#[from] JsonError),
    /// Could not build a request URI.
    #[error("Invalid uri: {0}")]
    InvalidUri(String),
    /// Sensor entry without a usable first coordinate.
    #[error("Malformed sensor: {0}")]
    MalformedSensor(String),
    /// Vacancy response for the given zone had no reading.
    #[error("Missing reading for zone {0}")]
    MissingReading(u32),
    /// Occupancy summary did not follow the expected grammar.
    #[error("Malformed summary: {0}")]
    Summary(#[from] SummaryError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// How a response body should be read.
pub enum ResponseFormat {
    /// Parse the body as JSON.
    Json,
    /// Keep the body as raw text.
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A single outstanding upstream request.
pub struct FetchOption {
    /// Fully built request URI including the API key.
    pub uri: Url,
    /// Expected body format.
    pub format: ResponseFormat,
}

impl FetchOption {
    /// Request whose body is JSON.
    #[must_use]
    pub fn json(uri: Url) -> Self {
        Self {
            uri,
            format: ResponseFormat::Json,
        }
    }

    /// Request whose body is plain text.
    #[must_use]
    pub fn text(uri: Url) -> Self {
        Self {
            uri,
            format: ResponseFormat::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Body returned by a [`Fetcher`].
pub enum FetchBody {
    /// Parsed JSON document.
    Json(Value),
    /// Raw text.
    Text(String),
}

impl FetchBody {
    /// Decode the body into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::Decode`] when the body does not match `T`.
    pub fn into_json<T: DeserializeOwned>(self) -> Result<T, PortError> {
        match self {
            FetchBody::Json(value) => serde_json::from_value(value).map_err(PortError::from),
            FetchBody::Text(text) => serde_json::from_str(&text).map_err(PortError::from),
        }
    }

    /// Body as text, serializing JSON if needed.
    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            FetchBody::Json(value) => value.to_string(),
            FetchBody::Text(text) => text,
        }
    }
}

#[async_trait]
/// Trait for backends able to execute upstream requests.
pub trait Fetcher: Send + Sync {
    /// Execute one request.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the request fails or the body cannot be read.
    async fn fetch(&self, option: &FetchOption) -> Result<FetchBody, PortError>;
}
