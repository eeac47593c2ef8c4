//! Best-effort outdoor weather lookups against OpenWeatherMap.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use thermostat_bridge_common::Coordinates;

const GEOCODING_URL: &str = "https://api.openweathermap.org/geo/1.0/direct";
const ONE_CALL_URL: &str = "https://api.openweathermap.org/data/3.0/onecall";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("no geocoding match for {0:?}")]
    NoMatch(String),
    #[error("weather response has no current temperature")]
    MissingTemperature,
}

#[async_trait]
pub trait WeatherLookup: Send + Sync {
    async fn geocode(&self, location: &str) -> Result<Coordinates, WeatherError>;

    /// Current outdoor temperature in Celsius.
    async fn current_temperature(&self, coordinates: Coordinates) -> Result<f64, WeatherError>;
}

#[derive(Debug, Deserialize)]
struct GeocodeMatch {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OneCallResponse {
    current: Option<CurrentConditions>,
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    temp: Option<f64>,
}

fn first_match(location: &str, matches: Vec<GeocodeMatch>) -> Result<Coordinates, WeatherError> {
    matches
        .into_iter()
        .next()
        .map(|found| Coordinates {
            lat: found.lat,
            lon: found.lon,
        })
        .ok_or_else(|| WeatherError::NoMatch(location.to_string()))
}

fn current_temp(response: OneCallResponse) -> Result<f64, WeatherError> {
    response
        .current
        .and_then(|current| current.temp)
        .ok_or(WeatherError::MissingTemperature)
}

pub struct OpenWeatherClient {
    http: reqwest::Client,
    api_key: String,
}

impl OpenWeatherClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, WeatherError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl WeatherLookup for OpenWeatherClient {
    async fn geocode(&self, location: &str) -> Result<Coordinates, WeatherError> {
        debug!("resolving coordinates for {location:?}");
        let matches: Vec<GeocodeMatch> = self
            .http
            .get(GEOCODING_URL)
            .query(&[
                ("q", location),
                ("limit", "1"),
                ("appid", self.api_key.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        first_match(location, matches)
    }

    async fn current_temperature(&self, coordinates: Coordinates) -> Result<f64, WeatherError> {
        debug!(
            "fetching weather for {:.3},{:.3}",
            coordinates.lat, coordinates.lon
        );
        let response: OneCallResponse = self
            .http
            .get(ONE_CALL_URL)
            .query(&[
                ("lat", coordinates.lat.to_string()),
                ("lon", coordinates.lon.to_string()),
                ("exclude", "minutely,hourly,daily,alerts".to_string()),
                ("units", "metric".to_string()),
                ("appid", self.api_key.clone()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        current_temp(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geocode_takes_first_match() {
        let matches: Vec<GeocodeMatch> = serde_json::from_str(
            r#"[{"name":"Portland","lat":45.52,"lon":-122.67,"country":"US"},{"lat":43.6,"lon":-70.2}]"#,
        )
        .unwrap();

        let coordinates = first_match("Portland", matches).unwrap();
        assert_eq!(coordinates.lat, 45.52);
        assert_eq!(coordinates.lon, -122.67);
    }

    #[test]
    fn empty_geocode_result_is_an_error() {
        let err = first_match("Atlantis", Vec::new()).unwrap_err();
        assert!(matches!(err, WeatherError::NoMatch(location) if location == "Atlantis"));
    }

    #[test]
    fn reads_current_temperature() {
        let response: OneCallResponse =
            serde_json::from_str(r#"{"lat":45.5,"current":{"dt":1,"temp":11.4,"humidity":80}}"#)
                .unwrap();
        assert_eq!(current_temp(response).unwrap(), 11.4);
    }

    #[test]
    fn missing_current_block_is_an_error() {
        let response: OneCallResponse = serde_json::from_str(r#"{"lat":45.5}"#).unwrap();
        assert!(matches!(
            current_temp(response),
            Err(WeatherError::MissingTemperature)
        ));
    }
}
