//! Hourly weather-window lookup backed by Open-Meteo.
//!
//! A lookup geocodes a place name, fetches one day of hourly forecast and
//! returns the first few samples. Every failure is folded into
//! [`WeatherReport::Failed`] so callers can hand the result straight back to
//! the model.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::rchain::RequestFailure;
use crate::rchain::chat_runtime::send_once;

pub const DEFAULT_GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
pub const DEFAULT_FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
pub const DEFAULT_HOURS: i64 = 12;
pub const MIN_HOURS: i64 = 1;
pub const MAX_HOURS: i64 = 24;
pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Clamps a requested window length into `[MIN_HOURS, MAX_HOURS]`.
pub fn clamp_hours(hours: i64) -> usize {
    hours.clamp(MIN_HOURS, MAX_HOURS) as usize
}

/// One hourly reading. Values are passed through exactly as the provider sent
/// them; a missing entry becomes `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlySample {
    pub time: String,
    pub temperature_c: Value,
    pub precipitation_probability: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherWindow {
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Number of samples actually returned.
    pub window_hours: usize,
    pub samples: Vec<HourlySample>,
}

/// Outcome of one lookup, serialized flat for the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WeatherReport {
    Window(WeatherWindow),
    Failed { city: String, error: String },
}

impl WeatherReport {
    fn failed(city: &str, error: impl Into<String>) -> Self {
        WeatherReport::Failed {
            city: city.to_string(),
            error: error.into(),
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            WeatherReport::Window(_) => None,
            WeatherReport::Failed { error, .. } => Some(error),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Option<Vec<GeoMatch>>,
}

#[derive(Debug, Deserialize)]
struct GeoMatch {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Default, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    hourly: HourlySeries,
}

#[derive(Debug, Default, Deserialize)]
struct HourlySeries {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    temperature_2m: Vec<Value>,
    #[serde(default)]
    precipitation_probability: Vec<Value>,
}

impl HourlySeries {
    /// Zips the parallel arrays positionally, bounded by the timestamp count.
    fn window(self, hours: usize) -> Vec<HourlySample> {
        let count = hours.min(self.time.len());
        let mut temperatures = self.temperature_2m.into_iter();
        let mut precipitation = self.precipitation_probability.into_iter();
        self.time
            .into_iter()
            .take(count)
            .map(|time| HourlySample {
                time,
                temperature_c: temperatures.next().unwrap_or(Value::Null),
                precipitation_probability: precipitation.next().unwrap_or(Value::Null),
            })
            .collect()
    }
}

/// Open-Meteo geocoding + forecast client.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Client,
    geocoding_url: String,
    forecast_url: String,
}

impl WeatherClient {
    pub fn new(
        geocoding_url: impl Into<String>,
        forecast_url: impl Into<String>,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder().timeout(LOOKUP_TIMEOUT).build()?,
            geocoding_url: geocoding_url.into(),
            forecast_url: forecast_url.into(),
        })
    }

    /// Looks up the next `hours` hourly samples for `city`.
    pub fn fetch_weather_window(&self, city: &str, hours: i64) -> WeatherReport {
        let hours = clamp_hours(hours);

        let (latitude, longitude) = match self.geocode(city) {
            Ok(Some(found)) => (found.latitude, found.longitude),
            Ok(None) => return WeatherReport::failed(city, "No geocoding match"),
            Err(err) => {
                warn!(city, error = %err, "geocoding failed");
                return WeatherReport::failed(city, format!("Geocoding failed: {err}"));
            }
        };
        debug!(city, latitude, longitude, "geocoded");

        let series = match self.forecast(latitude, longitude) {
            Ok(forecast) => forecast.hourly,
            Err(err) => {
                warn!(city, error = %err, "forecast fetch failed");
                return WeatherReport::failed(city, format!("Forecast fetch failed: {err}"));
            }
        };

        let samples = series.window(hours);
        WeatherReport::Window(WeatherWindow {
            city: city.to_string(),
            latitude,
            longitude,
            window_hours: samples.len(),
            samples,
        })
    }

    fn geocode(&self, city: &str) -> Result<Option<GeoMatch>, RequestFailure> {
        let response = send_once(self.client.get(&self.geocoding_url).query(&[
            ("name", city),
            ("count", "1"),
            ("language", "en"),
            ("format", "json"),
        ]))?;
        let body: GeocodingResponse = response.json()?;
        Ok(body.results.and_then(|results| results.into_iter().next()))
    }

    fn forecast(&self, latitude: f64, longitude: f64) -> Result<ForecastResponse, RequestFailure> {
        let response = send_once(self.client.get(&self.forecast_url).query(&[
            ("latitude", latitude.to_string()),
            ("longitude", longitude.to_string()),
            (
                "hourly",
                "temperature_2m,precipitation_probability".to_string(),
            ),
            ("forecast_days", "1".to_string()),
            ("timezone", "auto".to_string()),
        ]))?;
        Ok(response.json()?)
    }
}
