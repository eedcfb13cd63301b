//! Weather and electricity-tariff lookups for advisory surfaces.
//!
//! Peripheral HTTP clients feeding the recommendation analyzer: an
//! open-meteo forecast client and a tempo tariff-color client. Both are
//! plain GET-and-map; neither is part of the sync path.
//!
//! # Example
//!
//! ```no_run
//! use roomsense_core::advisory::WeatherClient;
//! use roomsense_core::recommend::analyze;
//! use roomsense_types::SensorSnapshot;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = WeatherClient::new();
//! let weather = client.fetch().await?;
//!
//! let room = SensorSnapshot::builder()
//!     .co2(1200.0)
//!     .temperature(23.0)
//!     .humidity(55.0)
//!     .timestamp(1_700_000_000_000)
//!     .label("B-204")
//!     .build();
//!
//! let recommendations = analyze(&weather.conditions(&room, 0.5));
//! # Ok(())
//! # }
//! ```

use reqwest::Client;
use serde::{Deserialize, Serialize};

use roomsense_types::{EnvironmentalConditions, SensorSnapshot, TimeOfDay};

/// Error type for advisory lookups.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AdvisoryError {
    /// The service is not reachable.
    #[error("Service not reachable at {url}: {source}")]
    NotReachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: status {status}")]
    Api { status: u16 },
}

/// Result type for advisory lookups.
pub type Result<T> = std::result::Result<T, AdvisoryError>;

// ==========================================================================
// Weather
// ==========================================================================

/// Default coordinates (Paris); adjust per deployment site.
pub const DEFAULT_LATITUDE: f64 = 48.8566;
/// Default coordinates (Paris); adjust per deployment site.
pub const DEFAULT_LONGITUDE: f64 = 2.3522;

const WEATHER_BASE_URL: &str = "https://api.open-meteo.com";

/// Current outdoor conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    /// Temperature in °C.
    pub temperature: f64,
    /// Relative humidity percentage.
    pub humidity: f64,
    /// Whether the sun is up.
    pub is_day: bool,
    /// Current precipitation in mm.
    pub precipitation: f64,
}

/// One hourly forecast entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyWeather {
    /// Forecast hour, as reported by the service.
    pub time: String,
    /// Temperature in °C.
    pub temperature: f64,
    /// Relative humidity percentage.
    pub humidity: f64,
    /// Precipitation probability percentage.
    pub precipitation_probability: f64,
}

/// Mapped weather data: current conditions plus the next 24 hours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    pub current: CurrentWeather,
    pub hourly: Vec<HourlyWeather>,
}

impl Weather {
    /// Combine outdoor weather with a room snapshot into analyzer input.
    ///
    /// `temp_trend` is the expected indoor temperature change per forecast
    /// period, supplied by the caller.
    #[must_use]
    pub fn conditions(&self, room: &SensorSnapshot, temp_trend: f64) -> EnvironmentalConditions {
        EnvironmentalConditions {
            room_temp: room.temperature,
            exterior_temp: self.current.temperature,
            temp_trend,
            humidity: room.humidity,
            co2: room.co2,
            precipitation: self.current.precipitation,
            time_of_day: if self.current.is_day {
                TimeOfDay::Day
            } else {
                TimeOfDay::Night
            },
        }
    }

    fn from_response(data: WeatherResponse) -> Self {
        let hourly = data
            .hourly
            .time
            .iter()
            .take(24)
            .enumerate()
            .map(|(i, time)| HourlyWeather {
                time: time.clone(),
                temperature: data.hourly.temperature_2m.get(i).copied().unwrap_or_default(),
                humidity: data
                    .hourly
                    .relative_humidity_2m
                    .get(i)
                    .copied()
                    .unwrap_or_default(),
                precipitation_probability: data
                    .hourly
                    .precipitation_probability
                    .get(i)
                    .copied()
                    .unwrap_or_default(),
            })
            .collect();

        Self {
            current: CurrentWeather {
                temperature: data.current.temperature_2m,
                humidity: data.current.relative_humidity_2m,
                is_day: data.current.is_day == 1,
                precipitation: data.current.precipitation,
            },
            hourly,
        }
    }
}

/// Wire shape of the open-meteo forecast response.
#[derive(Debug, Deserialize)]
struct WeatherResponse {
    current: CurrentResponse,
    hourly: HourlyResponse,
}

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    temperature_2m: f64,
    relative_humidity_2m: f64,
    is_day: u8,
    precipitation: f64,
}

#[derive(Debug, Deserialize)]
struct HourlyResponse {
    time: Vec<String>,
    temperature_2m: Vec<f64>,
    relative_humidity_2m: Vec<f64>,
    precipitation_probability: Vec<f64>,
}

/// HTTP client for the open-meteo forecast API.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Client,
    base_url: String,
    latitude: f64,
    longitude: f64,
}

impl WeatherClient {
    /// Create a client with the default endpoint and coordinates.
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: WEATHER_BASE_URL.to_string(),
            latitude: DEFAULT_LATITUDE,
            longitude: DEFAULT_LONGITUDE,
        }
    }

    /// Set the forecast coordinates.
    #[must_use]
    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = latitude;
        self.longitude = longitude;
        self
    }

    /// Override the base URL (for testing against a local server).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetch current conditions and the 24-hour forecast.
    pub async fn fetch(&self) -> Result<Weather> {
        let url = format!(
            "{}/v1/forecast?latitude={}&longitude={}\
             &current=temperature_2m,relative_humidity_2m,is_day,precipitation\
             &hourly=temperature_2m,relative_humidity_2m,precipitation_probability\
             &timezone=auto",
            self.base_url, self.latitude, self.longitude
        );

        let response =
            self.client
                .get(&url)
                .send()
                .await
                .map_err(|source| AdvisoryError::NotReachable {
                    url: self.base_url.clone(),
                    source,
                })?;

        if !response.status().is_success() {
            return Err(AdvisoryError::Api {
                status: response.status().as_u16(),
            });
        }

        let data: WeatherResponse = response.json().await?;
        Ok(Weather::from_response(data))
    }
}

impl Default for WeatherClient {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================================================
// Tariff
// ==========================================================================

const TARIFF_BASE_URL: &str = "https://www.api-couleur-tempo.fr";

/// Tariff color of a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TariffColor {
    /// Not yet published.
    Unknown,
    Blue,
    White,
    Red,
}

impl From<u8> for TariffColor {
    fn from(code: u8) -> Self {
        match code {
            1 => TariffColor::Blue,
            2 => TariffColor::White,
            3 => TariffColor::Red,
            _ => TariffColor::Unknown,
        }
    }
}

/// Tariff information for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TariffDay {
    /// Calendar date, as reported by the service.
    pub date: String,
    /// Tariff color.
    pub color: TariffColor,
    /// Tariff period label.
    pub period: String,
}

/// Today's and tomorrow's tariff days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TariffDays {
    pub today: TariffDay,
    pub tomorrow: TariffDay,
}

/// Wire shape of the tariff API response.
#[derive(Debug, Deserialize)]
struct TariffDayResponse {
    #[serde(rename = "dateJour")]
    date_jour: String,
    #[serde(rename = "codeJour")]
    code_jour: u8,
    periode: String,
}

impl From<TariffDayResponse> for TariffDay {
    fn from(response: TariffDayResponse) -> Self {
        Self {
            date: response.date_jour,
            color: TariffColor::from(response.code_jour),
            period: response.periode,
        }
    }
}

/// HTTP client for the tempo tariff-color API.
#[derive(Debug, Clone)]
pub struct TariffClient {
    client: Client,
    base_url: String,
}

impl TariffClient {
    /// Create a client with the default endpoint.
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: TARIFF_BASE_URL.to_string(),
        }
    }

    /// Override the base URL (for testing against a local server).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetch today's and tomorrow's tariff days concurrently.
    pub async fn fetch_days(&self) -> Result<TariffDays> {
        let (today, tomorrow) = tokio::try_join!(self.fetch_day("today"), self.fetch_day("tomorrow"))?;
        Ok(TariffDays { today, tomorrow })
    }

    async fn fetch_day(&self, which: &str) -> Result<TariffDay> {
        let url = format!("{}/api/jourTempo/{}", self.base_url, which);

        let response =
            self.client
                .get(&url)
                .send()
                .await
                .map_err(|source| AdvisoryError::NotReachable {
                    url: self.base_url.clone(),
                    source,
                })?;

        if !response.status().is_success() {
            return Err(AdvisoryError::Api {
                status: response.status().as_u16(),
            });
        }

        let data: TariffDayResponse = response.json().await?;
        Ok(TariffDay::from(data))
    }
}

impl Default for TariffClient {
    fn default() -> Self {
        Self::new()
    }
}
