use bon::Builder;
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

/// A snapshot of current conditions and the hourly forecast.
///
/// Snapshots are deserialized from JSON with camelCase keys, matching the
/// names expressions use:
///
/// ```
/// use skycast::WeatherData;
///
/// let data: WeatherData = serde_json::from_str(r#"{
///     "temperature": 12.5,
///     "cloudiness": 75,
///     "rain3h": 1.2,
///     "currentTime": "2026-10-18T07:30:00+02:00",
///     "forecast": { "hourly": [{ "temperature": 13.0, "rain": 0.4 }] }
/// }"#).unwrap();
/// assert_eq!(data.cloudiness, 75);
/// assert_eq!(data.forecast.hourly.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherData {
    /// Current temperature in °C.
    #[serde(default)]
    #[builder(default)]
    pub temperature: f64,
    #[serde(default)]
    #[builder(default)]
    pub temp_min: f64,
    #[serde(default)]
    #[builder(default)]
    pub temp_max: f64,
    #[serde(default)]
    #[builder(default)]
    pub feels_like: f64,
    /// Rain volume over the last hour, in mm.
    #[serde(default)]
    #[builder(default)]
    pub rain1h: f64,
    /// Rain volume over the last three hours, in mm.
    #[serde(default)]
    #[builder(default)]
    pub rain3h: f64,
    #[serde(default)]
    #[builder(default)]
    pub snow1h: f64,
    #[serde(default)]
    #[builder(default)]
    pub snow3h: f64,
    #[serde(default)]
    #[builder(default)]
    pub uv_value: f64,
    /// Cloud cover in percent.
    #[serde(default)]
    #[builder(default)]
    pub cloudiness: i64,
    /// Wind speed in m/s.
    #[serde(default)]
    #[builder(default)]
    pub wind_speed: f64,
    pub current_time: DateTime<FixedOffset>,
    #[serde(default)]
    #[builder(default)]
    pub forecast: Forecast,
}

impl WeatherData {
    /// A snapshot carrying plausible values, used where only the shape of
    /// the data matters.
    pub fn placeholder() -> Self {
        WeatherData::builder()
            .temperature(20.0)
            .feels_like(21.0)
            .current_time(Utc::now().into())
            .build()
    }
}

impl Default for WeatherData {
    fn default() -> Self {
        Self::placeholder()
    }
}

/// The hourly forecast following a snapshot. Entry `n` covers the hour
/// starting `n` hours after the snapshot time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    #[serde(default)]
    pub hourly: Vec<HourlyForecast>,
}

impl Forecast {
    pub fn new(hourly: Vec<HourlyForecast>) -> Self {
        Self { hourly }
    }

    pub fn hour(&self, offset: usize) -> Option<&HourlyForecast> {
        self.hourly.get(offset)
    }

    /// Lowest forecast temperature, or 0 with no forecast.
    pub fn min_temperature(&self) -> f64 {
        self.fold(|h| h.temperature, f64::min)
    }

    /// Highest forecast temperature, or 0 with no forecast.
    pub fn max_temperature(&self) -> f64 {
        self.fold(|h| h.temperature, f64::max)
    }

    /// Total forecast rain in mm.
    pub fn total_rain(&self) -> f64 {
        self.hourly.iter().map(|h| h.rain).sum()
    }

    /// Total forecast snow in mm.
    pub fn total_snow(&self) -> f64 {
        self.hourly.iter().map(|h| h.snow).sum()
    }

    pub fn max_wind_speed(&self) -> f64 {
        self.fold(|h| h.wind_speed, f64::max)
    }

    pub fn max_uv_value(&self) -> f64 {
        self.fold(|h| h.uv_value, f64::max)
    }

    fn fold(&self, field: fn(&HourlyForecast) -> f64, combine: fn(f64, f64) -> f64) -> f64 {
        self.hourly.iter().map(field).reduce(combine).unwrap_or(0.0)
    }
}

/// Forecast conditions for one hour.
#[derive(Debug, Clone, Default, PartialEq, Builder, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyForecast {
    #[serde(default)]
    #[builder(default)]
    pub temperature: f64,
    #[serde(default)]
    #[builder(default)]
    pub feels_like: f64,
    #[serde(default)]
    #[builder(default)]
    pub rain: f64,
    #[serde(default)]
    #[builder(default)]
    pub snow: f64,
    #[serde(default)]
    #[builder(default)]
    pub wind_speed: f64,
    #[serde(default)]
    #[builder(default)]
    pub uv_value: f64,
}
