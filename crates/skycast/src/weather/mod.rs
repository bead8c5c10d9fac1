//! The weather data environment that conditions and guards run against.
//!
//! [`data_schema`] declares the names and kinds available to expressions.
//! [`WeatherData::environment`] builds the matching values from a snapshot,
//! including the `temperatureIn`, `feelsLikeIn`, `rainIn`, and `snowIn`
//! hourly lookups.

mod data;

use std::sync::Arc;

pub use data::{Forecast, HourlyForecast, WeatherData};

use crate::interpreter::{Environment, EnvironmentSchema, RuntimeError};
use crate::types::{Kind, NativeFunction, Signature, Value};

/// Hourly lookup functions: name and the hourly field each one reads.
const HOURLY_FUNCTIONS: [(&str, fn(&HourlyForecast) -> f64); 4] = [
    ("temperatureIn", |h| h.temperature),
    ("feelsLikeIn", |h| h.feels_like),
    ("rainIn", |h| h.rain),
    ("snowIn", |h| h.snow),
];

/// The kind of the `forecast` record.
pub fn forecast_kind() -> Kind {
    Kind::record([
        ("hours", Kind::Int),
        ("minTemp", Kind::Float),
        ("maxTemp", Kind::Float),
        ("rain", Kind::Float),
        ("snow", Kind::Float),
        ("maxWindSpeed", Kind::Float),
        ("maxUvValue", Kind::Float),
    ])
}

fn hourly_signature() -> Signature {
    Signature::new(vec![Kind::Int], Kind::Float)
}

/// The schema conditions and choice guards are compiled against.
///
/// # Example
///
/// ```
/// use skycast::weather::data_schema;
/// use skycast::Kind;
///
/// let schema = data_schema();
/// assert_eq!(schema.get("cloudiness"), Some(&Kind::Int));
/// assert!(schema.contains("rainIn"));
/// ```
pub fn data_schema() -> EnvironmentSchema {
    let mut schema = EnvironmentSchema::new()
        .with("currentTime", Kind::Timestamp)
        .with("cloudiness", Kind::Int)
        .with("forecast", forecast_kind());
    for name in [
        "temperature",
        "tempMin",
        "tempMax",
        "feelsLike",
        "rain1h",
        "rain3h",
        "snow1h",
        "snow3h",
        "uvValue",
        "windSpeed",
    ] {
        schema.insert(name, Kind::Float);
    }
    for (name, _) in HOURLY_FUNCTIONS {
        schema.insert(name, Kind::function(hourly_signature()));
    }
    schema
}

impl WeatherData {
    /// Build the data environment for this snapshot.
    pub fn environment(&self) -> Environment {
        let forecast = &self.forecast;
        let hours = i64::try_from(forecast.hourly.len()).unwrap_or(i64::MAX);
        let mut env = Environment::new()
            .with("temperature", self.temperature)
            .with("tempMin", self.temp_min)
            .with("tempMax", self.temp_max)
            .with("feelsLike", self.feels_like)
            .with("rain1h", self.rain1h)
            .with("rain3h", self.rain3h)
            .with("snow1h", self.snow1h)
            .with("snow3h", self.snow3h)
            .with("uvValue", self.uv_value)
            .with("cloudiness", self.cloudiness)
            .with("windSpeed", self.wind_speed)
            .with("currentTime", self.current_time)
            .with(
                "forecast",
                Value::record([
                    ("hours", Value::Int(hours)),
                    ("minTemp", Value::Float(forecast.min_temperature())),
                    ("maxTemp", Value::Float(forecast.max_temperature())),
                    ("rain", Value::Float(forecast.total_rain())),
                    ("snow", Value::Float(forecast.total_snow())),
                    ("maxWindSpeed", Value::Float(forecast.max_wind_speed())),
                    ("maxUvValue", Value::Float(forecast.max_uv_value())),
                ]),
            );

        let hourly = Arc::new(forecast.hourly.clone());
        for (name, field) in HOURLY_FUNCTIONS {
            env.insert(name, hourly_lookup(name, Arc::clone(&hourly), field));
        }
        env
    }
}

fn hourly_lookup(
    name: &'static str,
    hourly: Arc<Vec<HourlyForecast>>,
    field: fn(&HourlyForecast) -> f64,
) -> NativeFunction {
    NativeFunction::new(name, hourly_signature(), move |args| {
        let offset = args
            .first()
            .and_then(Value::as_int)
            .ok_or_else(|| RuntimeError::function(name, "expected an hour offset"))?;
        usize::try_from(offset)
            .ok()
            .and_then(|offset| hourly.get(offset))
            .map(|hour| Value::Float(field(hour)))
            .ok_or_else(|| {
                RuntimeError::function(
                    name,
                    format!(
                        "no forecast for hour {offset}, forecast covers {} hours",
                        hourly.len()
                    ),
                )
            })
    })
}
