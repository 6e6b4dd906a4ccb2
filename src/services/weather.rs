//! Current-conditions and forecast client for OpenWeatherMap

use async_trait::async_trait;
use serde::Deserialize;

use super::{FailureReason, Payload, ServiceOutcome, WeatherClient};

const BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// One parsed weather observation
#[derive(Debug, Clone)]
pub struct WeatherReading {
    pub city: String,
    pub country: String,
    /// Title-cased condition description ("Clear Sky")
    pub description: String,
    /// Temperatures in °C, rounded to one decimal
    pub temp: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    /// Relative humidity percentage
    pub humidity: u8,
    /// Pressure in hPa
    pub pressure: u32,
    /// Wind speed in m/s
    pub wind_speed: f64,
}

#[derive(Deserialize)]
struct OwmResponse {
    name: String,
    #[serde(default)]
    sys: OwmSys,
    #[serde(default)]
    weather: Vec<OwmCondition>,
    main: OwmMain,
    #[serde(default)]
    wind: OwmWind,
}

#[derive(Deserialize, Default)]
struct OwmSys {
    #[serde(default)]
    country: String,
}

#[derive(Deserialize)]
struct OwmCondition {
    #[serde(default)]
    description: String,
}

#[derive(Deserialize)]
struct OwmMain {
    temp: f64,
    #[serde(default)]
    feels_like: f64,
    #[serde(default)]
    temp_min: f64,
    #[serde(default)]
    temp_max: f64,
    #[serde(default)]
    humidity: u8,
    #[serde(default)]
    pressure: u32,
}

#[derive(Deserialize, Default)]
struct OwmWind {
    #[serde(default)]
    speed: f64,
}

/// One summarized forecast day
#[derive(Debug, Clone)]
pub struct ForecastDay {
    /// Calendar date, "2025-01-02"
    pub date: String,
    /// Title-cased condition for the midday period
    pub description: String,
    pub temp_min: f64,
    pub temp_max: f64,
}

/// Multi-day forecast collapsed from the provider's 3-hour periods
#[derive(Debug, Clone)]
pub struct ForecastReport {
    pub city: String,
    pub days: Vec<ForecastDay>,
}

#[derive(Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    city: ForecastCity,
    #[serde(default)]
    list: Vec<ForecastEntry>,
}

#[derive(Deserialize, Default)]
struct ForecastCity {
    #[serde(default)]
    name: String,
}

#[derive(Deserialize)]
struct ForecastEntry {
    /// "2025-01-02 12:00:00"
    #[serde(default)]
    dt_txt: String,
    main: OwmMain,
    #[serde(default)]
    weather: Vec<OwmCondition>,
}

/// Fetches weather data from OpenWeatherMap
pub struct WeatherService {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl WeatherService {
    /// Create a new weather client. An empty key is allowed; fetches will
    /// fail with `InvalidKey` without hitting the network.
    #[must_use]
    pub fn new(api_key: String) -> Self {
        Self {
            client: super::http_client(),
            api_key,
            base_url: BASE_URL.to_string(),
        }
    }

    /// Override the API base URL (used by tests)
    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    async fn current(&self, location: &str) -> Result<WeatherReading, FailureReason> {
        let url = format!("{}/weather", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", location),
                ("appid", &self.api_key),
                ("units", "metric"),
            ])
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, location, "weather request failed");
                super::reason_for_transport(&e)
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, location, "weather API error");
            return Err(super::reason_for_status(status));
        }

        let raw: OwmResponse = response.json().await.map_err(|e| {
            tracing::warn!(error = %e, "failed to parse weather response");
            FailureReason::Unreachable
        })?;

        Ok(format_reading(raw))
    }

    async fn five_day(&self, location: &str, days: u8) -> Result<ForecastReport, FailureReason> {
        let url = format!("{}/forecast", self.base_url);
        // The provider returns 8 three-hour periods per day, capped at 40
        let count = (u32::from(days) * 8).min(40).to_string();
        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", location),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
                ("cnt", count.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, location, "forecast request failed");
                super::reason_for_transport(&e)
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, location, "forecast API error");
            return Err(super::reason_for_status(status));
        }

        let raw: ForecastResponse = response.json().await.map_err(|e| {
            tracing::warn!(error = %e, "failed to parse forecast response");
            FailureReason::Unreachable
        })?;

        Ok(summarize_forecast(raw, days))
    }
}

/// Round to one decimal place, as the provider reports spurious precision
fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Title-case a condition description ("scattered clouds" -> "Scattered Clouds")
fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn format_reading(raw: OwmResponse) -> WeatherReading {
    let description = raw
        .weather
        .first()
        .map(|c| title_case(&c.description))
        .unwrap_or_default();

    WeatherReading {
        city: raw.name,
        country: raw.sys.country,
        description,
        temp: round1(raw.main.temp),
        feels_like: round1(raw.main.feels_like),
        temp_min: round1(raw.main.temp_min),
        temp_max: round1(raw.main.temp_max),
        humidity: raw.main.humidity,
        pressure: raw.main.pressure,
        wind_speed: round1(raw.wind.speed),
    }
}

/// Collapse 3-hour periods into per-day min/max summaries, keeping the
/// midday condition as the day's description
fn summarize_forecast(raw: ForecastResponse, days: u8) -> ForecastReport {
    let mut out: Vec<ForecastDay> = Vec::new();

    for entry in raw.list {
        let date = entry.dt_txt.get(..10).unwrap_or("").to_string();
        if date.is_empty() {
            continue;
        }
        let midday = entry.dt_txt.contains("12:00");
        let description = entry
            .weather
            .first()
            .map(|c| title_case(&c.description))
            .unwrap_or_default();
        let temp = entry.main.temp;

        match out.last_mut() {
            Some(day) if day.date == date => {
                day.temp_min = day.temp_min.min(temp);
                day.temp_max = day.temp_max.max(temp);
                if midday && !description.is_empty() {
                    day.description = description;
                }
            }
            _ => {
                if out.len() == usize::from(days) {
                    break;
                }
                out.push(ForecastDay {
                    date,
                    description,
                    temp_min: temp,
                    temp_max: temp,
                });
            }
        }
    }

    for day in &mut out {
        day.temp_min = round1(day.temp_min);
        day.temp_max = round1(day.temp_max);
    }

    ForecastReport {
        city: raw.city.name,
        days: out,
    }
}

#[async_trait]
impl WeatherClient for WeatherService {
    async fn fetch(&self, location: &str) -> ServiceOutcome {
        if self.api_key.is_empty() {
            return ServiceOutcome::Failure(FailureReason::InvalidKey);
        }

        match self.current(location).await {
            Ok(reading) => {
                tracing::debug!(city = %reading.city, temp = reading.temp, "weather fetched");
                ServiceOutcome::Success(Payload::Weather(reading))
            }
            Err(reason) => ServiceOutcome::Failure(reason),
        }
    }

    async fn forecast(&self, location: &str, days: u8) -> ServiceOutcome {
        if self.api_key.is_empty() {
            return ServiceOutcome::Failure(FailureReason::InvalidKey);
        }

        match self.five_day(location, days).await {
            Ok(report) if report.days.is_empty() => {
                ServiceOutcome::Failure(FailureReason::NotFound)
            }
            Ok(report) => {
                tracing::debug!(city = %report.city, days = report.days.len(), "forecast fetched");
                ServiceOutcome::Success(Payload::Forecast(report))
            }
            Err(reason) => ServiceOutcome::Failure(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_cases_descriptions() {
        assert_eq!(title_case("scattered clouds"), "Scattered Clouds");
        assert_eq!(title_case("clear"), "Clear");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn rounds_to_one_decimal() {
        assert_eq!(round1(19.96), 20.0);
        assert_eq!(round1(19.44), 19.4);
    }

    #[tokio::test]
    async fn empty_key_fails_without_network() {
        let service = WeatherService::new(String::new());
        let outcome = service.fetch("Tokyo").await;
        assert!(matches!(
            outcome,
            ServiceOutcome::Failure(FailureReason::InvalidKey)
        ));

        let outcome = service.forecast("Tokyo", 5).await;
        assert!(matches!(
            outcome,
            ServiceOutcome::Failure(FailureReason::InvalidKey)
        ));
    }

    fn entry(dt_txt: &str, temp: f64, description: &str) -> ForecastEntry {
        ForecastEntry {
            dt_txt: dt_txt.to_string(),
            main: OwmMain {
                temp,
                feels_like: temp,
                temp_min: temp,
                temp_max: temp,
                humidity: 50,
                pressure: 1013,
            },
            weather: vec![OwmCondition {
                description: description.to_string(),
            }],
        }
    }

    #[test]
    fn forecast_groups_periods_by_day() {
        let raw = ForecastResponse {
            city: ForecastCity {
                name: "Berlin".to_string(),
            },
            list: vec![
                entry("2025-01-01 09:00:00", 2.0, "few clouds"),
                entry("2025-01-01 12:00:00", 8.0, "clear sky"),
                entry("2025-01-01 15:00:00", 6.0, "few clouds"),
                entry("2025-01-02 12:00:00", 4.0, "light rain"),
            ],
        };

        let report = summarize_forecast(raw, 5);
        assert_eq!(report.city, "Berlin");
        assert_eq!(report.days.len(), 2);
        assert_eq!(report.days[0].date, "2025-01-01");
        assert_eq!(report.days[0].temp_min, 2.0);
        assert_eq!(report.days[0].temp_max, 8.0);
        // Midday period wins the description
        assert_eq!(report.days[0].description, "Clear Sky");
        assert_eq!(report.days[1].description, "Light Rain");
    }

    #[test]
    fn forecast_caps_at_requested_days() {
        let raw = ForecastResponse {
            city: ForecastCity::default(),
            list: vec![
                entry("2025-01-01 12:00:00", 1.0, "clear sky"),
                entry("2025-01-02 12:00:00", 2.0, "clear sky"),
                entry("2025-01-03 12:00:00", 3.0, "clear sky"),
            ],
        };

        let report = summarize_forecast(raw, 2);
        assert_eq!(report.days.len(), 2);
    }
}
