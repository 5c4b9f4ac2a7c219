use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{error::ProviderError, model::CityRecord, provider::truncate_body};

use super::{Observation, ProviderId, WeatherProvider};

const CURRENT_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
const FORECAST_URL: &str = "https://api.openweathermap.org/data/2.5/forecast";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    http: Client,
    timeout: std::time::Duration,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, timeout: std::time::Duration) -> Self {
        Self { api_key, http: Client::new(), timeout }
    }

    async fn fetch(&self, url: &str, city: &CityRecord) -> Result<String, ProviderError> {
        let lat = city.latitude.to_string();
        let lon = city.longitude.to_string();

        debug!(provider = %self.id(), city = %city.name, url, "fetching weather upstream");

        let res = self
            .http
            .get(url)
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|source| ProviderError::Http { provider: self.id(), source })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| ProviderError::Http { provider: self.id(), source })?;

        if !status.is_success() {
            return Err(ProviderError::Status {
                provider: self.id(),
                status,
                body: truncate_body(&body),
            });
        }

        Ok(body)
    }

    fn decode<T: serde::de::DeserializeOwned>(&self, body: &str) -> Result<T, ProviderError> {
        serde_json::from_str(body).map_err(|e| ProviderError::Decode {
            provider: self.id(),
            detail: e.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: u8,
    pressure: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    visibility: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    visibility: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

fn condition_of(weather: &[OwWeather]) -> String {
    weather
        .first()
        .map(|w| w.description.clone())
        .unwrap_or_else(|| "Unknown".to_string())
}

// Upstream reports visibility in meters, capped at 10 km; absent means
// unlimited.
fn visibility_km(meters: Option<f64>) -> f64 {
    meters.map_or(10.0, |m| m / 1000.0)
}

fn observation(main: &OwMain, weather: &[OwWeather], wind: &OwWind, vis: Option<f64>) -> Observation {
    Observation {
        temperature_c: main.temp,
        humidity_pct: main.humidity,
        wind_speed_mps: wind.speed,
        pressure_hpa: main.pressure,
        visibility_km: visibility_km(vis),
        condition: condition_of(weather),
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenWeather
    }

    async fn current(&self, city: &CityRecord) -> Result<Observation, ProviderError> {
        let body = self.fetch(CURRENT_URL, city).await?;
        let parsed: OwCurrentResponse = self.decode(&body)?;

        Ok(observation(&parsed.main, &parsed.weather, &parsed.wind, parsed.visibility))
    }

    async fn forecast(
        &self,
        city: &CityRecord,
        days: u8,
    ) -> Result<Vec<Observation>, ProviderError> {
        let body = self.fetch(FORECAST_URL, city).await?;
        let parsed: OwForecastResponse = self.decode(&body)?;

        if parsed.list.is_empty() {
            return Err(ProviderError::Decode {
                provider: self.id(),
                detail: "forecast response contained no data".to_string(),
            });
        }

        // The upstream returns 3-hourly entries; pick the one nearest local
        // noon for each requested day.
        let now = Utc::now();
        let mut observations = Vec::with_capacity(days as usize);
        for day in 0..days {
            let target = (now + Duration::days(i64::from(day)))
                .date_naive()
                .and_hms_opt(12, 0, 0)
                .map(|ndt| ndt.and_utc().timestamp())
                .unwrap_or_else(|| now.timestamp());

            let entry = parsed
                .list
                .iter()
                .min_by_key(|e| (e.dt - target).abs())
                .ok_or_else(|| ProviderError::Decode {
                    provider: self.id(),
                    detail: "forecast response contained no data".to_string(),
                })?;

            observations.push(observation(&entry.main, &entry.weather, &entry.wind, entry.visibility));
        }

        Ok(observations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_response_decodes_into_observation() {
        let body = r#"{
            "main": {"temp": 21.4, "humidity": 56, "pressure": 1014.0},
            "weather": [{"description": "scattered clouds"}],
            "wind": {"speed": 3.6},
            "visibility": 8000
        }"#;

        let parsed: OwCurrentResponse = serde_json::from_str(body).unwrap();
        let obs = observation(&parsed.main, &parsed.weather, &parsed.wind, parsed.visibility);

        assert_eq!(obs.temperature_c, 21.4);
        assert_eq!(obs.humidity_pct, 56);
        assert_eq!(obs.visibility_km, 8.0);
        assert_eq!(obs.condition, "scattered clouds");
    }

    #[test]
    fn missing_visibility_means_unlimited() {
        assert_eq!(visibility_km(None), 10.0);
        assert_eq!(visibility_km(Some(2500.0)), 2.5);
    }

    #[test]
    fn empty_weather_array_yields_unknown_condition() {
        assert_eq!(condition_of(&[]), "Unknown");
    }
}
