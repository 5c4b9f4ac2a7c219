use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{error::ProviderError, model::CityRecord, provider::truncate_body};

use super::{Observation, ProviderId, WeatherProvider};

const CURRENT_URL: &str = "https://api.weatherapi.com/v1/current.json";
const FORECAST_URL: &str = "https://api.weatherapi.com/v1/forecast.json";

#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    http: Client,
    timeout: std::time::Duration,
}

impl WeatherApiProvider {
    pub fn new(api_key: String, timeout: std::time::Duration) -> Self {
        Self { api_key, http: Client::new(), timeout }
    }

    async fn fetch(
        &self,
        url: &str,
        city: &CityRecord,
        days: Option<u8>,
    ) -> Result<String, ProviderError> {
        let q = format!("{},{}", city.latitude, city.longitude);
        let mut query: Vec<(&str, String)> =
            vec![("key", self.api_key.clone()), ("q", q)];
        if let Some(days) = days {
            query.push(("days", days.to_string()));
        }

        debug!(provider = %self.id(), city = %city.name, url, "fetching weather upstream");

        let res = self
            .http
            .get(url)
            .query(&query)
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
struct WaCondition {
    text: String,
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: f64,
    humidity: u8,
    wind_kph: f64,
    pressure_mb: f64,
    vis_km: f64,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaCurrentResponse {
    current: WaCurrent,
}

#[derive(Debug, Deserialize)]
struct WaForecastHour {
    time_epoch: i64,
    temp_c: f64,
    humidity: u8,
    wind_kph: f64,
    pressure_mb: f64,
    vis_km: f64,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaForecastDay {
    date_epoch: i64,
    hour: Vec<WaForecastHour>,
}

#[derive(Debug, Deserialize)]
struct WaForecast {
    forecastday: Vec<WaForecastDay>,
}

#[derive(Debug, Deserialize)]
struct WaForecastResponse {
    forecast: WaForecast,
}

fn kph_to_mps(kph: f64) -> f64 {
    kph / 3.6
}

impl From<&WaCurrent> for Observation {
    fn from(c: &WaCurrent) -> Self {
        Observation {
            temperature_c: c.temp_c,
            humidity_pct: c.humidity,
            wind_speed_mps: kph_to_mps(c.wind_kph),
            pressure_hpa: c.pressure_mb,
            visibility_km: c.vis_km,
            condition: c.condition.text.clone(),
        }
    }
}

impl From<&WaForecastHour> for Observation {
    fn from(h: &WaForecastHour) -> Self {
        Observation {
            temperature_c: h.temp_c,
            humidity_pct: h.humidity,
            wind_speed_mps: kph_to_mps(h.wind_kph),
            pressure_hpa: h.pressure_mb,
            visibility_km: h.vis_km,
            condition: h.condition.text.clone(),
        }
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::WeatherApi
    }

    async fn current(&self, city: &CityRecord) -> Result<Observation, ProviderError> {
        let body = self.fetch(CURRENT_URL, city, None).await?;
        let parsed: WaCurrentResponse = self.decode(&body)?;

        Ok(Observation::from(&parsed.current))
    }

    async fn forecast(
        &self,
        city: &CityRecord,
        days: u8,
    ) -> Result<Vec<Observation>, ProviderError> {
        let body = self.fetch(FORECAST_URL, city, Some(days)).await?;
        let parsed: WaForecastResponse = self.decode(&body)?;

        if parsed.forecast.forecastday.len() < days as usize {
            return Err(ProviderError::Decode {
                provider: self.id(),
                detail: format!(
                    "requested {days} forecast days, upstream returned {}",
                    parsed.forecast.forecastday.len()
                ),
            });
        }

        // One observation per day, taken from the hourly block nearest noon.
        parsed
            .forecast
            .forecastday
            .iter()
            .take(days as usize)
            .map(|day| {
                let noon = day.date_epoch + 12 * 3600;
                day.hour
                    .iter()
                    .min_by_key(|h| (h.time_epoch - noon).abs())
                    .map(Observation::from)
                    .ok_or_else(|| ProviderError::Decode {
                        provider: self.id(),
                        detail: "forecast day contained no hourly data".to_string(),
                    })
            })
            .collect()
    }
}
