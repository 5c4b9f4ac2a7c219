//! Weather lookups with a deterministic mock fallback.
//!
//! The contract is "always return usable data, flagged by provenance": a
//! single bounded fetch attempt against the configured provider, and on any
//! failure a mock record synthesized from the city name. Upstream failures
//! never reach the caller.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::config::Config;
use crate::model::{CityRecord, DataSource, ResolvedCity, WeatherRecord};
use crate::provider::{Observation, WeatherProvider, default_provider_from_config};

const MOCK_CONDITIONS: &[&str] = &[
    "Clear sky",
    "Partly cloudy",
    "Overcast",
    "Light rain",
    "Heavy rain",
    "Thunderstorm",
    "Snow",
    "Fog",
];

#[derive(Debug)]
pub struct WeatherService {
    provider: Option<Box<dyn WeatherProvider>>,
}

impl WeatherService {
    /// A service with no live upstream; every record is mock-sourced.
    pub fn mock_only() -> Self {
        Self { provider: None }
    }

    pub fn with_provider(provider: Box<dyn WeatherProvider>) -> Self {
        Self { provider: Some(provider) }
    }

    /// Build from configuration. A missing credential is a normal condition
    /// and simply leaves the service in mock-only mode.
    pub fn from_config(config: &Config) -> Self {
        match default_provider_from_config(config) {
            Some(provider) => Self::with_provider(provider),
            None => {
                debug!("no weather provider configured, serving mock data only");
                Self::mock_only()
            }
        }
    }

    /// Current weather for a resolved city. Never fails; an upstream
    /// failure surfaces as a mock-sourced record.
    pub async fn current(&self, resolved: &ResolvedCity<'_>) -> WeatherRecord {
        self.current_at(resolved, Utc::now()).await
    }

    /// Forecast for the next `days` days (one record per day). The fetch is
    /// a single attempt; any failure falls back wholesale, never per day.
    pub async fn forecast(&self, resolved: &ResolvedCity<'_>, days: u8) -> Vec<WeatherRecord> {
        self.forecast_at(resolved, days, Utc::now()).await
    }

    async fn current_at(&self, resolved: &ResolvedCity<'_>, now: DateTime<Utc>) -> WeatherRecord {
        let city = resolved.record;

        if let Some(provider) = &self.provider {
            match provider.current(city).await {
                Ok(obs) => return record_from(city, &obs, DataSource::Live, now),
                Err(err) => {
                    warn!(city = %city.name, error = %err, "live weather fetch failed, serving mock data");
                }
            }
        }

        record_from(city, &mock_observation(city, 0), DataSource::Mock, now)
    }

    async fn forecast_at(
        &self,
        resolved: &ResolvedCity<'_>,
        days: u8,
        now: DateTime<Utc>,
    ) -> Vec<WeatherRecord> {
        let city = resolved.record;

        if let Some(provider) = &self.provider {
            match provider.forecast(city, days).await {
                Ok(observations) if observations.len() == days as usize => {
                    return observations
                        .iter()
                        .enumerate()
                        .map(|(day, obs)| {
                            record_from(
                                city,
                                obs,
                                DataSource::Live,
                                now + Duration::days(day as i64),
                            )
                        })
                        .collect();
                }
                Ok(observations) => {
                    warn!(
                        city = %city.name,
                        expected = days,
                        received = observations.len(),
                        "forecast length mismatch, serving mock data"
                    );
                }
                Err(err) => {
                    warn!(city = %city.name, error = %err, "live forecast fetch failed, serving mock data");
                }
            }
        }

        (0..days)
            .map(|day| {
                record_from(
                    city,
                    &mock_observation(city, day),
                    DataSource::Mock,
                    now + Duration::days(i64::from(day)),
                )
            })
            .collect()
    }
}

fn record_from(
    city: &CityRecord,
    obs: &Observation,
    source: DataSource,
    fetched_at: DateTime<Utc>,
) -> WeatherRecord {
    let temperature_c = round1(obs.temperature_c);
    WeatherRecord {
        city: city.name.clone(),
        country: city.country.clone(),
        temperature_c,
        temperature_f: round1(temperature_c * 9.0 / 5.0 + 32.0),
        humidity_pct: obs.humidity_pct.min(100),
        wind_speed_mps: round1(obs.wind_speed_mps),
        pressure_hpa: round1(obs.pressure_hpa),
        visibility_km: round1(obs.visibility_km),
        condition: obs.condition.clone(),
        source,
        fetched_at,
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Synthesize a plausible observation from the city name alone.
///
/// The seed depends only on the canonical name and the day offset, so
/// repeated calls for the same city are stable across calls and runs.
fn mock_observation(city: &CityRecord, day: u8) -> Observation {
    let seed = name_seed(&city.name).wrapping_add(u32::from(day).wrapping_mul(131));

    Observation {
        temperature_c: f64::from(seed % 400) / 10.0 - 5.0,
        humidity_pct: (30 + seed % 60) as u8,
        wind_speed_mps: 1.5 + f64::from(seed % 80) / 10.0,
        pressure_hpa: 990.0 + f64::from(seed % 45),
        visibility_km: 4.0 + f64::from(seed % 70) / 10.0,
        condition: MOCK_CONDITIONS[(seed / 7) as usize % MOCK_CONDITIONS.len()].to_string(),
    }
}

fn name_seed(name: &str) -> u32 {
    name.bytes().fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(u32::from(b)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::provider::ProviderId;
    use crate::registry::Registry;
    use crate::resolver::resolve;
    use async_trait::async_trait;

    fn fixed_now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-06-01T00:00:00Z").unwrap().with_timezone(&Utc)
    }

    /// Upstream that always succeeds with a fixed observation.
    #[derive(Debug)]
    struct HealthyProvider;

    /// Upstream that always fails.
    #[derive(Debug)]
    struct BrokenProvider;

    fn canned_observation() -> Observation {
        Observation {
            temperature_c: 21.4,
            humidity_pct: 55,
            wind_speed_mps: 3.2,
            pressure_hpa: 1013.0,
            visibility_km: 10.0,
            condition: "Clear sky".to_string(),
        }
    }

    fn broken_error() -> ProviderError {
        ProviderError::Decode {
            provider: ProviderId::OpenWeather,
            detail: "synthetic failure".to_string(),
        }
    }

    #[async_trait]
    impl WeatherProvider for HealthyProvider {
        fn id(&self) -> ProviderId {
            ProviderId::OpenWeather
        }

        async fn current(&self, _city: &CityRecord) -> Result<Observation, ProviderError> {
            Ok(canned_observation())
        }

        async fn forecast(
            &self,
            _city: &CityRecord,
            days: u8,
        ) -> Result<Vec<Observation>, ProviderError> {
            Ok((0..days).map(|_| canned_observation()).collect())
        }
    }

    #[async_trait]
    impl WeatherProvider for BrokenProvider {
        fn id(&self) -> ProviderId {
            ProviderId::OpenWeather
        }

        async fn current(&self, _city: &CityRecord) -> Result<Observation, ProviderError> {
            Err(broken_error())
        }

        async fn forecast(
            &self,
            _city: &CityRecord,
            _days: u8,
        ) -> Result<Vec<Observation>, ProviderError> {
            Err(broken_error())
        }
    }

    #[tokio::test]
    async fn failing_provider_always_yields_mock_data() {
        let registry = Registry::builtin().unwrap();
        let paris = resolve(&registry, "Paris").unwrap();
        let service = WeatherService::with_provider(Box::new(BrokenProvider));

        let first = service.current_at(&paris, fixed_now()).await;
        let second = service.current_at(&paris, fixed_now()).await;

        assert_eq!(first.source, DataSource::Mock);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn missing_credential_yields_mock_without_a_fetch() {
        let registry = Registry::builtin().unwrap();
        let tokyo = resolve(&registry, "Tokyo").unwrap();
        let service = WeatherService::mock_only();

        let record = service.current(&tokyo).await;
        assert_eq!(record.source, DataSource::Mock);
        assert_eq!(record.city, "Tokyo");
    }

    #[tokio::test]
    async fn mock_values_are_stable_across_service_instances() {
        let registry = Registry::builtin().unwrap();
        let sydney = resolve(&registry, "Sydney").unwrap();

        let a = WeatherService::mock_only().current_at(&sydney, fixed_now()).await;
        let b = WeatherService::mock_only().current_at(&sydney, fixed_now()).await;

        assert_eq!(a, b);
        assert!(a.humidity_pct <= 100);
    }

    #[tokio::test]
    async fn healthy_provider_yields_live_data_with_derived_fahrenheit() {
        let registry = Registry::builtin().unwrap();
        let london = resolve(&registry, "London").unwrap();
        let service = WeatherService::with_provider(Box::new(HealthyProvider));

        let record = service.current(&london).await;
        assert_eq!(record.source, DataSource::Live);
        assert_eq!(record.temperature_c, 21.4);

        let expected_f = record.temperature_c * 9.0 / 5.0 + 32.0;
        assert!((record.temperature_f - expected_f).abs() < 0.06);
    }

    #[tokio::test]
    async fn forecast_returns_one_record_per_day_with_day_offsets() {
        let registry = Registry::builtin().unwrap();
        let dubai = resolve(&registry, "Dubai").unwrap();
        let now = fixed_now();

        let service = WeatherService::with_provider(Box::new(HealthyProvider));
        let records = service.forecast_at(&dubai, 5, now).await;

        assert_eq!(records.len(), 5);
        for (day, record) in records.iter().enumerate() {
            assert_eq!(record.source, DataSource::Live);
            assert_eq!(record.fetched_at, now + Duration::days(day as i64));
        }
    }

    #[tokio::test]
    async fn forecast_fallback_is_wholesale_and_deterministic() {
        let registry = Registry::builtin().unwrap();
        let singapore = resolve(&registry, "Singapore").unwrap();
        let now = fixed_now();

        let service = WeatherService::with_provider(Box::new(BrokenProvider));
        let first = service.forecast_at(&singapore, 3, now).await;
        let second = service.forecast_at(&singapore, 3, now).await;

        assert_eq!(first.len(), 3);
        assert!(first.iter().all(|r| r.source == DataSource::Mock));
        assert_eq!(first, second);

        // Per-day offsets survive the fallback path too.
        for (day, record) in first.iter().enumerate() {
            assert_eq!(record.fetched_at, now + Duration::days(day as i64));
        }
    }
}
