//! The boundary between the hosting agent framework and the services.
//!
//! The framework hands over a tool name and a JSON argument object; it gets
//! back a `ToolResponse`, always. Malformed input and unknown cities are the
//! only caller-visible failures; nothing here panics or returns a raw error.

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::error::{RegistryError, ResolutionError};
use crate::model::{DataSource, ToolPayload, ToolResponse};
use crate::registry::Registry;
use crate::resolver::resolve_with_country;
use crate::time::current_time_in;
use crate::weather::WeatherService;

const MAX_FORECAST_DAYS: u8 = 5;

/// Tools exposed to the agent framework. Closed set: dispatch is an
/// enum-keyed table, not open-ended reflection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ToolName {
    GetWeather,
    GetForecast,
    GetCurrentTime,
    GetCityInfo,
    SearchCities,
    ListCities,
}

impl TryFrom<&str> for ToolName {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "get_weather" => Ok(ToolName::GetWeather),
            "get_forecast" => Ok(ToolName::GetForecast),
            "get_current_time" => Ok(ToolName::GetCurrentTime),
            "get_city_info" => Ok(ToolName::GetCityInfo),
            "search_cities" => Ok(ToolName::SearchCities),
            "list_cities" => Ok(ToolName::ListCities),
            _ => Err(anyhow::anyhow!(
                "Unknown tool '{value}'. Supported tools: get_weather, get_forecast, \
                 get_current_time, get_city_info, search_cities, list_cities."
            )),
        }
    }
}

fn default_forecast_days() -> u8 {
    MAX_FORECAST_DAYS
}

fn default_search_limit() -> usize {
    5
}

#[derive(Debug, Deserialize)]
struct CityArgs {
    city: String,
    #[serde(default)]
    country_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ForecastArgs {
    city: String,
    #[serde(default)]
    country_code: Option<String>,
    #[serde(default = "default_forecast_days")]
    days: u8,
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    #[serde(default = "default_search_limit")]
    limit: usize,
}

/// One entry of a batch invocation.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCall {
    pub tool: String,
    #[serde(default)]
    pub args: Value,
}

/// Routes framework tool calls to the services and wraps results in the
/// response envelope.
#[derive(Debug)]
pub struct Dispatcher {
    registry: Registry,
    weather: WeatherService,
}

impl Dispatcher {
    pub fn new(registry: Registry, weather: WeatherService) -> Self {
        Self { registry, weather }
    }

    /// Build the registry and weather service from configuration. Fails only
    /// on a registry consistency violation, which is fatal at startup.
    pub fn from_config(config: &Config) -> Result<Self, RegistryError> {
        Ok(Self::new(Registry::builtin()?, WeatherService::from_config(config)))
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Handle a single tool call. Always returns a response envelope.
    pub async fn handle(&self, tool: &str, args: Value) -> ToolResponse {
        debug!(tool, "dispatching tool call");

        let name = match ToolName::try_from(tool) {
            Ok(name) => name,
            Err(err) => return ToolResponse::invalid_input(err.to_string()),
        };

        match name {
            ToolName::GetWeather => self.get_weather(args).await,
            ToolName::GetForecast => self.get_forecast(args).await,
            ToolName::GetCurrentTime => self.get_current_time(args),
            ToolName::GetCityInfo => self.get_city_info(args),
            ToolName::SearchCities => self.search_cities(args),
            ToolName::ListCities => self.list_cities(),
        }
    }

    /// Handle several independent calls concurrently. Responses come back in
    /// caller order regardless of completion order.
    pub async fn handle_batch(&self, calls: &[ToolCall]) -> Vec<ToolResponse> {
        let futures = calls.iter().map(|call| self.handle(&call.tool, call.args.clone()));
        futures::future::join_all(futures).await
    }

    async fn get_weather(&self, args: Value) -> ToolResponse {
        let args: CityArgs = match decode_args(args) {
            Ok(args) => args,
            Err(resp) => return resp,
        };

        let resolved =
            match resolve_with_country(&self.registry, &args.city, args.country_code.as_deref()) {
                Ok(resolved) => resolved,
                Err(err) => return not_found(&err),
            };

        let record = self.weather.current(&resolved).await;
        let message = match record.source {
            DataSource::Live => {
                format!("Current weather for {}, {}", record.city, record.country)
            }
            DataSource::Mock => {
                format!("Mock weather data for {} (live data unavailable)", record.city)
            }
        };

        ToolResponse::ok(ToolPayload::Weather(record), message)
    }

    async fn get_forecast(&self, args: Value) -> ToolResponse {
        let args: ForecastArgs = match decode_args(args) {
            Ok(args) => args,
            Err(resp) => return resp,
        };

        if args.days == 0 || args.days > MAX_FORECAST_DAYS {
            return ToolResponse::invalid_input(format!(
                "'days' must be between 1 and {MAX_FORECAST_DAYS}, got {}",
                args.days
            ));
        }

        let resolved =
            match resolve_with_country(&self.registry, &args.city, args.country_code.as_deref()) {
                Ok(resolved) => resolved,
                Err(err) => return not_found(&err),
            };

        let records = self.weather.forecast(&resolved, args.days).await;
        let mocked = records.iter().any(|r| r.source == DataSource::Mock);
        let message = if mocked {
            format!("Mock {}-day forecast for {} (live data unavailable)", args.days, resolved.record.name)
        } else {
            format!("{}-day forecast for {}", args.days, resolved.record.name)
        };

        ToolResponse::ok(ToolPayload::Forecast(records), message)
    }

    fn get_current_time(&self, args: Value) -> ToolResponse {
        let args: CityArgs = match decode_args(args) {
            Ok(args) => args,
            Err(resp) => return resp,
        };

        let resolved =
            match resolve_with_country(&self.registry, &args.city, args.country_code.as_deref()) {
                Ok(resolved) => resolved,
                Err(err) => return not_found(&err),
            };

        let record = current_time_in(&resolved, Utc::now());
        let message = format!(
            "Current time in {} is {}",
            record.city,
            record.local_time.format("%Y-%m-%d %H:%M:%S %Z")
        );

        ToolResponse::ok(ToolPayload::Time(record), message)
    }

    fn get_city_info(&self, args: Value) -> ToolResponse {
        let args: CityArgs = match decode_args(args) {
            Ok(args) => args,
            Err(resp) => return resp,
        };

        let resolved =
            match resolve_with_country(&self.registry, &args.city, args.country_code.as_deref()) {
                Ok(resolved) => resolved,
                Err(err) => return not_found(&err),
            };

        let record = resolved.record.clone();
        let message = format!("Information retrieved for {}", record.name);
        ToolResponse::ok(ToolPayload::City(record), message)
    }

    fn search_cities(&self, args: Value) -> ToolResponse {
        let args: SearchArgs = match decode_args(args) {
            Ok(args) => args,
            Err(resp) => return resp,
        };

        let matches: Vec<_> = self
            .registry
            .search(&args.query)
            .into_iter()
            .take(args.limit)
            .cloned()
            .collect();

        if matches.is_empty() {
            return ToolResponse::not_found(format!(
                "No cities found matching '{}'. Try broader terms or major city names.",
                args.query
            ));
        }

        let message = format!("Found {} cities matching '{}'", matches.len(), args.query);
        ToolResponse::ok(ToolPayload::Cities(matches), message)
    }

    fn list_cities(&self) -> ToolResponse {
        let cities = self.registry.all().to_vec();
        let message = format!("Complete list of {} available cities", cities.len());
        ToolResponse::ok(ToolPayload::Cities(cities), message)
    }
}

fn decode_args<T: serde::de::DeserializeOwned>(args: Value) -> Result<T, ToolResponse> {
    serde_json::from_value(args)
        .map_err(|e| ToolResponse::invalid_input(format!("Invalid arguments: {e}")))
}

fn not_found(err: &ResolutionError) -> ToolResponse {
    ToolResponse::not_found(format!(
        "{err}. Try cities like New York, London, Tokyo or Paris."
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DataSource, ToolStatus};
    use serde_json::json;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(
            Registry::builtin().expect("builtin data must be consistent"),
            WeatherService::mock_only(),
        )
    }

    #[tokio::test]
    async fn unknown_tool_is_invalid_input() {
        let resp = dispatcher().handle("launch_rockets", json!({})).await;
        assert_eq!(resp.status, ToolStatus::InvalidInput);
        assert!(resp.message.contains("Unknown tool"));
    }

    #[tokio::test]
    async fn malformed_args_are_invalid_input_not_a_panic() {
        let d = dispatcher();

        let resp = d.handle("get_weather", json!("not an object")).await;
        assert_eq!(resp.status, ToolStatus::InvalidInput);

        let resp = d.handle("get_weather", json!({})).await;
        assert_eq!(resp.status, ToolStatus::InvalidInput);
    }

    #[tokio::test]
    async fn unresolved_city_is_not_found() {
        let resp = dispatcher()
            .handle("get_current_time", json!({"city": "Nonexistent City XYZ"}))
            .await;
        assert_eq!(resp.status, ToolStatus::NotFound);
    }

    #[tokio::test]
    async fn get_weather_returns_flagged_mock_data() {
        let resp = dispatcher().handle("get_weather", json!({"city": "tokyo"})).await;

        assert_eq!(resp.status, ToolStatus::Ok);
        let Some(ToolPayload::Weather(record)) = resp.payload else {
            panic!("expected weather payload");
        };
        assert_eq!(record.city, "Tokyo");
        assert_eq!(record.source, DataSource::Mock);
        assert!(resp.message.contains("Mock"));
    }

    #[tokio::test]
    async fn forecast_validates_day_range() {
        let d = dispatcher();

        for days in [0, 6] {
            let resp = d.handle("get_forecast", json!({"city": "Paris", "days": days})).await;
            assert_eq!(resp.status, ToolStatus::InvalidInput, "days={days}");
        }

        let resp = d.handle("get_forecast", json!({"city": "Paris", "days": 5})).await;
        assert_eq!(resp.status, ToolStatus::Ok);
        let Some(ToolPayload::Forecast(records)) = resp.payload else {
            panic!("expected forecast payload");
        };
        assert_eq!(records.len(), 5);
    }

    #[tokio::test]
    async fn city_info_honors_country_code() {
        let d = dispatcher();

        let resp = d
            .handle("get_city_info", json!({"city": "Paris", "country_code": "FR"}))
            .await;
        assert_eq!(resp.status, ToolStatus::Ok);

        let resp = d
            .handle("get_city_info", json!({"city": "Paris", "country_code": "JP"}))
            .await;
        assert_eq!(resp.status, ToolStatus::NotFound);
    }

    #[tokio::test]
    async fn search_cities_matches_partial_names() {
        let resp = dispatcher()
            .handle("search_cities", json!({"query": "Angeles"}))
            .await;

        assert_eq!(resp.status, ToolStatus::Ok);
        let Some(ToolPayload::Cities(cities)) = resp.payload else {
            panic!("expected cities payload");
        };
        assert!(cities.iter().any(|c| c.name.contains("Angeles")));
    }

    #[tokio::test]
    async fn search_limit_caps_results() {
        let resp = dispatcher()
            .handle("search_cities", json!({"query": "a", "limit": 2}))
            .await;

        let Some(ToolPayload::Cities(cities)) = resp.payload else {
            panic!("expected cities payload");
        };
        assert_eq!(cities.len(), 2);
    }

    #[tokio::test]
    async fn list_cities_returns_the_whole_registry() {
        let resp = dispatcher().handle("list_cities", json!({})).await;

        assert_eq!(resp.status, ToolStatus::Ok);
        let Some(ToolPayload::Cities(cities)) = resp.payload else {
            panic!("expected cities payload");
        };
        assert_eq!(cities.len(), 8);
    }

    #[tokio::test]
    async fn batch_preserves_caller_order() {
        let d = dispatcher();
        let calls = vec![
            ToolCall { tool: "get_city_info".into(), args: json!({"city": "Sydney"}) },
            ToolCall { tool: "nope".into(), args: json!({}) },
            ToolCall { tool: "get_city_info".into(), args: json!({"city": "Dubai"}) },
        ];

        let responses = d.handle_batch(&calls).await;
        assert_eq!(responses.len(), 3);

        let Some(ToolPayload::City(first)) = &responses[0].payload else {
            panic!("expected city payload");
        };
        assert_eq!(first.name, "Sydney");
        assert_eq!(responses[1].status, ToolStatus::InvalidInput);
        let Some(ToolPayload::City(third)) = &responses[2].payload else {
            panic!("expected city payload");
        };
        assert_eq!(third.name, "Dubai");
    }
}
