use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Canonical metadata for a single registered city.
///
/// Built once at process start; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityRecord {
    pub name: String,
    pub country: String,
    pub country_code: String,
    pub state: String,
    pub aliases: Vec<String>,
    /// IANA timezone, validated when the registry is built.
    pub timezone: Tz,
    pub latitude: f64,
    pub longitude: f64,
    pub population: u64,
    pub landmarks: Vec<String>,
}

/// How a query matched its registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Partial,
}

/// Outcome of resolving a free-text query against the registry.
///
/// Borrowed from the registry; lives only for the duration of one call.
#[derive(Debug, Clone)]
pub struct ResolvedCity<'a> {
    pub record: &'a CityRecord,
    pub match_kind: MatchKind,
    pub query: String,
}

/// Provenance of a weather record.
///
/// Callers must never treat `Mock` data as live; every record carries this
/// tag so the distinction survives serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Live,
    Mock,
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSource::Live => f.write_str("live"),
            DataSource::Mock => f.write_str("mock"),
        }
    }
}

/// A single weather observation or forecast entry.
///
/// For forecast entries `fetched_at` carries the forecast day (request time
/// plus the day offset).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub city: String,
    pub country: String,
    pub temperature_c: f64,
    pub temperature_f: f64,
    pub humidity_pct: u8,
    pub wind_speed_mps: f64,
    pub pressure_hpa: f64,
    pub visibility_km: f64,
    pub condition: String,
    pub source: DataSource,
    pub fetched_at: DateTime<Utc>,
}

/// Current wall-clock information for a resolved city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeRecord {
    pub city: String,
    pub timezone_id: String,
    pub local_time: DateTime<FixedOffset>,
    pub utc_offset_minutes: i32,
    pub tz_abbreviation: String,
    pub is_dst: bool,
}

/// Status of a dispatched tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    Ok,
    NotFound,
    InvalidInput,
    /// Reserved: the fallback path always produces a record, so this should
    /// not occur in practice.
    UpstreamError,
}

/// Payload variants a tool call can produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ToolPayload {
    Weather(WeatherRecord),
    Forecast(Vec<WeatherRecord>),
    Time(TimeRecord),
    City(CityRecord),
    Cities(Vec<CityRecord>),
}

/// The response envelope returned to the agent framework.
///
/// This is the only structure that crosses the dispatch boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse {
    pub status: ToolStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<ToolPayload>,
    pub message: String,
}

impl ToolResponse {
    pub fn ok(payload: ToolPayload, message: impl Into<String>) -> Self {
        Self { status: ToolStatus::Ok, payload: Some(payload), message: message.into() }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self { status: ToolStatus::NotFound, payload: None, message: message.into() }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self { status: ToolStatus::InvalidInput, payload: None, message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_response_serializes_status_as_snake_case() {
        let resp = ToolResponse::not_found("no such city");
        let json = serde_json::to_value(&resp).expect("serializable");

        assert_eq!(json["status"], "not_found");
        assert_eq!(json["message"], "no such city");
        assert!(json.get("payload").is_none());
    }

    #[test]
    fn payload_is_tagged_by_kind() {
        let record = TimeRecord {
            city: "Tokyo".into(),
            timezone_id: "Asia/Tokyo".into(),
            local_time: DateTime::parse_from_rfc3339("2024-06-01T21:00:00+09:00").unwrap(),
            utc_offset_minutes: 540,
            tz_abbreviation: "JST".into(),
            is_dst: false,
        };
        let resp = ToolResponse::ok(ToolPayload::Time(record), "time retrieved");
        let json = serde_json::to_value(&resp).expect("serializable");

        assert_eq!(json["status"], "ok");
        assert_eq!(json["payload"]["kind"], "time");
        assert_eq!(json["payload"]["data"]["utc_offset_minutes"], 540);
    }
}
