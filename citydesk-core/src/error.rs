use crate::provider::ProviderId;
use thiserror::Error;

/// Failure to map a free-text city query onto the registry.
///
/// This is one of only two failures that ever reach the caller of the
/// dispatch layer; everything upstream of the registry is absorbed by the
/// weather fallback path.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("no city matching '{query}' is registered")]
    NotFound { query: String },
}

/// Failure of a single live fetch attempt against a weather upstream.
///
/// Consumed internally by `WeatherService`; never propagated past it.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("no API key configured for provider '{0}'")]
    NoCredential(ProviderId),

    #[error("request to {provider} failed: {source}")]
    Http {
        provider: ProviderId,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} returned status {status}: {body}")]
    Status {
        provider: ProviderId,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to decode {provider} response: {detail}")]
    Decode {
        provider: ProviderId,
        detail: String,
    },
}

/// Registry data failed its load-time consistency check.
///
/// Fatal at startup; never surfaced per request.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("city '{city}' carries unparsable timezone identifier '{timezone_id}'")]
    InvalidTimezone { city: String, timezone_id: String },
}
