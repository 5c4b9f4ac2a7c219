//! Core library for the `citydesk` agent tools.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The fixed city registry and the query resolver
//! - Time and weather services (live fetch with deterministic mock fallback)
//! - The dispatch layer consumed by the hosting agent framework
//!
//! It is used by `citydesk-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod model;
pub mod provider;
pub mod registry;
pub mod resolver;
pub mod time;
pub mod weather;

pub use config::{Config, ProviderConfig};
pub use dispatch::{Dispatcher, ToolCall};
pub use error::{ProviderError, RegistryError, ResolutionError};
pub use model::{
    CityRecord, DataSource, MatchKind, ResolvedCity, TimeRecord, ToolPayload, ToolResponse,
    ToolStatus, WeatherRecord,
};
pub use provider::{Observation, ProviderId, WeatherProvider};
pub use registry::Registry;
pub use resolver::{resolve, resolve_with_country};
pub use time::current_time_in;
pub use weather::WeatherService;
