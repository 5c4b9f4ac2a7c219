use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::json;

use citydesk_core::{Config, Dispatcher, ProviderId, ToolPayload, ToolStatus};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "citydesk", version, about = "City information tools: weather, time and city facts")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific weather provider.
    Configure {
        /// Provider short name, e.g. "openweather" or "weatherapi".
        provider: String,
    },

    /// Show current weather (or a forecast) for a city.
    Weather {
        /// City name, optionally with a country hint like "Paris, FR".
        city: String,

        /// ISO 3166 country code filter, e.g. "US".
        #[arg(long)]
        country: Option<String>,

        /// Forecast length in days (1-5); omit for current weather.
        #[arg(long)]
        days: Option<u8>,
    },

    /// Show the current local time in a city.
    Time {
        city: String,
    },

    /// Show registry information about a city.
    Info {
        city: String,

        /// ISO 3166 country code filter, e.g. "US".
        #[arg(long)]
        country: Option<String>,
    },

    /// Search registered cities by name, alias, country or landmark.
    Search {
        query: String,

        /// Maximum number of results.
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },

    /// List every registered city.
    Cities,

    /// Invoke a tool exactly as the agent framework would and print the raw
    /// response envelope as JSON.
    Call {
        /// Tool name, e.g. "get_weather".
        tool: String,

        /// Tool arguments as a JSON object.
        #[arg(long, default_value = "{}")]
        args: String,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        if let Command::Configure { provider } = &self.command {
            return configure(provider);
        }

        let config = Config::load()?;
        init_tracing(&config);

        let dispatcher = Dispatcher::from_config(&config)
            .context("Registry failed its consistency check")?;

        match self.command {
            Command::Configure { .. } => unreachable!("handled above"),

            Command::Weather { city, country, days } => {
                let (tool, args) = match days {
                    Some(days) => (
                        "get_forecast",
                        json!({ "city": city, "country_code": country, "days": days }),
                    ),
                    None => ("get_weather", json!({ "city": city, "country_code": country })),
                };
                let payload = expect_ok(dispatcher.handle(tool, args).await)?;
                match payload {
                    ToolPayload::Weather(record) => render::weather(&record),
                    ToolPayload::Forecast(records) => render::forecast(&records),
                    other => bail!("unexpected payload: {other:?}"),
                }
            }

            Command::Time { city } => {
                let args = json!({ "city": city });
                let payload = expect_ok(dispatcher.handle("get_current_time", args).await)?;
                match payload {
                    ToolPayload::Time(record) => render::time(&record),
                    other => bail!("unexpected payload: {other:?}"),
                }
            }

            Command::Info { city, country } => {
                let args = json!({ "city": city, "country_code": country });
                let payload = expect_ok(dispatcher.handle("get_city_info", args).await)?;
                match payload {
                    ToolPayload::City(record) => render::city(&record),
                    other => bail!("unexpected payload: {other:?}"),
                }
            }

            Command::Search { query, limit } => {
                let args = json!({ "query": query, "limit": limit });
                let payload = expect_ok(dispatcher.handle("search_cities", args).await)?;
                match payload {
                    ToolPayload::Cities(cities) => render::cities(&cities),
                    other => bail!("unexpected payload: {other:?}"),
                }
            }

            Command::Cities => {
                let payload = expect_ok(dispatcher.handle("list_cities", json!({})).await)?;
                match payload {
                    ToolPayload::Cities(cities) => render::cities(&cities),
                    other => bail!("unexpected payload: {other:?}"),
                }
            }

            Command::Call { tool, args } => {
                let args: serde_json::Value =
                    serde_json::from_str(&args).context("--args must be valid JSON")?;
                let response = dispatcher.handle(&tool, args).await;
                println!("{}", serde_json::to_string_pretty(&response)?);
            }
        }

        Ok(())
    }
}

/// Interactive credential entry, persisted to the config file. Reads the
/// file directly so environment overrides are not written back to disk.
fn configure(provider: &str) -> Result<()> {
    let id = ProviderId::try_from(provider)?;
    let mut config = Config::load_file()?;

    let api_key = inquire::Password::new(&format!("API key for {id}:"))
        .without_confirmation()
        .prompt()
        .context("Aborted")?;

    let had_other_default = config
        .default_provider_id()
        .map(|current| current != id)
        .unwrap_or(false);

    config.upsert_provider_api_key(id, api_key);

    if had_other_default {
        let make_default = inquire::Confirm::new(&format!("Make {id} the default provider?"))
            .with_default(false)
            .prompt()
            .context("Aborted")?;
        if make_default {
            config.set_default_provider(id);
        }
    }

    config.save()?;
    println!("Saved credentials for {id} to {}", Config::config_file_path()?.display());
    Ok(())
}

/// Unwrap an OK envelope or turn the response message into a CLI error.
fn expect_ok(response: citydesk_core::ToolResponse) -> Result<ToolPayload> {
    match response.status {
        ToolStatus::Ok => response
            .payload
            .ok_or_else(|| anyhow::anyhow!("tool reported success without a payload")),
        _ => bail!("{}", response.message),
    }
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}
