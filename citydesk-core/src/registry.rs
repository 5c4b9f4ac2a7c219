//! Fixed registry of cities the tools can answer questions about.
//!
//! The table is compiled in; adding a city means a new build, not a runtime
//! mutation path. Timezone identifiers are validated once while the registry
//! is built, so the time service never has to handle an invalid zone.

use chrono_tz::Tz;

use crate::error::RegistryError;
use crate::model::CityRecord;

/// Raw, declaration-friendly form of a registry entry. The timezone is still
/// a string here; parsing it is the load-time consistency check.
struct RawCity {
    name: &'static str,
    country: &'static str,
    country_code: &'static str,
    state: &'static str,
    aliases: &'static [&'static str],
    timezone_id: &'static str,
    latitude: f64,
    longitude: f64,
    population: u64,
    landmarks: &'static [&'static str],
}

const BUILTIN: &[RawCity] = &[
    RawCity {
        name: "New York City",
        country: "United States",
        country_code: "US",
        state: "New York",
        aliases: &["new york", "nyc"],
        timezone_id: "America/New_York",
        latitude: 40.7128,
        longitude: -74.0060,
        population: 8_336_817,
        landmarks: &["Statue of Liberty", "Central Park", "Times Square", "Broadway"],
    },
    RawCity {
        name: "London",
        country: "United Kingdom",
        country_code: "GB",
        state: "England",
        aliases: &[],
        timezone_id: "Europe/London",
        latitude: 51.5074,
        longitude: -0.1278,
        population: 9_648_110,
        landmarks: &["Big Ben", "Tower Bridge", "Buckingham Palace", "London Eye"],
    },
    RawCity {
        name: "Tokyo",
        country: "Japan",
        country_code: "JP",
        state: "Tokyo Metropolis",
        aliases: &[],
        timezone_id: "Asia/Tokyo",
        latitude: 35.6762,
        longitude: 139.6503,
        population: 14_047_594,
        landmarks: &["Tokyo Skytree", "Senso-ji Temple", "Shibuya Crossing", "Mount Fuji (nearby)"],
    },
    RawCity {
        name: "Paris",
        country: "France",
        country_code: "FR",
        state: "Île-de-France",
        aliases: &[],
        timezone_id: "Europe/Paris",
        latitude: 48.8566,
        longitude: 2.3522,
        population: 2_161_000,
        landmarks: &["Eiffel Tower", "Louvre Museum", "Notre-Dame Cathedral", "Arc de Triomphe"],
    },
    RawCity {
        name: "Sydney",
        country: "Australia",
        country_code: "AU",
        state: "New South Wales",
        aliases: &[],
        timezone_id: "Australia/Sydney",
        latitude: -33.8688,
        longitude: 151.2093,
        population: 5_312_163,
        landmarks: &["Sydney Opera House", "Harbour Bridge", "Bondi Beach", "Royal Botanic Gardens"],
    },
    RawCity {
        name: "Dubai",
        country: "United Arab Emirates",
        country_code: "AE",
        state: "Dubai Emirate",
        aliases: &[],
        timezone_id: "Asia/Dubai",
        latitude: 25.2048,
        longitude: 55.2708,
        population: 3_331_420,
        landmarks: &["Burj Khalifa", "Palm Jumeirah", "Dubai Mall", "Burj Al Arab"],
    },
    RawCity {
        name: "Singapore",
        country: "Singapore",
        country_code: "SG",
        state: "Singapore",
        aliases: &[],
        timezone_id: "Asia/Singapore",
        latitude: 1.3521,
        longitude: 103.8198,
        population: 5_685_807,
        landmarks: &["Marina Bay Sands", "Gardens by the Bay", "Merlion", "Sentosa Island"],
    },
    RawCity {
        name: "Los Angeles",
        country: "United States",
        country_code: "US",
        state: "California",
        aliases: &["la"],
        timezone_id: "America/Los_Angeles",
        latitude: 34.0522,
        longitude: -118.2437,
        population: 3_898_747,
        landmarks: &["Hollywood", "Santa Monica Pier", "Griffith Observatory", "Venice Beach"],
    },
];

/// Immutable city registry, loaded once at process start.
#[derive(Debug, Clone)]
pub struct Registry {
    cities: Vec<CityRecord>,
}

impl Registry {
    /// Build the compiled-in registry, validating every timezone identifier.
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::from_raw(BUILTIN)
    }

    fn from_raw(raw: &[RawCity]) -> Result<Self, RegistryError> {
        let mut cities = Vec::with_capacity(raw.len());
        for entry in raw {
            let timezone: Tz = entry.timezone_id.parse().map_err(|_| {
                RegistryError::InvalidTimezone {
                    city: entry.name.to_string(),
                    timezone_id: entry.timezone_id.to_string(),
                }
            })?;

            cities.push(CityRecord {
                name: entry.name.to_string(),
                country: entry.country.to_string(),
                country_code: entry.country_code.to_string(),
                state: entry.state.to_string(),
                aliases: entry.aliases.iter().map(|a| (*a).to_string()).collect(),
                timezone,
                latitude: entry.latitude,
                longitude: entry.longitude,
                population: entry.population,
                landmarks: entry.landmarks.iter().map(|l| (*l).to_string()).collect(),
            });
        }

        Ok(Self { cities })
    }

    /// Case-insensitive exact lookup over canonical names and aliases.
    pub fn lookup_exact(&self, name: &str) -> Option<&CityRecord> {
        let needle = name.trim().to_lowercase();
        self.cities.iter().find(|c| {
            c.name.to_lowercase() == needle
                || c.aliases.iter().any(|a| a.to_lowercase() == needle)
        })
    }

    /// Case-insensitive substring search over canonical name, aliases,
    /// country and landmarks, ordered by population (largest first) with
    /// name as the tie-break.
    pub fn search(&self, query: &str) -> Vec<&CityRecord> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut matches: Vec<&CityRecord> = self
            .cities
            .iter()
            .filter(|c| {
                c.name.to_lowercase().contains(&needle)
                    || c.aliases.iter().any(|a| a.to_lowercase().contains(&needle))
                    || c.country.to_lowercase().contains(&needle)
                    || c.landmarks.iter().any(|l| l.to_lowercase().contains(&needle))
            })
            .collect();

        matches.sort_by(|a, b| {
            b.population.cmp(&a.population).then_with(|| a.name.cmp(&b.name))
        });

        matches
    }

    /// All registered cities, in declaration order.
    pub fn all(&self) -> &[CityRecord] {
        &self.cities
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }
}
