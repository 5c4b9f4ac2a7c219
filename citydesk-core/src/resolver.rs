//! Mapping from free-text city queries to canonical registry entries.
//!
//! Resolution is deterministic: identical input always yields the same
//! entry, with no randomness and no locale-dependent collation.

use crate::error::ResolutionError;
use crate::model::{CityRecord, MatchKind, ResolvedCity};
use crate::registry::Registry;

/// Resolve `query` against the registry.
///
/// A trailing two-letter annotation is treated as a country hint, so
/// "Paris, FR" resolves the name "Paris" filtered to France.
pub fn resolve<'a>(
    registry: &'a Registry,
    query: &str,
) -> Result<ResolvedCity<'a>, ResolutionError> {
    let (name, hint) = split_country_hint(query);
    resolve_in_country(registry, query, &name, hint.as_deref())
}

/// Resolve with an explicit country filter, as supplied by callers that pass
/// `country_code` separately from the city name.
pub fn resolve_with_country<'a>(
    registry: &'a Registry,
    query: &str,
    country_code: Option<&str>,
) -> Result<ResolvedCity<'a>, ResolutionError> {
    match country_code {
        // An explicit hint wins over anything embedded in the query.
        Some(cc) => resolve_in_country(registry, query, &normalize(query), Some(cc)),
        None => resolve(registry, query),
    }
}

fn resolve_in_country<'a>(
    registry: &'a Registry,
    original: &str,
    name: &str,
    hint: Option<&str>,
) -> Result<ResolvedCity<'a>, ResolutionError> {
    if name.is_empty() {
        return Err(ResolutionError::NotFound { query: original.to_string() });
    }

    let in_country = |c: &CityRecord| match hint {
        Some(cc) => c.country_code.eq_ignore_ascii_case(cc),
        None => true,
    };

    // Exact match over canonical name or alias wins outright.
    if let Some(record) = registry
        .all()
        .iter()
        .filter(|c| in_country(c))
        .find(|c| {
            c.name.to_lowercase() == name
                || c.aliases.iter().any(|a| a.to_lowercase() == name)
        })
    {
        return Ok(ResolvedCity {
            record,
            match_kind: MatchKind::Exact,
            query: original.to_string(),
        });
    }

    let mut candidates: Vec<&CityRecord> = registry
        .all()
        .iter()
        .filter(|c| in_country(c))
        .filter(|c| {
            c.name.to_lowercase().contains(name)
                || c.aliases.iter().any(|a| a.to_lowercase().contains(name))
        })
        .collect();

    if candidates.is_empty() {
        return Err(ResolutionError::NotFound { query: original.to_string() });
    }

    // Tie-break: prefix matches first, then shortest canonical name, then
    // alphabetical order.
    candidates.sort_by(|a, b| {
        let a_prefix = is_prefix_match(a, name);
        let b_prefix = is_prefix_match(b, name);
        b_prefix
            .cmp(&a_prefix)
            .then_with(|| a.name.len().cmp(&b.name.len()))
            .then_with(|| a.name.cmp(&b.name))
    });

    Ok(ResolvedCity {
        record: candidates[0],
        match_kind: MatchKind::Partial,
        query: original.to_string(),
    })
}

fn is_prefix_match(record: &CityRecord, name: &str) -> bool {
    record.name.to_lowercase().starts_with(name)
        || record.aliases.iter().any(|a| a.to_lowercase().starts_with(name))
}

fn normalize(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Split "Paris, FR" into ("paris", Some("FR")). Anything after the comma
/// that is not a two-letter code stays part of the name.
fn split_country_hint(query: &str) -> (String, Option<String>) {
    if let Some((name, tail)) = query.rsplit_once(',') {
        let tail = tail.trim();
        if tail.len() == 2 && tail.chars().all(|c| c.is_ascii_alphabetic()) {
            return (normalize(name), Some(tail.to_ascii_uppercase()));
        }
    }
    (normalize(query), None)
}
