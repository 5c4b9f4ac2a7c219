//! Human-friendly output formatting.
//!
//! Mock-sourced data is always labeled; provenance never disappears in the
//! terminal view.

use citydesk_core::{CityRecord, DataSource, TimeRecord, WeatherRecord};

fn source_label(source: DataSource) -> &'static str {
    match source {
        DataSource::Live => "live data",
        DataSource::Mock => "mock data, live fetch unavailable",
    }
}

pub fn weather(record: &WeatherRecord) {
    println!("Weather for {}, {} ({})", record.city, record.country, source_label(record.source));
    println!("  temperature : {:.1} °C / {:.1} °F", record.temperature_c, record.temperature_f);
    println!("  condition   : {}", record.condition);
    println!("  humidity    : {} %", record.humidity_pct);
    println!("  wind        : {:.1} m/s", record.wind_speed_mps);
    println!("  pressure    : {:.1} hPa", record.pressure_hpa);
    println!("  visibility  : {:.1} km", record.visibility_km);
}

pub fn forecast(records: &[WeatherRecord]) {
    let Some(first) = records.first() else {
        println!("No forecast data.");
        return;
    };

    println!(
        "{}-day forecast for {}, {} ({})",
        records.len(),
        first.city,
        first.country,
        source_label(first.source)
    );
    for record in records {
        println!(
            "  {}  {:>5.1} °C  {:>3} %  {:>4.1} m/s  {}",
            record.fetched_at.format("%Y-%m-%d"),
            record.temperature_c,
            record.humidity_pct,
            record.wind_speed_mps,
            record.condition
        );
    }
}

pub fn time(record: &TimeRecord) {
    println!(
        "Current time in {}: {} {}",
        record.city,
        record.local_time.format("%Y-%m-%d %H:%M:%S"),
        record.tz_abbreviation
    );
    println!(
        "  timezone : {} (UTC{}, {})",
        record.timezone_id,
        format_offset(record.utc_offset_minutes),
        if record.is_dst { "daylight saving time" } else { "standard time" }
    );
}

pub fn city(record: &CityRecord) {
    println!("{}, {} ({})", record.name, record.state, record.country);
    println!("  population : {}", record.population);
    println!("  timezone   : {}", record.timezone.name());
    println!("  location   : {:.4}, {:.4}", record.latitude, record.longitude);
    println!("  famous for : {}", record.landmarks.join(", "));
    if !record.aliases.is_empty() {
        println!("  also known : {}", record.aliases.join(", "));
    }
}

pub fn cities(records: &[CityRecord]) {
    for record in records {
        println!(
            "{:<16} {:<22} population {:>10}",
            record.name, record.country, record.population
        );
    }
}

fn format_offset(minutes: i32) -> String {
    let sign = if minutes < 0 { '-' } else { '+' };
    let abs = minutes.abs();
    format!("{sign}{:02}:{:02}", abs / 60, abs % 60)
}
