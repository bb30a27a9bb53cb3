use std::fmt::Write as _;

use chrono::Local;
use weather_core::{CityOutcome, CityStatus, WeatherReading};

fn reading_lines(out: &mut String, reading: &WeatherReading) {
    let _ = writeln!(out, "  Temperature: {:.1}°F", reading.temperature_f);
    let _ = writeln!(out, "  Feels like:  {:.1}°F", reading.feels_like_f);
    let _ = writeln!(out, "  Humidity:    {}%", reading.humidity_pct);
    let _ = writeln!(out, "  Conditions:  {}", reading.condition_text);
}

/// Human-readable block for one city. `bucket` is only used to print where a
/// snapshot went.
pub fn render_outcome(outcome: &CityOutcome, bucket: Option<&str>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", outcome.city);

    match &outcome.status {
        CityStatus::Stored { reading, key, captured_at } => {
            reading_lines(&mut out, reading);
            let local = captured_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S");
            match bucket {
                Some(bucket) => {
                    let _ = writeln!(out, "  Saved:       s3://{bucket}/{key} ({local})");
                }
                None => {
                    let _ = writeln!(out, "  Saved:       {key} ({local})");
                }
            }
        }
        CityStatus::Fetched { reading } => reading_lines(&mut out, reading),
        CityStatus::FetchFailed { error } => {
            let _ = writeln!(out, "  Failed to fetch weather data: {error}");
        }
        CityStatus::StoreFailed { reading, error } => {
            reading_lines(&mut out, reading);
            let _ = writeln!(out, "  Failed to save snapshot: {error}");
        }
    }

    out
}
