//! Unit-aware parsing of counter values.

use vboxmon_shared::errors::{VboxError, VboxResult};

use super::Unit;

/// Byte suffixes, longest first so `KB` is not read as `B`.
const BYTE_SUFFIXES: [(&str, f64); 4] = [
    ("GB", 1024.0 * 1024.0 * 1024.0),
    ("MB", 1024.0 * 1024.0),
    ("KB", 1024.0),
    ("B", 1.0),
];

/// Parse `text` with the grammar of `unit`.
pub fn parse_value(text: &str, unit: Unit) -> VboxResult<f64> {
    match unit {
        Unit::Percent => parse_percent(text),
        Unit::Bytes => parse_bytes(text),
    }
}

/// Parse a percentage such as `12.5%`. The `%` is optional.
pub fn parse_percent(text: &str) -> VboxResult<f64> {
    let trimmed = text.trim();
    let number = trimmed.strip_suffix('%').unwrap_or(trimmed);
    parse_decimal(text, number)
}

/// Parse a byte size such as `2 MB`, `512kB` or `4096`.
///
/// Suffixes `B`, `KB`, `MB`, `GB` are matched case-insensitively with
/// binary multipliers. Without a recognized suffix the text is a plain
/// number of bytes.
pub fn parse_bytes(text: &str) -> VboxResult<f64> {
    let trimmed = text.trim();
    let upper = trimmed.to_ascii_uppercase();

    for (suffix, multiplier) in BYTE_SUFFIXES {
        if upper.ends_with(suffix) {
            let number = &trimmed[..trimmed.len() - suffix.len()];
            return Ok(parse_decimal(text, number)? * multiplier);
        }
    }

    parse_decimal(text, trimmed)
}

fn parse_decimal(text: &str, number: &str) -> VboxResult<f64> {
    number
        .trim()
        .parse::<f64>()
        .map_err(|e| VboxError::MetricParse {
            value: text.to_string(),
            reason: e.to_string(),
        })
}
