//! Human readable rendering of counter values.

use vboxmon::metrics::Unit;

const BYTE_UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];

/// `-` for missing samples.
pub fn format_percent(value: f64) -> String {
    if value.is_nan() {
        return "-".to_string();
    }
    format!("{:.1}%", value)
}

pub fn format_bytes(value: f64) -> String {
    if value.is_nan() {
        return "-".to_string();
    }

    let mut scaled = value;
    let mut unit = 0;
    while scaled.abs() >= 1024.0 && unit < BYTE_UNITS.len() - 1 {
        scaled /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", scaled, BYTE_UNITS[unit])
    } else {
        format!("{:.1} {}", scaled, BYTE_UNITS[unit])
    }
}

pub fn format_value(value: f64, unit: Unit) -> String {
    match unit {
        Unit::Percent => format_percent(value),
        Unit::Bytes => format_bytes(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(12.5), "12.5%");
        assert_eq!(format_percent(f64::NAN), "-");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512.0), "512 B");
        assert_eq!(format_bytes(2048.0 * 1024.0), "2.0 MiB");
        assert_eq!(format_bytes(3.0 * 1024.0 * 1024.0 * 1024.0 * 1024.0), "3072.0 GiB");
        assert_eq!(format_bytes(f64::NAN), "-");
    }
}
