//! Human readable formatting helpers.

/// Render a byte count with a decimal unit suffix, e.g. `1.5MB`.
///
/// Units stop at `TB`; larger values keep growing the number.
pub fn format_size(bytes: i64) -> String {
    let mut size = bytes as f64;
    for unit in ["B", "kB", "MB", "GB"] {
        if size.abs() < 1000.0 {
            return format!("{size:.1}{unit}");
        }
        size /= 1000.0;
    }
    format!("{size:.1}TB")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0.0B");
        assert_eq!(format_size(999), "999.0B");
        assert_eq!(format_size(1_000), "1.0kB");
        assert_eq!(format_size(1_500_000), "1.5MB");
        assert_eq!(format_size(1_000_000_000), "1.0GB");
        assert_eq!(format_size(1_000_000_000_000), "1.0TB");
        assert_eq!(format_size(1_000_000_000_000_000), "1000.0TB");
        assert_eq!(format_size(-1_000_000), "-1.0MB");
    }
}
