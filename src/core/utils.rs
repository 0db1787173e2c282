//! Small shared helpers

use chrono::DateTime;

/// Current UTC time in milliseconds, the timestamp unit used across the schema.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Render a milli-DRX counter with the fixed 3-decimal precision
/// the ledger stores ("12.345").
pub fn format_drx(milli: i64) -> String {
    let sign = if milli < 0 { "-" } else { "" };
    let abs = milli.unsigned_abs();
    format!("{}{}.{:03}", sign, abs / 1000, abs % 1000)
}

/// Format a millisecond timestamp as a calendar date ("2025-03-14").
/// Out-of-range timestamps render as "unknown".
pub fn format_date(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_drx_whole_and_fraction() {
        assert_eq!(format_drx(0), "0.000");
        assert_eq!(format_drx(200_000), "200.000");
        assert_eq!(format_drx(1_234), "1.234");
        assert_eq!(format_drx(5), "0.005");
    }

    #[test]
    fn test_format_drx_negative() {
        assert_eq!(format_drx(-1_500), "-1.500");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(0), "1970-01-01");
        assert_eq!(format_date(i64::MAX), "unknown");
    }
}
