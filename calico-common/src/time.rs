//! Timestamp utilities

use chrono::{DateTime, SecondsFormat, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current UTC time as an RFC 3339 string, the format stored in `created_at` columns
pub fn now_rfc3339() -> String {
    now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp.timestamp() > 946_684_800); // 2000-01-01 00:00:00 UTC
    }

    #[test]
    fn test_rfc3339_round_trips_through_chrono() {
        let stamp = now_rfc3339();
        assert!(stamp.ends_with('Z'));
        assert!(DateTime::parse_from_rfc3339(&stamp).is_ok());
    }

    #[tokio::test]
    async fn test_rfc3339_strings_sort_chronologically() {
        let first = now_rfc3339();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = now_rfc3339();
        // Fixed-width format: lexical order matches time order
        assert!(second > first);
    }
}
