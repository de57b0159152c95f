use chrono::{DateTime, Local, Utc};

/// Get current Unix timestamp (milliseconds)
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Format a Unix timestamp (milliseconds) as local wall-clock time (`HH:MM:SS`).
pub fn timestamp_to_local_clock(timestamp_millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(timestamp_millis)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
        .with_timezone(&Local)
        .format("%H:%M:%S")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_millis_is_monotonic_enough() {
        // テスト項目: 連続した呼び出しで値が減少しない
        let first = now_millis();
        let second = now_millis();
        assert!(second >= first);
    }

    #[test]
    fn test_timestamp_to_local_clock_format() {
        // テスト項目: ローカル時刻が HH:MM:SS 形式で返される
        let clock = timestamp_to_local_clock(0);
        assert_eq!(clock.len(), 8);
        assert_eq!(clock.chars().filter(|c| *c == ':').count(), 2);
    }
}
