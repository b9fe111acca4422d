pub mod config;
pub mod embedding;
pub mod llm;

use std::time::Duration;

/// Whole milliseconds, saturating, for log fields.
pub fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_millis_truncates_and_saturates() {
        assert_eq!(duration_millis(Duration::from_micros(2_999)), 2);
        assert_eq!(duration_millis(Duration::MAX), u64::MAX);
    }
}
