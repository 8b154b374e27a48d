use chrono::Utc;

/// Wall-clock milliseconds since the Unix epoch, as carried on the wire.
pub fn now_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

/// Microseconds as the 32-bit duration width used on the wire, saturating.
pub fn micros_u32(duration: std::time::Duration) -> u32 {
    u32::try_from(duration.as_micros()).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn now_is_after_2020() {
        assert!(now_ms() > 1_577_836_800_000);
    }

    #[test]
    fn micros_saturate() {
        assert_eq!(micros_u32(Duration::from_micros(1_500)), 1_500);
        assert_eq!(micros_u32(Duration::from_secs(10_000)), u32::MAX);
    }
}
