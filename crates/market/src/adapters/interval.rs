/// Canonical interval tokens shared by every adapter. Each adapter translates
/// these to its native notation and declares the subset it serves in its
/// descriptor.
pub const CANONICAL_INTERVALS: &[&str] = &["1m", "5m", "15m", "30m", "1h", "4h", "1d", "1w"];

/// Duration of one canonical interval in milliseconds.
pub fn interval_ms(interval: &str) -> Option<i64> {
    let ms = match interval {
        "1m" => 60_000,
        "5m" => 300_000,
        "15m" => 900_000,
        "30m" => 1_800_000,
        "1h" => 3_600_000,
        "4h" => 14_400_000,
        "1d" => 86_400_000,
        "1w" => 604_800_000,
        _ => return None,
    };
    Some(ms)
}
