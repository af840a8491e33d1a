use derive_more::{Constructor, Display, From};
use serde::{Deserialize, Serialize};

/// Millisecond UTC epoch timestamp, signed 64-bit per the data model.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize, Display, From,
)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Timestamp(
            chrono::Utc::now()
                .timestamp_millis(),
        )
    }

    /// Floors this timestamp to the nearest `interval_ms` boundary, used to
    /// align candles/k-lines.
    pub fn floor_to_interval(&self, interval_ms: i64) -> Timestamp {
        assert!(interval_ms > 0, "interval must be positive");
        Timestamp(self.0 - self.0.rem_euclid(interval_ms))
    }

    pub fn as_chrono(&self) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp_millis(self.0).unwrap_or_default()
    }
}

/// Millisecond duration, signed to mirror [`Timestamp`] arithmetic.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize, Display, Constructor,
)]
pub struct DurationMs(pub i64);

impl std::ops::Add<DurationMs> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: DurationMs) -> Self::Output {
        Timestamp(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Timestamp {
    type Output = DurationMs;

    fn sub(self, rhs: Timestamp) -> Self::Output {
        DurationMs(self.0 - rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_to_interval_aligns_down() {
        let ts = Timestamp(1_000 * 60 * 5 + 37_000); // 5m boundary + 37s
        let floored = ts.floor_to_interval(60_000 * 5);
        assert_eq!(floored.0, 1_000 * 60 * 5);
    }

    #[test]
    fn floor_is_idempotent() {
        let ts = Timestamp(120_000);
        let floored = ts.floor_to_interval(60_000);
        assert_eq!(floored, floored.floor_to_interval(60_000));
    }
}
