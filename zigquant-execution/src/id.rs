use smol_str::SmolStr;
use std::sync::atomic::{AtomicU64, Ordering};
use zigquant_core::time::Timestamp;

/// Generates process-unique `client_order_id`s without a `rand` dependency:
/// a monotonic counter composed with the submission timestamp is unique for
/// as long as the counter does not wrap, which at one allocation per order
/// submission is not a practical concern.
#[derive(Debug, Default)]
pub struct ClientOrderIdGenerator {
    counter: AtomicU64,
}

impl ClientOrderIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self, now: Timestamp) -> SmolStr {
        let sequence = self.counter.fetch_add(1, Ordering::Relaxed);
        SmolStr::new(format!("C-{}-{}", now.0, sequence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique_within_the_same_timestamp() {
        let generator = ClientOrderIdGenerator::new();
        let now = Timestamp(1);
        let a = generator.next(now);
        let b = generator.next(now);
        assert_ne!(a, b);
    }
}
