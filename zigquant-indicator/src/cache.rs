use crate::indicator::{Indicator, Series};
use indexmap::IndexMap;
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use zigquant_core::candle::Candle;

/// Key an [`IndicatorCache`] entry is addressed by: indicator name, a hash of
/// its parameters, and the input candle sequence's fingerprint (§3
/// `IndicatorCacheEntry`, §4.E).
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
struct CacheKey {
    name: &'static str,
    params_hash: u64,
    candles_fingerprint: u64,
}

/// Hashes any `Hash` parameter struct into the `u64` half of a [`CacheKey`].
/// Indicators implement `Hash` on their parameter structs precisely so
/// callers can build this without the cache needing to know each
/// indicator's concrete type.
pub fn hash_params<P: Hash>(params: &P) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    params.hash(&mut hasher);
    hasher.finish()
}

enum Slot {
    /// A computation for this key is already in flight; waiters block on the
    /// condvar until it resolves (§4.E "at-most-one computation per key").
    Pending,
    Ready(Arc<Vec<(&'static str, Series)>>),
}

struct Inner {
    capacity: usize,
    entries: IndexMap<CacheKey, Slot>,
}

/// LRU-evicted memoisation of indicator output, keyed by `(name, params,
/// candles fingerprint)`. A cache miss blocks concurrent callers for the same
/// key on the single in-flight computation rather than duplicating work;
/// callers for a different key proceed immediately.
pub struct IndicatorCache {
    inner: Mutex<Inner>,
    condvar: Condvar,
}

impl IndicatorCache {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "cache capacity must be positive");
        Self {
            inner: Mutex::new(Inner {
                capacity,
                entries: IndexMap::new(),
            }),
            condvar: Condvar::new(),
        }
    }

    /// Returns the cached result for `(indicator.name(), params_hash,
    /// candles)`, computing it via `indicator.compute(candles)` on a miss.
    /// Concurrent callers racing the same miss share the single computation.
    pub fn get_or_compute(
        &self,
        indicator: &dyn Indicator,
        params_hash: u64,
        candles: &[Candle],
        candles_fingerprint: u64,
    ) -> Arc<Vec<(&'static str, Series)>> {
        let key = CacheKey {
            name: indicator.name(),
            params_hash,
            candles_fingerprint,
        };

        let mut guard = self.inner.lock();
        loop {
            match guard.entries.get(&key) {
                Some(Slot::Ready(value)) => {
                    let value = Arc::clone(value);
                    guard.entries.shift_remove(&key);
                    guard.entries.insert(key, Slot::Ready(Arc::clone(&value)));
                    return value;
                }
                Some(Slot::Pending) => {
                    self.condvar.wait(&mut guard);
                }
                None => {
                    guard.entries.insert(key.clone(), Slot::Pending);
                    break;
                }
            }
        }
        drop(guard);

        let computed = Arc::new(indicator.compute(candles));

        let mut guard = self.inner.lock();
        guard.entries.insert(key, Slot::Ready(Arc::clone(&computed)));
        while guard.entries.len() > guard.capacity {
            guard.entries.shift_remove_index(0);
        }
        drop(guard);
        self.condvar.notify_all();

        computed
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }
}

/// Tracks call counts per indicator name, used by tests to assert
/// "at-most-one computation per key" under concurrent access.
#[derive(Default)]
pub struct CallCounter {
    counts: Mutex<HashMap<&'static str, u64>>,
}

impl CallCounter {
    pub fn record(&self, name: &'static str) {
        *self.counts.lock().entry(name).or_insert(0) += 1;
    }

    pub fn count(&self, name: &'static str) -> u64 {
        *self.counts.lock().get(name).unwrap_or(&0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moving_average::Sma;
    use std::sync::Barrier;
    use std::time::Duration;
    use zigquant_core::time::Timestamp;
    use zigquant_decimal::Decimal;

    fn candles(closes: &[i64]) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, close)| Candle {
                timestamp: Timestamp(i as i64),
                open: Decimal::from_int(*close),
                high: Decimal::from_int(*close),
                low: Decimal::from_int(*close),
                close: Decimal::from_int(*close),
                volume: Decimal::ZERO,
            })
            .collect()
    }

    #[test]
    fn repeated_calls_for_identical_inputs_are_referentially_transparent() {
        let cache = IndicatorCache::new(16);
        let sma = Sma { period: 3 };
        let candles = candles(&[10, 12, 14, 16, 18]);

        let first = cache.get_or_compute(&sma, hash_params(&sma), &candles, 1);
        let second = cache.get_or_compute(&sma, hash_params(&sma), &candles, 1);

        assert_eq!(first, second);
    }

    #[test]
    fn different_fingerprints_are_distinct_cache_entries() {
        let cache = IndicatorCache::new(16);
        let sma = Sma { period: 3 };
        let a = candles(&[10, 12, 14]);
        let b = candles(&[10, 12, 14, 16]);

        cache.get_or_compute(&sma, hash_params(&sma), &a, 1);
        cache.get_or_compute(&sma, hash_params(&sma), &b, 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn capacity_overflow_evicts_the_least_recently_used_entry() {
        let cache = IndicatorCache::new(2);
        let sma = Sma { period: 3 };
        let params_hash = hash_params(&sma);

        cache.get_or_compute(&sma, params_hash, &candles(&[1, 2, 3]), 1);
        cache.get_or_compute(&sma, params_hash, &candles(&[1, 2, 3]), 2);
        cache.get_or_compute(&sma, params_hash, &candles(&[1, 2, 3]), 3);

        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn concurrent_misses_on_the_same_key_share_one_computation() {
        let cache = Arc::new(IndicatorCache::new(16));
        let counter = Arc::new(CallCounter::default());
        let sma = Sma { period: 3 };
        let params_hash = hash_params(&sma);
        let input = candles(&[10, 12, 14, 16, 18]);
        let barrier = Arc::new(Barrier::new(4));

        struct CountingIndicator {
            inner: Sma,
            counter: Arc<CallCounter>,
        }
        impl Indicator for CountingIndicator {
            fn name(&self) -> &'static str {
                self.inner.name()
            }
            fn required_warm_up(&self) -> usize {
                self.inner.required_warm_up()
            }
            fn compute(&self, candles: &[Candle]) -> Vec<(&'static str, Series)> {
                self.counter.record(self.name());
                std::thread::sleep(Duration::from_millis(20));
                self.inner.compute(candles)
            }
        }

        let indicator = Arc::new(CountingIndicator {
            inner: sma,
            counter: Arc::clone(&counter),
        });

        let mut handles = Vec::new();
        for _ in 0..4 {
            let cache = Arc::clone(&cache);
            let indicator = Arc::clone(&indicator);
            let input = input.clone();
            let barrier = Arc::clone(&barrier);
            handles.push(std::thread::spawn(move || {
                barrier.wait();
                cache.get_or_compute(indicator.as_ref(), params_hash, &input, 1);
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(counter.count("sma"), 1);
    }
}
