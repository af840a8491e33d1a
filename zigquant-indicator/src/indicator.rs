use zigquant_core::candle::Candle;
use zigquant_decimal::Decimal;

/// A single named output series, the same length as the input candle slice;
/// positions within the warm-up region are `None` (§4.E).
pub type Series = Vec<Option<Decimal>>;

/// Common contract every technical indicator satisfies. Multi-line
/// indicators (MACD, Bollinger Bands, Ichimoku) return more than one
/// `(name, Series)` pair from `compute`; single-line indicators return one.
pub trait Indicator: Send + Sync {
    fn name(&self) -> &'static str;

    /// Number of leading candles whose output is `None` for this
    /// indicator's configured parameters.
    fn required_warm_up(&self) -> usize;

    /// Computes every output line. Returns an empty vector of series when
    /// `candles` is empty; never panics.
    fn compute(&self, candles: &[Candle]) -> Vec<(&'static str, Series)>;
}

/// Builds a `None`-padded warm-up prefix followed by `values`, so the
/// returned series always has the same length as the input candles.
pub(crate) fn padded(warm_up: usize, len: usize, values: impl Iterator<Item = Decimal>) -> Series {
    let mut series: Series = (0..warm_up.min(len)).map(|_| None).collect();
    series.extend(values.map(Some));
    series.truncate(len);
    while series.len() < len {
        series.push(None);
    }
    series
}
