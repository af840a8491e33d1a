use zigquant_core::instrument::Side;
use zigquant_decimal::Decimal;

/// Adjusts a reference price to account for market impact, applied against
/// every simulated fill (§4.H). Grounded on `jackbot/src/backtest::
/// simulation::MarketSimulator`'s `slippage_bps` field, generalised from a
/// single fixed basis-point constant to a pluggable trait so other models
/// (volume-scaled, volatility-scaled) can be added without touching the
/// simulator.
pub trait SlippageModel: Send + Sync {
    /// Returns the price actually achieved when crossing `reference_price`
    /// in the direction implied by `side` (a buy pays slippage upward, a
    /// sell receives slippage downward).
    fn adjust(&self, reference_price: Decimal, side: Side) -> Decimal;
}

/// No market impact. The default for deterministic unit tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZeroSlippage;

impl SlippageModel for ZeroSlippage {
    fn adjust(&self, reference_price: Decimal, _side: Side) -> Decimal {
        reference_price
    }
}

/// Fixed basis-point slippage applied against the reference price, the
/// direct analogue of `MarketSimulator::execute`'s `slippage_bps`.
#[derive(Debug, Clone, Copy)]
pub struct BasisPointSlippage {
    pub bps: Decimal,
}

impl SlippageModel for BasisPointSlippage {
    fn adjust(&self, reference_price: Decimal, side: Side) -> Decimal {
        let slip = reference_price * self.bps / Decimal::from_int(10_000);
        match side {
            Side::Buy => reference_price + slip,
            Side::Sell => reference_price - slip,
        }
    }
}
