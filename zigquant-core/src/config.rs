use serde::{Deserialize, Serialize};
use zigquant_decimal::Decimal;

/// Per-exchange credentials and connection limits (§6). The core reads this
/// but never logs it directly — callers must pass [`ExchangeConfig::redacted`]
/// to any logging call site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    pub name: String,
    pub api_key: String,
    pub api_secret: String,
    pub testnet: bool,
    pub rate_limit_per_sec: u32,
}

impl ExchangeConfig {
    /// A view with secrets masked, safe to pass to `tracing`.
    pub fn redacted(&self) -> RedactedExchangeConfig {
        RedactedExchangeConfig {
            name: self.name.clone(),
            testnet: self.testnet,
            rate_limit_per_sec: self.rate_limit_per_sec,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactedExchangeConfig {
    pub name: String,
    pub testnet: bool,
    pub rate_limit_per_sec: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingLimits {
    pub max_position_size: Decimal,
    pub max_leverage: Decimal,
    pub risk_limit: Decimal,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub destination: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            destination: None,
        }
    }
}

/// Network call timeouts (§5): defaults mirror the spec's stated defaults.
#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    pub http_timeout_ms: u64,
    pub websocket_handshake_timeout_ms: u64,
    pub strategy_stop_deadline_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            http_timeout_ms: 10_000,
            websocket_handshake_timeout_ms: 5_000,
            strategy_stop_deadline_ms: 5_000,
        }
    }
}

/// Top-level configuration consumed (not owned) by the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    pub exchanges: Vec<ExchangeConfig>,
    pub trading_limits: TradingLimits,
    pub logging: LoggingConfig,
    pub timeouts: TimeoutConfig,
}

impl CoreConfig {
    pub fn redacted(&self) -> RedactedCoreConfig {
        RedactedCoreConfig {
            exchanges: self.exchanges.iter().map(ExchangeConfig::redacted).collect(),
            trading_limits: self.trading_limits.clone(),
            logging: self.logging.clone(),
            timeouts: self.timeouts,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactedCoreConfig {
    pub exchanges: Vec<RedactedExchangeConfig>,
    pub trading_limits: TradingLimits,
    pub logging: LoggingConfig,
    pub timeouts: TimeoutConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacted_view_never_carries_api_secret() {
        let config = ExchangeConfig {
            name: "hyperliquid".into(),
            api_key: "pk".into(),
            api_secret: "sk-super-secret".into(),
            testnet: true,
            rate_limit_per_sec: 10,
        };
        let redacted = config.redacted();
        let json = serde_json::to_string(&redacted).unwrap();
        assert!(!json.contains("sk-super-secret"));
    }
}
