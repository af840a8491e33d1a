use thiserror::Error;

/// Stable error-kind code so operators and tests can assert on the kind of
/// failure without parsing prose, per the propagation policy in the error
/// handling design.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    Transport,
    Protocol,
    Authentication,
    RateLimit,
    RiskRejected,
    InvalidArgument,
    Conflict,
    Precondition,
    Internal,
}

/// Every surfaced error carries a short human-readable reason (via `Display`)
/// and a stable [`ErrorKind`].
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("transport error reaching adapter: {0}")]
    Transport(String),

    #[error("malformed message from adapter: {0}")]
    Protocol(String),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimit { retry_after_ms: u64 },

    #[error("risk gate rejected order: {0}")]
    RiskRejected(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("duplicate client order id: {0}")]
    DuplicateClientOrderId(String),

    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("kill switch is active")]
    KillSwitchActive,

    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error("requested data older than staleness bound")]
    Stale,

    #[error("internal invariant violated: {0}")]
    Internal(String),

    #[error(transparent)]
    Decimal(#[from] zigquant_decimal::DecimalError),
}

impl CoreError {
    /// The stable kind code for this error, independent of its `Display`
    /// message.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Transport(_) => ErrorKind::Transport,
            CoreError::Protocol(_) => ErrorKind::Protocol,
            CoreError::Authentication(_) => ErrorKind::Authentication,
            CoreError::RateLimit { .. } => ErrorKind::RateLimit,
            CoreError::RiskRejected(_) => ErrorKind::RiskRejected,
            CoreError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            CoreError::DuplicateClientOrderId(_) | CoreError::Conflict(_) => ErrorKind::Conflict,
            CoreError::UnknownSymbol(_) => ErrorKind::InvalidArgument,
            CoreError::KillSwitchActive | CoreError::Precondition(_) | CoreError::Stale => {
                ErrorKind::Precondition
            }
            CoreError::Internal(_) => ErrorKind::Internal,
            CoreError::Decimal(_) => ErrorKind::Internal,
        }
    }

    /// `true` if a caller may retry this error after a delay.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Transport | ErrorKind::RateLimit
        )
    }
}
