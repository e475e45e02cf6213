//! Error types for rebalance core.

use thiserror::Error;

/// Errors raised while parsing a resource quantity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityError {
    #[error("empty quantity")]
    Empty,

    #[error("invalid quantity: {0}")]
    Invalid(String),

    #[error("unknown suffix {suffix:?} in quantity {quantity}")]
    UnknownSuffix { quantity: String, suffix: String },

    #[error("quantity out of range: {0}")]
    OutOfRange(String),
}
