//! Error types for the arbitrage monitor.

use rust_decimal::Decimal;
use thiserror::Error;

/// Top-level error.
#[derive(Error, Debug)]
pub enum TriarbError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Indicator error: {0}")]
    Indicator(#[from] IndicatorError),

    #[error("Trade error: {0}")]
    Trade(#[from] TradeError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Market data errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("No data available for {0}")]
    NoDataAvailable(String),

    #[error("Invalid data for {symbol}: {reason}")]
    InvalidData { symbol: String, reason: String },

    #[error("Request for {0} timed out after {1} ms")]
    Timeout(String, u64),

    #[error("Rate limited: retry after {retry_after_ms} ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Indicator calculation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndicatorError {
    #[error("Insufficient data: need {required} points, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Simulated trade errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TradeError {
    #[error("Insufficient {asset}: required {required}, available {available}")]
    InsufficientBalance {
        asset: String,
        required: Decimal,
        available: Decimal,
    },

    #[error("Negative amount {amount} for {asset}")]
    NegativeAmount { asset: String, amount: Decimal },

    #[error("Price unavailable for {0}")]
    PriceUnavailable(String),

    #[error("Unrepresentable price {price} for {pair}")]
    InvalidPrice { pair: String, price: f64 },

    #[error("Arithmetic overflow on {0}")]
    Overflow(String),

    #[error("Trade interrupted by shutdown")]
    Interrupted,
}

/// Subscriber delivery errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("Subscriber connection closed")]
    Closed,

    #[error("Subscriber buffer full")]
    Full,

    #[error("Delivery failed: {0}")]
    Other(String),
}
