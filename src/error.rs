//! Error types for the order book depth engine

use thiserror::Error;

use crate::orderbook::Side;

/// Order book depth engine errors
///
/// None of these are fatal to a running view: feed faults degrade to the
/// last known good state, configuration faults surface before the view exists.
#[derive(Error, Debug)]
pub enum OrderbookError {
    #[error("Malformed {side:?} side at level {index}: {reason}")]
    MalformedSide {
        side: Side,
        index: usize,
        reason: String,
    },

    #[error("Invalid price level value: {0}")]
    InvalidLevel(String),

    #[error("Invalid tick size: {0}")]
    InvalidTickSize(String),

    #[error("Failed to parse snapshot: {0}")]
    ParseError(String),

    #[error("Snapshot feed closed")]
    FeedClosed,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Metrics error: {0}")]
    MetricsError(String),
}

impl OrderbookError {
    pub(crate) fn malformed(side: Side, index: usize, reason: impl Into<String>) -> Self {
        OrderbookError::MalformedSide {
            side,
            index,
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for OrderbookError {
    fn from(err: serde_json::Error) -> Self {
        OrderbookError::ParseError(err.to_string())
    }
}

impl From<config::ConfigError> for OrderbookError {
    fn from(err: config::ConfigError) -> Self {
        OrderbookError::ConfigError(err.to_string())
    }
}

impl From<prometheus::Error> for OrderbookError {
    fn from(err: prometheus::Error) -> Self {
        OrderbookError::MetricsError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, OrderbookError>;
