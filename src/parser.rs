//! Parser module for snapshot messages
//!
//! Handles deserialization of newline-delimited JSON snapshots:
//! `{"sequence":1,"bids":[["100.12","5"]],"asks":[["100.13","2","41"]]}`.
//! Each level is `[price, size]` or `[price, size, offset]`, with numbers
//! given as strings or plain JSON numbers.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use std::str::FromStr;

use crate::error::Result;
use crate::orderbook::{OrderbookSnapshot, PriceLevel, Side};

/// Snapshot message as it appears on the wire
#[derive(Debug, Clone, Deserialize)]
struct SnapshotMessage {
    /// Feed sequence number
    #[serde(default)]
    sequence: u64,

    /// Bids, best first
    #[serde(default, deserialize_with = "deserialize_bids")]
    bids: Vec<PriceLevel>,

    /// Asks, best first
    #[serde(default, deserialize_with = "deserialize_asks")]
    asks: Vec<PriceLevel>,
}

/// A number that may arrive quoted
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Text(String),
    Integer(u64),
    Float(f64),
}

impl RawNumber {
    fn to_decimal(&self) -> std::result::Result<Decimal, String> {
        match self {
            RawNumber::Text(s) => Decimal::from_str(s.trim()).map_err(|e| format!("{s:?}: {e}")),
            RawNumber::Integer(n) => Ok(Decimal::from(*n)),
            RawNumber::Float(f) => Decimal::try_from(*f).map_err(|e| format!("{f}: {e}")),
        }
    }

    fn to_offset(&self) -> std::result::Result<u64, String> {
        match self {
            RawNumber::Text(s) => s.trim().parse().map_err(|e| format!("offset {s:?}: {e}")),
            RawNumber::Integer(n) => Ok(*n),
            RawNumber::Float(f) => Err(format!("offset {f} is not an integer")),
        }
    }
}

/// Parse one snapshot line
///
/// Only the shape is checked here; ordering and sign rules are left to the
/// aggregator so one bad side does not discard the other.
pub fn parse_snapshot(raw: &str) -> Result<OrderbookSnapshot> {
    let message: SnapshotMessage = serde_json::from_str(raw)?;
    Ok(OrderbookSnapshot {
        sequence: message.sequence,
        bids: message.bids,
        asks: message.asks,
    })
}

fn deserialize_bids<'de, D>(deserializer: D) -> std::result::Result<Vec<PriceLevel>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_price_levels(deserializer, Side::Bid)
}

fn deserialize_asks<'de, D>(deserializer: D) -> std::result::Result<Vec<PriceLevel>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_price_levels(deserializer, Side::Ask)
}

/// Custom deserializer for price levels from arrays of string pairs or triples
fn deserialize_price_levels<'de, D>(
    deserializer: D,
    side: Side,
) -> std::result::Result<Vec<PriceLevel>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<Vec<RawNumber>> = Deserialize::deserialize(deserializer)?;
    raw.into_iter()
        .map(|entry| {
            let (price, size, offset) = match entry.as_slice() {
                [price, size] => (price, size, None),
                [price, size, offset] => (price, size, Some(offset)),
                _ => return Err(serde::de::Error::custom("Invalid price level format")),
            };
            let level = PriceLevel::new(
                side,
                price.to_decimal().map_err(serde::de::Error::custom)?,
                size.to_decimal().map_err(serde::de::Error::custom)?,
            );
            match offset {
                Some(offset) => Ok(level.with_offset(offset.to_offset().map_err(serde::de::Error::custom)?)),
                None => Ok(level),
            }
        })
        .collect()
}
