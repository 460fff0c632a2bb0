//! Process-wide counters for the depth engine
//!
//! Registered lazily in the prometheus default registry. Exposition is the
//! embedding application's concern; [`encode`] renders the text format.

use std::sync::OnceLock;

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, TextEncoder};
use tracing::warn;

use crate::error::Result;
use crate::orderbook::Side;

struct Counters {
    snapshots_received: IntCounter,
    snapshots_coalesced: IntCounter,
    sides_rejected: IntCounterVec,
    frames_painted: IntCounterVec,
}

static COUNTERS: OnceLock<Option<Counters>> = OnceLock::new();

fn counters() -> Option<&'static Counters> {
    COUNTERS
        .get_or_init(|| match register() {
            Ok(counters) => Some(counters),
            Err(e) => {
                warn!(error = %e, "Failed to register orderbook metrics");
                None
            }
        })
        .as_ref()
}

fn register() -> Result<Counters> {
    let snapshots_received = IntCounter::new(
        "orderbook_snapshots_received_total",
        "Snapshots taken from the feed",
    )?;
    let snapshots_coalesced = IntCounter::new(
        "orderbook_snapshots_coalesced_total",
        "Snapshots superseded before they could be painted",
    )?;
    let sides_rejected = IntCounterVec::new(
        Opts::new(
            "orderbook_sides_rejected_total",
            "Snapshot sides discarded as malformed",
        ),
        &["side"],
    )?;
    let frames_painted = IntCounterVec::new(
        Opts::new("orderbook_frames_painted_total", "Canvas paints per side"),
        &["side"],
    )?;

    let registry = prometheus::default_registry();
    registry.register(Box::new(snapshots_received.clone()))?;
    registry.register(Box::new(snapshots_coalesced.clone()))?;
    registry.register(Box::new(sides_rejected.clone()))?;
    registry.register(Box::new(frames_painted.clone()))?;

    Ok(Counters {
        snapshots_received,
        snapshots_coalesced,
        sides_rejected,
        frames_painted,
    })
}

fn side_label(side: Side) -> &'static str {
    match side {
        Side::Bid => "bid",
        Side::Ask => "ask",
    }
}

pub fn snapshot_received() {
    if let Some(c) = counters() {
        c.snapshots_received.inc();
    }
}

pub fn snapshots_coalesced(count: u64) {
    if let Some(c) = counters() {
        c.snapshots_coalesced.inc_by(count);
    }
}

pub fn side_rejected(side: Side) {
    if let Some(c) = counters() {
        c.sides_rejected.with_label_values(&[side_label(side)]).inc();
    }
}

pub fn frame_painted(side: Side) {
    if let Some(c) = counters() {
        c.frames_painted.with_label_values(&[side_label(side)]).inc();
    }
}

/// Render all registered metrics in the prometheus text format
pub fn encode() -> Result<String> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&prometheus::gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| crate::error::OrderbookError::MetricsError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_show_up_in_exposition() {
        snapshot_received();
        side_rejected(Side::Ask);
        frame_painted(Side::Bid);

        let text = encode().unwrap();
        assert!(text.contains("orderbook_snapshots_received_total"));
        assert!(text.contains("orderbook_sides_rejected_total{side=\"ask\"}"));
        assert!(text.contains("orderbook_frames_painted_total{side=\"bid\"}"));
    }
}
