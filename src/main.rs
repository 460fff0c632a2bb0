//! Order book depth replay
//!
//! Replays snapshots from a newline-delimited JSON file, or from a synthetic
//! random-walk book, through the depth view and prints both canvases as text.

use std::time::Duration;

use anyhow::Context;
use rand::Rng;
use rust_decimal::Decimal;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use orderbook_depth::{
    parse_snapshot, telemetry, AsciiCanvas, Config, OrderbookSnapshot, OrderbookView, PriceLevel,
    Side, SnapshotFeed,
};

/// CSS pixels per character cell
const CELL_WIDTH: f64 = 6.0;
const SYNTHETIC_SNAPSHOTS: u64 = 300;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().json().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    info!("Starting order book depth replay");

    let config = Config::load()?;
    let source = std::env::args().nth(1);

    let feed = SnapshotFeed::new();
    let mut view = OrderbookView::new(
        &config,
        AsciiCanvas::new(CELL_WIDTH, config.row_height),
        AsciiCanvas::new(CELL_WIDTH, config.row_height),
    )?;
    view.attach(feed.subscribe());
    if let Some(offset) = view.take_scroll_command() {
        info!(offset, "Centered spread row");
    }

    let frame_interval = Duration::from_millis(config.frame_interval_ms);
    let mut ticker = tokio::time::interval(frame_interval);

    let producer = produce(&feed, source.as_deref(), &config, frame_interval);
    tokio::pin!(producer);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut finished = false;
    loop {
        tokio::select! {
            result = &mut producer, if !finished => {
                result?;
                finished = true;
            }
            _ = ticker.tick() => {
                if view.on_animation_frame() {
                    print_frame(&view);
                }
                if finished && view.highlight_until().is_none() {
                    break;
                }
            }
            _ = &mut ctrl_c => {
                info!("Interrupted, shutting down");
                break;
            }
        }
    }

    info!(
        market = view.market_id(),
        has_orderbook = view.has_orderbook(),
        "Replay finished"
    );
    println!("{}", telemetry::encode()?);

    Ok(())
}

async fn produce(
    feed: &SnapshotFeed,
    source: Option<&str>,
    config: &Config,
    pace: Duration,
) -> anyhow::Result<()> {
    match source {
        Some(path) => replay_file(feed, path, pace).await,
        None => synthesize(feed, config, pace).await,
    }
}

/// Publish every snapshot line of `path`, skipping lines that fail to parse
async fn replay_file(feed: &SnapshotFeed, path: &str, pace: Duration) -> anyhow::Result<()> {
    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("opening snapshot file {path}"))?;
    let mut lines = BufReader::new(file).lines();
    let mut line_no = 0usize;

    info!(path, "Replaying snapshots");
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }
        match parse_snapshot(&line) {
            Ok(snapshot) => feed.publish(snapshot),
            Err(e) => warn!(line = line_no, error = %e, "Skipping unparseable snapshot"),
        }
        tokio::time::sleep(pace).await;
    }

    Ok(())
}

/// Random-walk book around a drifting mid price
async fn synthesize(feed: &SnapshotFeed, config: &Config, pace: Duration) -> anyhow::Result<()> {
    let tick = config.tick_size;
    let depth = config.max_rows_per_side * 3;
    let mut mid_ticks: i64 = 1_000_000;

    info!(snapshots = SYNTHETIC_SNAPSHOTS, depth, "Generating synthetic book");
    for sequence in 1..=SYNTHETIC_SNAPSHOTS {
        let snapshot = {
            let mut rng = rand::thread_rng();
            mid_ticks += rng.gen_range(-3..=3);
            let mut level = |side: Side, distance: i64| {
                let price = Decimal::from(mid_ticks + distance) * tick;
                let size = Decimal::new(rng.gen_range(1..50_000), 4);
                PriceLevel::new(side, price, size).with_offset(sequence)
            };

            OrderbookSnapshot {
                sequence,
                bids: (1..=depth as i64).map(|i| level(Side::Bid, -i)).collect(),
                asks: (1..=depth as i64).map(|i| level(Side::Ask, i)).collect(),
            }
        };
        feed.publish(snapshot);
        tokio::time::sleep(pace).await;
    }

    Ok(())
}

fn print_frame(view: &OrderbookView<AsciiCanvas>) {
    let metrics = view.spread_metrics();
    let mid = view
        .display_mid_price()
        .map(|mid| mid.to_string())
        .unwrap_or_else(|| "-".to_string());
    let spread = metrics
        .spread
        .map(|spread| spread.to_string())
        .unwrap_or_else(|| "-".to_string());

    println!("{}", view.canvas(Side::Ask).render());
    println!(
        "---- {} mid {} spread {} (tick {}) ----",
        view.market_id(),
        mid,
        spread,
        view.grouping().tick_size
    );
    println!("{}\n", view.canvas(Side::Bid).render());
}
