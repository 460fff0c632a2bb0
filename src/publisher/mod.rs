//! Publisher module for snapshot fan-out
//!
//! The feed side publishes immutable snapshots; views subscribe and pull the
//! newest one when they are ready to paint. The channel keeps only the latest
//! value, so a burst between two frames collapses into a single update.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, trace};

use crate::error::{OrderbookError, Result};
use crate::orderbook::OrderbookSnapshot;
use crate::telemetry;

type Slot = Option<Arc<OrderbookSnapshot>>;

/// Publishing half of the snapshot feed
#[derive(Debug)]
pub struct SnapshotFeed {
    tx: watch::Sender<Slot>,
    published: Arc<AtomicU64>,
}

impl Default for SnapshotFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotFeed {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            tx,
            published: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Replace the current snapshot
    pub fn publish(&self, snapshot: OrderbookSnapshot) {
        let sequence = snapshot.sequence;
        self.tx.send_replace(Some(Arc::new(snapshot)));
        self.published.fetch_add(1, Ordering::Relaxed);
        trace!(sequence, "Published order book snapshot");
    }

    pub fn subscribe(&self) -> Subscription {
        let rx = self.tx.subscribe();
        debug!(subscribers = self.tx.receiver_count(), "New snapshot subscription");
        Subscription {
            rx,
            published: self.published.clone(),
            taken_at: self.published.load(Ordering::Relaxed),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Receiving half; dropping it releases the subscription
#[derive(Debug)]
pub struct Subscription {
    rx: watch::Receiver<Slot>,
    published: Arc<AtomicU64>,
    /// Publish count when the last snapshot was taken
    taken_at: u64,
}

impl Subscription {
    /// Newest snapshot if one arrived since the last call
    ///
    /// Anything published in between is skipped and counted as coalesced.
    pub fn latest(&mut self) -> Option<Arc<OrderbookSnapshot>> {
        if !self.rx.has_changed().unwrap_or(false) {
            return None;
        }

        let snapshot = self.rx.borrow_and_update().clone();
        let published = self.published.load(Ordering::Relaxed);
        let skipped = published.saturating_sub(self.taken_at).saturating_sub(1);
        self.taken_at = published;

        if skipped > 0 {
            trace!(skipped, "Coalesced snapshots");
            telemetry::snapshots_coalesced(skipped);
        }
        if snapshot.is_some() {
            telemetry::snapshot_received();
        }
        snapshot
    }

    /// Wait until a new snapshot is published
    pub async fn changed(&mut self) -> Result<()> {
        self.rx
            .changed()
            .await
            .map_err(|_| OrderbookError::FeedClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(sequence: u64) -> OrderbookSnapshot {
        OrderbookSnapshot {
            sequence,
            ..Default::default()
        }
    }

    #[test]
    fn test_latest_wins() {
        let feed = SnapshotFeed::new();
        let mut sub = feed.subscribe();
        assert!(sub.latest().is_none());

        feed.publish(snapshot(1));
        feed.publish(snapshot(2));
        feed.publish(snapshot(3));

        assert_eq!(sub.latest().map(|s| s.sequence), Some(3));
        assert!(sub.latest().is_none());
    }

    #[test]
    fn test_dropping_subscription_releases_it() {
        let feed = SnapshotFeed::new();
        let sub = feed.subscribe();
        assert_eq!(feed.subscriber_count(), 1);
        drop(sub);
        assert_eq!(feed.subscriber_count(), 0);

        // publishing with nobody listening is fine
        feed.publish(snapshot(1));
    }

    #[test]
    fn test_changed_pending_until_publish() {
        let feed = SnapshotFeed::new();
        let mut sub = feed.subscribe();

        {
            let mut changed = tokio_test::task::spawn(sub.changed());
            tokio_test::assert_pending!(changed.poll());
            feed.publish(snapshot(1));
            assert!(changed.is_woken());
            tokio_test::assert_ready_ok!(changed.poll());
        }
        assert_eq!(sub.latest().map(|s| s.sequence), Some(1));
    }

    #[tokio::test]
    async fn test_changed_wakes_on_publish() {
        let feed = SnapshotFeed::new();
        let mut sub = feed.subscribe();

        feed.publish(snapshot(7));
        sub.changed().await.unwrap();
        assert_eq!(sub.latest().map(|s| s.sequence), Some(7));
    }

    #[tokio::test]
    async fn test_changed_errors_once_feed_is_gone() {
        let feed = SnapshotFeed::new();
        let mut sub = feed.subscribe();
        drop(feed);
        assert!(matches!(sub.changed().await, Err(OrderbookError::FeedClosed)));
    }
}
