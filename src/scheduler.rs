//! The poll cycle: select the most overdue feeds, fetch them concurrently
//! under a fixed cap, and hand discovered items downstream.

use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tokio::time::MissedTickBehavior;

use crate::config::ConfigError;
use crate::feed::Fetcher;
use crate::sink::ItemSink;
use crate::storage::{Feed, FeedStore};

/// Drives the repeating fetch cycle.
///
/// Each tick selects up to `concurrency` feeds most overdue for a refresh,
/// fetches them concurrently, and waits for the whole batch before the next
/// tick. Batches never overlap, so a feed can never sit in two outstanding
/// batches at once.
#[derive(Debug)]
pub struct PollScheduler {
    concurrency: usize,
    interval: Duration,
}

impl PollScheduler {
    /// Invalid settings are the only fatal error in this subsystem; every
    /// failure after construction is logged and survived.
    pub fn new(concurrency: usize, interval: Duration) -> Result<Self, ConfigError> {
        if concurrency == 0 {
            return Err(ConfigError::Invalid(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if interval.is_zero() {
            return Err(ConfigError::Invalid(
                "poll interval must be non-zero".to_string(),
            ));
        }
        Ok(Self {
            concurrency,
            interval,
        })
    }

    /// Run the poll cycle forever. Stops only when the future is dropped
    /// (process shutdown is the caller's concern).
    pub async fn run<S, F, K>(&self, store: &S, fetcher: &F, sink: &K)
    where
        S: FeedStore,
        F: Fetcher,
        K: ItemSink,
    {
        tracing::info!(
            concurrency = self.concurrency,
            interval_secs = self.interval.as_secs(),
            "poll scheduler started"
        );

        let mut ticker = tokio::time::interval(self.interval);
        // An overrunning batch starts the next cycle as soon as it finishes;
        // missed ticks are never queued up behind it.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.run_cycle(store, fetcher, sink).await;
        }
    }

    /// One tick's worth of work: select, fetch concurrently, join.
    ///
    /// Public so the binary's single-shot mode and tests can drive cycles
    /// without the timer.
    pub async fn run_cycle<S, F, K>(&self, store: &S, fetcher: &F, sink: &K)
    where
        S: FeedStore,
        F: Fetcher,
        K: ItemSink,
    {
        let batch = match store.select_most_overdue(self.concurrency).await {
            Ok(feeds) => feeds,
            Err(e) => {
                tracing::warn!(error = %e, "feed selection failed, skipping cycle");
                return;
            }
        };

        if batch.is_empty() {
            tracing::debug!("no feeds due, nothing to poll");
            return;
        }

        let total = batch.len();
        // buffer_unordered holds in-flight fetches at the ceiling even if
        // the store hands back more feeds than asked for.
        let delivered: usize = stream::iter(batch)
            .map(|feed| self.poll_feed(store, fetcher, sink, feed))
            .buffer_unordered(self.concurrency)
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .sum();

        tracing::debug!(feeds = total, items = delivered, "cycle complete");
    }

    /// Fetch one feed and deliver its items. Returns the number of items the
    /// sink accepted; every failure is contained to this feed.
    async fn poll_feed<S, F, K>(&self, store: &S, fetcher: &F, sink: &K, feed: Feed) -> usize
    where
        S: FeedStore,
        F: Fetcher,
        K: ItemSink,
    {
        // Mark before fetching: the feed leaves the overdue window even if
        // the fetch fails or outlives this tick, so no later batch can pick
        // it up while this attempt is in flight. A failed fetch waits for
        // its natural next-overdue turn.
        if let Err(e) = store.mark_fetched(feed.id, Utc::now().timestamp()).await {
            tracing::warn!(feed_id = feed.id, error = %e, "failed to mark feed fetched, skipping");
            return 0;
        }

        let document = match fetcher.fetch(&feed.url).await {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(feed_id = feed.id, url = %feed.url, error = %e, "feed fetch failed");
                return 0;
            }
        };

        let mut accepted = 0;
        for item in document.items {
            match sink.accept(feed.id, item).await {
                Ok(()) => accepted += 1,
                Err(e) => {
                    tracing::warn!(feed_id = feed.id, error = %e, "item rejected by sink");
                }
            }
        }

        tracing::debug!(feed_id = feed.id, url = %feed.url, items = accepted, "feed refreshed");
        accepted
    }
}
