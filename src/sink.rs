use async_trait::async_trait;
use thiserror::Error;

use crate::feed::Item;

/// Downstream item handoff failure.
///
/// Sinks decide what counts as an error; the scheduler logs these and moves
/// on to the feed's remaining items.
#[derive(Debug, Error)]
#[error("item sink error: {0}")]
pub struct SinkError(#[from] anyhow::Error);

/// Consumes the items the poller discovers.
///
/// Ownership of each item transfers on accept; within one feed, items arrive
/// in document order.
#[async_trait]
pub trait ItemSink: Send + Sync {
    async fn accept(&self, feed_id: i64, item: Item) -> Result<(), SinkError>;
}

/// Reports each discovered item through the structured log.
///
/// The default sink for the service binary: discovery stays observable while
/// item persistence remains a downstream concern.
pub struct TracingSink;

#[async_trait]
impl ItemSink for TracingSink {
    async fn accept(&self, feed_id: i64, item: Item) -> Result<(), SinkError> {
        tracing::info!(feed_id, title = %item.title, link = %item.link, "discovered item");
        Ok(())
    }
}
