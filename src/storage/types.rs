use async_trait::async_trait;
use thiserror::Error;

/// Feed store failures: overdue selection or fetch-state updates.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Escape hatch for store implementations not backed by sqlx.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A registered feed as the polling core sees it.
///
/// The store owns these records; the core only reads them and triggers
/// `last_fetched` updates. Ids are unique and stable across cycles.
#[derive(Debug, Clone)]
pub struct Feed {
    pub id: i64,
    pub title: String,
    pub url: String,
    /// Unix seconds of the last fetch attempt; `None` for never fetched.
    pub last_fetched: Option<i64>,
}

/// The selection and fetch-state surface the scheduler drives.
#[async_trait]
pub trait FeedStore: Send + Sync {
    /// Up to `limit` feeds, most overdue first; never-fetched feeds are more
    /// overdue than everything else. With no intervening `mark_fetched`,
    /// repeated calls return the same ordering.
    async fn select_most_overdue(&self, limit: usize) -> Result<Vec<Feed>, StoreError>;

    /// Record a fetch attempt. Single-field, single-feed update; only the
    /// task that owns the feed in the current batch writes it.
    async fn mark_fetched(&self, feed_id: i64, timestamp: i64) -> Result<(), StoreError>;
}
