use async_trait::async_trait;

use super::schema::Database;
use super::types::{Feed, FeedStore, StoreError};

type FeedRow = (i64, String, String, Option<i64>);

fn into_feed((id, title, url, last_fetched): FeedRow) -> Feed {
    Feed {
        id,
        title,
        url,
        last_fetched,
    }
}

impl Database {
    /// Register a feed, updating the title if the url is already known.
    /// Returns the feed's id either way.
    pub async fn add_feed(&self, url: &str, title: &str) -> Result<i64, StoreError> {
        let row: (i64,) = sqlx::query_as(
            "INSERT INTO feeds (title, url) VALUES (?, ?)
             ON CONFLICT(url) DO UPDATE SET title = excluded.title
             RETURNING id",
        )
        .bind(title)
        .bind(url)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    /// All registered feeds, for the CLI listing.
    pub async fn all_feeds(&self) -> Result<Vec<Feed>, StoreError> {
        let rows: Vec<FeedRow> =
            sqlx::query_as("SELECT id, title, url, last_fetched FROM feeds ORDER BY title")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(into_feed).collect())
    }
}

#[async_trait]
impl FeedStore for Database {
    async fn select_most_overdue(&self, limit: usize) -> Result<Vec<Feed>, StoreError> {
        let rows: Vec<FeedRow> = sqlx::query_as(
            "SELECT id, title, url, last_fetched FROM feeds
             ORDER BY last_fetched ASC NULLS FIRST
             LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(into_feed).collect())
    }

    async fn mark_fetched(&self, feed_id: i64, timestamp: i64) -> Result<(), StoreError> {
        // Zero rows updated (feed deleted mid-cycle) is not an error; the
        // fetch state of a gone feed is nobody's concern.
        sqlx::query("UPDATE feeds SET last_fetched = ? WHERE id = ?")
            .bind(timestamp)
            .bind(feed_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
