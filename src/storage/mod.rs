mod feeds;
mod schema;
mod types;

pub use schema::Database;
pub use types::{Feed, FeedStore, StoreError};
