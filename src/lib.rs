//! Feed polling service core.
//!
//! A fixed-interval scheduler keeps every registered feed's freshness bounded
//! without unbounded concurrency: each cycle selects the feeds most overdue
//! for a refresh, fetches them concurrently under a fixed cap, records the
//! attempt, and hands discovered items downstream.
//!
//! The subsystem is three seams and a loop:
//!
//! - [`storage::FeedStore`] - where feeds and their fetch state live
//! - [`feed::Fetcher`] - source URL to parsed document
//! - [`sink::ItemSink`] - where discovered items go
//! - [`scheduler::PollScheduler`] - the cycle driving all three

pub mod config;
pub mod feed;
pub mod scheduler;
pub mod sink;
pub mod storage;

pub use config::{Config, ConfigError};
pub use feed::{FetchError, Fetcher, HttpFetcher, Item, ParseError, ParsedDocument};
pub use scheduler::PollScheduler;
pub use sink::{ItemSink, SinkError, TracingSink};
pub use storage::{Database, Feed, FeedStore, StoreError};
