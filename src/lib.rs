//! Streaming aggregation of RSS feeds.
//!
//! Many feeds are fetched concurrently and their items are rendered and
//! emitted as soon as each `</item>` arrives, so the first results show up
//! long before the slowest server answers.

pub mod config;
pub mod feed;
pub mod stream;
pub mod util;
