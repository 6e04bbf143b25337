//! Streaming RSS aggregation.
//!
//! Every source runs the same pipeline, and the sources are merged in
//! arrival order:
//!
//! - [`fetcher`] - one HTTP GET per feed, body exposed as a byte stream
//! - [`decode`] - incremental UTF-8 decoding across chunk boundaries
//! - [`parser`] - pull-based XML tokenizing into [`FeedItem`] records
//! - [`filter`] - the shared accept/reject decision ([`SeenLinks`] dedup)
//! - [`render`] - item to output tokens ([`HtmlRenderer`])
//! - [`aggregate`] - per-source wiring and the [`Aggregator`] entry point
//!
//! # Example
//!
//! ```no_run
//! use feedme::feed::{default_feed_urls, AggregateOptions, Aggregator, HtmlRenderer};
//! use futures::StreamExt;
//! use std::sync::Arc;
//!
//! # async fn run() {
//! let aggregator = Aggregator::new(
//!     reqwest::Client::new(),
//!     Arc::new(HtmlRenderer::new()),
//!     AggregateOptions::default(),
//! );
//! let mut html = Box::pin(aggregator.aggregate_deduplicated(default_feed_urls()));
//! while let Some(token) = html.next().await {
//!     print!("{token}");
//! }
//! # }
//! ```

pub mod aggregate;
pub mod decode;
pub mod fetcher;
pub mod filter;
pub mod item;
pub mod parser;
pub mod render;
pub mod source;
mod transducer;
mod urls;

pub use aggregate::{AggregateOptions, Aggregator};
pub use decode::{decode_utf8, Utf8Decoder};
pub use fetcher::{fetch_body, FetchError, FetchOptions};
pub use filter::{ItemFilter, SeenLinks};
pub use item::FeedItem;
pub use parser::{parse_items, ParseError};
pub use render::{HtmlRenderer, HtmlToken, RenderError, Renderer};
pub use source::{SourceError, SourceErrorPolicy};
pub use transducer::render_items;
pub use urls::{default_feed_urls, parse_feed_urls, valid_urls, DEFAULT_FEED_URLS};
