//! Property tests: parsed items must not depend on how the body is split
//! into chunks on the wire.

use feedme::feed::{decode_utf8, parse_items, FeedItem};
use futures::executor::block_on;
use futures::stream::{self, StreamExt};
use proptest::prelude::*;
use std::io;
use url::Url;

const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Ünïcödé channel</title>
    <link>https://example.com/</link>
    <item>
      <title>Café &amp; crème · 日本語</title>
      <link>https://example.com/a</link>
      <comments>https://example.com/a#comments</comments>
      <pubDate>Mon, 06 Jan 2025 12:00:00 +0000</pubDate>
    </item>
    <item>
      <title><![CDATA[Emoji 🦀 <inside> CDATA]]></title>
      <link>https://example.com/b</link>
    </item>
    <item><title>Third</title><link>https://example.com/c</link><guid>c</guid></item>
  </channel>
</rss>"#;

fn feed_url() -> Url {
    Url::parse("https://example.com/rss").unwrap()
}

fn split_at_points(bytes: &[u8], mut points: Vec<usize>) -> Vec<Vec<u8>> {
    points.push(0);
    points.push(bytes.len());
    points.sort_unstable();
    points.dedup();
    points.windows(2).map(|w| bytes[w[0]..w[1]].to_vec()).collect()
}

fn parse(chunks: Vec<Vec<u8>>) -> Vec<FeedItem> {
    let body = stream::iter(chunks.into_iter().map(Ok::<_, io::Error>));
    block_on(parse_items(feed_url(), decode_utf8(body)).collect::<Vec<_>>())
        .into_iter()
        .map(|item| item.expect("well-formed feed"))
        .collect()
}

#[test]
fn test_whole_body_parses_three_items() {
    let items = parse(vec![FEED.as_bytes().to_vec()]);
    assert_eq!(items.len(), 3);
    assert_eq!(items[0].title.as_deref(), Some("Café & crème · 日本語"));
    assert_eq!(items[1].title.as_deref(), Some("Emoji 🦀 <inside> CDATA"));
    assert_eq!(items[2].link.as_deref(), Some("https://example.com/c"));
}

#[test]
fn test_one_byte_chunks() {
    let chunks = FEED.as_bytes().iter().map(|b| vec![*b]).collect();
    assert_eq!(parse(chunks), parse(vec![FEED.as_bytes().to_vec()]));
}

proptest! {
    #[test]
    fn test_chunk_boundaries_do_not_change_items(
        points in prop::collection::vec(0..FEED.len(), 0..40)
    ) {
        let expected = parse(vec![FEED.as_bytes().to_vec()]);
        let actual = parse(split_at_points(FEED.as_bytes(), points));
        prop_assert_eq!(actual, expected);
    }
}
