use crate::util::{validate_url, HostPolicy};
use url::Url;

/// Feeds aggregated when the user supplies none.
pub const DEFAULT_FEED_URLS: &[&str] = &[
    "https://feeds.arstechnica.com/arstechnica/features",
    "https://feeds.arstechnica.com/arstechnica/gadgets",
    "https://feeds.arstechnica.com/arstechnica/gaming",
    "https://feeds.arstechnica.com/arstechnica/science",
    "https://feeds.arstechnica.com/arstechnica/technology-lab",
    "https://feeds.bbci.co.uk/news/business/rss.xml",
    "https://feeds.bbci.co.uk/news/health/rss.xml",
    "https://feeds.bbci.co.uk/news/world/rss.xml",
    "https://feeds.bloomberg.com/markets/news.rss",
    "https://feeds.npr.org/1001/rss.xml",
    "https://feeds.npr.org/1006/rss.xml",
    "https://feeds.npr.org/1007/rss.xml",
    "https://feeds.npr.org/1019/rss.xml",
    "https://feeds.npr.org/1026/rss.xml",
    "https://feeds.washingtonpost.com/rss/world",
    "https://globalnews.ca/world/feed/",
    "https://lwn.net/headlines/rss",
    "https://news.ycombinator.com/rss",
    "https://phys.org/rss-feed/",
    "https://rss.nytimes.com/services/xml/rss/nyt/World.xml",
    "https://rss.slashdot.org/Slashdot/slashdotMain",
    "https://www.aljazeera.com/xml/rss/all.xml",
    "https://www.economist.com/latest/rss.xml",
    "https://www.nasa.gov/rss/dyn/breaking_news.rss",
    "https://www.nature.com/nature.rss",
    "https://www.newscientist.com/feed/home",
    "https://www.theguardian.com/world/rss",
];

/// The built-in feed list, parsed.
pub fn default_feed_urls() -> Vec<Url> {
    DEFAULT_FEED_URLS
        .iter()
        .filter_map(|raw| Url::parse(raw).ok())
        .collect()
}

/// Parses newline-delimited feed URLs.
///
/// Blank lines are skipped and invalid entries are logged and dropped. When
/// nothing usable remains, [`default_feed_urls`] is returned instead.
pub fn parse_feed_urls(text: &str, policy: HostPolicy) -> Vec<Url> {
    let urls = valid_urls(text.lines(), policy);
    if urls.is_empty() {
        tracing::info!("No usable feed URLs given, using the default list");
        return default_feed_urls();
    }
    urls
}

/// Validates each entry, dropping (and logging) the ones that fail.
pub fn valid_urls<'a, I>(entries: I, policy: HostPolicy) -> Vec<Url>
where
    I: IntoIterator<Item = &'a str>,
{
    entries
        .into_iter()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match validate_url(line, policy) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(url = line, error = %e, "Ignoring invalid feed URL");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_list_is_valid() {
        assert_eq!(default_feed_urls().len(), DEFAULT_FEED_URLS.len());
        for raw in DEFAULT_FEED_URLS {
            assert!(validate_url(raw, HostPolicy::PublicOnly).is_ok(), "{raw}");
        }
    }

    #[test]
    fn test_newline_delimited_input() {
        let urls = parse_feed_urls(
            "https://a.example.com/rss\n\n  https://b.example.com/feed  \r\n",
            HostPolicy::PublicOnly,
        );
        let urls: Vec<_> = urls.iter().map(Url::as_str).collect();
        assert_eq!(urls, vec!["https://a.example.com/rss", "https://b.example.com/feed"]);
    }

    #[test]
    fn test_invalid_entries_are_dropped() {
        let urls = parse_feed_urls(
            "not a url\nftp://files.example.com/x\nhttps://ok.example.com/rss",
            HostPolicy::PublicOnly,
        );
        assert_eq!(urls.len(), 1);
        assert_eq!(urls[0].host_str(), Some("ok.example.com"));
    }

    #[test]
    fn test_private_hosts_follow_policy() {
        let text = "http://127.0.0.1:8080/rss";
        assert_eq!(
            parse_feed_urls(text, HostPolicy::PublicOnly).len(),
            DEFAULT_FEED_URLS.len()
        );
        assert_eq!(parse_feed_urls(text, HostPolicy::AllowPrivate).len(), 1);
    }

    #[test]
    fn test_empty_input_falls_back_to_defaults() {
        assert_eq!(
            parse_feed_urls("   \n", HostPolicy::PublicOnly),
            default_feed_urls()
        );
    }
}
