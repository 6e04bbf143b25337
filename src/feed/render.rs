use crate::feed::item::FeedItem;
use crate::feed::source::SourceError;
use crate::util::{is_http_link, strip_control_chars};
use chrono::DateTime;
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fmt;
use thiserror::Error;

/// Errors from rendering a single item. The item is skipped; its source
/// keeps going.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A link that is not http(s) would end up in an `href`.
    #[error("refusing to render non-http link: {0}")]
    UnsafeLink(String),
}

/// Turns accepted items into output tokens.
///
/// The aggregation core never looks inside a token; it only guarantees that
/// the tokens of one `render` call are emitted back to back.
pub trait Renderer: Send + Sync {
    type Token: Send + 'static;

    /// Renders one item. An empty `Vec` means "nothing to show".
    fn render(&self, item: &FeedItem) -> Result<Vec<Self::Token>, RenderError>;

    /// Renders a placeholder for a source that failed.
    fn render_source_error(&self, error: &SourceError) -> Self::Token;
}

/// One fragment of HTML: a start tag, an end tag or an escaped text run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlToken(String);

impl HtmlToken {
    pub(crate) fn raw(markup: impl Into<String>) -> Self {
        Self(markup.into())
    }

    fn text(text: &str) -> Self {
        Self(encode_text(&strip_control_chars(text)).into_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for HtmlToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Renders each item as a collapsible `<li>` entry:
///
/// ```html
/// <li><details>
///   <summary><a href="LINK">TITLE</a></summary>
///   <dl>
///     <dt>Feed</dt><dd><a href="FEED">FEED</a></dd>
///     <dt>Comments</dt><dd><a href="COMMENTS">COMMENTS</a></dd>
///     <dt>Published</dt><dd><time datetime="ISO">PUBDATE</time></dd>
///   </dl>
/// </details></li>
/// ```
///
/// Comments and Published are only present when the item has them, and
/// Comments only for an absolute http(s) URL. The
/// summary falls back to the link text when there is no title, or to the bare
/// title when there is no link. An item with neither renders nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlRenderer;

impl HtmlRenderer {
    pub fn new() -> Self {
        Self
    }
}

struct Builder(Vec<HtmlToken>);

impl Builder {
    fn open(&mut self, tag: &str) -> &mut Self {
        self.0.push(HtmlToken::raw(format!("<{tag}>")));
        self
    }

    fn open_with(&mut self, tag: &str, attr: &str, value: &str) -> &mut Self {
        let value = encode_double_quoted_attribute(&strip_control_chars(value)).into_owned();
        self.0.push(HtmlToken::raw(format!("<{tag} {attr}=\"{value}\">")));
        self
    }

    fn close(&mut self, tag: &str) -> &mut Self {
        self.0.push(HtmlToken::raw(format!("</{tag}>")));
        self
    }

    fn text(&mut self, text: &str) -> &mut Self {
        self.0.push(HtmlToken::text(text));
        self
    }

    fn link(&mut self, href: &str, text: &str) -> &mut Self {
        self.open_with("a", "href", href.trim()).text(text).close("a")
    }
}

fn checked_link(link: Option<&str>) -> Result<Option<&str>, RenderError> {
    match link {
        Some(link) if !is_http_link(link) => Err(RenderError::UnsafeLink(link.to_owned())),
        other => Ok(other),
    }
}

/// Comments URLs are often relative (`/item?id=1`); those lose their row
/// rather than the whole item.
fn comments_link(comments: Option<&str>) -> Option<&str> {
    match comments {
        Some(comments) if !is_http_link(comments) => {
            tracing::debug!(comments, "Omitting non-http comments link");
            None
        }
        other => other,
    }
}

impl Renderer for HtmlRenderer {
    type Token = HtmlToken;

    fn render(&self, item: &FeedItem) -> Result<Vec<HtmlToken>, RenderError> {
        let link = checked_link(item.link.as_deref())?;
        let comments = comments_link(item.comments.as_deref());
        let title = item.title.as_deref().map(str::trim);

        let mut html = Builder(Vec::with_capacity(32));
        match (link, title) {
            (Some(link), title) => {
                html.open("li").open("details").open("summary");
                html.link(link, title.unwrap_or(link)).close("summary");
            }
            (None, Some(title)) => {
                html.open("li").open("details").open("summary");
                html.text(title).close("summary");
            }
            (None, None) => return Ok(Vec::new()),
        }

        html.open("dl").open("dt").text("Feed").close("dt");
        html.open("dd").link(item.feed_url.as_str(), item.feed_url.as_str()).close("dd");

        if let Some(comments) = comments {
            html.open("dt").text("Comments").close("dt");
            html.open("dd").link(comments, comments).close("dd");
        }

        if let Some(published) = item.pub_date.as_deref() {
            html.open("dt").text("Published").close("dt").open("dd");
            match DateTime::parse_from_rfc2822(published.trim()) {
                Ok(parsed) => html.open_with("time", "datetime", &parsed.to_rfc3339()),
                Err(_) => html.open("time"),
            };
            html.text(published).close("time").close("dd");
        }

        html.close("dl").close("details").close("li");
        Ok(html.0)
    }

    fn render_source_error(&self, error: &SourceError) -> HtmlToken {
        HtmlToken::raw(format!(
            "<li class=\"feed-error\">{}</li>",
            encode_text(&error.to_string())
        ))
    }
}
