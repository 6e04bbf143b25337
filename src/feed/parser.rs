use crate::feed::item::{FeedItem, Field, Tag};
use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::borrow::Cow;
use std::io;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::io::StreamReader;
use url::Url;

/// Errors that end one source's item stream.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The markup is not well-formed (mismatched end tag, bad entity, ...).
    #[error("malformed XML at byte {position}: {source}")]
    Xml {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },
    /// Reading the body failed part-way through.
    #[error("failed to read feed body: {0}")]
    Io(#[source] Arc<io::Error>),
}

impl ParseError {
    fn from_xml(error: quick_xml::Error, position: u64) -> Self {
        match error {
            quick_xml::Error::Io(e) => ParseError::Io(e),
            source => ParseError::Xml { position, source },
        }
    }
}

/// Structural events the item state machine reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlEvent<'a> {
    Open(Tag),
    Close(Tag),
    /// Text or CDATA content, already unescaped.
    Text(Cow<'a, str>),
}

/// Where the parser currently is relative to the item being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Irrelevant,
    InItem,
    InField(Field),
}

/// The tag-tracking state machine that turns structural events into items.
///
/// It knows nothing about the tokenizer: feed it [`XmlEvent`]s in document
/// order and it hands back each item as its `</item>` is seen.
#[derive(Debug)]
pub struct ItemAccumulator {
    feed_url: Url,
    location: Location,
    current: FeedItem,
}

impl ItemAccumulator {
    pub fn new(feed_url: Url) -> Self {
        let current = FeedItem::empty(feed_url.clone());
        Self {
            feed_url,
            location: Location::Irrelevant,
            current,
        }
    }

    pub fn location(&self) -> Location {
        self.location
    }

    /// Applies one event, returning the finished item when it closes one.
    pub fn step(&mut self, event: XmlEvent<'_>) -> Option<FeedItem> {
        match (event, self.location) {
            (XmlEvent::Open(Tag::ItemContainer), _) => {
                self.current = FeedItem::empty(self.feed_url.clone());
                self.location = Location::InItem;
                None
            }
            (XmlEvent::Open(Tag::Field(field)), Location::InItem) => {
                self.location = Location::InField(field);
                None
            }
            (XmlEvent::Text(text), Location::InField(field)) => {
                // A repeated field keeps its last value
                *self.current.field_mut(field) = Some(text.into_owned());
                None
            }
            (XmlEvent::Close(Tag::ItemContainer), Location::InItem | Location::InField(_)) => {
                self.location = Location::Irrelevant;
                let fresh = FeedItem::empty(self.feed_url.clone());
                Some(std::mem::replace(&mut self.current, fresh))
            }
            // Any field close ends field capture, even one nested in another
            (XmlEvent::Close(Tag::Field(_)), Location::InField(_)) => {
                self.location = Location::InItem;
                None
            }
            _ => None,
        }
    }
}

/// Parses a feed incrementally, yielding each `<item>` as soon as it closes.
///
/// `chunks` is the decoded body of one source, split at arbitrary points;
/// the output does not depend on where the splits fall. Only items that are
/// closed are emitted: a document that ends inside an `<item>` simply stops.
///
/// The stream ends after the first error. Errors from `chunks` surface as
/// [`ParseError::Io`], malformed markup as [`ParseError::Xml`].
pub fn parse_items<S, E>(feed_url: Url, chunks: S) -> impl Stream<Item = Result<FeedItem, ParseError>>
where
    S: Stream<Item = Result<String, E>>,
    E: Into<io::Error>,
{
    let bytes = Box::pin(chunks.map(|chunk| chunk.map(Bytes::from)));
    let mut reader = Reader::from_reader(StreamReader::new(bytes));
    // quick-xml never expands <!ENTITY> declarations, so a DOCTYPE
    // in a hostile feed cannot pull in external content.
    reader.config_mut().trim_text(true);

    let items = ItemAccumulator::new(feed_url);

    stream::unfold(Some((reader, Vec::new(), items)), |state| async move {
        let (mut reader, mut buf, mut items) = state?;
        loop {
            buf.clear();
            let event = match reader.read_event_into_async(&mut buf).await {
                Ok(event) => event,
                Err(e) => {
                    let position = reader.error_position();
                    return Some((Err(ParseError::from_xml(e, position)), None));
                }
            };

            let event = match event {
                Event::Start(e) => XmlEvent::Open(Tag::from_name(e.name().as_ref())),
                Event::End(e) => XmlEvent::Close(Tag::from_name(e.name().as_ref())),
                Event::Empty(e) => {
                    let tag = Tag::from_name(e.name().as_ref());
                    items.step(XmlEvent::Open(tag));
                    XmlEvent::Close(tag)
                }
                Event::Text(e) => match e.unescape() {
                    Ok(text) => XmlEvent::Text(text),
                    Err(e) => {
                        let position = reader.buffer_position();
                        return Some((Err(ParseError::from_xml(e, position)), None));
                    }
                },
                Event::CData(e) => {
                    XmlEvent::Text(Cow::Owned(String::from_utf8_lossy(&e.into_inner()).into_owned()))
                }
                Event::Eof => {
                    if items.location() != Location::Irrelevant {
                        tracing::debug!(
                            feed = %items.feed_url,
                            "Feed ended inside an unclosed <item>, dropping it"
                        );
                    }
                    return None;
                }
                _ => continue,
            };

            if let Some(item) = items.step(event) {
                return Some((Ok(item), Some((reader, buf, items))));
            }
        }
    })
}
