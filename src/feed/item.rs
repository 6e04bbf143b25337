use url::Url;

/// One `<item>` extracted from a feed.
///
/// Every field except `feed_url` is optional: feeds in the wild omit any of
/// them, and deciding what is renderable is left to the filter and renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub title: Option<String>,
    pub link: Option<String>,
    pub comments: Option<String>,
    pub pub_date: Option<String>,
    /// The source this item was read from.
    pub feed_url: Url,
}

impl FeedItem {
    /// An item with no fields set yet.
    pub fn empty(feed_url: Url) -> Self {
        Self {
            title: None,
            link: None,
            comments: None,
            pub_date: None,
            feed_url,
        }
    }

    /// Mutable access to the slot for `field`.
    pub fn field_mut(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Title => &mut self.title,
            Field::Link => &mut self.link,
            Field::Comments => &mut self.comments,
            Field::PubDate => &mut self.pub_date,
        }
    }
}

/// Item sub-elements whose text is captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Link,
    Comments,
    PubDate,
}

/// Element names the parser distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// `<item>`
    ItemContainer,
    Field(Field),
    Other,
}

impl Tag {
    /// Classifies a qualified element name. Matching is exact and
    /// case-sensitive, so `dc:title` or `Title` are [`Tag::Other`].
    pub fn from_name(name: &[u8]) -> Self {
        match name {
            b"item" => Tag::ItemContainer,
            b"title" => Tag::Field(Field::Title),
            b"link" => Tag::Field(Field::Link),
            b"comments" => Tag::Field(Field::Comments),
            b"pubDate" => Tag::Field(Field::PubDate),
            _ => Tag::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_classification() {
        assert_eq!(Tag::from_name(b"item"), Tag::ItemContainer);
        assert_eq!(Tag::from_name(b"pubDate"), Tag::Field(Field::PubDate));
        assert_eq!(Tag::from_name(b"pubdate"), Tag::Other);
        assert_eq!(Tag::from_name(b"dc:title"), Tag::Other);
        assert_eq!(Tag::from_name(b"channel"), Tag::Other);
    }

    #[test]
    fn test_field_mut_targets_matching_slot() {
        let mut item = FeedItem::empty(Url::parse("https://example.com/rss").unwrap());
        *item.field_mut(Field::Comments) = Some("https://example.com/c".into());
        assert_eq!(item.comments.as_deref(), Some("https://example.com/c"));
        assert!(item.title.is_none());
    }
}
