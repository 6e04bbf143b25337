use crate::feed::item::FeedItem;
use std::collections::HashSet;
use std::sync::Mutex;

/// Decides which items make it into the aggregated output.
///
/// One filter is shared by every source of an aggregation call, so
/// implementations with state must guard it for concurrent access.
pub trait ItemFilter: Send + Sync {
    fn accept(&self, item: &FeedItem) -> bool;
}

impl<F> ItemFilter for F
where
    F: Fn(&FeedItem) -> bool + Send + Sync,
{
    fn accept(&self, item: &FeedItem) -> bool {
        self(item)
    }
}

/// Accepts each distinct `<link>` once across all sources.
///
/// Items without a link are rejected: there is nothing to point the reader
/// at and nothing to deduplicate on. The seen-set lives as long as this value,
/// so create a fresh one per aggregation call.
///
/// The check and the insert happen under one lock, so two sources racing to
/// publish the same link can never both win.
#[derive(Debug, Default)]
pub struct SeenLinks {
    seen: Mutex<HashSet<String>>,
}

impl SeenLinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct links accepted so far.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        // A panic while holding the lock cannot leave the set half-updated
        self.seen.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ItemFilter for SeenLinks {
    fn accept(&self, item: &FeedItem) -> bool {
        match item.link.as_deref() {
            Some(link) if !link.is_empty() => self.lock().insert(link.to_owned()),
            _ => false,
        }
    }
}
