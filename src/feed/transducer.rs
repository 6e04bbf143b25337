use crate::feed::filter::ItemFilter;
use crate::feed::item::FeedItem;
use crate::feed::render::Renderer;
use futures::future;
use futures::stream::{Stream, StreamExt};
use std::sync::Arc;

/// Filters a source's items and renders the accepted ones.
///
/// Yields one `Vec` of tokens per accepted item, so downstream stages move
/// whole items and can never split one item's output. Rejected items and
/// items that render to nothing yield nothing. Errors from `items` are passed
/// through unchanged. An item that fails to render is logged and skipped.
pub fn render_items<S, E, R>(
    items: S,
    filter: Arc<dyn ItemFilter>,
    renderer: Arc<R>,
) -> impl Stream<Item = Result<Vec<R::Token>, E>>
where
    S: Stream<Item = Result<FeedItem, E>>,
    R: Renderer + ?Sized,
{
    items.filter_map(move |item| {
        let rendered = match item {
            Ok(item) if filter.accept(&item) => match renderer.render(&item) {
                Ok(tokens) if tokens.is_empty() => None,
                Ok(tokens) => Some(Ok(tokens)),
                Err(e) => {
                    tracing::warn!(
                        feed = %item.feed_url,
                        link = item.link.as_deref().unwrap_or(""),
                        error = %e,
                        "Skipping item that failed to render"
                    );
                    None
                }
            },
            Ok(_) => None,
            Err(e) => Some(Err(e)),
        };
        future::ready(rendered)
    })
}
