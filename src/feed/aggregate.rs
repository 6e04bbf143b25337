use crate::feed::fetcher::FetchOptions;
use crate::feed::filter::{ItemFilter, SeenLinks};
use crate::feed::render::Renderer;
use crate::feed::source::{open_source, SourceContext, SourceError, SourceErrorPolicy};
use crate::stream::{deferred, merge};
use futures::stream::{self, Stream, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

/// Settings shared by every source of an aggregation.
#[derive(Debug, Clone, Copy, Default)]
pub struct AggregateOptions {
    pub fetch: FetchOptions,
    pub source_errors: SourceErrorPolicy,
}

/// Fetches many feeds at once and merges their rendered items into one
/// stream.
///
/// Holds the HTTP client and renderer so repeated calls reuse the same
/// connection pool.
pub struct Aggregator<R: ?Sized> {
    client: reqwest::Client,
    options: AggregateOptions,
    renderer: Arc<R>,
}

impl<R> Aggregator<R>
where
    R: Renderer + ?Sized + 'static,
{
    pub fn new(client: reqwest::Client, renderer: Arc<R>, options: AggregateOptions) -> Self {
        Self {
            client,
            options,
            renderer,
        }
    }

    /// Starts one request per distinct URL and returns the merged output.
    ///
    /// Nothing happens until the stream is polled. Each accepted item's
    /// tokens appear back to back; items from faster sources come first.
    /// Failed sources are logged and left out (or rendered in place, under
    /// [`SourceErrorPolicy::Inline`]), and the stream ends once every source
    /// has finished. Dropping it aborts all requests still in flight.
    ///
    /// `filter` sees every parsed item from every source.
    pub fn aggregate<I>(
        &self,
        urls: I,
        filter: Arc<dyn ItemFilter>,
    ) -> impl Stream<Item = R::Token> + Send + 'static
    where
        I: IntoIterator<Item = Url>,
    {
        let mut distinct = HashSet::new();
        let urls: Vec<Url> = urls
            .into_iter()
            .filter(|url| distinct.insert(url.clone()))
            .collect();

        tracing::info!(sources = urls.len(), "Aggregating feeds");

        let ctx = Arc::new(SourceContext {
            client: self.client.clone(),
            fetch: self.options.fetch,
            errors: self.options.source_errors,
            filter,
            renderer: self.renderer.clone(),
        });

        merge_items(
            urls.into_iter()
                .map(move |url| deferred(open_source(ctx.clone(), url))),
        )
    }

    /// [`aggregate`](Self::aggregate) with each distinct item link shown at
    /// most once across all sources.
    pub fn aggregate_deduplicated<I>(&self, urls: I) -> impl Stream<Item = R::Token> + Send + 'static
    where
        I: IntoIterator<Item = Url>,
    {
        self.aggregate(urls, Arc::new(SeenLinks::new()))
    }
}

/// Merges per-source item batches and flattens them into tokens.
///
/// The merger only ever switches sources between batches, so the tokens of
/// one item always come out back to back.
fn merge_items<I, S, T>(sources: I) -> impl Stream<Item = T>
where
    I: IntoIterator<Item = S>,
    S: Stream<Item = Result<Vec<T>, SourceError>>,
{
    merge(sources).flat_map(stream::iter)
}
