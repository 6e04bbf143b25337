use crate::feed::decode::decode_utf8;
use crate::feed::fetcher::{fetch_body, FetchError, FetchOptions};
use crate::feed::filter::ItemFilter;
use crate::feed::parser::{parse_items, ParseError};
use crate::feed::render::Renderer;
use crate::feed::transducer::render_items;
use crate::stream::Resolved;
use futures::future;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

/// Why one source stopped contributing to the aggregate.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: Url,
        #[source]
        source: FetchError,
    },
    #[error("failed to parse {url}: {source}")]
    Parse {
        url: Url,
        #[source]
        source: ParseError,
    },
}

impl SourceError {
    pub fn url(&self) -> &Url {
        match self {
            SourceError::Fetch { url, .. } | SourceError::Parse { url, .. } => url,
        }
    }
}

/// What a failed source leaves behind in the aggregated output.
///
/// Failures are always logged. `Drop` ends the source with whatever it had
/// already produced; `Inline` additionally emits one rendered error token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceErrorPolicy {
    #[default]
    Drop,
    Inline,
}

/// Per-source output as handed to the merger: one `Vec` of tokens per item.
pub type ItemStream<T> = BoxStream<'static, Result<Vec<T>, SourceError>>;

/// Everything one source pipeline needs, shared by all sources of a call.
pub(crate) struct SourceContext<R: ?Sized> {
    pub client: reqwest::Client,
    pub fetch: FetchOptions,
    pub errors: SourceErrorPolicy,
    pub filter: Arc<dyn ItemFilter>,
    pub renderer: Arc<R>,
}

/// Fetches one feed and wires its body through decode, parse and render.
///
/// Resolves as soon as response headers arrive. A fetch failure never
/// escapes: it is logged and, per the context's policy, becomes either an
/// empty stream or a single error entry.
pub(crate) async fn open_source<R>(
    ctx: Arc<SourceContext<R>>,
    url: Url,
) -> Result<Resolved<ItemStream<R::Token>, Vec<R::Token>>, SourceError>
where
    R: Renderer + ?Sized + 'static,
{
    let body = match fetch_body(&ctx.client, &url, ctx.fetch).await {
        Ok(body) => body,
        Err(source) => {
            let error = SourceError::Fetch { url, source };
            tracing::warn!(feed = %error.url(), error = %error, "Feed fetch failed");
            return Ok(match ctx.errors {
                SourceErrorPolicy::Drop => Resolved::Stream(stream::empty().boxed()),
                SourceErrorPolicy::Inline => {
                    Resolved::Value(vec![ctx.renderer.render_source_error(&error)])
                }
            });
        }
    };

    let items = parse_items(url.clone(), decode_utf8(body)).map(move |item| {
        item.map_err(|source| SourceError::Parse {
            url: url.clone(),
            source,
        })
    });
    let tokens = render_items(items, ctx.filter.clone(), ctx.renderer.clone());

    Ok(Resolved::Stream(match ctx.errors {
        SourceErrorPolicy::Drop => tokens.boxed(),
        SourceErrorPolicy::Inline => inline_errors(tokens, ctx.renderer.clone()).boxed(),
    }))
}

/// Replaces the first error in `items` with its rendered form and ends the
/// stream there.
fn inline_errors<S, R>(items: S, renderer: Arc<R>) -> impl Stream<Item = Result<Vec<R::Token>, SourceError>>
where
    S: Stream<Item = Result<Vec<R::Token>, SourceError>>,
    R: Renderer + ?Sized,
{
    items.scan(false, move |failed, item| {
        let out = match item {
            _ if *failed => None,
            Ok(tokens) => Some(Ok(tokens)),
            Err(error) => {
                tracing::warn!(feed = %error.url(), error = %error, "Feed ended with an error");
                *failed = true;
                Some(Ok(vec![renderer.render_source_error(&error)]))
            }
        };
        future::ready(out)
    })
}
