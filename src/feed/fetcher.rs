use bytes::Bytes;
use futures::future;
use futures::stream::{Stream, StreamExt};
use std::io;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Default time allowed for connecting and receiving response headers.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default cap on a single feed body.
pub const DEFAULT_MAX_FEED_BYTES: usize = 10 * 1024 * 1024; // 10MB

/// Errors that can occur while fetching one feed.
///
/// All of them are contained to the source that produced them.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// No response headers within the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// Response body exceeded the configured size limit
    #[error("Response too large")]
    ResponseTooLarge,
}

impl From<FetchError> for io::Error {
    fn from(e: FetchError) -> Self {
        io::Error::other(e)
    }
}

/// Limits applied to every feed request.
#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    pub timeout: Duration,
    pub max_bytes: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_bytes: DEFAULT_MAX_FEED_BYTES,
        }
    }
}

/// Requests `url` and returns its body as a stream of byte chunks.
///
/// Resolves once response headers arrive; the body is read lazily as the
/// returned stream is polled, and dropping the stream closes the connection.
///
/// # Errors
///
/// - [`FetchError::Timeout`] - no response within `options.timeout`
/// - [`FetchError::Network`] - DNS, connect or TLS failure
/// - [`FetchError::HttpStatus`] - non-2xx response
/// - [`FetchError::ResponseTooLarge`] - `Content-Length` above `options.max_bytes`
///
/// Failures while reading the body (including exceeding `max_bytes` without
/// a `Content-Length`) arrive as the last item of the stream.
pub async fn fetch_body(
    client: &reqwest::Client,
    url: &Url,
    options: FetchOptions,
) -> Result<impl Stream<Item = Result<Bytes, FetchError>> + Send + 'static, FetchError> {
    let response = tokio::time::timeout(options.timeout, client.get(url.clone()).send())
        .await
        .map_err(|_| FetchError::Timeout)?
        .map_err(FetchError::Network)?;

    if !response.status().is_success() {
        return Err(FetchError::HttpStatus(response.status().as_u16()));
    }

    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len > options.max_bytes as u64 {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    tracing::debug!(feed = %url, status = %response.status(), "Feed response received");

    let body = response
        .bytes_stream()
        .map(|chunk| chunk.map_err(FetchError::Network));
    Ok(limit_bytes(body, options.max_bytes))
}

/// Passes chunks through until more than `limit` bytes have been seen, then
/// yields [`FetchError::ResponseTooLarge`].
fn limit_bytes<S>(body: S, limit: usize) -> impl Stream<Item = Result<Bytes, FetchError>>
where
    S: Stream<Item = Result<Bytes, FetchError>>,
{
    body.scan(Some(0usize), move |received, chunk| {
        let item = match (*received, chunk) {
            (None, _) => None,
            (Some(total), Ok(bytes)) => {
                let total = total.saturating_add(bytes.len());
                if total > limit {
                    *received = None;
                    Some(Err(FetchError::ResponseTooLarge))
                } else {
                    *received = Some(total);
                    Some(Ok(bytes))
                }
            }
            (Some(_), Err(e)) => {
                *received = None;
                Some(Err(e))
            }
        };
        future::ready(item)
    })
}
