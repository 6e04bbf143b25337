use futures::stream::{FusedStream, Stream};
use std::fmt::Display;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Combines a fixed set of fallible streams into one, yielding each value as
/// soon as any input produces it.
///
/// Every still-active input has exactly one outstanding poll; whichever input
/// is ready first wins. Inputs that finish are retired: their slot is emptied
/// and they are never polled again. The merged stream ends once every input
/// has been retired.
///
/// # Ordering
///
/// Values from one input keep their relative order. Order across inputs
/// follows readiness and is otherwise unspecified. After each yielded value
/// the scan starts at the next input, so one always-ready input cannot starve
/// the others.
///
/// # Failure policy
///
/// An `Err` from an input is logged and that input is retired as if it had
/// finished. Its siblings, and the merged stream, carry on.
///
/// # Cancellation
///
/// Dropping the merged stream drops every input it still holds, releasing
/// whatever connections or timers they own.
#[must_use = "streams do nothing unless polled"]
pub struct Merge<S> {
    sources: Vec<Option<Pin<Box<S>>>>,
    active: usize,
    cursor: usize,
}

/// Creates a [`Merge`] over `streams`.
///
/// # Examples
///
/// ```
/// use feedme::stream::merge;
/// use futures::{executor::block_on, stream, StreamExt};
///
/// let a = stream::iter(vec![Ok::<_, String>(1), Ok(2)]);
/// let b = stream::iter(vec![Ok(3), Err("boom".to_string()), Ok(4)]);
///
/// let mut merged: Vec<i32> = block_on(merge([a, b]).collect());
/// merged.sort();
/// assert_eq!(merged, vec![1, 2, 3]);
/// ```
pub fn merge<I, S, T, E>(streams: I) -> Merge<S>
where
    I: IntoIterator<Item = S>,
    S: Stream<Item = Result<T, E>>,
    E: Display,
{
    let sources: Vec<_> = streams.into_iter().map(|s| Some(Box::pin(s))).collect();
    let active = sources.len();
    Merge {
        sources,
        active,
        cursor: 0,
    }
}

impl<S> Merge<S> {
    /// Number of inputs that have not yet finished.
    pub fn active_sources(&self) -> usize {
        self.active
    }

    fn retire(&mut self, index: usize) {
        if self.sources[index].take().is_some() {
            self.active -= 1;
        }
    }
}

impl<S, T, E> Stream for Merge<S>
where
    S: Stream<Item = Result<T, E>>,
    E: Display,
{
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        let this = &mut *self;
        let len = this.sources.len();

        for offset in 0..len {
            let index = (this.cursor + offset) % len;
            let Some(source) = this.sources[index].as_mut() else {
                continue;
            };

            match source.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(value))) => {
                    this.cursor = (index + 1) % len;
                    return Poll::Ready(Some(value));
                }
                Poll::Ready(Some(Err(e))) => {
                    tracing::warn!(source = index, error = %e, "Source failed, retiring it from the merge");
                    this.retire(index);
                }
                Poll::Ready(None) => {
                    tracing::debug!(source = index, remaining = this.active - 1, "Source finished");
                    this.retire(index);
                }
                Poll::Pending => {}
            }
        }

        if this.active == 0 {
            Poll::Ready(None)
        } else {
            Poll::Pending
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.active == 0 {
            (0, Some(0))
        } else {
            (0, None)
        }
    }
}

impl<S, T, E> FusedStream for Merge<S>
where
    S: Stream<Item = Result<T, E>>,
    E: Display,
{
    fn is_terminated(&self) -> bool {
        self.active == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::mpsc;
    use futures::stream::{self, BoxStream, StreamExt};
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    type Source = BoxStream<'static, Result<&'static str, String>>;

    fn ok_source(values: &[&'static str]) -> Source {
        stream::iter(values.iter().copied().map(Ok).collect::<Vec<_>>()).boxed()
    }

    /// Wraps a stream and counts how many wrapped streams have been dropped.
    struct DropCounter<S> {
        inner: Pin<Box<S>>,
        dropped: Arc<AtomicUsize>,
    }

    impl<S: Stream> Stream for DropCounter<S> {
        type Item = S::Item;

        fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<S::Item>> {
            self.inner.as_mut().poll_next(cx)
        }
    }

    impl<S> Drop for DropCounter<S> {
        fn drop(&mut self) {
            self.dropped.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn position(values: &[&str], needle: &str) -> usize {
        values.iter().position(|v| *v == needle).unwrap()
    }

    #[tokio::test]
    async fn test_merge_preserves_per_source_order() {
        let merged: Vec<_> = merge([ok_source(&["a", "b"]), ok_source(&["c", "d"])])
            .collect()
            .await;

        assert_eq!(merged.len(), 4);
        assert!(position(&merged, "a") < position(&merged, "b"));
        assert!(position(&merged, "c") < position(&merged, "d"));

        let mut sorted = merged.clone();
        sorted.sort();
        assert_eq!(sorted, vec!["a", "b", "c", "d"]);
    }

    #[tokio::test]
    async fn test_merge_rotates_between_ready_sources() {
        let merged: Vec<_> = merge([ok_source(&["a1", "a2"]), ok_source(&["b1", "b2"])])
            .collect()
            .await;
        assert_eq!(merged, vec!["a1", "b1", "a2", "b2"]);
    }

    #[tokio::test]
    async fn test_merge_of_nothing_is_empty() {
        let mut merged = merge(Vec::<Source>::new());
        assert!(merged.is_terminated());
        assert_eq!(merged.next().await, None);
    }

    #[tokio::test]
    async fn test_merge_closes_only_when_all_sources_close() {
        let (tx, rx) = mpsc::unbounded::<Result<&'static str, String>>();
        let mut merged = merge([ok_source(&["fast"]), rx.boxed()]);

        assert_eq!(merged.next().await, Some("fast"));
        // The channel source is still open, so the merge must not finish.
        assert!(merged.next().now_or_never().is_none());
        assert_eq!(merged.active_sources(), 1);

        tx.unbounded_send(Ok("slow")).unwrap();
        assert_eq!(merged.next().await, Some("slow"));
        assert!(merged.next().now_or_never().is_none());

        drop(tx);
        assert_eq!(merged.next().await, None);
        assert!(merged.is_terminated());
        assert_eq!(merged.next().await, None);
    }

    #[tokio::test]
    async fn test_failed_source_is_retired_without_affecting_siblings() {
        let failing: Source = stream::iter(vec![
            Ok("before"),
            Err("parse error".to_string()),
            Ok("never"),
        ])
        .boxed();
        let mut merged: Vec<_> = merge([failing, ok_source(&["x", "y"])]).collect().await;
        merged.sort();
        assert_eq!(merged, vec!["before", "x", "y"]);
    }

    #[tokio::test]
    async fn test_all_sources_failing_yields_nothing() {
        let merged: Vec<&str> = merge([
            stream::once(async { Err::<&str, _>("a".to_string()) }).boxed(),
            stream::once(async { Err::<&str, _>("b".to_string()) }).boxed(),
        ])
        .collect()
        .await;
        assert!(merged.is_empty());
    }

    #[tokio::test]
    async fn test_dropping_merge_cancels_every_source() {
        let dropped = Arc::new(AtomicUsize::new(0));
        let (_keep_open_tx, pending_rx) = mpsc::unbounded::<Result<&'static str, String>>();

        let sources: Vec<Source> = vec![
            DropCounter {
                inner: Box::pin(ok_source(&["a", "b"])),
                dropped: dropped.clone(),
            }
            .boxed(),
            DropCounter {
                inner: Box::pin(ok_source(&["c", "d"])),
                dropped: dropped.clone(),
            }
            .boxed(),
            DropCounter {
                inner: Box::pin(pending_rx),
                dropped: dropped.clone(),
            }
            .boxed(),
        ];

        let mut merged = merge(sources);
        assert!(merged.next().await.is_some());
        assert_eq!(dropped.load(Ordering::SeqCst), 0);

        drop(merged);
        assert_eq!(dropped.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_finished_source_is_dropped_before_merge_ends() {
        let dropped = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::unbounded::<Result<&'static str, String>>();

        let mut merged = merge(vec![
            DropCounter {
                inner: Box::pin(ok_source(&["only"])),
                dropped: dropped.clone(),
            }
            .boxed(),
            rx.boxed(),
        ]);

        assert_eq!(merged.next().await, Some("only"));
        assert!(merged.next().now_or_never().is_none());
        assert_eq!(dropped.load(Ordering::SeqCst), 1);
        drop(tx);
    }
}
