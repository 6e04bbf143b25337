use futures::stream::{FusedStream, Stream};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// What a deferred operation eventually produces.
#[derive(Debug)]
pub enum Resolved<S, T> {
    /// A stream whose items are forwarded one by one.
    Stream(S),
    /// A single, already-complete value.
    Value(T),
}

enum State<F, S> {
    Pending(Pin<Box<F>>),
    Streaming(Pin<Box<S>>),
    Done,
}

/// A stream that exists before the operation producing its contents resolves.
///
/// While the operation is in flight, polling yields `Poll::Pending`. Once it
/// resolves to [`Resolved::Stream`] every item of the inner stream is
/// forwarded in order; a [`Resolved::Value`] is emitted once; an error is
/// emitted as the final item. Dropping a `Deferred` drops the pending
/// operation or inner stream with it.
///
/// This lets a not-yet-fetched source sit in a [`Merge`](super::Merge) next
/// to sources that are already producing items.
#[must_use = "streams do nothing unless polled"]
pub struct Deferred<F, S> {
    state: State<F, S>,
}

/// Wraps `operation` as a stream usable immediately.
///
/// # Examples
///
/// ```
/// use feedme::stream::{deferred, Resolved};
/// use futures::{executor::block_on, stream, StreamExt};
///
/// let op = async {
///     Ok::<_, String>(Resolved::<_, u8>::Stream(stream::iter(vec![Ok(1u8), Ok(2)])))
/// };
/// let items: Vec<_> = block_on(deferred(op).collect());
/// assert_eq!(items, vec![Ok(1), Ok(2)]);
/// ```
pub fn deferred<F, S, T, E>(operation: F) -> Deferred<F, S>
where
    F: Future<Output = Result<Resolved<S, T>, E>>,
    S: Stream<Item = Result<T, E>>,
{
    Deferred {
        state: State::Pending(Box::pin(operation)),
    }
}

impl<F, S> Deferred<F, S> {
    /// Returns true while the wrapped operation has not resolved.
    pub fn is_pending(&self) -> bool {
        matches!(self.state, State::Pending(_))
    }
}

impl<F, S, T, E> Stream for Deferred<F, S>
where
    F: Future<Output = Result<Resolved<S, T>, E>>,
    S: Stream<Item = Result<T, E>>,
{
    type Item = Result<T, E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        loop {
            match &mut this.state {
                State::Pending(operation) => match operation.as_mut().poll(cx) {
                    Poll::Pending => return Poll::Pending,
                    Poll::Ready(Ok(Resolved::Stream(inner))) => {
                        this.state = State::Streaming(Box::pin(inner));
                    }
                    Poll::Ready(Ok(Resolved::Value(value))) => {
                        this.state = State::Done;
                        return Poll::Ready(Some(Ok(value)));
                    }
                    Poll::Ready(Err(e)) => {
                        this.state = State::Done;
                        return Poll::Ready(Some(Err(e)));
                    }
                },
                State::Streaming(inner) => match inner.as_mut().poll_next(cx) {
                    Poll::Ready(None) => {
                        this.state = State::Done;
                        return Poll::Ready(None);
                    }
                    other => return other,
                },
                State::Done => return Poll::Ready(None),
            }
        }
    }
}

impl<F, S, T, E> FusedStream for Deferred<F, S>
where
    F: Future<Output = Result<Resolved<S, T>, E>>,
    S: Stream<Item = Result<T, E>>,
{
    fn is_terminated(&self) -> bool {
        matches!(self.state, State::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::oneshot;
    use futures::stream::{self, BoxStream, StreamExt};
    use futures::FutureExt;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    type Items = BoxStream<'static, Result<u32, String>>;

    #[tokio::test(start_paused = true)]
    async fn test_yields_nothing_before_resolution_then_all_items() {
        let mut adapted = deferred(async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok::<_, String>(Resolved::<Items, u32>::Stream(
                stream::iter(vec![Ok(1), Ok(2), Ok(3)]).boxed(),
            ))
        });

        assert!(adapted.next().now_or_never().is_none());
        assert!(adapted.is_pending());

        tokio::time::advance(Duration::from_millis(499)).await;
        assert!(adapted.next().now_or_never().is_none());

        let items: Vec<_> = adapted.collect().await;
        assert_eq!(items, vec![Ok(1), Ok(2), Ok(3)]);
    }

    #[tokio::test]
    async fn test_single_value_is_emitted_once() {
        let mut adapted = deferred(async { Ok::<_, String>(Resolved::<Items, u32>::Value(7)) });
        assert_eq!(adapted.next().await, Some(Ok(7)));
        assert!(adapted.is_terminated());
        assert_eq!(adapted.next().await, None);
    }

    #[tokio::test]
    async fn test_failure_becomes_terminal_error() {
        let adapted = deferred(async { Err::<Resolved<Items, u32>, _>("refused".to_string()) });
        let items: Vec<_> = adapted.collect().await;
        assert_eq!(items, vec![Err("refused".to_string())]);
    }

    #[tokio::test]
    async fn test_inner_stream_errors_are_forwarded_in_order() {
        let adapted = deferred(async {
            Ok::<_, String>(Resolved::<Items, u32>::Stream(
                stream::iter(vec![Ok(1), Err("bad".to_string())]).boxed(),
            ))
        });
        let items: Vec<_> = adapted.collect().await;
        assert_eq!(items, vec![Ok(1), Err("bad".to_string())]);
    }

    #[tokio::test]
    async fn test_forwards_items_as_inner_stream_produces_them() {
        let (resolve_tx, resolve_rx) = oneshot::channel::<Items>();
        let (item_tx, item_rx) = futures::channel::mpsc::unbounded::<Result<u32, String>>();

        let mut adapted = deferred(async move {
            let inner = resolve_rx.await.map_err(|e| e.to_string())?;
            Ok::<_, String>(Resolved::<Items, u32>::Stream(inner))
        });
        assert!(adapted.next().now_or_never().is_none());

        resolve_tx.send(item_rx.boxed()).ok();
        assert!(adapted.next().now_or_never().is_none());
        assert!(!adapted.is_pending());

        item_tx.unbounded_send(Ok(10)).unwrap();
        assert_eq!(adapted.next().await, Some(Ok(10)));

        drop(item_tx);
        assert_eq!(adapted.next().await, None);
    }

    #[tokio::test]
    async fn test_dropping_while_pending_drops_operation() {
        struct Flag(Arc<AtomicBool>);
        impl Drop for Flag {
            fn drop(&mut self) {
                self.0.store(true, Ordering::SeqCst);
            }
        }

        let cancelled = Arc::new(AtomicBool::new(false));
        let guard = Flag(cancelled.clone());
        let mut adapted = deferred(async move {
            let _guard = guard;
            futures::future::pending::<()>().await;
            Ok::<_, String>(Resolved::<Items, u32>::Value(0))
        });

        assert!(adapted.next().now_or_never().is_none());
        assert!(!cancelled.load(Ordering::SeqCst));

        drop(adapted);
        assert!(cancelled.load(Ordering::SeqCst));
    }
}
