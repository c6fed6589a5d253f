//! Replay-latest live values
//!
//! A [`LiveValue`] stores the most recent value and fans every update out to all
//! current subscribers. A new subscriber immediately receives the stored value.
//! Built on `tokio::sync::watch`, so a slow subscriber skips intermediate values
//! and only ever sees the latest one.
//!
//! Failures are terminal per subscription: `fail` delivers the error to every
//! stream opened before the failure and ends it. Streams opened afterwards start
//! clean from the current value.

use crate::error::{Error, Result};
use futures::stream::{self, BoxStream, StreamExt};
use tokio::sync::watch;

/// Live sequence of values; an `Err` item is always the last one
pub type LiveStream<T> = BoxStream<'static, Result<T>>;

#[derive(Clone)]
struct Frame<T> {
    value: T,
    faults: u64,
    last_fault: Option<Error>,
}

/// Latest-value holder with multi-subscriber fan-out
pub struct LiveValue<T> {
    tx: watch::Sender<Frame<T>>,
}

impl<T> LiveValue<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(initial: T) -> Self {
        let (tx, _) = watch::channel(Frame {
            value: initial,
            faults: 0,
            last_fault: None,
        });
        Self { tx }
    }

    /// Current value
    pub fn get(&self) -> T {
        self.tx.borrow().value.clone()
    }

    /// Replace the value and notify subscribers (repeated values are emitted too)
    pub fn set(&self, value: T) {
        self.tx.send_modify(|frame| frame.value = value);
    }

    /// Terminate every open subscription with `error`
    ///
    /// When `reset` is given the stored value is replaced in the same step, so
    /// later subscribers start from it.
    pub fn fail(&self, error: Error, reset: Option<T>) {
        self.tx.send_modify(|frame| {
            frame.faults += 1;
            frame.last_fault = Some(error);
            if let Some(value) = reset {
                frame.value = value;
            }
        });
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Open a stream that starts with the current value
    pub fn subscribe(&self) -> LiveStream<T> {
        let mut rx = self.tx.subscribe();
        let (first, baseline) = {
            let frame = rx.borrow_and_update();
            (frame.value.clone(), frame.faults)
        };

        Box::pin(async_stream::stream! {
            yield Ok(first);
            while rx.changed().await.is_ok() {
                let frame = rx.borrow_and_update().clone();
                if frame.faults != baseline {
                    if let Some(error) = frame.last_fault {
                        yield Err(error);
                    }
                    break;
                }
                yield Ok(frame.value);
            }
        })
    }
}

/// First item of a live stream, i.e. its current value
pub async fn current<T>(mut stream: LiveStream<T>) -> Result<T> {
    stream
        .next()
        .await
        .unwrap_or_else(|| Err(Error::Internal("live stream ended without a value".to_string())))
}

enum Side<A, B> {
    Left(A),
    Right(B),
}

/// Combine two live streams; emits once both have a value, then on every update
pub fn combine_latest2<A, B, O, F>(a: LiveStream<A>, b: LiveStream<B>, combine: F) -> LiveStream<O>
where
    A: Send + 'static,
    B: Send + 'static,
    O: Send + 'static,
    F: Fn(&A, &B) -> O + Send + 'static,
{
    let mut merged = stream::select(
        a.map(|item| item.map(Side::Left)),
        b.map(|item| item.map(Side::Right)),
    );

    Box::pin(async_stream::stream! {
        let mut left: Option<A> = None;
        let mut right: Option<B> = None;
        while let Some(item) = merged.next().await {
            match item {
                Ok(Side::Left(value)) => left = Some(value),
                Ok(Side::Right(value)) => right = Some(value),
                Err(error) => {
                    yield Err(error);
                    break;
                }
            }
            if let (Some(l), Some(r)) = (&left, &right) {
                yield Ok(combine(l, r));
            }
        }
    })
}

/// Combine any number of same-typed live streams into a stream of vectors
pub fn combine_latest_all<T>(streams: Vec<LiveStream<T>>) -> LiveStream<Vec<T>>
where
    T: Clone + Send + 'static,
{
    let count = streams.len();
    if count == 0 {
        return Box::pin(stream::once(async { Ok(Vec::new()) }));
    }

    let mut merged = stream::select_all(
        streams
            .into_iter()
            .enumerate()
            .map(|(slot, s)| s.map(move |item| item.map(|value| (slot, value))).boxed()),
    );

    Box::pin(async_stream::stream! {
        let mut latest: Vec<Option<T>> = vec![None; count];
        while let Some(item) = merged.next().await {
            match item {
                Ok((slot, value)) => latest[slot] = Some(value),
                Err(error) => {
                    yield Err(error);
                    break;
                }
            }
            if latest.iter().all(Option::is_some) {
                yield Ok(latest.iter().flatten().cloned().collect());
            }
        }
    })
}
