//! Fixed-cadence stream pacing.

use futures::{Stream, ready};
use pin_project_lite::pin_project;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::time::{Interval, interval};

/// Extension trait to pace any Stream to a fixed emission cadence.
pub trait PaceExt: Stream {
    /// Emit at most one item per interval, latest-wins.
    ///
    /// If several items arrive within one interval only the newest is kept;
    /// a tick with nothing buffered emits nothing and the next arrival waits
    /// for the following tick. This is how an application payload source
    /// faster than the send cadence degrades: stale readings are replaced,
    /// never queued.
    fn pace(self, period: Duration) -> Pace<Self>
    where
        Self: Sized,
    {
        Pace::new(self, period)
    }
}

impl<T: Stream> PaceExt for T {}

pin_project! {
    /// Stream combinator holding items to a fixed emission cadence.
    pub struct Pace<S: Stream> {
        #[pin]
        stream: S,
        interval: Interval,
        pending: Option<S::Item>,
        exhausted: bool,
    }
}

impl<S: Stream> Pace<S> {
    /// Create a new paced stream.
    pub fn new(stream: S, period: Duration) -> Self {
        let mut interval = interval(period);
        // Late ticks are delayed, not bursted, preserving the cadence.
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        Self { stream, interval, pending: None, exhausted: false }
    }
}

impl<S: Stream> Stream for Pace<S> {
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            // Buffer the newest available item, latest-wins.
            while !*this.exhausted {
                match this.stream.as_mut().poll_next(cx) {
                    Poll::Ready(Some(item)) => *this.pending = Some(item),
                    Poll::Ready(None) => *this.exhausted = true,
                    Poll::Pending => break,
                }
            }

            if *this.exhausted && this.pending.is_none() {
                return Poll::Ready(None);
            }

            ready!(this.interval.poll_tick(cx));

            if let Some(item) = this.pending.take() {
                return Poll::Ready(Some(item));
            }
            // Tick fired with nothing buffered: loop to re-register interest
            // in both the source and the next tick.
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tokio_stream::wrappers::ReceiverStream;

    #[tokio::test(start_paused = true)]
    async fn emits_one_item_per_tick() {
        let source = futures::stream::iter([1, 2, 3]);
        let mut paced = source.pace(Duration::from_millis(100));

        let start = tokio::time::Instant::now();
        let mut seen = Vec::new();
        while let Some(item) = paced.next().await {
            seen.push((item, (tokio::time::Instant::now() - start).as_millis()));
        }

        // An eager iter source overwrites earlier items before the first
        // tick, so only the newest survives.
        assert_eq!(seen, vec![(3, 0)]);
    }

    #[tokio::test(start_paused = true)]
    async fn latest_wins_within_an_interval() {
        let (tx, rx) = tokio::sync::mpsc::channel(8);
        let mut paced = ReceiverStream::new(rx).pace(Duration::from_millis(100));

        tx.send(1).await.unwrap();
        assert_eq!(paced.next().await, Some(1));

        // Three arrivals inside one period: only the newest is emitted.
        tx.send(2).await.unwrap();
        tx.send(3).await.unwrap();
        tx.send(4).await.unwrap();
        assert_eq!(paced.next().await, Some(4));

        drop(tx);
        assert_eq!(paced.next().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_ticks_emit_nothing_and_do_not_end_the_stream() {
        let (tx, rx) = tokio::sync::mpsc::channel(8);
        let mut paced = ReceiverStream::new(rx).pace(Duration::from_millis(50));

        let producer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            tx.send(7).await.unwrap();
        });

        // The stream stays pending across many empty ticks.
        assert_eq!(paced.next().await, Some(7));
        producer.await.unwrap();
        assert_eq!(paced.next().await, None);
    }
}
