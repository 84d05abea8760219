//! Live subscriptions.
//!
//! [`SignalSubscription`] is the pull form: each call to `next` yields the
//! complete recomputed result for one store snapshot. [`SubscriptionHandle`]
//! is the callback adapter returned by `SignalFeed::subscribe_signals`.

use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use signalfeed_store::SnapshotStream;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::feed::{Clock, SignalFeed};
use crate::normalize::normalize_all;
use crate::{post_filter, Call, CallFilter, FeedError};

/// Cancellable stream of fully filtered snapshots.
pub struct SignalSubscription {
    stream: SnapshotStream,
    filter: CallFilter,
    clock: Clock,
    finished: bool,
}

impl SignalSubscription {
    pub(crate) fn new(stream: SnapshotStream, filter: CallFilter, clock: Clock) -> Self {
        Self {
            stream,
            filter,
            clock,
            finished: false,
        }
    }

    /// Waits for the next snapshot.
    ///
    /// Returns `Some(Err(_))` once when the channel fails and `None` on every
    /// later call, after cancellation, or when the store closed the channel.
    pub async fn next(&mut self) -> Option<Result<Vec<Call>, FeedError>> {
        if self.finished {
            return None;
        }

        match self.stream.next().await {
            Some(Ok(documents)) => {
                let evaluated_at = (self.clock)();
                let calls = normalize_all(&documents, evaluated_at);
                Some(Ok(post_filter::apply(calls, &self.filter, evaluated_at)))
            }
            Some(Err(error)) => {
                self.finish();
                Some(Err(FeedError::from(error)))
            }
            None => {
                self.finished = true;
                None
            }
        }
    }

    /// Stops the subscription. Safe to call repeatedly.
    pub fn cancel(&mut self) {
        self.finish();
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn filter(&self) -> &CallFilter {
        &self.filter
    }

    fn finish(&mut self) {
        self.finished = true;
        self.stream.close();
    }
}

impl Debug for SignalSubscription {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalSubscription")
            .field("filter", &self.filter)
            .field("finished", &self.finished)
            .finish()
    }
}

/// Handle for a callback subscription.
///
/// Dropping the handle leaves the subscription running; call
/// [`cancel`](SubscriptionHandle::cancel) to stop it.
#[derive(Debug)]
pub struct SubscriptionHandle {
    cancelled: Arc<AtomicBool>,
    wake: Arc<Notify>,
    task: JoinHandle<()>,
}

impl SubscriptionHandle {
    pub(crate) fn spawn<U, E>(
        feed: SignalFeed,
        filter: CallFilter,
        mut on_update: U,
        mut on_error: E,
    ) -> Self
    where
        U: FnMut(Vec<Call>) + Send + 'static,
        E: FnMut(FeedError) + Send + 'static,
    {
        let cancelled = Arc::new(AtomicBool::new(false));
        let wake = Arc::new(Notify::new());
        let task_cancelled = Arc::clone(&cancelled);
        let task_wake = Arc::clone(&wake);

        let task = tokio::spawn(async move {
            let is_cancelled = || task_cancelled.load(Ordering::SeqCst);

            let opened = tokio::select! {
                biased;
                _ = task_wake.notified() => return,
                opened = feed.watch(filter) => opened,
            };

            let mut subscription = match opened {
                Ok(subscription) => subscription,
                Err(error) => {
                    if !is_cancelled() {
                        warn!(%error, "subscription could not be opened");
                        on_error(error);
                        on_update(Vec::new());
                    }
                    return;
                }
            };
            info!(filter = ?subscription.filter(), "subscription started");

            loop {
                let next = tokio::select! {
                    biased;
                    _ = task_wake.notified() => break,
                    next = subscription.next() => next,
                };
                if is_cancelled() {
                    break;
                }

                match next {
                    Some(Ok(calls)) => {
                        debug!(count = calls.len(), "subscription update");
                        on_update(calls);
                    }
                    Some(Err(error)) => {
                        warn!(%error, "subscription channel failed");
                        on_error(error);
                        on_update(Vec::new());
                        break;
                    }
                    None => break,
                }
            }

            subscription.cancel();
            info!("subscription stopped");
        });

        Self {
            cancelled,
            wake,
            task,
        }
    }

    /// Stops further callback invocations. Idempotent, and safe after the
    /// subscription already ended on an error.
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            self.wake.notify_one();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// `true` once the background task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
