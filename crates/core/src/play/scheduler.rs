//! Delayed callbacks requested by the play engine.
//!
//! The engine never sleeps. It asks a [`Scheduler`] to deliver a [`Timer`]
//! back after a delay and keeps the returned [`TimerHandle`] so the request
//! can be withdrawn on restart or teardown.

use std::{fmt, time::Duration};

use tokio::sync::mpsc;

/// What a timer does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Image countdown decrement.
    Countdown,
    /// Move past an answered question.
    Advance,
}

/// Token handed to the scheduler and delivered back to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timer {
    id: u64,
    kind: TimerKind,
}

impl Timer {
    pub(crate) fn new(id: u64, kind: TimerKind) -> Self {
        Self { id, kind }
    }

    /// Engine-unique identifier.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Purpose of the timer.
    pub fn kind(&self) -> TimerKind {
        self.kind
    }
}

/// Cancels a scheduled timer. Dropping the handle leaves the timer armed.
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl TimerHandle {
    /// Wrap the backend-specific cancellation.
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A handle whose timer cannot be withdrawn.
    pub fn detached() -> Self {
        Self { cancel: None }
    }

    /// Withdraw the timer if it has not fired yet.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle")
            .field("cancellable", &self.cancel.is_some())
            .finish()
    }
}

/// Backend that delivers timers after a delay.
pub trait Scheduler {
    /// Arrange for `timer` to come back after `delay`.
    fn schedule(&mut self, delay: Duration, timer: Timer) -> TimerHandle;
}

/// Spawns one tokio task per timer and posts the wrapped timer into an event
/// channel. Must be used from within a tokio runtime.
pub struct TokioScheduler<E> {
    sender: mpsc::Sender<E>,
    wrap: fn(Timer) -> E,
}

impl<E> TokioScheduler<E> {
    /// Deliver timers to `sender`, converting them with `wrap`.
    pub fn new(sender: mpsc::Sender<E>, wrap: fn(Timer) -> E) -> Self {
        Self { sender, wrap }
    }
}

impl<E: Send + 'static> Scheduler for TokioScheduler<E> {
    fn schedule(&mut self, delay: Duration, timer: Timer) -> TimerHandle {
        let sender = self.sender.clone();
        let event = (self.wrap)(timer);
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = sender.send(event).await;
        });
        TimerHandle::new(move || task.abort())
    }
}

#[cfg(test)]
pub(crate) use manual::ManualScheduler;

#[cfg(test)]
mod manual {
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };

    use super::*;

    struct Entry {
        due: Duration,
        seq: u64,
        timer: Timer,
        cancelled: Arc<AtomicBool>,
    }

    /// Virtual clock: timers fire only when a test pops them.
    #[derive(Default)]
    pub(crate) struct ManualScheduler {
        now: Duration,
        seq: u64,
        queue: Vec<Entry>,
    }

    impl ManualScheduler {
        pub(crate) fn now(&self) -> Duration {
            self.now
        }

        /// Timers still armed, earliest first.
        pub(crate) fn armed(&self) -> Vec<Timer> {
            let mut live: Vec<&Entry> = self
                .queue
                .iter()
                .filter(|entry| !entry.cancelled.load(Ordering::SeqCst))
                .collect();
            live.sort_by_key(|entry| (entry.due, entry.seq));
            live.into_iter().map(|entry| entry.timer).collect()
        }

        /// Remove and return the earliest armed timer due at or before
        /// `until`, moving the clock to its due time.
        pub(crate) fn pop_due(&mut self, until: Duration) -> Option<Timer> {
            self.queue
                .retain(|entry| !entry.cancelled.load(Ordering::SeqCst));
            let index = self
                .queue
                .iter()
                .enumerate()
                .filter(|(_, entry)| entry.due <= until)
                .min_by_key(|(_, entry)| (entry.due, entry.seq))
                .map(|(index, _)| index)?;
            let entry = self.queue.remove(index);
            self.now = entry.due;
            Some(entry.timer)
        }

        pub(crate) fn set_now(&mut self, now: Duration) {
            self.now = now;
        }
    }

    impl Scheduler for ManualScheduler {
        fn schedule(&mut self, delay: Duration, timer: Timer) -> TimerHandle {
            let cancelled = Arc::new(AtomicBool::new(false));
            self.seq += 1;
            self.queue.push(Entry {
                due: self.now + delay,
                seq: self.seq,
                timer,
                cancelled: cancelled.clone(),
            });
            TimerHandle::new(move || cancelled.store(true, Ordering::SeqCst))
        }
    }
}
