//! Debounced value propagation
//!
//! Holds a pending and a settled value and promotes pending -> settled
//! only after a quiet period without further input. Every `set` disarms
//! the previous timer; each armed timer carries the epoch it was armed
//! at and promotes only if no newer input arrived in the meantime.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Quiet period used by the search box
pub const DEFAULT_SEARCH_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug)]
struct Slot<T> {
    epoch: u64,
    pending: Option<T>,
    timer: Option<JoinHandle<()>>,
}

/// Trailing debounce over a value observed through a `watch` channel.
///
/// `set` must be called from within a tokio runtime because arming the
/// timer spawns a task.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    slot: Arc<Mutex<Slot<T>>>,
    settled: Arc<watch::Sender<T>>,
    immediate: fn(&T) -> bool,
}

fn never<T>(_: &T) -> bool {
    false
}

#[allow(clippy::ptr_arg)]
fn is_blank(value: &String) -> bool {
    value.is_empty()
}

impl<T> Debouncer<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(initial: T, delay: Duration) -> Self {
        Self::with_immediate(initial, delay, never::<T>)
    }

    /// Values for which `immediate` holds skip the quiet period
    pub fn with_immediate(initial: T, delay: Duration, immediate: fn(&T) -> bool) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self {
            delay,
            slot: Arc::new(Mutex::new(Slot {
                epoch: 0,
                pending: None,
                timer: None,
            })),
            settled: Arc::new(tx),
            immediate,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn settled(&self) -> T {
        self.settled.borrow().clone()
    }

    pub fn pending(&self) -> Option<T> {
        self.lock().pending.clone()
    }

    pub fn has_pending(&self) -> bool {
        self.lock().pending.is_some()
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.settled.subscribe()
    }

    /// Record new input, restarting the quiet period
    pub fn set(&self, value: T) {
        let mut slot = self.lock();
        slot.epoch += 1;
        if let Some(timer) = slot.timer.take() {
            timer.abort();
        }

        if (self.immediate)(&value) {
            slot.pending = None;
            promote(&self.settled, value);
            return;
        }

        slot.pending = Some(value);
        let epoch = slot.epoch;
        let delay = self.delay;
        let shared = Arc::clone(&self.slot);
        let settled = Arc::clone(&self.settled);

        slot.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut slot = shared.lock().unwrap_or_else(PoisonError::into_inner);
            // A newer set() or cancel() bumped the epoch: this timer is stale
            if slot.epoch != epoch {
                return;
            }
            slot.timer = None;
            if let Some(value) = slot.pending.take() {
                promote(&settled, value);
            }
        }));
    }

    /// Promote the pending value now (e.g. the search form was submitted)
    pub fn flush(&self) {
        let mut slot = self.lock();
        slot.epoch += 1;
        if let Some(timer) = slot.timer.take() {
            timer.abort();
        }
        if let Some(value) = slot.pending.take() {
            promote(&self.settled, value);
        }
    }

    /// Disarm the timer and forget the pending value
    pub fn cancel(&self) {
        let mut slot = self.lock();
        slot.epoch += 1;
        slot.pending = None;
        if let Some(timer) = slot.timer.take() {
            timer.abort();
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Debouncer<String> {
    /// Search-box debouncer: clearing the box propagates immediately
    pub fn for_search(initial: impl Into<String>, delay: Duration) -> Self {
        Self::with_immediate(initial.into(), delay, is_blank)
    }
}

fn promote<T: PartialEq>(settled: &watch::Sender<T>, value: T) {
    settled.send_if_modified(|current| {
        if *current == value {
            false
        } else {
            *current = value;
            true
        }
    });
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.epoch += 1;
        slot.pending = None;
        if let Some(timer) = slot.timer.take() {
            timer.abort();
        }
    }
}
