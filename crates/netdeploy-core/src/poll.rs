//! Cancellable polling bridge for event-driven native operations.
//!
//! Native deployment mechanisms expose "start", "cancel", and a completion
//! event, but no cancellation token. [`run_cancellable`] starts the operation,
//! then checks a [`CompletionSlot`] and the caller's token on a fixed interval
//! until one of them fires. Completion is checked first on every tick, so a
//! result that lands in the same tick as a cancellation request wins.
//!
//! The token is never consulted before `start`: an already-cancelled token
//! still starts the native operation once and cancels it on the first tick.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use log::trace;
use netdeploy_backend::DeployError;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    interval: Duration,
}

impl PollOptions {
    /// Intervals below one millisecond are raised to one millisecond.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(MIN_POLL_INTERVAL),
        }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for PollOptions {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

enum SlotState<T> {
    Pending,
    Resolved(T),
    Consumed,
}

/// Write-once cell resolved by a native completion handler.
pub struct CompletionSlot<T> {
    state: Arc<Mutex<SlotState<T>>>,
}

impl<T> Clone for CompletionSlot<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T> Default for CompletionSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CompletionSlot<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SlotState::Pending)),
        }
    }

    /// Stores `value` if nothing was stored before. Returns whether this call
    /// resolved the slot.
    pub fn resolve(&self, value: T) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(*state, SlotState::Pending) {
            *state = SlotState::Resolved(value);
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        !matches!(*state, SlotState::Pending)
    }

    fn take(&self) -> Option<T> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match std::mem::replace(&mut *state, SlotState::Consumed) {
            SlotState::Resolved(value) => Some(value),
            SlotState::Pending => {
                *state = SlotState::Pending;
                None
            }
            SlotState::Consumed => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    Completed(T),
    Cancelled,
}

impl<T> PollOutcome<T> {
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Cancelled => None,
        }
    }
}

/// Runs the poll loop on the calling thread.
///
/// # Errors
/// Returns whatever `start` or `cancel` return; the loop stops at the first
/// error.
pub fn run_blocking<T, S, C>(
    start: S,
    cancel: C,
    slot: &CompletionSlot<T>,
    token: &CancellationToken,
    options: PollOptions,
) -> Result<PollOutcome<T>, DeployError>
where
    S: FnOnce() -> Result<(), DeployError>,
    C: FnOnce() -> Result<(), DeployError>,
{
    start()?;

    loop {
        if let Some(value) = slot.take() {
            return Ok(PollOutcome::Completed(value));
        }
        if token.is_cancelled() {
            cancel()?;
            return Ok(PollOutcome::Cancelled);
        }
        std::thread::sleep(options.interval());
    }
}

/// Runs the poll loop on a dedicated blocking worker and awaits it.
///
/// The worker is held for the whole operation, so the native completion
/// handler must not depend on the awaiting task making progress. Dropping the
/// returned future cancels the worker's token, so the native `cancel` runs on
/// the worker's next tick and the worker exits.
///
/// # Errors
/// Returns errors from `start`/`cancel`, or [`DeployError::PollAborted`] if the
/// runtime drops the worker before it finishes. Panics inside the worker are
/// resumed on the caller.
pub async fn run_cancellable<T, S, C>(
    operation: &'static str,
    start: S,
    cancel: C,
    slot: CompletionSlot<T>,
    token: CancellationToken,
    options: PollOptions,
) -> Result<PollOutcome<T>, DeployError>
where
    T: Send + 'static,
    S: FnOnce() -> Result<(), DeployError> + Send + 'static,
    C: FnOnce() -> Result<(), DeployError> + Send + 'static,
{
    trace!(
        "Polling {operation} every {}ms",
        options.interval().as_millis()
    );

    let worker_token = token.child_token();
    let _cancel_on_drop = worker_token.clone().drop_guard();
    let worker = tokio::task::spawn_blocking(move || {
        run_blocking(start, cancel, &slot, &worker_token, options)
    });

    match worker.await {
        Ok(outcome) => outcome,
        Err(error) if error.is_panic() => std::panic::resume_unwind(error.into_panic()),
        Err(_) => Err(DeployError::PollAborted { operation }),
    }
}
