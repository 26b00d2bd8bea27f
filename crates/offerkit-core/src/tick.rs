//! Periodic driver for engine reads.
//!
//! Engines are pure `read` calls; a display that wants live values spawns a
//! [`Ticker`] which calls the producer once immediately and then once per
//! period, handing each value to a sink. Dropping or cancelling the returned
//! [`TickHandle`] stops the timer. Persisted state is unaffected either way.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

/// Countdown displays refresh once per second.
pub const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

/// Stock displays refresh once per minute.
pub const STOCK_TICK: Duration = Duration::from_secs(60);

pub struct Ticker;

impl Ticker {
    /// Spawn a ticking task on the current tokio runtime.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime, or if `period` is zero.
    pub fn spawn<T, P, S>(period: Duration, mut producer: P, mut sink: S) -> TickHandle
    where
        T: Send + 'static,
        P: FnMut() -> T + Send + 'static,
        S: FnMut(T) + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let mut interval = time::interval(period);
            // A stalled display should pick up the current value, not replay
            // every tick it missed.
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                sink(producer());
            }
        });
        TickHandle { task }
    }
}

/// Owner of a running ticker. The timer stops when this is cancelled or
/// dropped.
#[derive(Debug)]
pub struct TickHandle {
    task: JoinHandle<()>,
}

impl TickHandle {
    pub fn cancel(self) {
        // Drop aborts.
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
