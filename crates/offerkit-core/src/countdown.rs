//! Rolling countdown engine.
//!
//! The countdown never ends: when the deadline passes, the persisted window
//! start is replaced with the current instant on the same read, so callers
//! always see a positive remaining time.
//!
//! ## State Transitions
//!
//! ```text
//! (absent) -> Running -> Expired -> Running
//!                         `--- collapsed within one read
//! ```
//!
//! The engine has no internal timer; a display calls [`CountdownEngine::read`]
//! once per second (see [`crate::tick`]).

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::storage::{keys, Store};

/// Remaining time, floor-decomposed for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayTime {
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub total_ms: i64,
}

impl DisplayTime {
    pub fn from_millis(total_ms: i64) -> Self {
        let total_secs = total_ms.max(0) / 1000;
        Self {
            hours: total_secs / 3600,
            minutes: (total_secs % 3600) / 60,
            seconds: total_secs % 60,
            total_ms,
        }
    }

    /// `HH:MM:SS`; hours may exceed two digits for long windows.
    pub fn formatted(&self) -> String {
        if self.total_ms <= 0 {
            return "00:00:00".to_string();
        }
        format!("{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }

    /// Remaining share of `window`, rounded to a whole percent in 0..=100.
    pub fn progress_pct(&self, window: Duration) -> u8 {
        let window_ms = window.num_milliseconds();
        if self.total_ms <= 0 || window_ms <= 0 {
            return 0;
        }
        if self.total_ms >= window_ms {
            return 100;
        }
        ((self.total_ms as f64 / window_ms as f64) * 100.0).round() as u8
    }
}

/// Reads and maintains the persisted countdown start.
#[derive(Clone)]
pub struct CountdownEngine {
    store: Store,
    clock: Arc<dyn Clock>,
}

impl CountdownEngine {
    pub fn new(store: Store) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Store, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Time left in the current window. Always in `(0, window]` for a
    /// positive `window`.
    pub fn read(&self, window: Duration) -> DisplayTime {
        let now = self.clock.now();

        let start = match self.store.get::<DateTime<Utc>>(keys::COUNTDOWN_START) {
            Some(start) if start <= now => start,
            Some(start) => {
                debug!(%start, %now, "countdown start lies in the future, restarting window");
                self.restart(now)
            }
            None => {
                debug!(%now, "initializing countdown");
                self.restart(now)
            }
        };

        let Some(deadline) = start.checked_add_signed(window) else {
            warn!(%start, hours = window.num_hours(), "countdown deadline out of range");
            return DisplayTime::from_millis(window.num_milliseconds());
        };
        if now >= deadline {
            debug!(%deadline, "countdown expired, rolling over");
            self.restart(now);
            return DisplayTime::from_millis(window.num_milliseconds());
        }

        DisplayTime::from_millis((deadline - now).num_milliseconds())
    }

    /// Whether no window has been started yet on this store.
    pub fn is_first_visit(&self) -> bool {
        self.store
            .get::<DateTime<Utc>>(keys::COUNTDOWN_START)
            .is_none()
    }

    fn restart(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.store.set(keys::COUNTDOWN_START, &now);
        now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::{KvBackend, MemoryBackend};
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 10, 5, 9, 30, 0).unwrap()
    }

    fn engine_at(store: &Store, at: DateTime<Utc>) -> (CountdownEngine, ManualClock) {
        let clock = ManualClock::new(at);
        let engine = CountdownEngine::with_clock(store.clone(), Arc::new(clock.clone()));
        (engine, clock)
    }

    #[test]
    fn fresh_state_returns_full_window() {
        let store = Store::in_memory();
        let (engine, _) = engine_at(&store, t0());
        assert!(engine.is_first_visit());

        let left = engine.read(Duration::hours(48));
        assert_eq!(left.total_ms, Duration::hours(48).num_milliseconds());
        assert_eq!(left.hours, 48);
        assert_eq!(store.get::<DateTime<Utc>>(keys::COUNTDOWN_START), Some(t0()));
        assert!(!engine.is_first_visit());
    }

    #[test]
    fn one_second_in_reads_47_59_59() {
        let store = Store::in_memory();
        let (engine, clock) = engine_at(&store, t0());
        engine.read(Duration::hours(48));

        clock.advance(Duration::seconds(1));
        let left = engine.read(Duration::hours(48));
        assert_eq!((left.hours, left.minutes, left.seconds), (47, 59, 59));
        assert_eq!(left.formatted(), "47:59:59");
    }

    #[test]
    fn expired_window_rolls_over() {
        let store = Store::in_memory();
        store.set(keys::COUNTDOWN_START, &(t0() - Duration::hours(49)));
        let (engine, _) = engine_at(&store, t0());

        let left = engine.read(Duration::hours(48));
        assert!(left.total_ms > 0);
        assert!(left.total_ms <= Duration::hours(48).num_milliseconds());
        assert_eq!(store.get::<DateTime<Utc>>(keys::COUNTDOWN_START), Some(t0()));
    }

    #[test]
    fn exact_deadline_counts_as_expired() {
        let store = Store::in_memory();
        let (engine, clock) = engine_at(&store, t0());
        engine.read(Duration::hours(1));

        clock.advance(Duration::hours(1));
        let left = engine.read(Duration::hours(1));
        assert_eq!(left.total_ms, Duration::hours(1).num_milliseconds());
    }

    #[test]
    fn corrupt_start_reinitializes() {
        let backend = MemoryBackend::new();
        backend
            .set_raw(keys::COUNTDOWN_START, "definitely not json")
            .unwrap();
        let store = Store::new(backend);
        let (engine, _) = engine_at(&store, t0());

        let left = engine.read(Duration::hours(48));
        assert_eq!(left.total_ms, Duration::hours(48).num_milliseconds());
        assert_eq!(store.get::<DateTime<Utc>>(keys::COUNTDOWN_START), Some(t0()));
    }

    #[test]
    fn future_start_restarts_window() {
        let store = Store::in_memory();
        store.set(keys::COUNTDOWN_START, &(t0() + Duration::hours(3)));
        let (engine, _) = engine_at(&store, t0());

        let left = engine.read(Duration::hours(48));
        assert_eq!(left.total_ms, Duration::hours(48).num_milliseconds());
    }

    #[test]
    fn reads_inside_window_do_not_write() {
        let store = Store::in_memory();
        let (engine, clock) = engine_at(&store, t0());
        engine.read(Duration::hours(48));

        // Overwrite with a marker; an unexpected write would clobber it.
        let marker = t0() - Duration::minutes(5);
        store.set(keys::COUNTDOWN_START, &marker);
        clock.advance(Duration::minutes(10));
        engine.read(Duration::hours(48));
        assert_eq!(store.get::<DateTime<Utc>>(keys::COUNTDOWN_START), Some(marker));
    }

    #[test]
    fn two_displays_converge_on_one_deadline() {
        let store = Store::in_memory();
        let (hero, clock) = engine_at(&store, t0());
        let sticky = CountdownEngine::with_clock(store.clone(), Arc::new(clock.clone()));

        hero.read(Duration::hours(48));
        clock.advance(Duration::seconds(30));
        assert_eq!(
            hero.read(Duration::hours(48)),
            sticky.read(Duration::hours(48))
        );
    }

    #[test]
    fn failed_persistence_still_returns_full_window() {
        let store = Store::new(MemoryBackend::with_quota(0));
        let (engine, _) = engine_at(&store, t0());
        let left = engine.read(Duration::hours(48));
        assert_eq!(left.total_ms, Duration::hours(48).num_milliseconds());
    }

    #[test]
    fn unrepresentable_deadline_returns_full_window() {
        let store = Store::in_memory();
        let (engine, _) = engine_at(&store, t0());
        let window = Duration::hours(i64::from(u32::MAX));

        let left = engine.read(window);
        assert_eq!(left.total_ms, window.num_milliseconds());
        assert_eq!(left.hours, i64::from(u32::MAX));
        assert_eq!(engine.read(window), left);
    }

    #[test]
    fn formatting_and_progress() {
        let window = Duration::hours(48);
        let half = DisplayTime::from_millis(Duration::hours(24).num_milliseconds());
        assert_eq!(half.formatted(), "24:00:00");
        assert_eq!(half.progress_pct(window), 50);

        let zero = DisplayTime::from_millis(0);
        assert_eq!(zero.formatted(), "00:00:00");
        assert_eq!(zero.progress_pct(window), 0);

        let full = DisplayTime::from_millis(window.num_milliseconds());
        assert_eq!(full.progress_pct(window), 100);

        let odd = DisplayTime::from_millis(3_725_999);
        assert_eq!((odd.hours, odd.minutes, odd.seconds), (1, 2, 5));
    }

    proptest! {
        #[test]
        fn remaining_stays_within_window(
            window_secs in 1i64..200_000,
            steps in proptest::collection::vec(0i64..400_000, 1..20),
        ) {
            let window = Duration::seconds(window_secs);
            let store = Store::in_memory();
            let (engine, clock) = engine_at(&store, t0());

            let mut previous = engine.read(window).total_ms;
            prop_assert!(previous > 0 && previous <= window.num_milliseconds());

            for step in steps {
                clock.advance(Duration::seconds(step));
                let left = engine.read(window).total_ms;
                prop_assert!(left > 0);
                prop_assert!(left <= window.num_milliseconds());
                // Within a window time only runs down; after a rollover it
                // restarts at the full window.
                prop_assert!(left <= previous || left == window.num_milliseconds());
                previous = left;
            }
        }
    }
}
