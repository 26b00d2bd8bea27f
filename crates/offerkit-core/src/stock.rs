//! Decaying stock counter.
//!
//! The counter starts at `initial_stock` and loses one unit per elapsed
//! decay interval, never dropping below `min_floor` and never restocking.
//! The interval is perturbed by a per-day jitter so the cadence is stable
//! within a calendar day but differs from one day to the next.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::error::ValidationError;
use crate::storage::{keys, Store};

/// Jitter spans `[-JITTER_SPAN_MIN / 2, +JITTER_SPAN_MIN / 2]` minutes.
const JITTER_SPAN_MIN: f64 = 10.0;

/// Lower bound on the jittered interval, so a small base interval cannot
/// produce a zero or negative period.
pub const MIN_EFFECTIVE_INTERVAL_MIN: f64 = 1.0;

/// Validated decay parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockConfig {
    initial_stock: u32,
    min_floor: u32,
    base_interval_minutes: u32,
}

impl StockConfig {
    pub fn new(
        initial_stock: u32,
        min_floor: u32,
        base_interval_minutes: u32,
    ) -> Result<Self, ValidationError> {
        if min_floor > initial_stock {
            return Err(ValidationError::InvalidValue {
                field: "min_floor".into(),
                message: format!("floor {min_floor} exceeds initial stock {initial_stock}"),
            });
        }
        if base_interval_minutes == 0 {
            return Err(ValidationError::InvalidValue {
                field: "base_interval_minutes".into(),
                message: "decay interval must be positive".into(),
            });
        }
        Ok(Self {
            initial_stock,
            min_floor,
            base_interval_minutes,
        })
    }

    pub fn initial_stock(&self) -> u32 {
        self.initial_stock
    }

    pub fn min_floor(&self) -> u32 {
        self.min_floor
    }

    pub fn base_interval_minutes(&self) -> u32 {
        self.base_interval_minutes
    }
}

/// Persisted counter state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockState {
    pub initial: u32,
    pub current: u32,
    pub last_tick_at: DateTime<Utc>,
}

/// Source of the interval perturbation, in minutes.
pub trait Jitter: Send + Sync {
    fn offset_minutes(&self, now: DateTime<Utc>) -> f64;
}

/// Jitter seeded by the UTC day of the year.
#[derive(Debug, Clone, Copy, Default)]
pub struct DailyJitter;

impl Jitter for DailyJitter {
    fn offset_minutes(&self, now: DateTime<Utc>) -> f64 {
        let seed = format!("stock-{}", now.ordinal());
        deterministic_random(&seed) * JITTER_SPAN_MIN - JITTER_SPAN_MIN / 2.0
    }
}

/// Constant offset; `FixedJitter(0.0)` disables jitter.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedJitter(pub f64);

impl Jitter for FixedJitter {
    fn offset_minutes(&self, _now: DateTime<Utc>) -> f64 {
        self.0
    }
}

/// Map a seed string to a stable value in `[0, 1)`.
///
/// Rolling `h * 31 + unit` over the UTF-16 code units with 32-bit wrapping,
/// then the magnitude's low 31 bits scaled by 2^-31.
pub fn deterministic_random(seed: &str) -> f64 {
    let hash = seed
        .encode_utf16()
        .fold(0i32, |h, unit| {
            h.wrapping_shl(5).wrapping_sub(h).wrapping_add(i32::from(unit))
        });
    f64::from(hash.unsigned_abs() & 0x7fff_ffff) / 2_147_483_648.0
}

/// Reads and decays the persisted stock counter.
#[derive(Clone)]
pub struct StockEngine {
    store: Store,
    clock: Arc<dyn Clock>,
    jitter: Arc<dyn Jitter>,
}

impl StockEngine {
    pub fn new(store: Store) -> Self {
        Self::with_parts(store, Arc::new(SystemClock), Arc::new(DailyJitter))
    }

    pub fn with_parts(store: Store, clock: Arc<dyn Clock>, jitter: Arc<dyn Jitter>) -> Self {
        Self {
            store,
            clock,
            jitter,
        }
    }

    /// Current stock, after applying any decay owed since the last tick.
    pub fn read(&self, config: &StockConfig) -> u32 {
        let now = self.clock.now();

        let Some(state) = self.store.get::<StockState>(keys::STOCK_STATE) else {
            let state = StockState {
                initial: config.initial_stock,
                current: config.initial_stock,
                last_tick_at: now,
            };
            debug!(initial = state.initial, "initializing stock counter");
            self.store.set(keys::STOCK_STATE, &state);
            return state.current;
        };

        let current = clamp_current(&state, config);
        let effective = self.effective_interval(config, now);
        let minutes_since = (now - state.last_tick_at).num_milliseconds() as f64 / 60_000.0;

        if minutes_since >= effective && current > config.min_floor {
            let decrements = (minutes_since / effective).floor();
            let owed = if decrements >= f64::from(u32::MAX) {
                u32::MAX
            } else {
                decrements as u32
            };
            let next = current.saturating_sub(owed).max(config.min_floor);
            debug!(from = current, to = next, minutes_since, effective, "stock decayed");

            self.store.set(
                keys::STOCK_STATE,
                &StockState {
                    current: next,
                    last_tick_at: now,
                    ..state
                },
            );
            return next;
        }

        current
    }

    /// Jittered decay interval for `now`, in minutes.
    pub fn effective_interval(&self, config: &StockConfig, now: DateTime<Utc>) -> f64 {
        let interval = f64::from(config.base_interval_minutes) + self.jitter.offset_minutes(now);
        interval.max(MIN_EFFECTIVE_INTERVAL_MIN)
    }
}

/// Keep a hand-edited state inside `[min_floor, initial]`.
fn clamp_current(state: &StockState, config: &StockConfig) -> u32 {
    let ceiling = state.initial.max(config.min_floor);
    state.current.clamp(config.min_floor, ceiling)
}
