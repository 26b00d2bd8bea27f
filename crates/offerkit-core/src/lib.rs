//! # offerkit Core Library
//!
//! State core for a promotional landing page: a countdown that never runs
//! out, a stock counter that slowly decays, and the lead/comment collections
//! the page's forms capture. Everything persists through one injected
//! key-value [`Store`]; the `offerkit` CLI is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Storage**: typed JSON store over a SQLite or in-memory backend, plus
//!   TOML configuration
//! - **Engines**: [`CountdownEngine`] and [`StockEngine`], pure `read` calls
//!   over persisted state and an injected [`Clock`]
//! - **Tick**: tokio-driven periodic reads for live displays
//! - **Records / CSV / Admin**: lead and comment intake, export, inspection
//!   and reset

pub mod admin;
pub mod clock;
pub mod countdown;
pub mod csv;
pub mod error;
pub mod records;
pub mod stock;
pub mod storage;
pub mod tick;

pub use clock::{Clock, ManualClock, SystemClock};
pub use countdown::{CountdownEngine, DisplayTime};
pub use error::{ConfigError, CoreError, StoreError, ValidationError};
pub use records::{Comment, CommentForm, ContactMethod, Lead, LeadForm};
pub use stock::{DailyJitter, FixedJitter, Jitter, StockConfig, StockEngine, StockState};
pub use storage::{Config, KvBackend, MemoryBackend, SqliteBackend, Store};
pub use tick::{TickHandle, Ticker};
