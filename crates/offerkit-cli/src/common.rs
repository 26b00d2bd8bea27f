//! Shared plumbing for command handlers.

use std::time::Duration;

use offerkit_core::{Config, Store, Ticker};
use tokio::sync::mpsc;
use tracing::debug;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Loaded configuration plus the store every command works against.
pub struct Context {
    pub config: Config,
    pub store: Store,
}

impl Context {
    pub fn open(memory: bool) -> Result<Self, Box<dyn std::error::Error>> {
        let config = Config::load()?;
        debug!(memory, backend = ?config.storage.backend, "opening store");
        let store = if memory {
            Store::in_memory()
        } else {
            Store::open(&config.storage)?
        };
        Ok(Self { config, store })
    }
}

/// Drive `producer` on a ticker and hand each value to `render` until
/// Ctrl-C, or until `limit` values have been shown.
pub fn watch<T, P, R>(period: Duration, producer: P, limit: Option<usize>, mut render: R) -> CliResult
where
    T: Send + 'static,
    P: FnMut() -> T + Send + 'static,
    R: FnMut(T),
{
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = Ticker::spawn(period, producer, move |value| {
            // The receiver only goes away during shutdown.
            let _ = tx.send(value);
        });

        let mut shown = 0usize;
        loop {
            tokio::select! {
                value = rx.recv() => {
                    let Some(value) = value else { break };
                    render(value);
                    shown += 1;
                    if limit.is_some_and(|n| shown >= n) {
                        break;
                    }
                }
                _ = tokio::signal::ctrl_c() => break,
            }
        }
        handle.cancel();
    });
    Ok(())
}
