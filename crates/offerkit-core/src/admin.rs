//! Operational surface: inspect everything that is persisted, and wipe it.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::records::{Comment, ContactMethod, Lead};
use crate::stock::StockState;
use crate::storage::{keys, Store};

/// Every persisted key, decoded. Corrupt values show up as empty/`None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageSnapshot {
    pub leads: Vec<Lead>,
    pub comments: Vec<Comment>,
    pub countdown_start: Option<DateTime<Utc>>,
    pub stock_state: Option<StockState>,
}

pub fn snapshot(store: &Store) -> StorageSnapshot {
    StorageSnapshot {
        leads: store.get_or_empty(keys::LEADS),
        comments: store.get_or_empty(keys::COMMENTS),
        countdown_start: store.get(keys::COUNTDOWN_START),
        stock_state: store.get(keys::STOCK_STATE),
    }
}

pub fn export_json(store: &Store) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&snapshot(store))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LeadStats {
    pub total: usize,
    pub last_24h: usize,
    pub whatsapp: usize,
    pub with_email: usize,
}

pub fn lead_stats(leads: &[Lead], now: DateTime<Utc>) -> LeadStats {
    let since = now - Duration::hours(24);
    LeadStats {
        total: leads.len(),
        last_24h: leads.iter().filter(|l| l.created_at > since).count(),
        whatsapp: leads
            .iter()
            .filter(|l| l.preferred_contact == ContactMethod::Whatsapp)
            .count(),
        with_email: leads.iter().filter(|l| l.email.is_some()).count(),
    }
}

/// Remove all four keys. The next engine reads start from scratch.
pub fn clear_all(store: &Store) {
    for key in keys::ALL {
        store.remove(key);
    }
    info!("cleared all offer data");
}

/// Remove only the captured leads.
pub fn clear_leads(store: &Store) {
    store.remove(keys::LEADS);
}
