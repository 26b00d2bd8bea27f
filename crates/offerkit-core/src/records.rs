//! Lead and comment records.
//!
//! Records are immutable once created. The store treats them as opaque
//! payloads; the only checks happen here, at intake.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::storage::{keys, ContactConfig, Store};

const NOTE_MAX: usize = 500;
const COMMENT_MIN: usize = 10;
const COMMENT_MAX: usize = 500;
const NAME_MIN: usize = 2;
const PHONE_MIN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContactMethod {
    Phone,
    Telegram,
    #[default]
    Whatsapp,
}

impl ContactMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactMethod::Phone => "phone",
            ContactMethod::Telegram => "telegram",
            ContactMethod::Whatsapp => "whatsapp",
        }
    }
}

impl std::str::FromStr for ContactMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "phone" => Ok(ContactMethod::Phone),
            "telegram" => Ok(ContactMethod::Telegram),
            "whatsapp" => Ok(ContactMethod::Whatsapp),
            _ => Err(ValidationError::Malformed {
                field: "contact method",
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub id: String,
    pub name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub preferred_contact: ContactMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub name: String,
    pub text: String,
    pub date: DateTime<Utc>,
}

/// Raw lead form input.
#[derive(Debug, Clone, Default)]
pub struct LeadForm {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub preferred_contact: ContactMethod,
    pub note: String,
}

impl LeadForm {
    /// Check the form and build a trimmed [`Lead`]. Empty optional fields
    /// become `None`.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<Lead, ValidationError> {
        let name = self.name.trim();
        check_name(name)?;

        let phone = self.phone.trim();
        if phone.is_empty() {
            return Err(ValidationError::Required {
                field: "phone number",
            });
        }
        if !is_phone(phone) {
            return Err(ValidationError::Malformed {
                field: "phone number",
            });
        }

        let email = self.email.trim();
        if !email.is_empty() && !is_email(email) {
            return Err(ValidationError::Malformed {
                field: "email address",
            });
        }

        let note = self.note.trim();
        if note.chars().count() > NOTE_MAX {
            return Err(ValidationError::TooLong {
                field: "note",
                max: NOTE_MAX,
            });
        }

        Ok(Lead {
            id: generate_id(now),
            name: name.to_string(),
            phone: phone.to_string(),
            email: non_empty(email),
            preferred_contact: self.preferred_contact,
            note: non_empty(note),
            created_at: now,
        })
    }
}

/// Raw comment form input.
#[derive(Debug, Clone, Default)]
pub struct CommentForm {
    pub name: String,
    pub text: String,
}

impl CommentForm {
    pub fn validate(&self, now: DateTime<Utc>) -> Result<Comment, ValidationError> {
        let name = self.name.trim();
        check_name(name)?;

        let text = self.text.trim();
        let len = text.chars().count();
        if len == 0 {
            return Err(ValidationError::Required { field: "comment" });
        }
        if len < COMMENT_MIN {
            return Err(ValidationError::TooShort {
                field: "comment",
                min: COMMENT_MIN,
            });
        }
        if len > COMMENT_MAX {
            return Err(ValidationError::TooLong {
                field: "comment",
                max: COMMENT_MAX,
            });
        }

        Ok(Comment {
            id: generate_id(now),
            name: name.to_string(),
            text: text.to_string(),
            date: now,
        })
    }
}

fn check_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::Required { field: "name" });
    }
    if name.chars().count() < NAME_MIN {
        return Err(ValidationError::TooShort {
            field: "name",
            min: NAME_MIN,
        });
    }
    Ok(())
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

fn is_phone(phone: &str) -> bool {
    phone.chars().count() >= PHONE_MIN
        && phone
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_whitespace() || "+-()".contains(c))
}

/// `local@domain.tld`: a single `@`, no whitespace, and a dot strictly
/// inside the domain.
fn is_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// `<epoch-ms>-<9 base36 chars>`.
pub fn generate_id(now: DateTime<Utc>) -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]))
        .collect();
    format!("{}-{}", now.timestamp_millis(), suffix)
}

// ── Persistence ──────────────────────────────────────────────────────

/// Leads are kept in arrival order.
pub fn submit_lead(store: &Store, lead: Lead) -> bool {
    store.append(keys::LEADS, lead)
}

/// Comments are kept newest first.
pub fn submit_comment(store: &Store, comment: Comment) -> bool {
    store.prepend(keys::COMMENTS, comment)
}

pub fn leads(store: &Store) -> Vec<Lead> {
    store.get_or_empty(keys::LEADS)
}

pub fn comments(store: &Store) -> Vec<Comment> {
    store.get_or_empty(keys::COMMENTS)
}

// ── Contact links ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactLinks {
    pub phone: String,
    pub telegram: String,
    pub whatsapp: String,
}

impl ContactLinks {
    pub fn for_method(&self, method: ContactMethod) -> &str {
        match method {
            ContactMethod::Phone => &self.phone,
            ContactMethod::Telegram => &self.telegram,
            ContactMethod::Whatsapp => &self.whatsapp,
        }
    }
}

/// Follow-up links carrying a prefilled, URL-encoded message.
pub fn contact_links(contact: &ContactConfig, user_name: &str) -> ContactLinks {
    let message = format!(
        "Hi! I'm interested in the {}. My name is {}. Please contact me about this offer.",
        contact.product_name, user_name
    );
    let message = urlencoding::encode(&message);
    ContactLinks {
        phone: format!("tel:{}", contact.phone),
        telegram: format!(
            "https://t.me/{}?text={}",
            contact.telegram_username, message
        ),
        whatsapp: format!("https://wa.me/{}?text={}", contact.whatsapp_number, message),
    }
}

/// "3 hours ago" style relative time; future instants read as "just now".
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    const INTERVALS: [(&str, i64); 6] = [
        ("year", 31_536_000),
        ("month", 2_592_000),
        ("week", 604_800),
        ("day", 86_400),
        ("hour", 3_600),
        ("minute", 60),
    ];

    let secs = (now - then).num_seconds();
    for (label, span) in INTERVALS {
        let count = secs / span;
        if count >= 1 {
            let plural = if count > 1 { "s" } else { "" };
            return format!("{count} {label}{plural} ago");
        }
    }
    "just now".to_string()
}
