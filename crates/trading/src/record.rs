use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use teatrade_core::DomainResult;

/// A record the store can persist.
///
/// Records are stored as JSON under `(KIND, id)`. A record with a natural key
/// returns it from [`Record::unique_key`]; the store rejects a second record
/// of the same kind with the same key.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Store-level kind name (e.g. `"catalog"`).
    const KIND: &'static str;

    fn id(&self) -> Uuid;

    fn unique_key(&self) -> Option<String> {
        None
    }
}

/// Who is changing a record, and when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditContext {
    pub now: DateTime<Utc>,
    pub actor: String,
}

impl EditContext {
    pub fn new(now: DateTime<Utc>, actor: impl Into<String>) -> Self {
        Self {
            now,
            actor: actor.into(),
        }
    }
}

/// A record with plain create/replace semantics.
///
/// `Details` is the caller-supplied part of the record (request body or
/// import row); identity and timestamps are owned by the record.
pub trait Editable: Record {
    type Details: DeserializeOwned + Clone + Send + Sync + 'static;

    /// Top-level string fields a list request may filter on.
    const FILTERS: &'static [&'static str];

    fn create(details: Self::Details, ctx: &EditContext) -> DomainResult<Self>;

    fn revise(&mut self, details: Self::Details, ctx: &EditContext) -> DomainResult<()>;
}

pub(crate) fn require_text(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(teatrade_core::DomainError::validation(format!(
            "{field} cannot be empty"
        )));
    }
    Ok(())
}

pub(crate) fn require_positive(field: &str, value: f64) -> DomainResult<()> {
    if !(value.is_finite() && value > 0.0) {
        return Err(teatrade_core::DomainError::validation(format!(
            "{field} must be greater than 0"
        )));
    }
    Ok(())
}
