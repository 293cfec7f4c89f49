use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use teatrade_core::ContactMessageId;

use crate::record::Record;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContactMessage {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub company: Option<String>,
    pub message: String,
}

/// A submission of the public contact form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub id: ContactMessageId,
    #[serde(flatten)]
    pub content: NewContactMessage,
    pub received_at: DateTime<Utc>,
}

impl ContactMessage {
    pub fn receive(content: NewContactMessage, now: DateTime<Utc>) -> Self {
        Self {
            id: ContactMessageId::new(),
            content: NewContactMessage {
                name: content.name.trim().to_string(),
                email: content.email.trim().to_string(),
                company: content.company.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()),
                message: content.message,
            },
            received_at: now,
        }
    }
}

impl Record for ContactMessage {
    const KIND: &'static str = "contact_message";

    fn id(&self) -> Uuid {
        self.id.into()
    }
}
