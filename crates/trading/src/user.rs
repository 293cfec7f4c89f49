use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use teatrade_core::UserId;

use crate::record::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    pub const ALL: &'static [&'static str] = &["user", "admin"];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// Local profile of an identity-provider user.
///
/// Created the first time a token subject calls `GET /me`, refreshed on later
/// calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub sub: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub const FILTERS: &'static [&'static str] = &["sub", "email", "role"];

    pub fn register(
        sub: impl Into<String>,
        email: Option<String>,
        name: Option<String>,
        token_admin: bool,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: UserId::new(),
            sub: sub.into(),
            email,
            name,
            role: if token_admin { UserRole::Admin } else { UserRole::User },
            created_at: now,
            updated_at: now,
        }
    }

    /// Refresh profile fields from a newer token.
    ///
    /// Returns whether anything changed. A token carrying the admin group
    /// promotes the user; a token without it never demotes (roles granted
    /// through the admin API stick).
    pub fn refresh(
        &mut self,
        email: Option<String>,
        name: Option<String>,
        token_admin: bool,
        now: DateTime<Utc>,
    ) -> bool {
        let mut changed = false;
        if email.is_some() && self.email != email {
            self.email = email;
            changed = true;
        }
        if name.is_some() && self.name != name {
            self.name = name;
            changed = true;
        }
        if token_admin && self.role != UserRole::Admin {
            self.role = UserRole::Admin;
            changed = true;
        }
        if changed {
            self.updated_at = now;
        }
        changed
    }

    pub fn set_role(&mut self, role: UserRole, now: DateTime<Utc>) {
        self.role = role;
        self.updated_at = now;
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

impl Record for User {
    const KIND: &'static str = "user";

    fn id(&self) -> Uuid {
        self.id.into()
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.sub.clone())
    }
}
