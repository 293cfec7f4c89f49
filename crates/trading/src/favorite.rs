use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use teatrade_core::{DomainError, DomainResult, FavoriteId};

use crate::record::{EditContext, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FavoriteTarget {
    Catalog,
    Stock,
}

impl FavoriteTarget {
    pub const ALL: &'static [&'static str] = &["catalog", "stock"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Catalog => "catalog",
            Self::Stock => "stock",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFavorite {
    pub target_kind: FavoriteTarget,
    pub target_id: Uuid,
}

/// A catalog line or stock lot bookmarked by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favorite {
    pub id: FavoriteId,
    pub user_sub: String,
    pub target_kind: FavoriteTarget,
    pub target_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Favorite {
    pub fn create(new: NewFavorite, ctx: &EditContext) -> Self {
        Self {
            id: FavoriteId::new(),
            user_sub: ctx.actor.clone(),
            target_kind: new.target_kind,
            target_id: new.target_id,
            created_at: ctx.now,
        }
    }

    /// Favorites are private to the user who created them.
    pub fn ensure_owner(&self, sub: &str) -> DomainResult<()> {
        if self.user_sub != sub {
            return Err(DomainError::Forbidden);
        }
        Ok(())
    }
}

impl Record for Favorite {
    const KIND: &'static str = "favorite";

    fn id(&self) -> Uuid {
        self.id.into()
    }

    fn unique_key(&self) -> Option<String> {
        Some(format!(
            "{}|{}|{}",
            self.user_sub,
            self.target_kind.as_str(),
            self.target_id
        ))
    }
}
