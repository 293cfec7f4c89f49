use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use teatrade_core::{CatalogId, DomainError, DomainResult};

use crate::record::{EditContext, Editable, Record, require_positive, require_text};

/// Broad leaf category used by the auctions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeaCategory {
    Leaf,
    Dust,
    Other,
}

impl TeaCategory {
    pub const ALL: &'static [&'static str] = &["leaf", "dust", "other"];

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "leaf" => Some(Self::Leaf),
            "dust" => Some(Self::Dust),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Caller-supplied part of a catalog line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogDetails {
    pub sale_code: String,
    pub lot_no: String,
    pub broker: String,
    pub garden: String,
    pub grade: String,
    pub invoice_no: String,
    pub packages: u32,
    pub net_weight_kg: f64,
    pub category: TeaCategory,
    pub sale_date: NaiveDate,
    #[serde(default)]
    pub valuation_per_kg: Option<f64>,
}

impl CatalogDetails {
    pub fn validate(&self) -> DomainResult<()> {
        require_text("sale_code", &self.sale_code)?;
        require_text("lot_no", &self.lot_no)?;
        require_text("garden", &self.garden)?;
        require_text("grade", &self.grade)?;
        if self.packages == 0 {
            return Err(DomainError::validation("packages must be greater than 0"));
        }
        require_positive("net_weight_kg", self.net_weight_kg)?;
        if let Some(v) = self.valuation_per_kg {
            require_positive("valuation_per_kg", v)?;
        }
        Ok(())
    }
}

/// One lot offered in an auction catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub id: CatalogId,
    #[serde(flatten)]
    pub details: CatalogDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Catalog {
    const KIND: &'static str = "catalog";

    fn id(&self) -> Uuid {
        self.id.into()
    }

    fn unique_key(&self) -> Option<String> {
        Some(format!("{}|{}", self.details.sale_code, self.details.lot_no))
    }
}

impl Editable for Catalog {
    type Details = CatalogDetails;

    const FILTERS: &'static [&'static str] =
        &["sale_code", "lot_no", "broker", "garden", "grade", "category"];

    fn create(details: CatalogDetails, ctx: &EditContext) -> DomainResult<Self> {
        details.validate()?;
        Ok(Self {
            id: CatalogId::new(),
            details,
            created_at: ctx.now,
            updated_at: ctx.now,
        })
    }

    fn revise(&mut self, details: CatalogDetails, ctx: &EditContext) -> DomainResult<()> {
        details.validate()?;
        self.details = details;
        self.updated_at = ctx.now;
        Ok(())
    }
}
