use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use teatrade_core::{CatalogId, DomainError, DomainResult, StockId};

use crate::record::{EditContext, Editable, Record, require_positive, require_text};

/// Caller-supplied part of a stock lot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockDetails {
    pub lot_no: String,
    pub invoice_no: String,
    pub garden: String,
    pub grade: String,
    pub packages: u32,
    pub net_weight_kg: f64,
    pub purchase_price_per_kg: f64,
    pub warehouse: String,
    pub purchased_on: NaiveDate,
    #[serde(default)]
    pub catalog_id: Option<CatalogId>,
}

impl StockDetails {
    pub fn validate(&self) -> DomainResult<()> {
        require_text("lot_no", &self.lot_no)?;
        require_text("invoice_no", &self.invoice_no)?;
        require_text("garden", &self.garden)?;
        require_text("grade", &self.grade)?;
        require_text("warehouse", &self.warehouse)?;
        if !(self.net_weight_kg.is_finite() && self.net_weight_kg >= 0.0) {
            return Err(DomainError::validation("net_weight_kg cannot be negative"));
        }
        require_positive("purchase_price_per_kg", self.purchase_price_per_kg)?;
        Ok(())
    }
}

/// A lot held in a warehouse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stock {
    pub id: StockId,
    #[serde(flatten)]
    pub details: StockDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Stock {
    /// Net weight of one package, or 0 when the lot is empty.
    pub fn weight_per_package(&self) -> f64 {
        if self.details.packages == 0 {
            0.0
        } else {
            self.details.net_weight_kg / f64::from(self.details.packages)
        }
    }

    /// Take `packages` out of the lot.
    pub fn deduct(&mut self, packages: u32, now: DateTime<Utc>) -> DomainResult<()> {
        if packages == 0 {
            return Err(DomainError::validation("packages must be greater than 0"));
        }
        let remaining = self.details.packages.checked_sub(packages).ok_or_else(|| {
            DomainError::invariant(format!(
                "insufficient stock in lot {}: {} available, {} requested",
                self.details.lot_no, self.details.packages, packages
            ))
        })?;
        self.details.packages = remaining;
        self.updated_at = now;
        Ok(())
    }

    /// Put `packages` back into the lot.
    pub fn restore(&mut self, packages: u32, now: DateTime<Utc>) -> DomainResult<()> {
        self.details.packages = self
            .details
            .packages
            .checked_add(packages)
            .ok_or_else(|| DomainError::invariant("package count overflow"))?;
        self.updated_at = now;
        Ok(())
    }
}

impl Record for Stock {
    const KIND: &'static str = "stock";

    fn id(&self) -> Uuid {
        self.id.into()
    }

    fn unique_key(&self) -> Option<String> {
        Some(format!("{}|{}", self.details.lot_no, self.details.invoice_no))
    }
}

impl Editable for Stock {
    type Details = StockDetails;

    const FILTERS: &'static [&'static str] = &["lot_no", "invoice_no", "garden", "grade", "warehouse"];

    fn create(details: StockDetails, ctx: &EditContext) -> DomainResult<Self> {
        details.validate()?;
        Ok(Self {
            id: StockId::new(),
            details,
            created_at: ctx.now,
            updated_at: ctx.now,
        })
    }

    fn revise(&mut self, details: StockDetails, ctx: &EditContext) -> DomainResult<()> {
        details.validate()?;
        self.details = details;
        self.updated_at = ctx.now;
        Ok(())
    }
}
