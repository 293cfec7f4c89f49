use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use teatrade_core::{DomainError, DomainResult, OutLotId, StockId};

use crate::record::{EditContext, Record, require_positive, require_text};
use crate::stock::Stock;

/// Request to release packages from a stock lot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutLotDetails {
    pub stock_id: StockId,
    pub buyer: String,
    pub packages: u32,
    pub price_per_kg: f64,
    pub released_on: NaiveDate,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Packages released from a stock lot to a buyer.
///
/// `lot_no` and `net_weight_kg` are copied from the stock lot at release time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutLot {
    pub id: OutLotId,
    pub stock_id: StockId,
    pub lot_no: String,
    pub buyer: String,
    pub packages: u32,
    pub net_weight_kg: f64,
    pub price_per_kg: f64,
    pub released_on: NaiveDate,
    pub reason: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OutLot {
    pub const FILTERS: &'static [&'static str] = &["stock_id", "lot_no", "buyer"];

    /// Release packages from `stock`, deducting them from the lot.
    ///
    /// On error `stock` is left untouched.
    pub fn release(details: OutLotDetails, stock: &mut Stock, ctx: &EditContext) -> DomainResult<Self> {
        if details.stock_id != stock.id {
            return Err(DomainError::invariant("stock_id mismatch"));
        }
        require_text("buyer", &details.buyer)?;
        require_positive("price_per_kg", details.price_per_kg)?;

        let net_weight_kg = stock.weight_per_package() * f64::from(details.packages);
        stock.deduct(details.packages, ctx.now)?;

        Ok(Self {
            id: OutLotId::new(),
            stock_id: stock.id,
            lot_no: stock.details.lot_no.clone(),
            buyer: details.buyer,
            packages: details.packages,
            net_weight_kg,
            price_per_kg: details.price_per_kg,
            released_on: details.released_on,
            reason: details.reason,
            created_by: ctx.actor.clone(),
            created_at: ctx.now,
            updated_at: ctx.now,
        })
    }

    /// Give the released packages back to their lot (used when the out-lot is deleted).
    pub fn restore_to(&self, stock: &mut Stock, now: DateTime<Utc>) -> DomainResult<()> {
        if self.stock_id != stock.id {
            return Err(DomainError::invariant("stock_id mismatch"));
        }
        stock.restore(self.packages, now)
    }

    pub fn value(&self) -> f64 {
        self.net_weight_kg * self.price_per_kg
    }
}

impl Record for OutLot {
    const KIND: &'static str = "out_lot";

    fn id(&self) -> Uuid {
        self.id.into()
    }
}
