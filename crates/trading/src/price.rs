use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use teatrade_core::{DomainError, DomainResult, SellingPriceId};

use crate::record::{EditContext, Editable, Record, require_positive, require_text};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellingPriceDetails {
    pub garden: String,
    pub grade: String,
    pub price_per_kg: f64,
    pub currency: String,
    pub effective_from: NaiveDate,
}

impl SellingPriceDetails {
    pub fn validate(&self) -> DomainResult<()> {
        require_text("garden", &self.garden)?;
        require_text("grade", &self.grade)?;
        require_positive("price_per_kg", self.price_per_kg)?;
        let currency_ok =
            self.currency.len() == 3 && self.currency.chars().all(|c| c.is_ascii_uppercase());
        if !currency_ok {
            return Err(DomainError::validation(
                "currency must be a 3-letter ISO code",
            ));
        }
        Ok(())
    }
}

/// Asking price for a garden/grade from a given day on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellingPrice {
    pub id: SellingPriceId,
    #[serde(flatten)]
    pub details: SellingPriceDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for SellingPrice {
    const KIND: &'static str = "selling_price";

    fn id(&self) -> Uuid {
        self.id.into()
    }

    fn unique_key(&self) -> Option<String> {
        Some(format!(
            "{}|{}|{}",
            self.details.garden, self.details.grade, self.details.effective_from
        ))
    }
}

impl Editable for SellingPrice {
    type Details = SellingPriceDetails;

    const FILTERS: &'static [&'static str] = &["garden", "grade", "currency", "effective_from"];

    fn create(details: SellingPriceDetails, ctx: &EditContext) -> DomainResult<Self> {
        details.validate()?;
        Ok(Self {
            id: SellingPriceId::new(),
            details,
            created_at: ctx.now,
            updated_at: ctx.now,
        })
    }

    fn revise(&mut self, details: SellingPriceDetails, ctx: &EditContext) -> DomainResult<()> {
        details.validate()?;
        self.details = details;
        self.updated_at = ctx.now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(currency: &str) -> SellingPriceDetails {
        SellingPriceDetails {
            garden: "Halmari".to_string(),
            grade: "BOP".to_string(),
            price_per_kg: 420.0,
            currency: currency.to_string(),
            effective_from: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        }
    }

    #[test]
    fn unique_key_includes_effective_date() {
        let ctx = EditContext::new(Utc::now(), "admin");
        let price = SellingPrice::create(details("INR"), &ctx).unwrap();
        assert_eq!(price.unique_key().as_deref(), Some("Halmari|BOP|2024-06-01"));
    }

    #[test]
    fn currency_must_be_iso_code() {
        let ctx = EditContext::new(Utc::now(), "admin");
        for bad in ["inr", "RUPEE", "R1"] {
            assert!(SellingPrice::create(details(bad), &ctx).is_err(), "{bad} accepted");
        }
    }
}
