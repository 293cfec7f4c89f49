use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use teatrade_core::{DomainError, DomainResult, ReportId};

use crate::record::{EditContext, Editable, Record, require_text};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Stock,
    Sales,
    Shipment,
    Market,
}

impl ReportKind {
    pub const ALL: &'static [&'static str] = &["stock", "sales", "shipment", "market"];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDetails {
    pub title: String,
    pub kind: ReportKind,
    pub period_from: NaiveDate,
    pub period_to: NaiveDate,
    #[serde(default)]
    pub summary: Option<String>,
}

impl ReportDetails {
    pub fn validate(&self) -> DomainResult<()> {
        require_text("title", &self.title)?;
        if self.period_from > self.period_to {
            return Err(DomainError::validation(
                "period_from must not be after period_to",
            ));
        }
        Ok(())
    }
}

/// A written report over a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    #[serde(flatten)]
    pub details: ReportDetails,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Report {
    const KIND: &'static str = "report";

    fn id(&self) -> Uuid {
        self.id.into()
    }
}

impl Editable for Report {
    type Details = ReportDetails;

    const FILTERS: &'static [&'static str] = &["kind", "created_by"];

    fn create(details: ReportDetails, ctx: &EditContext) -> DomainResult<Self> {
        details.validate()?;
        Ok(Self {
            id: ReportId::new(),
            details,
            created_by: ctx.actor.clone(),
            created_at: ctx.now,
            updated_at: ctx.now,
        })
    }

    /// Authorship is kept; only the details change.
    fn revise(&mut self, details: ReportDetails, ctx: &EditContext) -> DomainResult<()> {
        details.validate()?;
        self.details = details;
        self.updated_at = ctx.now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(from: (i32, u32, u32), to: (i32, u32, u32)) -> ReportDetails {
        ReportDetails {
            title: "Q2 stock".to_string(),
            kind: ReportKind::Stock,
            period_from: NaiveDate::from_ymd_opt(from.0, from.1, from.2).unwrap(),
            period_to: NaiveDate::from_ymd_opt(to.0, to.1, to.2).unwrap(),
            summary: None,
        }
    }

    #[test]
    fn single_day_period_is_allowed() {
        let ctx = EditContext::new(Utc::now(), "analyst");
        let report = Report::create(details((2024, 4, 1), (2024, 4, 1)), &ctx).unwrap();
        assert_eq!(report.created_by, "analyst");
    }

    #[test]
    fn inverted_period_is_rejected() {
        let ctx = EditContext::new(Utc::now(), "analyst");
        let err = Report::create(details((2024, 6, 30), (2024, 4, 1)), &ctx).unwrap_err();
        assert_eq!(
            err,
            DomainError::validation("period_from must not be after period_to")
        );
    }

    #[test]
    fn revise_by_someone_else_keeps_author() {
        let ctx = EditContext::new(Utc::now(), "analyst");
        let mut report = Report::create(details((2024, 4, 1), (2024, 6, 30)), &ctx).unwrap();
        let other = EditContext::new(Utc::now(), "admin");
        report.revise(details((2024, 4, 1), (2024, 5, 31)), &other).unwrap();
        assert_eq!(report.created_by, "analyst");
    }
}
