use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use teatrade_core::{DomainError, DomainResult, ShipmentId, StockId};

use crate::record::{EditContext, Record, require_text};

/// Shipment lifecycle.
///
/// `pending -> in_transit -> delivered`; `pending` and `in_transit` may also
/// move to `cancelled`. `delivered` and `cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    Pending,
    InTransit,
    Delivered,
    Cancelled,
}

impl ShipmentStatus {
    pub const ALL: &'static [&'static str] = &["pending", "in_transit", "delivered", "cancelled"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InTransit => "in_transit",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn can_move_to(self, next: ShipmentStatus) -> bool {
        use ShipmentStatus::*;
        matches!(
            (self, next),
            (Pending, InTransit) | (InTransit, Delivered) | (Pending, Cancelled) | (InTransit, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentItem {
    pub stock_id: StockId,
    pub packages: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewShipment {
    pub shipment_no: String,
    pub buyer: String,
    pub destination: String,
    #[serde(default)]
    pub vessel: Option<String>,
    pub items: Vec<ShipmentItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipment {
    pub id: ShipmentId,
    pub shipment_no: String,
    pub buyer: String,
    pub destination: String,
    pub vessel: Option<String>,
    pub items: Vec<ShipmentItem>,
    pub status: ShipmentStatus,
    pub shipped_on: Option<NaiveDate>,
    pub delivered_on: Option<NaiveDate>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Shipment {
    pub const FILTERS: &'static [&'static str] = &["shipment_no", "buyer", "destination", "status"];

    pub fn create(new: NewShipment, ctx: &EditContext) -> DomainResult<Self> {
        require_text("shipment_no", &new.shipment_no)?;
        require_text("buyer", &new.buyer)?;
        require_text("destination", &new.destination)?;
        if new.items.is_empty() {
            return Err(DomainError::validation("a shipment needs at least one item"));
        }
        if new.items.iter().any(|i| i.packages == 0) {
            return Err(DomainError::validation("item packages must be greater than 0"));
        }

        Ok(Self {
            id: ShipmentId::new(),
            shipment_no: new.shipment_no,
            buyer: new.buyer,
            destination: new.destination,
            vessel: new.vessel,
            items: new.items,
            status: ShipmentStatus::Pending,
            shipped_on: None,
            delivered_on: None,
            created_by: ctx.actor.clone(),
            created_at: ctx.now,
            updated_at: ctx.now,
        })
    }

    pub fn total_packages(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.packages)).sum()
    }

    /// Move to `next`, stamping the shipping/delivery date where relevant.
    pub fn transition(&mut self, next: ShipmentStatus, on: NaiveDate, now: DateTime<Utc>) -> DomainResult<()> {
        if !self.status.can_move_to(next) {
            return Err(DomainError::conflict(format!(
                "cannot move shipment from {} to {}",
                self.status.as_str(),
                next.as_str()
            )));
        }
        match next {
            ShipmentStatus::InTransit => self.shipped_on = Some(on),
            ShipmentStatus::Delivered => self.delivered_on = Some(on),
            _ => {}
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }
}

impl Record for Shipment {
    const KIND: &'static str = "shipment";

    fn id(&self) -> Uuid {
        self.id.into()
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.shipment_no.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ctx() -> EditContext {
        EditContext::new(Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap(), "shipper")
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, d).unwrap()
    }

    fn new_shipment(items: Vec<ShipmentItem>) -> NewShipment {
        NewShipment {
            shipment_no: "SH-001".to_string(),
            buyer: "Tetley".to_string(),
            destination: "Felixstowe".to_string(),
            vessel: Some("MSC Aurora".to_string()),
            items,
        }
    }

    fn item(packages: u32) -> ShipmentItem {
        ShipmentItem {
            stock_id: StockId::new(),
            packages,
        }
    }

    #[test]
    fn new_shipments_start_pending() {
        let shipment = Shipment::create(new_shipment(vec![item(5), item(7)]), &ctx()).unwrap();
        assert_eq!(shipment.status, ShipmentStatus::Pending);
        assert_eq!(shipment.total_packages(), 12);
        assert_eq!(shipment.unique_key().as_deref(), Some("SH-001"));
    }

    #[test]
    fn create_requires_items() {
        let err = Shipment::create(new_shipment(vec![]), &ctx()).unwrap_err();
        assert_eq!(err, DomainError::validation("a shipment needs at least one item"));
    }

    #[test]
    fn happy_path_stamps_dates() {
        let mut shipment = Shipment::create(new_shipment(vec![item(1)]), &ctx()).unwrap();
        shipment.transition(ShipmentStatus::InTransit, day(3), ctx().now).unwrap();
        shipment.transition(ShipmentStatus::Delivered, day(20), ctx().now).unwrap();

        assert_eq!(shipment.status, ShipmentStatus::Delivered);
        assert_eq!(shipment.shipped_on, Some(day(3)));
        assert_eq!(shipment.delivered_on, Some(day(20)));
    }

    #[test]
    fn cannot_skip_transit() {
        let mut shipment = Shipment::create(new_shipment(vec![item(1)]), &ctx()).unwrap();
        let err = shipment
            .transition(ShipmentStatus::Delivered, day(3), ctx().now)
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::conflict("cannot move shipment from pending to delivered")
        );
        assert_eq!(shipment.status, ShipmentStatus::Pending);
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(ShipmentStatus::InTransit).unwrap(),
            serde_json::json!("in_transit")
        );
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn any_status() -> impl Strategy<Value = ShipmentStatus> {
            prop_oneof![
                Just(ShipmentStatus::Pending),
                Just(ShipmentStatus::InTransit),
                Just(ShipmentStatus::Delivered),
                Just(ShipmentStatus::Cancelled),
            ]
        }

        proptest! {
            /// Property: no sequence of transitions leaves a terminal state.
            #[test]
            fn terminal_states_are_final(steps in proptest::collection::vec(any_status(), 0..12)) {
                let mut shipment = Shipment::create(new_shipment(vec![item(1)]), &ctx()).unwrap();
                let mut reached_terminal: Option<ShipmentStatus> = None;
                for next in steps {
                    let before = shipment.status;
                    let result = shipment.transition(next, day(1), ctx().now);
                    if let Some(terminal) = reached_terminal {
                        prop_assert!(result.is_err());
                        prop_assert_eq!(shipment.status, terminal);
                    } else if result.is_ok() {
                        prop_assert!(before.can_move_to(next));
                    } else {
                        prop_assert_eq!(shipment.status, before);
                    }
                    if shipment.status.is_terminal() {
                        reached_terminal = Some(shipment.status);
                    }
                }
            }
        }
    }
}
