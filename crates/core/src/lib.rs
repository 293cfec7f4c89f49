//! `teatrade-core`: shared building blocks.
//!
//! Pure types only: identifiers, the domain error model, pagination and the
//! declarative request schema engine. Nothing here knows about HTTP or storage.

pub mod error;
pub mod id;
pub mod page;
pub mod schema;

pub use error::{DomainError, DomainResult};
pub use id::{
    CatalogId, ContactMessageId, FavoriteId, OutLotId, ReportId, SellingPriceId, ShipmentId,
    StockId, UserId,
};
pub use page::{Page, PageRequest};
pub use schema::{FieldRule, Location, ObjectSchema, RequestInput, RequestSchema, ValidationFailure, Violation};
