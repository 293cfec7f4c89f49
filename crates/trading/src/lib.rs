//! Tea trading domain records.
//!
//! Plain records persisted by the store plus the business rules that guard
//! them (stock deduction, shipment status flow, report periods). Everything
//! here is deterministic: no IO, no HTTP, no storage. Spreadsheet parsing
//! works on in-memory bytes only.

pub mod catalog;
pub mod contact;
pub mod favorite;
pub mod out_lot;
pub mod price;
pub mod record;
pub mod report;
pub mod sheet;
pub mod shipment;
pub mod stock;
pub mod user;

pub use catalog::{Catalog, CatalogDetails, TeaCategory};
pub use contact::{ContactMessage, NewContactMessage};
pub use favorite::{Favorite, FavoriteTarget, NewFavorite};
pub use out_lot::{OutLot, OutLotDetails};
pub use price::{SellingPrice, SellingPriceDetails};
pub use record::{EditContext, Editable, Record};
pub use report::{Report, ReportDetails, ReportKind};
pub use sheet::{FromRow, Row, SheetError, SheetFormat, parse_rows, read_rows, write_stock_csv};
pub use shipment::{NewShipment, Shipment, ShipmentItem, ShipmentStatus};
pub use stock::{Stock, StockDetails};
pub use user::{User, UserRole};
