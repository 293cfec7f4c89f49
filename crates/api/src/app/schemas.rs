//! Request schemas for the validation gate, one per route shape.

use teatrade_core::{FieldRule, ObjectSchema, RequestSchema};
use teatrade_trading::{FavoriteTarget, ReportKind, ShipmentStatus, TeaCategory, UserRole};

const SHORT_TEXT: usize = 100;
const LONG_TEXT: usize = 5000;

fn text() -> FieldRule {
    FieldRule::string().non_empty().max_len(SHORT_TEXT)
}

fn id_param() -> ObjectSchema {
    ObjectSchema::new().required("id", FieldRule::uuid())
}

fn paging() -> ObjectSchema {
    ObjectSchema::new()
        .optional("page", FieldRule::integer().min(1.0))
        .optional("limit", FieldRule::integer().min(1.0).max(100.0))
}

/// `GET` collection routes.
pub fn list() -> RequestSchema {
    RequestSchema::new().query(paging())
}

/// Routes addressing one record by `:id`, without a body.
pub fn by_id() -> RequestSchema {
    RequestSchema::new().params(id_param())
}

/// Multipart imports. The file itself is checked by the upload extractor;
/// a body schema here would make the gate buffer the multipart stream.
pub fn upload() -> RequestSchema {
    RequestSchema::new().query(ObjectSchema::new())
}

pub fn contact() -> RequestSchema {
    RequestSchema::new().body(
        ObjectSchema::new()
            .required("name", text())
            .required("email", FieldRule::string().non_empty().max_len(254))
            .optional("company", FieldRule::string().max_len(SHORT_TEXT))
            .required("message", FieldRule::string().non_empty().max_len(LONG_TEXT)),
    )
}

fn catalog_body() -> ObjectSchema {
    ObjectSchema::new()
        .required("sale_code", text())
        .required("lot_no", text())
        .required("broker", text())
        .required("garden", text())
        .required("grade", text())
        .required("invoice_no", text())
        .required("packages", FieldRule::integer().min(1.0))
        .required("net_weight_kg", FieldRule::number().min(0.0))
        .required("category", FieldRule::string().one_of(TeaCategory::ALL))
        .required("sale_date", FieldRule::date())
        .optional("valuation_per_kg", FieldRule::number().min(0.0))
}

pub fn create_catalog() -> RequestSchema {
    RequestSchema::new().body(catalog_body())
}

pub fn update_catalog() -> RequestSchema {
    RequestSchema::new().params(id_param()).body(catalog_body())
}

fn stock_body() -> ObjectSchema {
    ObjectSchema::new()
        .required("lot_no", text())
        .required("invoice_no", text())
        .required("garden", text())
        .required("grade", text())
        .required("packages", FieldRule::integer().min(0.0))
        .required("net_weight_kg", FieldRule::number().min(0.0))
        .required("purchase_price_per_kg", FieldRule::number().min(0.0))
        .required("warehouse", text())
        .required("purchased_on", FieldRule::date())
        .optional("catalog_id", FieldRule::uuid())
}

pub fn create_stock() -> RequestSchema {
    RequestSchema::new().body(stock_body())
}

pub fn update_stock() -> RequestSchema {
    RequestSchema::new().params(id_param()).body(stock_body())
}

fn price_body() -> ObjectSchema {
    ObjectSchema::new()
        .required("garden", text())
        .required("grade", text())
        .required("price_per_kg", FieldRule::number().min(0.0))
        .required("currency", FieldRule::string().non_empty().max_len(3))
        .required("effective_from", FieldRule::date())
}

pub fn create_price() -> RequestSchema {
    RequestSchema::new().body(price_body())
}

pub fn update_price() -> RequestSchema {
    RequestSchema::new().params(id_param()).body(price_body())
}

fn report_body() -> ObjectSchema {
    ObjectSchema::new()
        .required("title", FieldRule::string().non_empty().max_len(200))
        .required("kind", FieldRule::string().one_of(ReportKind::ALL))
        .required("period_from", FieldRule::date())
        .required("period_to", FieldRule::date())
        .optional("summary", FieldRule::string().max_len(LONG_TEXT))
}

pub fn create_report() -> RequestSchema {
    RequestSchema::new().body(report_body())
}

pub fn update_report() -> RequestSchema {
    RequestSchema::new().params(id_param()).body(report_body())
}

pub fn create_out_lot() -> RequestSchema {
    RequestSchema::new().body(
        ObjectSchema::new()
            .required("stock_id", FieldRule::uuid())
            .required("buyer", text())
            .required("packages", FieldRule::integer().min(1.0))
            .required("price_per_kg", FieldRule::number().min(0.0))
            .required("released_on", FieldRule::date())
            .optional("reason", FieldRule::string().max_len(500)),
    )
}

pub fn create_shipment() -> RequestSchema {
    let item = ObjectSchema::new()
        .required("stock_id", FieldRule::uuid())
        .required("packages", FieldRule::integer().min(1.0));
    RequestSchema::new().body(
        ObjectSchema::new()
            .required("shipment_no", text())
            .required("buyer", text())
            .required("destination", text())
            .optional("vessel", FieldRule::string().max_len(SHORT_TEXT))
            .required("items", FieldRule::array_of(item).min_items(1)),
    )
}

pub fn shipment_status() -> RequestSchema {
    RequestSchema::new().params(id_param()).body(
        ObjectSchema::new()
            .required("status", FieldRule::string().one_of(ShipmentStatus::ALL))
            .optional("on", FieldRule::date()),
    )
}

pub fn create_favorite() -> RequestSchema {
    RequestSchema::new().body(
        ObjectSchema::new()
            .required("target_kind", FieldRule::string().one_of(FavoriteTarget::ALL))
            .required("target_id", FieldRule::uuid()),
    )
}

pub fn user_role() -> RequestSchema {
    RequestSchema::new()
        .params(id_param())
        .body(ObjectSchema::new().required("role", FieldRule::string().one_of(UserRole::ALL)))
}
