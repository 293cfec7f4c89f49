//! Typed access to the record store.
//!
//! Thin helpers that (de)serialize [`Record`] types to the JSON the store
//! keeps, so handlers never touch [`RawRecord`] directly.

use serde_json::Value;
use uuid::Uuid;

use teatrade_core::{Page, PageRequest, page::MAX_LIMIT};
use teatrade_trading::Record;

use super::error::StoreError;
use super::{Filter, RawRecord, Transaction};

fn to_raw<R: Record>(record: &R) -> Result<RawRecord, StoreError> {
    Ok(RawRecord {
        id: record.id(),
        unique_key: record.unique_key(),
        data: serde_json::to_value(record)?,
    })
}

fn from_value<R: Record>(data: Value) -> Result<R, StoreError> {
    Ok(serde_json::from_value(data)?)
}

pub async fn insert_record<R: Record>(tx: &mut dyn Transaction, record: &R) -> Result<(), StoreError> {
    tx.insert(R::KIND, to_raw(record)?).await
}

pub async fn update_record<R: Record>(tx: &mut dyn Transaction, record: &R) -> Result<(), StoreError> {
    tx.update(R::KIND, to_raw(record)?).await
}

pub async fn delete_record<R: Record>(tx: &mut dyn Transaction, id: Uuid) -> Result<(), StoreError> {
    tx.delete(R::KIND, id).await
}

pub async fn get_record<R: Record>(tx: &mut dyn Transaction, id: Uuid) -> Result<Option<R>, StoreError> {
    tx.get(R::KIND, id).await?.map(from_value).transpose()
}

/// Like [`get_record`], but a missing record is [`StoreError::NotFound`].
pub async fn require_record<R: Record>(tx: &mut dyn Transaction, id: Uuid) -> Result<R, StoreError> {
    get_record(tx, id).await?.ok_or(StoreError::NotFound)
}

pub async fn list_records<R: Record>(
    tx: &mut dyn Transaction,
    filter: &Filter,
    page: PageRequest,
) -> Result<Page<R>, StoreError> {
    let raw = tx.list(R::KIND, filter, page).await?;
    let items = raw
        .items
        .into_iter()
        .map(from_value)
        .collect::<Result<Vec<R>, _>>()?;
    Ok(Page {
        items,
        total: raw.total,
        page: raw.page,
        limit: raw.limit,
        total_pages: raw.total_pages,
    })
}

/// Every matching record, newest first, fetched page by page.
pub async fn list_all_records<R: Record>(tx: &mut dyn Transaction, filter: &Filter) -> Result<Vec<R>, StoreError> {
    let mut out = Vec::new();
    let mut request = PageRequest::new(Some(1), Some(MAX_LIMIT));
    loop {
        let page = list_records::<R>(tx, filter, request).await?;
        let fetched = page.items.len();
        out.extend(page.items);
        if fetched == 0 || u64::from(request.page) >= page.total_pages {
            return Ok(out);
        }
        request.page += 1;
    }
}

/// First record matching `filter`, if any.
pub async fn find_one<R: Record>(tx: &mut dyn Transaction, filter: &Filter) -> Result<Option<R>, StoreError> {
    let page = list_records::<R>(tx, filter, PageRequest::new(Some(1), Some(1))).await?;
    Ok(page.items.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Database, InMemoryDatabase};
    use chrono::{TimeZone, Utc};
    use teatrade_trading::{EditContext, Editable, SellingPrice, SellingPriceDetails};

    fn ctx() -> EditContext {
        EditContext::new(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(), "user-1")
    }

    fn price(garden: &str, grade: &str) -> SellingPrice {
        let details: SellingPriceDetails = serde_json::from_value(serde_json::json!({
            "garden": garden,
            "grade": grade,
            "price_per_kg": 310.5,
            "currency": "INR",
            "effective_from": "2024-03-01"
        }))
        .unwrap();
        SellingPrice::create(details, &ctx()).unwrap()
    }

    #[tokio::test]
    async fn typed_round_trip_through_the_store() {
        let db = InMemoryDatabase::new();
        let mut tx = db.begin().await.unwrap();
        let p = price("Halmari", "BOP");
        insert_record(tx.as_mut(), &p).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = db.begin().await.unwrap();
        let loaded: SellingPrice = require_record(tx.as_mut(), p.id()).await.unwrap();
        assert_eq!(loaded, p);
        let missing = require_record::<SellingPrice>(tx.as_mut(), Uuid::now_v7()).await;
        assert_eq!(missing, Err(StoreError::NotFound));
    }

    #[tokio::test]
    async fn list_all_walks_every_page() {
        let db = InMemoryDatabase::new();
        let mut tx = db.begin().await.unwrap();
        for i in 0..(MAX_LIMIT + 5) {
            insert_record(tx.as_mut(), &price(&format!("Garden {i}"), "FD")).await.unwrap();
        }
        insert_record(tx.as_mut(), &price("Other", "BOP")).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = db.begin().await.unwrap();
        let all: Vec<SellingPrice> = list_all_records(tx.as_mut(), &Filter::new().eq("grade", "FD"))
            .await
            .unwrap();
        assert_eq!(all.len(), (MAX_LIMIT + 5) as usize);

        let found: Option<SellingPrice> = find_one(tx.as_mut(), &Filter::new().eq("garden", "Other"))
            .await
            .unwrap();
        assert_eq!(found.map(|p| p.details.grade), Some("BOP".to_string()));
    }
}
