//! Item records, store payloads and request bodies.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use time::OffsetDateTime;

use crate::error::ValidationError;

use super::status::Status;
use super::timestamp;

/// Store-assigned item identifier.
///
/// Hosted tables use either a serial or a text/uuid primary key, so both
/// shapes are accepted and echoed back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    /// Numeric primary key.
    Int(i64),
    /// Text or uuid primary key.
    Text(String),
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Int(id) => write!(f, "{}", id),
            ItemId::Text(id) => f.write_str(id),
        }
    }
}

/// A stored item, as returned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub customer_name: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    pub service_type: String,
    pub status: Status,
    #[serde(with = "time::serde::rfc3339")]
    pub checkin_date: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub promised_date: Option<OffsetDateTime>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Sanitized insert payload. `id` and `created_at` are left to the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewItem {
    pub customer_name: String,
    pub brand: Option<String>,
    pub size: Option<String>,
    pub service_type: String,
    pub status: Status,
    #[serde(with = "time::serde::rfc3339")]
    pub checkin_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub promised_date: Option<OffsetDateTime>,
    pub price: Option<Decimal>,
    pub note: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl NewItem {
    /// Materialize the stored row once the store has assigned its keys.
    pub fn into_item(self, id: ItemId, created_at: OffsetDateTime) -> Item {
        Item {
            id,
            customer_name: self.customer_name,
            brand: self.brand,
            size: self.size,
            service_type: self.service_type,
            status: self.status,
            checkin_date: self.checkin_date,
            promised_date: self.promised_date,
            price: self.price,
            note: self.note,
            created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Partial update. `None` leaves a column untouched; `Some(None)` clears a
/// nullable column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_timestamp"
    )]
    pub checkin_date: Option<OffsetDateTime>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_nullable_timestamp"
    )]
    pub promised_date: Option<Option<OffsetDateTime>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Option<Decimal>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<Option<String>>,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl ItemPatch {
    /// A patch that only refreshes `updated_at`.
    pub fn touch(updated_at: OffsetDateTime) -> Self {
        Self {
            customer_name: None,
            brand: None,
            size: None,
            service_type: None,
            status: None,
            checkin_date: None,
            promised_date: None,
            price: None,
            note: None,
            updated_at,
        }
    }

    /// Apply the patch to an in-memory row.
    pub fn apply(&self, item: &mut Item) {
        if let Some(customer_name) = &self.customer_name {
            item.customer_name = customer_name.clone();
        }
        if let Some(brand) = &self.brand {
            item.brand = brand.clone();
        }
        if let Some(size) = &self.size {
            item.size = size.clone();
        }
        if let Some(service_type) = &self.service_type {
            item.service_type = service_type.clone();
        }
        if let Some(status) = self.status {
            item.status = status;
        }
        if let Some(checkin_date) = self.checkin_date {
            item.checkin_date = checkin_date;
        }
        if let Some(promised_date) = self.promised_date {
            item.promised_date = promised_date;
        }
        if let Some(price) = self.price {
            item.price = price;
        }
        if let Some(note) = &self.note {
            item.note = note.clone();
        }
        item.updated_at = self.updated_at;
    }
}

fn serialize_timestamp<S: Serializer>(
    value: &Option<OffsetDateTime>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    time::serde::rfc3339::option::serialize(value, serializer)
}

fn serialize_nullable_timestamp<S: Serializer>(
    value: &Option<Option<OffsetDateTime>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(inner) => time::serde::rfc3339::option::serialize(inner, serializer),
        None => serializer.serialize_none(),
    }
}

/// Distinguishes an explicit `null` (`Some(None)`) from an absent field (`None`).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Keep the value only when it is a JSON number. A number that does not fit
/// the price column is rejected rather than dropped.
pub fn coerce_price(value: &Value) -> Result<Option<Decimal>, ValidationError> {
    if !value.is_number() {
        return Ok(None);
    }
    serde_json::from_value(value.clone())
        .map(Some)
        .map_err(|_| ValidationError::PriceOutOfRange)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Body of `POST /items`.
#[derive(Debug, Default, Deserialize)]
pub struct CreateItemRequest {
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub service_type: Option<String>,
    #[serde(default)]
    pub status: Option<Value>,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub checkin_date: Option<OffsetDateTime>,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub promised_date: Option<OffsetDateTime>,
    #[serde(default)]
    pub price: Option<Value>,
    #[serde(default)]
    pub note: Option<String>,
}

impl CreateItemRequest {
    /// Validate the body and fill defaults.
    pub fn into_new_item(self, now: OffsetDateTime) -> Result<NewItem, ValidationError> {
        let (Some(customer_name), Some(service_type)) =
            (required(self.customer_name), required(self.service_type))
        else {
            return Err(ValidationError::MissingRequired);
        };

        // An empty string is treated the same as an absent status.
        let status = match self.status {
            None | Some(Value::Null) => Status::default(),
            Some(Value::String(ref s)) if s.is_empty() => Status::default(),
            Some(ref value) => {
                Status::normalize(value).ok_or_else(ValidationError::invalid_status)?
            }
        };

        let price = match &self.price {
            Some(value) => coerce_price(value)?,
            None => None,
        };

        Ok(NewItem {
            customer_name,
            brand: non_empty(self.brand),
            size: non_empty(self.size),
            service_type,
            status,
            checkin_date: self.checkin_date.unwrap_or(now),
            promised_date: self.promised_date,
            price,
            note: non_empty(self.note),
            updated_at: now,
        })
    }
}

/// Body of `PATCH /items/:id`.
///
/// Only mutable columns are listed; `id`, `created_at`, `updated_at` and
/// unknown keys are dropped during deserialization.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateItemRequest {
    #[serde(default, deserialize_with = "double_option")]
    pub customer_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub brand: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub size: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub service_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub status: Option<Option<Value>>,
    #[serde(default, deserialize_with = "timestamp::deserialize_nullable")]
    pub checkin_date: Option<Option<OffsetDateTime>>,
    #[serde(default, deserialize_with = "timestamp::deserialize_nullable")]
    pub promised_date: Option<Option<OffsetDateTime>>,
    #[serde(default, deserialize_with = "double_option")]
    pub price: Option<Option<Value>>,
    #[serde(default, deserialize_with = "double_option")]
    pub note: Option<Option<String>>,
}

impl UpdateItemRequest {
    /// Validate the body and build the patch, stamping `updated_at`.
    pub fn into_patch(self, now: OffsetDateTime) -> Result<ItemPatch, ValidationError> {
        let customer_name = self
            .customer_name
            .map(|v| required(v).ok_or(ValidationError::EmptyField { field: "customer_name" }))
            .transpose()?;
        let service_type = self
            .service_type
            .map(|v| required(v).ok_or(ValidationError::EmptyField { field: "service_type" }))
            .transpose()?;

        let status = match self.status {
            None => None,
            Some(None) => return Err(ValidationError::NullField { field: "status" }),
            Some(Some(value)) => {
                Some(Status::normalize(&value).ok_or_else(ValidationError::invalid_status)?)
            }
        };

        let checkin_date = match self.checkin_date {
            None => None,
            Some(None) => return Err(ValidationError::NullField { field: "checkin_date" }),
            Some(Some(ts)) => Some(ts),
        };

        let price = match self.price {
            None => None,
            Some(None) => Some(None),
            Some(Some(value)) => Some(coerce_price(&value)?),
        };

        Ok(ItemPatch {
            customer_name,
            brand: self.brand.map(non_empty),
            size: self.size.map(non_empty),
            service_type,
            status,
            checkin_date,
            promised_date: self.promised_date,
            price,
            note: self.note.map(non_empty),
            updated_at: now,
        })
    }
}

/// Body of a successful `DELETE /items/:id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedItem {
    pub deleted: bool,
    pub item: Item,
}
