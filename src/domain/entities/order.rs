use crate::domain::value_objects::RecordId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One customer order row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: RecordId,
    pub client_id: RecordId,
    pub name: String,
    pub address: String,
    pub city: String,
    pub zip_code: String,
    pub price: f64,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn new(client_id: RecordId, fields: NewOrder) -> Self {
        Self {
            id: RecordId::generate(),
            client_id,
            name: fields.name,
            address: fields.address,
            city: fields.city,
            zip_code: fields.zip_code,
            price: fields.price,
            created_at: Utc::now(),
        }
    }

    pub fn apply_changes(&mut self, changes: OrderChanges) {
        if let Some(name) = changes.name {
            self.name = name;
        }
        if let Some(address) = changes.address {
            self.address = address;
        }
        if let Some(city) = changes.city {
            self.city = city;
        }
        if let Some(zip_code) = changes.zip_code {
            self.zip_code = zip_code;
        }
        if let Some(price) = changes.price {
            self.price = price;
        }
    }
}

/// Fields supplied by the order form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub name: String,
    pub address: String,
    pub city: String,
    pub zip_code: String,
    pub price: f64,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderChanges {
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub zip_code: Option<String>,
    pub price: Option<f64>,
}
