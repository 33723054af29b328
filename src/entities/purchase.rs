// 🧾 Purchase Entity - one customer buying one paint at a given size

use super::customer::non_blank;
use crate::entities::CustomerType;
use crate::error::{ShopError, ShopResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: i64,
    pub customer_id: i64,
    pub paint_id: i64,
    /// Requested batch size, same unit family as the paint's base unit
    pub size: f64,
    pub unit: String,
    pub purchase_date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Purchase joined with customer name and paint color
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseWithDetails {
    #[serde(flatten)]
    pub purchase: Purchase,
    pub customer_name: String,
    pub color_name: String,
    pub product_type: String,
}

/// Purchase of a given paint, joined with who bought it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaintPurchase {
    pub purchase_id: i64,
    pub size: f64,
    pub unit: String,
    pub purchase_date: NaiveDate,
    pub notes: Option<String>,
    pub customer_name: String,
    pub customer_type: CustomerType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseData {
    pub customer_id: i64,
    pub paint_id: i64,
    pub size: f64,
    pub unit: String,
    pub purchase_date: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
}

impl PurchaseData {
    pub fn new(customer_id: i64, paint_id: i64, size: f64, unit: &str, purchase_date: NaiveDate) -> Self {
        PurchaseData {
            customer_id,
            paint_id,
            size,
            unit: unit.to_string(),
            purchase_date,
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: &str) -> Self {
        self.notes = Some(notes.to_string());
        self
    }

    pub fn validate(&self) -> ShopResult<()> {
        if !self.size.is_finite() || self.size <= 0.0 {
            return Err(ShopError::Validation(format!(
                "purchase size must be positive, got {}",
                self.size
            )));
        }
        if self.unit.trim().is_empty() {
            return Err(ShopError::Validation("purchase unit is required".to_string()));
        }
        Ok(())
    }

    pub fn normalized(&self) -> PurchaseData {
        PurchaseData {
            unit: self.unit.trim().to_string(),
            notes: non_blank(&self.notes),
            ..self.clone()
        }
    }
}
