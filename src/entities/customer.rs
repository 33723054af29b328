// 👤 Customer Entity - people and companies who buy tinted paint
//
// Customers own their purchases: deleting a customer removes every purchase
// that references it (enforced by the gateway, not the schema).

use crate::error::{ShopError, ShopResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// CUSTOMER TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomerType {
    /// Walk-in or private buyer
    Individual,

    /// Contractor, painter or other business account
    Company,
}

impl CustomerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerType::Individual => "individual",
            CustomerType::Company => "company",
        }
    }

    /// Parse the stored form; case-insensitive
    pub fn parse(value: &str) -> ShopResult<Self> {
        match value.trim().to_lowercase().as_str() {
            "individual" => Ok(CustomerType::Individual),
            "company" => Ok(CustomerType::Company),
            other => Err(ShopError::Validation(format!(
                "unknown customer type '{}'",
                other
            ))),
        }
    }
}

// ============================================================================
// CUSTOMER ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub customer_type: CustomerType,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// WRITE INPUT
// ============================================================================

/// Fields accepted by create/update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerData {
    pub name: String,
    pub customer_type: CustomerType,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CustomerData {
    pub fn new(name: &str, customer_type: CustomerType) -> Self {
        CustomerData {
            name: name.to_string(),
            customer_type,
            phone: None,
            email: None,
            notes: None,
        }
    }

    /// Builder pattern: add phone number
    pub fn with_phone(mut self, phone: &str) -> Self {
        self.phone = Some(phone.to_string());
        self
    }

    /// Builder pattern: add email
    pub fn with_email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }

    /// Builder pattern: add free-text notes
    pub fn with_notes(mut self, notes: &str) -> Self {
        self.notes = Some(notes.to_string());
        self
    }

    pub fn validate(&self) -> ShopResult<()> {
        if self.name.trim().is_empty() {
            return Err(ShopError::Validation("customer name is required".to_string()));
        }
        Ok(())
    }

    /// Blank optional fields are stored as NULL
    pub fn normalized(&self) -> CustomerData {
        CustomerData {
            name: self.name.trim().to_string(),
            customer_type: self.customer_type,
            phone: non_blank(&self.phone),
            email: non_blank(&self.email),
            notes: non_blank(&self.notes),
        }
    }
}

pub(crate) fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
