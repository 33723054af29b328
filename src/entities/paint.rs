// 🎨 Paint Entity - a color/product and its base formulation
//
// A paint's components are expressed for `base_size` units of `base_unit`.
// Every quantity shown for another batch size is derived by the scaler.

use super::customer::non_blank;
use crate::error::{ShopError, ShopResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// PAINT ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paint {
    pub id: i64,
    pub color_name: String,
    /// e.g. "QD Enamel", "DTM"
    pub product_type: String,
    /// Reference batch size the formulation is written for (> 0)
    pub base_size: f64,
    pub base_unit: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One line of a paint's base formulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulationComponent {
    pub id: i64,
    pub paint_id: i64,
    pub component_name: String,
    /// Quantity per `base_size` of the parent paint
    pub quantity: f64,
    pub unit: String,
    /// Display order; ties fall back to insertion order
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaintWithFormulation {
    #[serde(flatten)]
    pub paint: Paint,
    pub formulations: Vec<FormulationComponent>,
}

// ============================================================================
// WRITE INPUT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaintData {
    pub color_name: String,
    pub product_type: String,
    pub base_size: f64,
    pub base_unit: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl PaintData {
    pub fn new(color_name: &str, product_type: &str, base_size: f64, base_unit: &str) -> Self {
        PaintData {
            color_name: color_name.to_string(),
            product_type: product_type.to_string(),
            base_size,
            base_unit: base_unit.to_string(),
            description: None,
        }
    }

    /// Builder pattern: add description
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn validate(&self) -> ShopResult<()> {
        if self.color_name.trim().is_empty() {
            return Err(ShopError::Validation("color name is required".to_string()));
        }
        if self.product_type.trim().is_empty() {
            return Err(ShopError::Validation("product type is required".to_string()));
        }
        if !self.base_size.is_finite() || self.base_size <= 0.0 {
            return Err(ShopError::Validation(format!(
                "base size must be positive, got {}",
                self.base_size
            )));
        }
        if self.base_unit.trim().is_empty() {
            return Err(ShopError::Validation("base unit is required".to_string()));
        }
        Ok(())
    }

    pub fn normalized(&self) -> PaintData {
        PaintData {
            color_name: self.color_name.trim().to_string(),
            product_type: self.product_type.trim().to_string(),
            base_size: self.base_size,
            base_unit: self.base_unit.trim().to_string(),
            description: non_blank(&self.description),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentData {
    pub component_name: String,
    pub quantity: f64,
    pub unit: String,
    pub sort_order: i64,
}

impl ComponentData {
    pub fn new(component_name: &str, quantity: f64, unit: &str, sort_order: i64) -> Self {
        ComponentData {
            component_name: component_name.to_string(),
            quantity,
            unit: unit.to_string(),
            sort_order,
        }
    }

    pub fn validate(&self) -> ShopResult<()> {
        if self.component_name.trim().is_empty() {
            return Err(ShopError::Validation("component name is required".to_string()));
        }
        if !self.quantity.is_finite() || self.quantity < 0.0 {
            return Err(ShopError::Validation(format!(
                "quantity for '{}' must be a non-negative number, got {}",
                self.component_name, self.quantity
            )));
        }
        if self.unit.trim().is_empty() {
            return Err(ShopError::Validation(format!(
                "unit for '{}' is required",
                self.component_name
            )));
        }
        Ok(())
    }
}

/// A paint plus its components, not yet persisted.
///
/// Produced by CSV import and by image extraction; a person confirms it
/// before it is handed to the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaintDraft {
    pub paint: PaintData,
    pub components: Vec<ComponentData>,
}

impl PaintDraft {
    pub fn validate(&self) -> ShopResult<()> {
        self.paint.validate()?;
        for component in &self.components {
            component.validate()?;
        }
        Ok(())
    }
}
