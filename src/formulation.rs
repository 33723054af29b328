// ⚗️ Formulation Scaler - rescale a base recipe to any batch size
//
//   factor = target_size / base_size
//   scaled = round(quantity * factor, 3)
//
// Rounding is half-away-from-zero at the third decimal. `round_quantity` is
// the only rounding used for displayed, shared and exported quantities.

use crate::entities::FormulationComponent;
use crate::error::{ShopError, ShopResult};
use serde::{Deserialize, Serialize};

/// Decimal places kept on every scaled quantity
pub const QUANTITY_DECIMALS: i32 = 3;

/// Base size assumed when a paint carries none
pub const DEFAULT_BASE_SIZE: f64 = 1.0;

// ============================================================================
// NUMERIC INPUT BOUNDARY
// ============================================================================

/// A quantity as it arrives from outside the typed core.
///
/// CSV cells, extraction output and loosely typed store columns may carry
/// numbers as text; `parse_quantity` is the single place they become `f64`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawQuantity {
    Number(f64),
    Text(String),
}

impl From<f64> for RawQuantity {
    fn from(value: f64) -> Self {
        RawQuantity::Number(value)
    }
}

impl From<&str> for RawQuantity {
    fn from(value: &str) -> Self {
        RawQuantity::Text(value.to_string())
    }
}

/// Parse-or-fail: finite, non-negative, numeric
pub fn parse_quantity(raw: &RawQuantity) -> ShopResult<f64> {
    let value = match raw {
        RawQuantity::Number(n) => *n,
        RawQuantity::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| ShopError::InvalidQuantity(text.clone()))?,
    };

    check_quantity(value)
}

fn check_quantity(value: f64) -> ShopResult<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(ShopError::InvalidQuantity(value.to_string()));
    }
    Ok(value)
}

/// Round to `QUANTITY_DECIMALS` places, half away from zero
pub fn round_quantity(value: f64) -> f64 {
    let scale = 10f64.powi(QUANTITY_DECIMALS);
    (value * scale).round() / scale
}

/// Resolve the reference size: missing defaults to 1, non-positive is an error
pub fn resolve_base_size(base_size: Option<f64>) -> ShopResult<f64> {
    let base = base_size.unwrap_or(DEFAULT_BASE_SIZE);
    if !base.is_finite() || base <= 0.0 {
        return Err(ShopError::InvalidBaseSize(base));
    }
    Ok(base)
}

fn scale_factor(target_size: f64, base_size: Option<f64>) -> ShopResult<f64> {
    let base = resolve_base_size(base_size)?;
    if !target_size.is_finite() || target_size <= 0.0 {
        return Err(ShopError::InvalidTargetSize(target_size));
    }
    Ok(target_size / base)
}

// ============================================================================
// SCALED OUTPUT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaledComponent {
    pub component_name: String,
    /// Rounded to 3 decimals
    pub quantity: f64,
    pub unit: String,
    pub sort_order: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaledFormulation {
    pub target_size: f64,
    pub base_size: f64,
    pub factor: f64,
    pub components: Vec<ScaledComponent>,
    /// Sum of the already-rounded component quantities
    pub total: f64,
}

impl ScaledFormulation {
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

// ============================================================================
// SCALER
// ============================================================================

/// Scale one component from `base_size` to `target_size`
pub fn scale(
    component: &FormulationComponent,
    target_size: f64,
    base_size: Option<f64>,
) -> ShopResult<ScaledComponent> {
    let factor = scale_factor(target_size, base_size)?;
    scale_by(component, factor)
}

fn scale_by(component: &FormulationComponent, factor: f64) -> ShopResult<ScaledComponent> {
    let quantity = check_quantity(component.quantity)?;

    Ok(ScaledComponent {
        component_name: component.component_name.clone(),
        quantity: round_quantity(quantity * factor),
        unit: component.unit.clone(),
        sort_order: component.sort_order,
    })
}

/// Scale a whole formulation, keeping component order.
///
/// The total is the sum of rounded components, so it can differ from
/// rounding the exact sum in the last digit.
pub fn scale_formulation(
    components: &[FormulationComponent],
    target_size: f64,
    base_size: Option<f64>,
) -> ShopResult<ScaledFormulation> {
    let base = resolve_base_size(base_size)?;
    let factor = scale_factor(target_size, Some(base))?;

    let scaled = components
        .iter()
        .map(|component| scale_by(component, factor))
        .collect::<ShopResult<Vec<_>>>()?;

    Ok(ScaledFormulation {
        target_size,
        base_size: base,
        factor,
        total: rounded_total(&scaled),
        components: scaled,
    })
}

/// Round-then-sum; the final round only strips float noise
pub fn rounded_total(components: &[ScaledComponent]) -> f64 {
    round_quantity(components.iter().fold(0.0, |acc, c| acc + c.quantity))
}

/// Sum of unscaled base quantities, as shown under a base formulation
pub fn base_total(components: &[FormulationComponent]) -> f64 {
    round_quantity(
        components
            .iter()
            .fold(0.0, |acc, c| acc + round_quantity(c.quantity)),
    )
}

// ============================================================================
// TESTS
// ============================================================================
