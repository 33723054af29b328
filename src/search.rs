// 🔎 Search Resolution - look up by customer name or by color name
//
// Both lookups are "first match wins": a case-insensitive substring match
// that resolves to a single customer or paint (lowest id), never a list.
// A miss is an empty result, not an error.

use crate::entities::{Customer, FormulationComponent, Paint, PaintPurchase, Purchase};
use crate::error::ShopResult;
use crate::formulation::{base_total, scale_formulation, ScaledFormulation};
use crate::gateway::PersistenceGateway;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

// ============================================================================
// RESULT SHAPES
// ============================================================================

/// One purchase with the formulation scaled to its size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerPurchase {
    #[serde(flatten)]
    pub purchase: Purchase,
    pub color_name: String,
    pub product_type: String,
    pub base_size: f64,
    pub base_unit: String,
    pub formulation: ScaledFormulation,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerSearchResult {
    /// None when nothing matched
    pub customer: Option<Customer>,
    pub purchases: Vec<CustomerPurchase>,
}

impl CustomerSearchResult {
    pub fn not_found() -> Self {
        Self::default()
    }

    pub fn is_found(&self) -> bool {
        self.customer.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColorSearchResult {
    /// None when nothing matched
    pub paint: Option<Paint>,
    /// Unscaled, in sort order
    pub base_formulation: Vec<FormulationComponent>,
    pub customers: Vec<PaintPurchase>,
}

impl ColorSearchResult {
    pub fn not_found() -> Self {
        Self::default()
    }

    pub fn is_found(&self) -> bool {
        self.paint.is_some()
    }

    /// Sum of the base quantities as displayed
    pub fn base_total(&self) -> f64 {
        base_total(&self.base_formulation)
    }
}

// ============================================================================
// RESOLVERS
// ============================================================================

/// Find the first customer whose name contains `query` and load their history.
///
/// Store failures are logged and returned as errors, distinct from a miss.
pub fn search_by_customer(gateway: &dyn PersistenceGateway, query: &str) -> ShopResult<CustomerSearchResult> {
    resolve_customer(gateway, query).map_err(|e| {
        error!(query, error = %e, "customer search failed");
        e
    })
}

fn resolve_customer(gateway: &dyn PersistenceGateway, query: &str) -> ShopResult<CustomerSearchResult> {
    let Some(customer) = gateway.find_customer_by_name(query)? else {
        debug!(query, "no customer matched");
        return Ok(CustomerSearchResult::not_found());
    };

    let mut purchases = Vec::new();
    for (purchase, paint) in gateway.purchases_for_customer(customer.id)? {
        let components = gateway.formulation_for_paint(paint.id)?;
        let formulation = scale_formulation(&components, purchase.size, Some(paint.base_size))?;

        purchases.push(CustomerPurchase {
            purchase,
            color_name: paint.color_name,
            product_type: paint.product_type,
            base_size: paint.base_size,
            base_unit: paint.base_unit,
            formulation,
        });
    }

    debug!(customer_id = customer.id, purchases = purchases.len(), "customer resolved");
    Ok(CustomerSearchResult {
        customer: Some(customer),
        purchases,
    })
}

/// Find the first paint whose color name contains `query`, with its base
/// formulation and everyone who bought it.
pub fn search_by_color(gateway: &dyn PersistenceGateway, query: &str) -> ShopResult<ColorSearchResult> {
    resolve_color(gateway, query).map_err(|e| {
        error!(query, error = %e, "color search failed");
        e
    })
}

fn resolve_color(gateway: &dyn PersistenceGateway, query: &str) -> ShopResult<ColorSearchResult> {
    let Some(paint) = gateway.find_paint_by_color(query)? else {
        debug!(query, "no color matched");
        return Ok(ColorSearchResult::not_found());
    };

    let base_formulation = gateway.formulation_for_paint(paint.id)?;
    let customers = gateway.purchases_for_paint(paint.id)?;

    debug!(paint_id = paint.id, buyers = customers.len(), "color resolved");
    Ok(ColorSearchResult {
        paint: Some(paint),
        base_formulation,
        customers,
    })
}
