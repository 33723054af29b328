// 📤 Share text - the plain-text formulation staff copy into chat apps

use crate::error::{ShopError, ShopResult};
use crate::formulation::{scale_formulation, ScaledFormulation};
use crate::gateway::PersistenceGateway;
use serde::{Deserialize, Serialize};

/// What the message is about; quantities come from the scaled formulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareHeader {
    pub paint_name: String,
    pub product_type: String,
    pub size: f64,
    pub unit: String,
    pub customer_name: Option<String>,
}

/// Render the share message.
///
/// Quantities are printed with 3 decimals from the already-rounded values, so
/// the text always matches what the catalog and purchase pages show.
pub fn share_message(header: &ShareHeader, formulation: &ScaledFormulation) -> String {
    let mut message = String::from("🎨 Paint Formulation\n\n");

    if let Some(customer) = &header.customer_name {
        message.push_str(&format!("Customer: {}\n", customer));
    }

    message.push_str(&format!("Paint: {}\n", header.paint_name));
    message.push_str(&format!("Type: {}\n", header.product_type));
    message.push_str(&format!("Size: {} {}\n\n", header.size, header.unit));
    message.push_str("Formula:\n");

    for component in &formulation.components {
        message.push_str(&format!(
            "• {}: {:.3} {}\n",
            component.component_name, component.quantity, component.unit
        ));
    }

    message.push_str(&format!("\nTotal: {:.3} {}", formulation.total, header.unit));

    message
}

/// Share text for a recorded purchase, scaled to the size that was sold
pub fn share_purchase(gateway: &dyn PersistenceGateway, purchase_id: i64) -> ShopResult<String> {
    let purchase = gateway
        .get_purchase(purchase_id)?
        .ok_or_else(|| ShopError::not_found("purchase", purchase_id))?;
    let paint = gateway
        .get_paint(purchase.paint_id)?
        .ok_or_else(|| ShopError::not_found("paint", purchase.paint_id))?;
    let customer = gateway.get_customer(purchase.customer_id)?;

    let formulation = scale_formulation(&paint.formulations, purchase.size, Some(paint.paint.base_size))?;
    let header = ShareHeader {
        paint_name: paint.paint.color_name,
        product_type: paint.paint.product_type,
        size: purchase.size,
        unit: purchase.unit,
        customer_name: customer.map(|c| c.name),
    };

    Ok(share_message(&header, &formulation))
}
