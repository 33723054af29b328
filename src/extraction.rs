// 📷 Formulation Extraction - turn a photo of a recipe card into a draft
//
// The extractor is an external model. Everything it returns is a suggestion:
// the candidate becomes a PaintDraft that a person reviews and edits in the
// entry form before anything is written to the store.

use crate::entities::{ComponentData, PaintData, PaintDraft};
use crate::error::{ShopError, ShopResult};
use crate::formulation::{parse_quantity, RawQuantity};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_UNIT: &str = "litre";

fn default_unit() -> String {
    DEFAULT_UNIT.to_string()
}

// ============================================================================
// PAYLOAD & CANDIDATE
// ============================================================================

/// Image handed to the extractor, usually a `data:image/...;base64,` URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePayload {
    pub image: String,
}

impl ImagePayload {
    pub fn new(image: &str) -> ShopResult<Self> {
        if image.trim().is_empty() {
            return Err(ShopError::Validation("no image provided".to_string()));
        }
        Ok(ImagePayload {
            image: image.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateComponent {
    pub name: String,
    pub quantity: RawQuantity,
    #[serde(default = "default_unit")]
    pub unit: String,
}

/// Structured output of the extraction model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormulationCandidate {
    pub color_name: String,
    pub product_type: String,
    pub base_size: RawQuantity,
    #[serde(default = "default_unit")]
    pub base_unit: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub components: Vec<CandidateComponent>,
}

impl FormulationCandidate {
    /// Parse a service response body
    pub fn from_json(body: &str) -> ShopResult<Self> {
        serde_json::from_str(body).map_err(|e| ShopError::ExtractionFailed(format!("malformed candidate: {}", e)))
    }

    /// Convert into a draft for review. Numbers go through the same
    /// parse-or-fail step as every other external quantity.
    pub fn into_draft(self) -> ShopResult<PaintDraft> {
        let base_size = parse_quantity(&self.base_size)?;

        let paint = PaintData {
            color_name: self.color_name,
            product_type: self.product_type,
            base_size,
            base_unit: self.base_unit,
            description: self.description,
        }
        .normalized();

        let components = self
            .components
            .into_iter()
            .enumerate()
            .map(|(position, candidate)| {
                Ok(ComponentData {
                    component_name: candidate.name.trim().to_string(),
                    quantity: parse_quantity(&candidate.quantity)?,
                    unit: candidate.unit.trim().to_string(),
                    sort_order: position as i64,
                })
            })
            .collect::<ShopResult<Vec<_>>>()?;

        let draft = PaintDraft { paint, components };
        draft.validate()?;
        Ok(draft)
    }
}

// ============================================================================
// EXTRACTOR SEAM
// ============================================================================

/// External image-to-formulation service
pub trait FormulationExtractor: Send + Sync {
    fn extract(&self, image: &ImagePayload) -> ShopResult<FormulationCandidate>;
}

/// Run the extractor and produce a draft for the entry form
pub fn extract_draft(extractor: &dyn FormulationExtractor, image: &ImagePayload) -> ShopResult<PaintDraft> {
    let candidate = extractor.extract(image).map_err(|e| {
        warn!(error = %e, "formulation extraction failed");
        match e {
            ShopError::ExtractionFailed(_) => e,
            other => ShopError::ExtractionFailed(other.to_string()),
        }
    })?;

    candidate.into_draft()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CARD: &str = r#"{
        "colorName": "Harbor Grey",
        "productType": "QD Enamel",
        "baseSize": 4,
        "components": [
            {"name": "White Base", "quantity": 3.2},
            {"name": "Black", "quantity": "0.45", "unit": "litre"},
            {"name": "Yellow Oxide", "quantity": 0.05, "unit": "ml"}
        ]
    }"#;

    struct CannedExtractor(&'static str);

    impl FormulationExtractor for CannedExtractor {
        fn extract(&self, _image: &ImagePayload) -> ShopResult<FormulationCandidate> {
            FormulationCandidate::from_json(self.0)
        }
    }

    struct BrokenExtractor;

    impl FormulationExtractor for BrokenExtractor {
        fn extract(&self, _image: &ImagePayload) -> ShopResult<FormulationCandidate> {
            Err(ShopError::DataSourceUnavailable("model timeout".to_string()))
        }
    }

    #[test]
    fn test_candidate_defaults_units_to_litre() {
        let candidate = FormulationCandidate::from_json(CARD).unwrap();

        assert_eq!(candidate.base_unit, "litre");
        assert_eq!(candidate.components[0].unit, "litre");
        assert_eq!(candidate.components[2].unit, "ml");
        assert_eq!(candidate.description, None);
    }

    #[test]
    fn test_into_draft_parses_text_numbers_and_orders_components() {
        let draft = FormulationCandidate::from_json(CARD).unwrap().into_draft().unwrap();

        assert_eq!(draft.paint.color_name, "Harbor Grey");
        assert_eq!(draft.paint.base_size, 4.0);
        assert_eq!(draft.components.len(), 3);
        assert_eq!(draft.components[1].quantity, 0.45);
        let orders: Vec<i64> = draft.components.iter().map(|c| c.sort_order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
    }

    #[test]
    fn test_non_numeric_quantity_is_rejected() {
        let body = r#"{"colorName": "X", "productType": "DTM", "baseSize": 1,
                       "components": [{"name": "Tint", "quantity": "a pinch"}]}"#;

        let result = FormulationCandidate::from_json(body).unwrap().into_draft();

        assert_eq!(result, Err(ShopError::InvalidQuantity("a pinch".to_string())));
    }

    #[test]
    fn test_missing_color_name_fails_validation() {
        let body = r#"{"colorName": " ", "productType": "DTM", "baseSize": 1}"#;

        let result = FormulationCandidate::from_json(body).unwrap().into_draft();

        assert!(matches!(result, Err(ShopError::Validation(_))));
    }

    #[test]
    fn test_malformed_body_is_extraction_failure() {
        let result = FormulationCandidate::from_json("{\"colorName\": 3}");
        assert!(matches!(result, Err(ShopError::ExtractionFailed(_))));
    }

    #[test]
    fn test_empty_image_is_rejected() {
        assert!(matches!(ImagePayload::new("  "), Err(ShopError::Validation(_))));
    }

    #[test]
    fn test_extract_draft_with_canned_extractor() {
        let image = ImagePayload::new("data:image/png;base64,iVBORw0KGgo=").unwrap();

        let draft = extract_draft(&CannedExtractor(CARD), &image).unwrap();
        assert_eq!(draft.paint.product_type, "QD Enamel");

        let result = extract_draft(&BrokenExtractor, &image);
        assert!(matches!(result, Err(ShopError::ExtractionFailed(_))));
    }
}
