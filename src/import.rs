// 📥 Catalog Import - CSV → PaintDraft → gateway
//
// One row per component:
//   color_name,product_type,base_size,base_unit,description,component_name,quantity,unit
// Consecutive rows with the same (color_name, product_type) form one paint.
// A row with an empty component_name declares a paint with no components.

use crate::entities::{ComponentData, PaintData, PaintDraft};
use crate::extraction::DEFAULT_UNIT;
use crate::formulation::{parse_quantity, RawQuantity};
use crate::gateway::PersistenceGateway;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct CatalogRow {
    color_name: String,
    product_type: String,
    base_size: String,
    #[serde(default)]
    base_unit: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    component_name: String,
    #[serde(default)]
    quantity: String,
    #[serde(default)]
    unit: String,
}

fn unit_or_default(unit: &str) -> String {
    let unit = unit.trim();
    if unit.is_empty() {
        DEFAULT_UNIT.to_string()
    } else {
        unit.to_string()
    }
}

/// Read a catalog CSV file into drafts
pub fn load_catalog_csv(path: &Path) -> Result<Vec<PaintDraft>> {
    let file = std::fs::File::open(path).with_context(|| format!("Failed to open catalog: {}", path.display()))?;
    read_catalog(file)
}

/// Read catalog rows from any reader (header row required)
pub fn read_catalog<R: Read>(reader: R) -> Result<Vec<PaintDraft>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut drafts: Vec<PaintDraft> = Vec::new();

    for (index, result) in rdr.deserialize::<CatalogRow>().enumerate() {
        // +2: 1-indexed plus the header row
        let line = index + 2;
        let row = result.with_context(|| format!("Failed to parse catalog line {}", line))?;

        let same_paint = drafts.last().is_some_and(|draft| {
            draft.paint.color_name == row.color_name && draft.paint.product_type == row.product_type
        });

        if !same_paint {
            let base_size = parse_quantity(&RawQuantity::Text(row.base_size.clone()))
                .with_context(|| format!("Bad base_size on line {}", line))?;
            let mut paint = PaintData::new(&row.color_name, &row.product_type, base_size, &unit_or_default(&row.base_unit));
            if !row.description.is_empty() {
                paint = paint.with_description(&row.description);
            }
            drafts.push(PaintDraft {
                paint,
                components: Vec::new(),
            });
        }

        if row.component_name.is_empty() {
            continue;
        }

        let quantity = parse_quantity(&RawQuantity::Text(row.quantity.clone()))
            .with_context(|| format!("Bad quantity on line {}", line))?;

        if let Some(draft) = drafts.last_mut() {
            let sort_order = draft.components.len() as i64;
            draft.components.push(ComponentData::new(
                &row.component_name,
                quantity,
                &unit_or_default(&row.unit),
                sort_order,
            ));
        }
    }

    Ok(drafts)
}

// ============================================================================
// IMPORT INTO THE STORE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedPaint {
    pub color_name: String,
    pub product_type: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub created: Vec<i64>,
    pub skipped: Vec<SkippedPaint>,
}

/// Create each draft through the gateway.
///
/// Paints whose color and product type already exist (ignoring case) are
/// skipped, as are drafts the gateway rejects. A store outage aborts.
pub fn import_catalog(gateway: &dyn PersistenceGateway, drafts: &[PaintDraft]) -> Result<ImportSummary> {
    let mut existing: Vec<(String, String)> = gateway
        .list_paints()
        .context("Failed to read existing paints")?
        .into_iter()
        .map(|paint| (paint.color_name.to_lowercase(), paint.product_type.to_lowercase()))
        .collect();

    let mut summary = ImportSummary::default();

    for draft in drafts {
        let key = (
            draft.paint.color_name.trim().to_lowercase(),
            draft.paint.product_type.trim().to_lowercase(),
        );
        let skip = |reason: String| SkippedPaint {
            color_name: draft.paint.color_name.clone(),
            product_type: draft.paint.product_type.clone(),
            reason,
        };

        if existing.contains(&key) {
            summary.skipped.push(skip("already in catalog".to_string()));
            continue;
        }

        match gateway.create_paint(&draft.paint, &draft.components) {
            Ok(id) => {
                summary.created.push(id);
                existing.push(key);
            }
            Err(e) if e.is_data_source() => {
                return Err(e).context("Store became unavailable during import");
            }
            Err(e) => {
                warn!(color = %draft.paint.color_name, error = %e, "skipping catalog entry");
                summary.skipped.push(skip(e.to_string()));
            }
        }
    }

    info!(created = summary.created.len(), skipped = summary.skipped.len(), "catalog import finished");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::SqliteGateway;
    use std::io::Write;

    const CATALOG: &str = "\
color_name,product_type,base_size,base_unit,description,component_name,quantity,unit
Ocean Blue,QD Enamel,5,litre,Deep marine blue,White Base,3.5,litre
Ocean Blue,QD Enamel,5,litre,Deep marine blue,Blue Tint,1.0,litre
Ocean Blue,QD Enamel,5,litre,Deep marine blue,Black,0.5,
Sunset Orange,DTM,4,,,Red Oxide,0.4,litre
Primer White,DTM,1,litre,,,,
";

    #[test]
    fn test_read_catalog_groups_consecutive_rows() {
        let drafts = read_catalog(CATALOG.as_bytes()).unwrap();

        assert_eq!(drafts.len(), 3);

        let ocean = &drafts[0];
        assert_eq!(ocean.paint.base_size, 5.0);
        assert_eq!(ocean.paint.description.as_deref(), Some("Deep marine blue"));
        assert_eq!(ocean.components.len(), 3);
        assert_eq!(ocean.components[2].unit, "litre");
        assert_eq!(ocean.components[2].sort_order, 2);

        assert_eq!(drafts[1].paint.base_unit, "litre");
        assert_eq!(drafts[1].paint.description, None);
        assert!(drafts[2].components.is_empty());
    }

    #[test]
    fn test_read_catalog_rejects_text_quantity() {
        let csv = "\
color_name,product_type,base_size,base_unit,description,component_name,quantity,unit
Ocean Blue,QD Enamel,5,litre,,Blue Tint,a dash,litre
";
        let err = read_catalog(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_import_catalog_skips_existing_and_invalid() {
        let gateway = SqliteGateway::open_in_memory().unwrap();
        gateway
            .create_paint(&PaintData::new("ocean blue", "qd enamel", 5.0, "litre"), &[])
            .unwrap();

        let mut drafts = read_catalog(CATALOG.as_bytes()).unwrap();
        drafts.push(PaintDraft {
            paint: PaintData::new("Nameless", "DTM", 0.0, "litre"),
            components: vec![],
        });

        let summary = import_catalog(&gateway, &drafts).unwrap();

        assert_eq!(summary.created.len(), 2);
        assert_eq!(summary.skipped.len(), 2);
        assert_eq!(summary.skipped[0].reason, "already in catalog");
        assert_eq!(summary.skipped[1].color_name, "Nameless");
        assert_eq!(gateway.list_paints().unwrap().len(), 3);
    }

    #[test]
    fn test_import_catalog_does_not_duplicate_within_file() {
        let gateway = SqliteGateway::open_in_memory().unwrap();
        let mut drafts = read_catalog(CATALOG.as_bytes()).unwrap();
        drafts.push(drafts[1].clone());

        let summary = import_catalog(&gateway, &drafts).unwrap();

        assert_eq!(summary.created.len(), 3);
        assert_eq!(summary.skipped.len(), 1);
    }

    #[test]
    fn test_load_catalog_csv_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CATALOG.as_bytes()).unwrap();

        let drafts = load_catalog_csv(file.path()).unwrap();
        assert_eq!(drafts.len(), 3);

        assert!(load_catalog_csv(Path::new("/nonexistent/catalog.csv")).is_err());
    }
}
