// Tint Shop - Core Library
// Customer, paint and purchase records for a paint-tinting counter.
// Exposes all modules for use in the CLI, the API server, and tests.

pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod extraction;
pub mod formulation;
pub mod gateway;
pub mod import;
pub mod report;
pub mod search;
pub mod share;

// Re-export commonly used types
pub use config::ShopConfig;
pub use db::{setup_database, Event};
pub use entities::{
    ComponentData, Customer, CustomerData, CustomerType, FormulationComponent, Paint, PaintData, PaintDraft,
    PaintPurchase, PaintWithFormulation, Purchase, PurchaseData, PurchaseWithDetails,
};
pub use error::{ShopError, ShopResult};
pub use extraction::{extract_draft, FormulationCandidate, FormulationExtractor, ImagePayload};
pub use formulation::{parse_quantity, round_quantity, scale, scale_formulation, RawQuantity, ScaledFormulation};
pub use gateway::{PersistenceGateway, SqliteGateway};
pub use import::{import_catalog, load_catalog_csv, ImportSummary};
pub use report::{compute_report, fetch_report, load_report, ReportOptions, ReportOutcome, ReportSummary, Snapshot};
pub use search::{search_by_color, search_by_customer, ColorSearchResult, CustomerSearchResult};
pub use share::{share_message, share_purchase, ShareHeader};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
