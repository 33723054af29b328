// Entity Models
//
// Each entity has:
// - Integer identity assigned by the store
// - A *Data input type carrying the fields accepted on create/update
// - validate() guarding the write path

pub mod customer;
pub mod paint;
pub mod purchase;

pub use customer::{Customer, CustomerData, CustomerType};
pub use paint::{ComponentData, FormulationComponent, Paint, PaintData, PaintDraft, PaintWithFormulation};
pub use purchase::{PaintPurchase, Purchase, PurchaseData, PurchaseWithDetails};
