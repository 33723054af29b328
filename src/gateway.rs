// 🔌 Persistence Gateway - the only path to and from the store
//
// Search and reporting depend on the trait, never on rusqlite, so they can be
// exercised against failing or canned stores.

use crate::db;
use crate::entities::{
    ComponentData, Customer, CustomerData, FormulationComponent, Paint, PaintData, PaintPurchase,
    PaintWithFormulation, Purchase, PurchaseData, PurchaseWithDetails,
};
use crate::error::{ShopError, ShopResult};
use crate::report::Snapshot;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

// ============================================================================
// GATEWAY TRAIT
// ============================================================================

pub trait PersistenceGateway: Send + Sync {
    // --- reads ---------------------------------------------------------------
    fn list_customers(&self) -> ShopResult<Vec<Customer>>;
    fn list_paints(&self) -> ShopResult<Vec<Paint>>;
    fn list_purchases(&self) -> ShopResult<Vec<Purchase>>;
    fn list_purchases_with_details(&self) -> ShopResult<Vec<PurchaseWithDetails>>;

    fn get_customer(&self, id: i64) -> ShopResult<Option<Customer>>;
    fn get_paint(&self, id: i64) -> ShopResult<Option<PaintWithFormulation>>;
    fn get_purchase(&self, id: i64) -> ShopResult<Option<Purchase>>;

    /// First customer whose name contains `query`, ignoring case
    fn find_customer_by_name(&self, query: &str) -> ShopResult<Option<Customer>>;
    /// First paint whose color name contains `query`, ignoring case
    fn find_paint_by_color(&self, query: &str) -> ShopResult<Option<Paint>>;

    fn formulation_for_paint(&self, paint_id: i64) -> ShopResult<Vec<FormulationComponent>>;
    fn purchases_for_customer(&self, customer_id: i64) -> ShopResult<Vec<(Purchase, Paint)>>;
    fn purchases_for_paint(&self, paint_id: i64) -> ShopResult<Vec<PaintPurchase>>;

    /// Point-in-time read of everything the report aggregates
    fn snapshot(&self) -> ShopResult<Snapshot> {
        Ok(Snapshot {
            customers: self.list_customers()?,
            paints: self.list_paints()?,
            purchases: self.list_purchases()?,
        })
    }

    // --- writes --------------------------------------------------------------
    fn create_customer(&self, data: &CustomerData) -> ShopResult<i64>;
    fn update_customer(&self, id: i64, data: &CustomerData) -> ShopResult<()>;
    /// Removes the customer's purchases too; returns how many
    fn delete_customer(&self, id: i64) -> ShopResult<usize>;

    fn create_paint(&self, data: &PaintData, components: &[ComponentData]) -> ShopResult<i64>;
    /// Replaces every component atomically
    fn update_paint(&self, id: i64, data: &PaintData, components: &[ComponentData]) -> ShopResult<()>;
    fn delete_paint(&self, id: i64) -> ShopResult<()>;

    fn create_purchase(&self, data: &PurchaseData) -> ShopResult<i64>;
    fn delete_purchase(&self, id: i64) -> ShopResult<()>;
}

// ============================================================================
// SQLITE GATEWAY
// ============================================================================

/// Gateway over a single SQLite connection
pub struct SqliteGateway {
    conn: Mutex<Connection>,
}

impl SqliteGateway {
    /// Open (or create) a database file and make sure the schema exists
    pub fn open(path: &Path) -> ShopResult<Self> {
        let conn = Connection::open(path)?;
        db::setup_database(&conn)?;
        info!(path = %path.display(), "opened shop database");
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> ShopResult<Self> {
        let conn = Connection::open_in_memory()?;
        db::setup_database(&conn)?;
        Ok(Self::from_connection(conn))
    }

    /// Wrap a connection whose schema is already set up
    pub fn from_connection(conn: Connection) -> Self {
        SqliteGateway {
            conn: Mutex::new(conn),
        }
    }

    fn lock(&self) -> ShopResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| ShopError::DataSourceUnavailable("connection lock poisoned".to_string()))
    }

    /// Audit trail for one entity
    pub fn events_for(&self, entity_type: &str, entity_id: i64) -> ShopResult<Vec<db::Event>> {
        db::get_events_for_entity(&*self.lock()?, entity_type, entity_id)
    }
}

fn validate_components(components: &[ComponentData]) -> ShopResult<Vec<ComponentData>> {
    components
        .iter()
        .map(|component| component.validate().map(|_| component.clone()))
        .collect()
}

impl PersistenceGateway for SqliteGateway {
    fn list_customers(&self) -> ShopResult<Vec<Customer>> {
        db::list_customers(&*self.lock()?)
    }

    fn list_paints(&self) -> ShopResult<Vec<Paint>> {
        db::list_paints(&*self.lock()?)
    }

    fn list_purchases(&self) -> ShopResult<Vec<Purchase>> {
        db::list_purchases(&*self.lock()?)
    }

    fn list_purchases_with_details(&self) -> ShopResult<Vec<PurchaseWithDetails>> {
        db::list_purchases_with_details(&*self.lock()?)
    }

    fn get_customer(&self, id: i64) -> ShopResult<Option<Customer>> {
        db::get_customer(&*self.lock()?, id)
    }

    fn get_paint(&self, id: i64) -> ShopResult<Option<PaintWithFormulation>> {
        let conn = self.lock()?;
        let Some(paint) = db::get_paint(&conn, id)? else {
            return Ok(None);
        };
        let formulations = db::formulation_for_paint(&conn, id)?;
        Ok(Some(PaintWithFormulation { paint, formulations }))
    }

    fn get_purchase(&self, id: i64) -> ShopResult<Option<Purchase>> {
        db::get_purchase(&*self.lock()?, id)
    }

    fn find_customer_by_name(&self, query: &str) -> ShopResult<Option<Customer>> {
        debug!(query, "customer name lookup");
        db::find_customer_by_name(&*self.lock()?, query)
    }

    fn find_paint_by_color(&self, query: &str) -> ShopResult<Option<Paint>> {
        debug!(query, "color name lookup");
        db::find_paint_by_color(&*self.lock()?, query)
    }

    fn formulation_for_paint(&self, paint_id: i64) -> ShopResult<Vec<FormulationComponent>> {
        db::formulation_for_paint(&*self.lock()?, paint_id)
    }

    fn purchases_for_customer(&self, customer_id: i64) -> ShopResult<Vec<(Purchase, Paint)>> {
        db::purchases_for_customer(&*self.lock()?, customer_id)
    }

    fn purchases_for_paint(&self, paint_id: i64) -> ShopResult<Vec<PaintPurchase>> {
        db::purchases_for_paint(&*self.lock()?, paint_id)
    }

    fn snapshot(&self) -> ShopResult<Snapshot> {
        // one lock for all three reads, so no write lands in between
        let conn = self.lock()?;
        Ok(Snapshot {
            customers: db::list_customers(&conn)?,
            paints: db::list_paints(&conn)?,
            purchases: db::list_purchases(&conn)?,
        })
    }

    fn create_customer(&self, data: &CustomerData) -> ShopResult<i64> {
        data.validate()?;
        let id = db::insert_customer(&mut *self.lock()?, &data.normalized())?;
        info!(customer_id = id, "customer created");
        Ok(id)
    }

    fn update_customer(&self, id: i64, data: &CustomerData) -> ShopResult<()> {
        data.validate()?;
        db::update_customer(&mut *self.lock()?, id, &data.normalized())?;
        info!(customer_id = id, "customer updated");
        Ok(())
    }

    fn delete_customer(&self, id: i64) -> ShopResult<usize> {
        let removed = db::delete_customer(&mut *self.lock()?, id)?;
        info!(customer_id = id, purchases_removed = removed, "customer deleted");
        Ok(removed)
    }

    fn create_paint(&self, data: &PaintData, components: &[ComponentData]) -> ShopResult<i64> {
        data.validate()?;
        let components = validate_components(components)?;
        let id = db::insert_paint(&mut *self.lock()?, &data.normalized(), &components)?;
        info!(paint_id = id, components = components.len(), "paint created");
        Ok(id)
    }

    fn update_paint(&self, id: i64, data: &PaintData, components: &[ComponentData]) -> ShopResult<()> {
        data.validate()?;
        let components = validate_components(components)?;
        db::update_paint(&mut *self.lock()?, id, &data.normalized(), &components)?;
        info!(paint_id = id, components = components.len(), "paint formulation replaced");
        Ok(())
    }

    fn delete_paint(&self, id: i64) -> ShopResult<()> {
        db::delete_paint(&mut *self.lock()?, id)?;
        info!(paint_id = id, "paint deleted");
        Ok(())
    }

    fn create_purchase(&self, data: &PurchaseData) -> ShopResult<i64> {
        data.validate()?;
        let id = db::insert_purchase(&mut *self.lock()?, &data.normalized())?;
        info!(purchase_id = id, customer_id = data.customer_id, paint_id = data.paint_id, "purchase recorded");
        Ok(id)
    }

    fn delete_purchase(&self, id: i64) -> ShopResult<()> {
        db::delete_purchase(&mut *self.lock()?, id)?;
        info!(purchase_id = id, "purchase deleted");
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::CustomerType;
    use chrono::NaiveDate;

    #[test]
    fn test_gateway_rejects_invalid_writes_before_touching_store() {
        let gateway = SqliteGateway::open_in_memory().unwrap();

        let result = gateway.create_paint(
            &PaintData::new("Ocean Blue", "QD Enamel", 5.0, "litre"),
            &[ComponentData::new("Blue Tint", f64::NAN, "litre", 0)],
        );
        assert!(matches!(result, Err(ShopError::Validation(_))));
        assert!(gateway.list_paints().unwrap().is_empty());

        let result = gateway.create_customer(&CustomerData::new("", CustomerType::Company));
        assert!(matches!(result, Err(ShopError::Validation(_))));
    }

    #[test]
    fn test_gateway_get_paint_includes_formulation() {
        let gateway = SqliteGateway::open_in_memory().unwrap();
        let id = gateway
            .create_paint(
                &PaintData::new(" Ocean Blue ", "QD Enamel", 5.0, "litre"),
                &[ComponentData::new("Blue Tint", 1.0, "litre", 0)],
            )
            .unwrap();

        let paint = gateway.get_paint(id).unwrap().unwrap();

        assert_eq!(paint.paint.color_name, "Ocean Blue");
        assert_eq!(paint.formulations.len(), 1);
        assert!(gateway.get_paint(id + 100).unwrap().is_none());
    }

    #[test]
    fn test_snapshot_reads_all_tables() {
        let gateway = SqliteGateway::open_in_memory().unwrap();
        let customer = gateway
            .create_customer(&CustomerData::new("Ana", CustomerType::Individual))
            .unwrap();
        let paint = gateway
            .create_paint(&PaintData::new("Sunset", "DTM", 4.0, "litre"), &[])
            .unwrap();
        gateway
            .create_purchase(&PurchaseData::new(
                customer,
                paint,
                2.0,
                "litre",
                NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            ))
            .unwrap();

        let snapshot = gateway.snapshot().unwrap();

        assert_eq!(snapshot.customers.len(), 1);
        assert_eq!(snapshot.paints.len(), 1);
        assert_eq!(snapshot.purchases.len(), 1);
    }

    #[test]
    fn test_gateway_records_events() {
        let gateway = SqliteGateway::open_in_memory().unwrap();
        let id = gateway
            .create_customer(&CustomerData::new("Ana", CustomerType::Individual))
            .unwrap();
        gateway.delete_customer(id).unwrap();

        let events = gateway.events_for("customer", id).unwrap();
        let kinds: Vec<&str> = events.iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(kinds, vec!["customer_created", "customer_deleted"]);
    }

    #[test]
    fn test_every_call_takes_and_releases_the_connection() {
        let gateway = SqliteGateway::open_in_memory().unwrap();
        let customer = gateway
            .create_customer(&CustomerData::new("Ana Souza", CustomerType::Individual))
            .unwrap();
        gateway
            .update_customer(customer, &CustomerData::new("Ana Souza", CustomerType::Company))
            .unwrap();
        let paint = gateway
            .create_paint(
                &PaintData::new("Sunset", "DTM", 4.0, "litre"),
                &[ComponentData::new("Red Oxide", 0.4, "litre", 0)],
            )
            .unwrap();
        gateway
            .update_paint(
                paint,
                &PaintData::new("Sunset", "DTM", 4.0, "litre"),
                &[ComponentData::new("Red Oxide", 0.5, "litre", 0)],
            )
            .unwrap();
        let purchase = gateway
            .create_purchase(&PurchaseData::new(
                customer,
                paint,
                8.0,
                "litre",
                NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            ))
            .unwrap();

        assert_eq!(gateway.list_customers().unwrap().len(), 1);
        assert_eq!(gateway.list_paints().unwrap().len(), 1);
        assert_eq!(gateway.list_purchases().unwrap().len(), 1);
        assert_eq!(gateway.list_purchases_with_details().unwrap().len(), 1);
        assert_eq!(
            gateway.get_customer(customer).unwrap().map(|c| c.customer_type),
            Some(CustomerType::Company)
        );
        assert!(gateway.get_purchase(purchase).unwrap().is_some());
        assert_eq!(gateway.find_customer_by_name("souza").unwrap().map(|c| c.id), Some(customer));
        assert_eq!(gateway.find_paint_by_color("sun").unwrap().map(|p| p.id), Some(paint));
        assert_eq!(gateway.formulation_for_paint(paint).unwrap()[0].quantity, 0.5);
        assert_eq!(gateway.purchases_for_customer(customer).unwrap().len(), 1);
        assert_eq!(gateway.purchases_for_paint(paint).unwrap().len(), 1);
        assert_eq!(gateway.events_for("purchase", purchase).unwrap().len(), 1);

        gateway.delete_purchase(purchase).unwrap();
        gateway.delete_paint(paint).unwrap();
        assert_eq!(gateway.delete_customer(customer).unwrap(), 0);
        assert!(gateway.snapshot().unwrap().customers.is_empty());
    }

    #[test]
    fn test_delete_missing_purchase_is_not_found() {
        let gateway = SqliteGateway::open_in_memory().unwrap();
        assert_eq!(gateway.delete_purchase(7), Err(ShopError::not_found("purchase", 7)));
    }
}
