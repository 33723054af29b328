// 🗄️ SQLite storage - schema, row mapping, statements, audit trail
//
// Free functions over a rusqlite Connection. Multi-statement writes take
// `&mut Connection` and run inside one transaction, so a failure part way
// through (e.g. a CHECK violation while reinserting components) leaves the
// previous rows untouched.

use crate::entities::{
    ComponentData, Customer, CustomerData, CustomerType, FormulationComponent, Paint, PaintData,
    PaintPurchase, Purchase, PurchaseData, PurchaseWithDetails,
};
use crate::error::{ShopError, ShopResult};
use crate::formulation::{parse_quantity, RawQuantity};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

const DATE_FORMAT: &str = "%Y-%m-%d";

const CUSTOMER_COLUMNS: &str =
    "c.id, c.name, c.customer_type, c.phone, c.email, c.notes, c.created_at, c.updated_at";
const PAINT_COLUMNS: &str =
    "pa.id, pa.color_name, pa.product_type, pa.base_size, pa.base_unit, pa.description, pa.created_at, pa.updated_at";
const PURCHASE_COLUMNS: &str =
    "p.id, p.customer_id, p.paint_id, p.size, p.unit, p.purchase_date, p.notes, p.created_at";
const COMPONENT_COLUMNS: &str =
    "f.id, f.paint_id, f.component_name, f.quantity, f.unit, f.sort_order, f.created_at";

// ============================================================================
// AUDIT EVENTS
// ============================================================================

/// Event for the audit trail; one per gateway write
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Event {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub data: serde_json::Value,
    pub actor: String,
}

impl Event {
    pub fn new(
        event_type: &str,
        entity_type: &str,
        entity_id: i64,
        data: serde_json::Value,
        actor: &str,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            data,
            actor: actor.to_string(),
        }
    }
}

// ============================================================================
// SCHEMA
// ============================================================================

pub fn setup_database(conn: &Connection) -> ShopResult<()> {
    // WAL for crash recovery; foreign keys are off by default in SQLite
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS customers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            customer_type TEXT NOT NULL CHECK (customer_type IN ('individual', 'company')),
            phone TEXT,
            email TEXT,
            notes TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS paints (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            color_name TEXT NOT NULL,
            product_type TEXT NOT NULL,
            base_size REAL NOT NULL CHECK (base_size > 0),
            base_unit TEXT NOT NULL,
            description TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS formulations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            paint_id INTEGER NOT NULL REFERENCES paints(id) ON DELETE CASCADE,
            component_name TEXT NOT NULL,
            quantity REAL NOT NULL CHECK (quantity >= 0),
            unit TEXT NOT NULL,
            sort_order INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS purchases (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            customer_id INTEGER NOT NULL REFERENCES customers(id),
            paint_id INTEGER NOT NULL REFERENCES paints(id),
            size REAL NOT NULL CHECK (size > 0),
            unit TEXT NOT NULL,
            purchase_date TEXT NOT NULL,
            notes TEXT,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            data TEXT NOT NULL,
            actor TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_formulations_paint ON formulations(paint_id, sort_order);
        CREATE INDEX IF NOT EXISTS idx_purchases_customer ON purchases(customer_id);
        CREATE INDEX IF NOT EXISTS idx_purchases_paint ON purchases(paint_id);
        CREATE INDEX IF NOT EXISTS idx_purchases_date ON purchases(purchase_date);
        CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id);",
    )?;

    Ok(())
}

// ============================================================================
// ROW MAPPING
// ============================================================================

fn now_stamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn timestamp_at(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn date_at(row: &Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let text: String = row.get(idx)?;
    NaiveDate::parse_from_str(&text, DATE_FORMAT).map_err(|e| conversion_error(idx, e))
}

fn customer_type_at(row: &Row, idx: usize) -> rusqlite::Result<CustomerType> {
    let text: String = row.get(idx)?;
    CustomerType::parse(&text).map_err(|e| conversion_error(idx, e))
}

/// Columns from CUSTOMER_COLUMNS starting at `at`
fn customer_from_row(row: &Row, at: usize) -> rusqlite::Result<Customer> {
    Ok(Customer {
        id: row.get(at)?,
        name: row.get(at + 1)?,
        customer_type: customer_type_at(row, at + 2)?,
        phone: row.get(at + 3)?,
        email: row.get(at + 4)?,
        notes: row.get(at + 5)?,
        created_at: timestamp_at(row, at + 6)?,
        updated_at: timestamp_at(row, at + 7)?,
    })
}

/// Columns from PAINT_COLUMNS starting at `at`
fn paint_from_row(row: &Row, at: usize) -> rusqlite::Result<Paint> {
    Ok(Paint {
        id: row.get(at)?,
        color_name: row.get(at + 1)?,
        product_type: row.get(at + 2)?,
        base_size: row.get(at + 3)?,
        base_unit: row.get(at + 4)?,
        description: row.get(at + 5)?,
        created_at: timestamp_at(row, at + 6)?,
        updated_at: timestamp_at(row, at + 7)?,
    })
}

/// Columns from PURCHASE_COLUMNS starting at `at`
fn purchase_from_row(row: &Row, at: usize) -> rusqlite::Result<Purchase> {
    Ok(Purchase {
        id: row.get(at)?,
        customer_id: row.get(at + 1)?,
        paint_id: row.get(at + 2)?,
        size: row.get(at + 3)?,
        unit: row.get(at + 4)?,
        purchase_date: date_at(row, at + 5)?,
        notes: row.get(at + 6)?,
        created_at: timestamp_at(row, at + 7)?,
    })
}

/// Component row before its quantity has been through `parse_quantity`
struct ComponentRow {
    id: i64,
    paint_id: i64,
    component_name: String,
    quantity: RawQuantity,
    unit: String,
    sort_order: i64,
    created_at: DateTime<Utc>,
}

impl ComponentRow {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        // SQLite keeps non-numeric text in a REAL column as TEXT
        let quantity = match row.get::<_, Value>(3)? {
            Value::Real(value) => RawQuantity::Number(value),
            Value::Integer(value) => RawQuantity::Number(value as f64),
            Value::Text(text) => RawQuantity::Text(text),
            Value::Null | Value::Blob(_) => RawQuantity::Text(String::new()),
        };

        Ok(ComponentRow {
            id: row.get(0)?,
            paint_id: row.get(1)?,
            component_name: row.get(2)?,
            quantity,
            unit: row.get(4)?,
            sort_order: row.get(5)?,
            created_at: timestamp_at(row, 6)?,
        })
    }

    fn into_component(self) -> ShopResult<FormulationComponent> {
        Ok(FormulationComponent {
            id: self.id,
            paint_id: self.paint_id,
            component_name: self.component_name,
            quantity: parse_quantity(&self.quantity)?,
            unit: self.unit,
            sort_order: self.sort_order,
            created_at: self.created_at,
        })
    }
}

// ============================================================================
// CUSTOMERS
// ============================================================================

pub fn list_customers(conn: &Connection) -> ShopResult<Vec<Customer>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CUSTOMER_COLUMNS} FROM customers c ORDER BY c.name ASC, c.id ASC"
    ))?;

    let customers = stmt
        .query_map([], |row| customer_from_row(row, 0))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(customers)
}

pub fn get_customer(conn: &Connection, id: i64) -> ShopResult<Option<Customer>> {
    let customer = conn
        .query_row(
            &format!("SELECT {CUSTOMER_COLUMNS} FROM customers c WHERE c.id = ?1"),
            params![id],
            |row| customer_from_row(row, 0),
        )
        .optional()?;

    Ok(customer)
}

/// Case-insensitive substring match; first match (lowest id) wins
pub fn find_customer_by_name(conn: &Connection, query: &str) -> ShopResult<Option<Customer>> {
    let mut stmt = conn.prepare(&format!("SELECT {CUSTOMER_COLUMNS} FROM customers c ORDER BY c.id ASC"))?;
    let needle = query.to_lowercase();

    for customer in stmt.query_map([], |row| customer_from_row(row, 0))? {
        let customer = customer?;
        if customer.name.to_lowercase().contains(&needle) {
            return Ok(Some(customer));
        }
    }

    Ok(None)
}

pub fn insert_customer(conn: &mut Connection, data: &CustomerData) -> ShopResult<i64> {
    let tx = conn.transaction()?;
    let now = now_stamp();

    tx.execute(
        "INSERT INTO customers (name, customer_type, phone, email, notes, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
        params![
            data.name,
            data.customer_type.as_str(),
            data.phone,
            data.email,
            data.notes,
            now,
        ],
    )?;
    let id = tx.last_insert_rowid();

    insert_event(
        &tx,
        &Event::new("customer_created", "customer", id, serde_json::json!({ "name": data.name }), "gateway"),
    )?;
    tx.commit()?;

    Ok(id)
}

pub fn update_customer(conn: &mut Connection, id: i64, data: &CustomerData) -> ShopResult<()> {
    let tx = conn.transaction()?;

    let updated = tx.execute(
        "UPDATE customers
         SET name = ?1, customer_type = ?2, phone = ?3, email = ?4, notes = ?5, updated_at = ?6
         WHERE id = ?7",
        params![
            data.name,
            data.customer_type.as_str(),
            data.phone,
            data.email,
            data.notes,
            now_stamp(),
            id,
        ],
    )?;
    if updated == 0 {
        return Err(ShopError::not_found("customer", id));
    }

    insert_event(
        &tx,
        &Event::new("customer_updated", "customer", id, serde_json::json!({ "name": data.name }), "gateway"),
    )?;
    tx.commit()?;

    Ok(())
}

/// Delete a customer and every purchase referencing it.
/// Returns the number of purchases removed.
pub fn delete_customer(conn: &mut Connection, id: i64) -> ShopResult<usize> {
    let tx = conn.transaction()?;

    let purchases = tx.execute("DELETE FROM purchases WHERE customer_id = ?1", params![id])?;
    let deleted = tx.execute("DELETE FROM customers WHERE id = ?1", params![id])?;
    if deleted == 0 {
        return Err(ShopError::not_found("customer", id));
    }

    insert_event(
        &tx,
        &Event::new(
            "customer_deleted",
            "customer",
            id,
            serde_json::json!({ "purchases_removed": purchases }),
            "gateway",
        ),
    )?;
    tx.commit()?;

    Ok(purchases)
}

// ============================================================================
// PAINTS & FORMULATIONS
// ============================================================================

pub fn list_paints(conn: &Connection) -> ShopResult<Vec<Paint>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PAINT_COLUMNS} FROM paints pa ORDER BY pa.color_name ASC, pa.id ASC"
    ))?;

    let paints = stmt
        .query_map([], |row| paint_from_row(row, 0))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(paints)
}

pub fn get_paint(conn: &Connection, id: i64) -> ShopResult<Option<Paint>> {
    let paint = conn
        .query_row(
            &format!("SELECT {PAINT_COLUMNS} FROM paints pa WHERE pa.id = ?1"),
            params![id],
            |row| paint_from_row(row, 0),
        )
        .optional()?;

    Ok(paint)
}

/// Case-insensitive substring match on color name; first match (lowest id) wins
pub fn find_paint_by_color(conn: &Connection, query: &str) -> ShopResult<Option<Paint>> {
    let mut stmt = conn.prepare(&format!("SELECT {PAINT_COLUMNS} FROM paints pa ORDER BY pa.id ASC"))?;
    let needle = query.to_lowercase();

    for paint in stmt.query_map([], |row| paint_from_row(row, 0))? {
        let paint = paint?;
        if paint.color_name.to_lowercase().contains(&needle) {
            return Ok(Some(paint));
        }
    }

    Ok(None)
}

/// Components of one paint by sort_order, ties in insertion order
pub fn formulation_for_paint(conn: &Connection, paint_id: i64) -> ShopResult<Vec<FormulationComponent>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COMPONENT_COLUMNS} FROM formulations f
         WHERE f.paint_id = ?1
         ORDER BY f.sort_order ASC, f.id ASC"
    ))?;

    let rows = stmt
        .query_map(params![paint_id], ComponentRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter().map(ComponentRow::into_component).collect()
}

fn insert_components(
    tx: &rusqlite::Transaction<'_>,
    paint_id: i64,
    components: &[ComponentData],
    stamp: &str,
) -> ShopResult<()> {
    let mut stmt = tx.prepare(
        "INSERT INTO formulations (paint_id, component_name, quantity, unit, sort_order, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;

    for component in components {
        stmt.execute(params![
            paint_id,
            component.component_name.trim(),
            component.quantity,
            component.unit.trim(),
            component.sort_order,
            stamp,
        ])?;
    }

    Ok(())
}

/// Insert a paint and its components atomically
pub fn insert_paint(conn: &mut Connection, data: &PaintData, components: &[ComponentData]) -> ShopResult<i64> {
    let tx = conn.transaction()?;
    let now = now_stamp();

    tx.execute(
        "INSERT INTO paints (color_name, product_type, base_size, base_unit, description, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
        params![
            data.color_name,
            data.product_type,
            data.base_size,
            data.base_unit,
            data.description,
            now,
        ],
    )?;
    let id = tx.last_insert_rowid();

    insert_components(&tx, id, components, &now)?;

    insert_event(
        &tx,
        &Event::new(
            "paint_created",
            "paint",
            id,
            serde_json::json!({ "color_name": data.color_name, "components": components.len() }),
            "gateway",
        ),
    )?;
    tx.commit()?;

    Ok(id)
}

/// Update paint fields and replace all components: all or nothing
pub fn update_paint(
    conn: &mut Connection,
    id: i64,
    data: &PaintData,
    components: &[ComponentData],
) -> ShopResult<()> {
    let tx = conn.transaction()?;
    let now = now_stamp();

    let updated = tx.execute(
        "UPDATE paints
         SET color_name = ?1, product_type = ?2, base_size = ?3, base_unit = ?4,
             description = ?5, updated_at = ?6
         WHERE id = ?7",
        params![
            data.color_name,
            data.product_type,
            data.base_size,
            data.base_unit,
            data.description,
            now,
            id,
        ],
    )?;
    if updated == 0 {
        return Err(ShopError::not_found("paint", id));
    }

    tx.execute("DELETE FROM formulations WHERE paint_id = ?1", params![id])?;
    insert_components(&tx, id, components, &now)?;

    insert_event(
        &tx,
        &Event::new(
            "paint_updated",
            "paint",
            id,
            serde_json::json!({ "color_name": data.color_name, "components": components.len() }),
            "gateway",
        ),
    )?;
    tx.commit()?;

    Ok(())
}

/// Delete a paint; its components go with it. Refused while purchases reference it.
pub fn delete_paint(conn: &mut Connection, id: i64) -> ShopResult<()> {
    let tx = conn.transaction()?;

    let referenced: i64 = tx.query_row(
        "SELECT COUNT(*) FROM purchases WHERE paint_id = ?1",
        params![id],
        |row| row.get(0),
    )?;
    if referenced > 0 {
        return Err(ShopError::Validation(format!(
            "paint {} is referenced by {} purchase(s)",
            id, referenced
        )));
    }

    let deleted = tx.execute("DELETE FROM paints WHERE id = ?1", params![id])?;
    if deleted == 0 {
        return Err(ShopError::not_found("paint", id));
    }

    insert_event(&tx, &Event::new("paint_deleted", "paint", id, serde_json::json!({}), "gateway"))?;
    tx.commit()?;

    Ok(())
}

// ============================================================================
// PURCHASES
// ============================================================================

pub fn list_purchases(conn: &Connection) -> ShopResult<Vec<Purchase>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PURCHASE_COLUMNS} FROM purchases p
         ORDER BY p.purchase_date DESC, p.created_at DESC, p.id DESC"
    ))?;

    let purchases = stmt
        .query_map([], |row| purchase_from_row(row, 0))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(purchases)
}

pub fn list_purchases_with_details(conn: &Connection) -> ShopResult<Vec<PurchaseWithDetails>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PURCHASE_COLUMNS}, c.name, pa.color_name, pa.product_type
         FROM purchases p
         JOIN customers c ON p.customer_id = c.id
         JOIN paints pa ON p.paint_id = pa.id
         ORDER BY p.purchase_date DESC, p.created_at DESC, p.id DESC"
    ))?;

    let purchases = stmt
        .query_map([], |row| {
            Ok(PurchaseWithDetails {
                purchase: purchase_from_row(row, 0)?,
                customer_name: row.get(8)?,
                color_name: row.get(9)?,
                product_type: row.get(10)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(purchases)
}

pub fn get_purchase(conn: &Connection, id: i64) -> ShopResult<Option<Purchase>> {
    let purchase = conn
        .query_row(
            &format!("SELECT {PURCHASE_COLUMNS} FROM purchases p WHERE p.id = ?1"),
            params![id],
            |row| purchase_from_row(row, 0),
        )
        .optional()?;

    Ok(purchase)
}

/// A customer's purchases joined with the paint bought, newest first
pub fn purchases_for_customer(conn: &Connection, customer_id: i64) -> ShopResult<Vec<(Purchase, Paint)>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PURCHASE_COLUMNS}, {PAINT_COLUMNS}
         FROM purchases p
         JOIN paints pa ON p.paint_id = pa.id
         WHERE p.customer_id = ?1
         ORDER BY p.purchase_date DESC, p.created_at DESC, p.id DESC"
    ))?;

    let rows = stmt
        .query_map(params![customer_id], |row| {
            Ok((purchase_from_row(row, 0)?, paint_from_row(row, 8)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Who bought a paint, newest first
pub fn purchases_for_paint(conn: &Connection, paint_id: i64) -> ShopResult<Vec<PaintPurchase>> {
    let mut stmt = conn.prepare(
        "SELECT p.id, p.size, p.unit, p.purchase_date, p.notes, c.name, c.customer_type
         FROM purchases p
         JOIN customers c ON p.customer_id = c.id
         WHERE p.paint_id = ?1
         ORDER BY p.purchase_date DESC, p.created_at DESC, p.id DESC",
    )?;

    let rows = stmt
        .query_map(params![paint_id], |row| {
            Ok(PaintPurchase {
                purchase_id: row.get(0)?,
                size: row.get(1)?,
                unit: row.get(2)?,
                purchase_date: date_at(row, 3)?,
                notes: row.get(4)?,
                customer_name: row.get(5)?,
                customer_type: customer_type_at(row, 6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}

pub fn insert_purchase(conn: &mut Connection, data: &PurchaseData) -> ShopResult<i64> {
    let tx = conn.transaction()?;

    tx.execute(
        "INSERT INTO purchases (customer_id, paint_id, size, unit, purchase_date, notes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            data.customer_id,
            data.paint_id,
            data.size,
            data.unit,
            data.purchase_date.format(DATE_FORMAT).to_string(),
            data.notes,
            now_stamp(),
        ],
    )?;
    let id = tx.last_insert_rowid();

    insert_event(
        &tx,
        &Event::new(
            "purchase_created",
            "purchase",
            id,
            serde_json::json!({
                "customer_id": data.customer_id,
                "paint_id": data.paint_id,
                "size": data.size,
            }),
            "gateway",
        ),
    )?;
    tx.commit()?;

    Ok(id)
}

pub fn delete_purchase(conn: &mut Connection, id: i64) -> ShopResult<()> {
    let tx = conn.transaction()?;

    let deleted = tx.execute("DELETE FROM purchases WHERE id = ?1", params![id])?;
    if deleted == 0 {
        return Err(ShopError::not_found("purchase", id));
    }

    insert_event(&tx, &Event::new("purchase_deleted", "purchase", id, serde_json::json!({}), "gateway"))?;
    tx.commit()?;

    Ok(())
}

// ============================================================================
// AUDIT TRAIL
// ============================================================================

/// Insert event into audit trail
pub fn insert_event(conn: &Connection, event: &Event) -> ShopResult<()> {
    let data_json = serde_json::to_string(&event.data)
        .map_err(|e| ShopError::Validation(format!("event data: {}", e)))?;

    conn.execute(
        "INSERT INTO events (
            event_id, timestamp, event_type, entity_type, entity_id, data, actor
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            event.event_id,
            event.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
            event.event_type,
            event.entity_type,
            event.entity_id,
            data_json,
            event.actor,
        ],
    )?;

    Ok(())
}

/// Get events for a specific entity, oldest first
pub fn get_events_for_entity(conn: &Connection, entity_type: &str, entity_id: i64) -> ShopResult<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, entity_type, entity_id, data, actor
         FROM events
         WHERE entity_type = ?1 AND entity_id = ?2
         ORDER BY id ASC",
    )?;

    let events = stmt
        .query_map(params![entity_type, entity_id.to_string()], |row| {
            let data_json: String = row.get(5)?;

            Ok(Event {
                event_id: row.get(0)?,
                timestamp: timestamp_at(row, 1)?,
                event_type: row.get(2)?,
                entity_type: row.get(3)?,
                entity_id: row.get(4)?,
                data: serde_json::from_str(&data_json).map_err(|e| conversion_error(5, e))?,
                actor: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}
