// ⚠️ Error taxonomy shared by the scaler, the gateway, search and reports

use thiserror::Error;

/// Errors raised by the shop core.
///
/// A search that matches nothing is NOT an error; it is an empty result shape.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShopError {
    /// Reference batch size was zero, negative or not a number
    #[error("invalid base size {0}: must be a positive number")]
    InvalidBaseSize(f64),

    /// Requested batch size was zero, negative or not a number
    #[error("invalid target size {0}: must be a positive number")]
    InvalidTargetSize(f64),

    /// Component quantity could not be read as a non-negative number
    #[error("invalid quantity '{0}'")]
    InvalidQuantity(String),

    /// The persistence store could not be reached or failed mid-query
    #[error("data source unavailable: {0}")]
    DataSourceUnavailable(String),

    /// Point lookup or write against an id that does not exist
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// Malformed write input
    #[error("validation failed: {0}")]
    Validation(String),

    /// The image extraction collaborator failed
    #[error("formulation extraction failed: {0}")]
    ExtractionFailed(String),
}

impl ShopError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        ShopError::NotFound { entity, id }
    }

    /// True for failures of the store itself (as opposed to bad input)
    pub fn is_data_source(&self) -> bool {
        matches!(self, ShopError::DataSourceUnavailable(_))
    }
}

impl From<rusqlite::Error> for ShopError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, _)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                ShopError::Validation(err.to_string())
            }
            _ => ShopError::DataSourceUnavailable(err.to_string()),
        }
    }
}

pub type ShopResult<T> = std::result::Result<T, ShopError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_violation_maps_to_validation() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE t (v REAL CHECK (v > 0))", []).unwrap();

        let err: ShopError = conn
            .execute("INSERT INTO t (v) VALUES (-1)", [])
            .unwrap_err()
            .into();

        assert!(matches!(err, ShopError::Validation(_)));
        assert!(!err.is_data_source());
    }

    #[test]
    fn test_query_failure_maps_to_data_source() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();

        let err: ShopError = conn
            .execute("SELECT * FROM missing_table", [])
            .unwrap_err()
            .into();

        assert!(err.is_data_source());
    }

    #[test]
    fn test_not_found_display() {
        let err = ShopError::not_found("paint", 42);
        assert_eq!(err.to_string(), "paint 42 not found");
    }
}
