//! Bike resolution against the roster.
//!
//! A bike is matched per rider by description, accepting either the same
//! registration or a record whose registration is still empty. A record
//! with no registration can be claimed by a later registration update, but
//! a stored registration is never overwritten.

use crate::storage::database::{Database, DatabaseError};

/// A bike roster entry as stored.
#[derive(Debug, Clone)]
pub struct Bike {
    pub bike_id: i64,
    pub rider_id: i64,
    pub description: String,
    pub registration: Option<String>,
    /// Odometer unit: true = kilometres, false = miles
    pub kms_odo: bool,
}

/// Resolve a bike for a rider, creating it when no record matches.
pub fn resolve_bike(
    db: &Database,
    rider_id: i64,
    description: &str,
    registration: &str,
    kms_odo: bool,
) -> Result<i64, DatabaseError> {
    match db.find_bike(rider_id, description, registration)? {
        Some(bike_id) => {
            db.claim_bike_registration(bike_id, rider_id, registration, kms_odo)?;
            Ok(bike_id)
        }
        None => {
            let bike_id = db.next_bike_id()?;
            db.insert_bike(bike_id, rider_id, description, registration, kms_odo)?;
            tracing::debug!(bike_id, rider_id, description, "new bike inserted");
            Ok(bike_id)
        }
    }
}
