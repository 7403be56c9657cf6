//! Identity resolution against the rider roster.
//!
//! An incoming person is matched by membership number first, then by exact
//! display name. A miss creates a new roster entry; a hit refreshes the
//! mutable contact fields in place. Display name and membership number are
//! never overwritten on a match.

use crate::reconcile::stats::RunStats;
use crate::storage::database::{Database, DatabaseError};

/// The fields an incoming record supplies for one person.
#[derive(Debug, Clone)]
pub struct PersonRecord {
    /// Display name, also used on certificates
    pub name: String,
    /// Membership number, when declared
    pub iba_number: Option<String>,
    /// Normalized postal address (see `reconcile::address`)
    pub postal_address: String,
    pub postcode: String,
    pub country: String,
    pub email: String,
    pub phone: String,
    pub is_pillion: bool,
    /// Name and address components; absent in the legacy tabular exports
    pub details: Option<PersonDetails>,
}

/// Name/address components carried only by the structured exports.
#[derive(Debug, Clone)]
pub struct PersonDetails {
    pub first_name: String,
    pub last_name: String,
    pub address1: String,
    pub address2: String,
    pub town: String,
    pub county: String,
}

/// A rider roster entry as stored.
#[derive(Debug, Clone)]
pub struct Rider {
    pub rider_id: i64,
    pub name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub iba_number: Option<String>,
    pub postal_address: String,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub town: Option<String>,
    pub county: Option<String>,
    pub postcode: String,
    pub country: String,
    pub email: String,
    pub phone: String,
    pub is_pillion: bool,
    pub date_last_active: String,
}

/// Outcome of resolving one person against the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityOutcome {
    pub rider_id: i64,
    pub created: bool,
}

/// Resolve a person to an existing rider or create a new one.
///
/// `notice_on_create` controls whether a newly created identity joins the
/// new-member notice list. Creation increments the new-rider or
/// new-pillion counter; a match mutates contact/address/last-active only.
pub fn resolve_identity(
    db: &Database,
    person: &PersonRecord,
    last_active: &str,
    notice_on_create: bool,
    stats: &mut RunStats,
) -> Result<IdentityOutcome, DatabaseError> {
    let mut rider_id = None;

    if let Some(iba) = person.iba_number.as_deref() {
        rider_id = db.find_rider_by_iba(iba)?;
    }
    if rider_id.is_none() {
        rider_id = db.find_rider_by_name(&person.name)?;
    }

    match rider_id {
        Some(rider_id) => {
            db.update_rider_contact(rider_id, person, last_active)?;
            Ok(IdentityOutcome {
                rider_id,
                created: false,
            })
        }
        None => {
            let rider_id = db.next_rider_id()?;
            db.insert_rider(rider_id, person, last_active)?;

            stats.rider_created(person.is_pillion);
            if notice_on_create {
                stats.member_registered(&person.name);
            }
            tracing::info!(rider_id, name = %person.name, "new rider registered");

            Ok(IdentityOutcome {
                rider_id,
                created: true,
            })
        }
    }
}

/// Normalize a declared membership number: trimmed, empty means none.
pub fn membership_number(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
