//! Reconciliation of incoming entrant records against the roster.

pub mod address;
pub mod bike;
pub mod duration;
pub mod identity;
pub mod ride;
pub mod stats;

pub use bike::resolve_bike;
pub use duration::ride_length;
pub use identity::{resolve_identity, IdentityOutcome, PersonDetails, PersonRecord};
pub use ride::{record_rally_result, upsert_ride, RallyResultRecord, RideRecord};
pub use stats::RunStats;
