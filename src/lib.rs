//! rideroster - Rally Results Import Engine
//!
//! Reconciles event-results exports for long-distance motorcycle rallies
//! against a persistent roster of riders, bikes, and historical rides.
//! Imports are idempotent: identities and bikes are matched before they are
//! created, and duplicate rides are silently skipped.

pub mod import;
pub mod reconcile;
pub mod routes;
pub mod storage;

// Re-export commonly used types
pub use import::batch::{import_event_results, import_rally_sheet, ImportError};
pub use reconcile::stats::RunStats;
pub use storage::config::{load_config, ImportConfig};
pub use storage::database::{Database, DatabaseError};
