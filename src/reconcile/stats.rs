//! Per-batch run statistics.
//!
//! One `RunStats` value is allocated per import batch, threaded through the
//! reconciliation call chain, and returned to the caller as the batch
//! summary. It is never shared between batches.

use serde::Serialize;
use std::collections::BTreeMap;

/// Counters accumulated across one import batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStats {
    /// Newly created rider identities
    pub new_riders: u32,
    /// Newly created pillion identities
    pub new_pillions: u32,
    /// Rides (or rally results) inserted
    pub new_rides: u32,
    /// Inserted rides per resolved route code
    pub route_counts: BTreeMap<String, u32>,
    /// Display names of newly registered members, for downstream notification
    pub new_members: Vec<String>,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly created identity.
    pub fn rider_created(&mut self, is_pillion: bool) {
        if is_pillion {
            self.new_pillions += 1;
        } else {
            self.new_riders += 1;
        }
    }

    /// Record an inserted ride. A route code is counted when present;
    /// rally results carry none.
    pub fn ride_added(&mut self, route_code: Option<&str>) {
        self.new_rides += 1;
        if let Some(code) = route_code {
            *self.route_counts.entry(code.to_string()).or_insert(0) += 1;
        }
    }

    /// Record a name for the new-member notice list.
    pub fn member_registered(&mut self, name: &str) {
        self.new_members.push(name.to_string());
    }
}
