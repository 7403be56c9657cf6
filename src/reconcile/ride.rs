//! Ride upsert with duplicate suppression.
//!
//! A ride is unique per (rider, start date, canonical ride name). A second
//! submission for the same triple with the same certificate name is treated
//! as already imported and silently skipped; it is neither an error nor a
//! counted success.

use crate::reconcile::stats::RunStats;
use crate::storage::database::{Database, DatabaseError};

/// The fields an import supplies for one new ride.
#[derive(Debug, Clone)]
pub struct RideRecord {
    pub rider_id: i64,
    pub bike_id: i64,
    /// Name as it should appear on the certificate; also the dedup tiebreak
    pub cert_name: String,
    pub date_start: String,
    pub date_finish: String,
    /// Canonical ride name from the resolved route
    pub ride_name: String,
    pub is_pillion: bool,
    pub event_name: String,
    pub kms_odo: bool,
    pub total_miles: i64,
    pub start_point: String,
    pub finish_point: String,
    pub mid_points: String,
    /// Roll-of-honour display flag (IBA-qualifying results only)
    pub show_roh: bool,
    pub odo_start: String,
    pub odo_finish: String,
    pub time_start: String,
    pub time_finish: String,
    pub ride_hours: i64,
    pub ride_mins: i64,
    pub notes: String,
    /// Processing date stamped on the administrative date columns
    pub admin_date: String,
    pub verifier: String,
}

/// A ride as stored.
#[derive(Debug, Clone)]
pub struct Ride {
    pub ride_id: i64,
    pub rider_id: i64,
    pub bike_id: i64,
    pub cert_name: String,
    pub date_start: String,
    pub date_finish: Option<String>,
    pub ride_name: String,
    pub is_pillion: bool,
    pub event_name: Option<String>,
    pub kms_odo: bool,
    pub total_miles: i64,
    pub start_point: Option<String>,
    pub finish_point: Option<String>,
    pub mid_points: Option<String>,
    pub catalog_ride_id: i64,
    pub show_roh: bool,
    pub odo_start: Option<String>,
    pub odo_finish: Option<String>,
    pub time_start: Option<String>,
    pub time_finish: Option<String>,
    pub ride_hours: i64,
    pub ride_mins: i64,
    pub notes: Option<String>,
}

/// The fields an import supplies for one rally result.
#[derive(Debug, Clone)]
pub struct RallyResultRecord {
    /// Rally code plus two-digit year
    pub rally_key: String,
    pub finish_position: i64,
    pub rider_id: i64,
    pub bike_id: i64,
    pub miles: i64,
    pub points: i64,
    pub country: String,
}

/// Insert a ride unless one already exists for (rider, start date, ride
/// name) under the same certificate name. Returns whether a ride was
/// created.
pub fn upsert_ride(
    db: &Database,
    ride: &RideRecord,
    route_code: &str,
    stats: &mut RunStats,
) -> Result<bool, DatabaseError> {
    if let Some(existing) = db.find_ride(ride.rider_id, &ride.date_start, &ride.ride_name)? {
        if existing.cert_name == ride.cert_name {
            tracing::debug!(
                rider_id = ride.rider_id,
                ride_name = %ride.ride_name,
                "ride already imported, skipping"
            );
            return Ok(false);
        }
    }

    let ride_id = db.next_ride_id()?;
    let catalog_ride_id = db.catalog_ride_id(&ride.ride_name)?;
    db.insert_ride(ride_id, catalog_ride_id, ride)?;

    stats.ride_added(Some(route_code));
    Ok(true)
}

/// Insert a rally result unless one already exists for (rider, bike,
/// rally key). Returns whether a result was created.
pub fn record_rally_result(
    db: &Database,
    result: &RallyResultRecord,
    stats: &mut RunStats,
) -> Result<bool, DatabaseError> {
    if db.rally_result_exists(result.rider_id, result.bike_id, &result.rally_key)? {
        tracing::debug!(
            rider_id = result.rider_id,
            rally = %result.rally_key,
            "rally result already imported, skipping"
        );
        return Ok(false);
    }

    let result_id = db.next_rally_result_id()?;
    db.insert_rally_result(result_id, result)?;

    stats.ride_added(None);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::identity::PersonRecord;

    fn setup(db: &Database) -> (i64, i64) {
        let person = PersonRecord {
            name: "Jane Doe".to_string(),
            iba_number: None,
            postal_address: String::new(),
            postcode: String::new(),
            country: String::new(),
            email: String::new(),
            phone: String::new(),
            is_pillion: false,
            details: None,
        };
        db.insert_rider(1, &person, "2025-06-07").unwrap();
        db.insert_bike(1, 1, "Honda Goldwing", "", false).unwrap();
        (1, 1)
    }

    fn test_ride(rider_id: i64, bike_id: i64) -> RideRecord {
        RideRecord {
            rider_id,
            bike_id,
            cert_name: "Jane Doe".to_string(),
            date_start: "2025-06-07".to_string(),
            date_finish: "2025-06-07".to_string(),
            ride_name: "RBLR1000-SC".to_string(),
            is_pillion: false,
            event_name: "RBLR 1000 ('25)".to_string(),
            kms_odo: false,
            total_miles: 1015,
            start_point: "Squires cafe".to_string(),
            finish_point: "Squires cafe".to_string(),
            mid_points: "Bangor, Barnstaple, Andover and Lowestoft".to_string(),
            show_roh: true,
            odo_start: "12000".to_string(),
            odo_finish: "13015".to_string(),
            time_start: "2025-06-07T06:00".to_string(),
            time_finish: "2025-06-08T05:30".to_string(),
            ride_hours: 23,
            ride_mins: 30,
            notes: String::new(),
            admin_date: "2025-06-07".to_string(),
            verifier: "RBLR".to_string(),
        }
    }

    #[test]
    fn test_duplicate_triple_is_skipped_silently() {
        let db = Database::open_in_memory().unwrap();
        let (rider_id, bike_id) = setup(&db);
        let mut stats = RunStats::new();
        let ride = test_ride(rider_id, bike_id);

        assert!(upsert_ride(&db, &ride, "C-SCW", &mut stats).unwrap());
        assert!(!upsert_ride(&db, &ride, "C-SCW", &mut stats).unwrap());

        assert_eq!(db.count_rides().unwrap(), 1);
        assert_eq!(stats.new_rides, 1);
        assert_eq!(stats.route_counts.get("C-SCW"), Some(&1));
    }

    #[test]
    fn test_same_triple_different_cert_name_creates_second_ride() {
        let db = Database::open_in_memory().unwrap();
        let (rider_id, bike_id) = setup(&db);
        let mut stats = RunStats::new();

        let ride = test_ride(rider_id, bike_id);
        let mut other = test_ride(rider_id, bike_id);
        other.cert_name = "Jane and Mary Doe".to_string();

        assert!(upsert_ride(&db, &ride, "C-SCW", &mut stats).unwrap());
        assert!(upsert_ride(&db, &other, "C-SCW", &mut stats).unwrap());
        assert_eq!(db.count_rides().unwrap(), 2);
    }

    #[test]
    fn test_inserted_ride_carries_all_fields() {
        let db = Database::open_in_memory().unwrap();
        let (rider_id, bike_id) = setup(&db);
        let mut stats = RunStats::new();

        upsert_ride(&db, &test_ride(rider_id, bike_id), "C-SCW", &mut stats).unwrap();

        let stored = db
            .find_ride(rider_id, "2025-06-07", "RBLR1000-SC")
            .unwrap()
            .expect("ride not stored");
        assert_eq!(stored.ride_hours, 23);
        assert_eq!(stored.ride_mins, 30);
        assert_eq!(stored.total_miles, 1015);
        assert!(stored.show_roh);
        assert_eq!(stored.catalog_ride_id, 0);
        assert_eq!(stored.event_name.as_deref(), Some("RBLR 1000 ('25)"));
    }

    #[test]
    fn test_rally_result_dedup_includes_bike() {
        let db = Database::open_in_memory().unwrap();
        let (rider_id, bike_id) = setup(&db);
        db.insert_bike(2, rider_id, "BMW R1250GS", "", false).unwrap();
        let mut stats = RunStats::new();

        let result = RallyResultRecord {
            rally_key: "BBR25".to_string(),
            finish_position: 3,
            rider_id,
            bike_id,
            miles: 2200,
            points: 41000,
            country: "UK".to_string(),
        };

        assert!(record_rally_result(&db, &result, &mut stats).unwrap());
        assert!(!record_rally_result(&db, &result, &mut stats).unwrap());

        // Same rider and rally on a different bike is a distinct result
        let mut other_bike = result.clone();
        other_bike.bike_id = 2;
        assert!(record_rally_result(&db, &other_bike, &mut stats).unwrap());

        assert_eq!(db.count_rally_results().unwrap(), 2);
        assert_eq!(stats.new_rides, 2);
        assert!(stats.route_counts.is_empty());
    }
}
