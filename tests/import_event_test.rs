//! Integration tests for the structured event-results import.
//!
//! Runs full import batches against an in-memory roster database.

use rideroster::{import_event_results, Database, ImportConfig};
use serde_json::json;

fn rider_json(first: &str, last: &str, iba: &str) -> serde_json::Value {
    json!({
        "First": first,
        "Last": last,
        "IBA": iba,
        "Email": format!("{}@example.com", first.to_lowercase()),
        "Phone": "01904 000000",
        "Address1": "1 High Street",
        "Address2": "",
        "Town": "York",
        "County": "North Yorkshire",
        "Postcode": "YO1 7HH",
        "Country": "UK"
    })
}

fn entrant_json(
    rider: serde_json::Value,
    pillion: serde_json::Value,
    status: i64,
    route: &str,
) -> serde_json::Value {
    json!({
        "EntrantID": 1,
        "EntrantStatus": status,
        "Rider": rider,
        "Pillion": pillion,
        "Bike": "Honda Goldwing",
        "BikeReg": "AB12 CDE",
        "Route": route,
        "OdoStart": "12000",
        "OdoFinish": "13015",
        "OdoCounts": "M",
        "StartTime": "2025-06-07T06:00",
        "FinishTime": "2025-06-08T05:30",
        "Notes": ""
    })
}

fn document(entrants: Vec<serde_json::Value>) -> String {
    json!({
        "Filetype": "RBLR1000",
        "Asat": "2025-06-09T10:00",
        "Entrants": entrants
    })
    .to_string()
}

#[test]
fn test_single_finisher_end_to_end() {
    let db = Database::open_in_memory().unwrap();
    let config = ImportConfig::default();

    let payload = document(vec![entrant_json(
        rider_json("Jane", "Doe", "83799"),
        json!({}),
        8,
        "C-SCW",
    )]);

    let stats = import_event_results(&db, &config, &payload, "2025-06-07").unwrap();

    assert_eq!(stats.new_riders, 1);
    assert_eq!(stats.new_pillions, 0);
    assert_eq!(stats.new_rides, 1);
    assert_eq!(stats.route_counts.get("C-SCW"), Some(&1));
    assert_eq!(stats.new_members, vec!["Jane Doe".to_string()]);

    assert_eq!(db.count_riders().unwrap(), 1);
    assert_eq!(db.count_bikes().unwrap(), 1);
    assert_eq!(db.count_rides().unwrap(), 1);

    let rider_id = db.find_rider_by_iba("83799").unwrap().expect("rider missing");
    let rider = db.get_rider(rider_id).unwrap().unwrap();
    assert_eq!(rider.name, "Jane Doe");
    assert_eq!(rider.date_last_active, "2025-06-07");
    assert_eq!(
        rider.postal_address,
        "1 High Street\r\nYork\r\nNorth Yorkshire"
    );

    let ride = db
        .find_ride(rider_id, "2025-06-07", "RBLR1000-SC")
        .unwrap()
        .expect("ride missing");
    assert_eq!(ride.ride_hours, 23);
    assert_eq!(ride.ride_mins, 30);
    assert_eq!(ride.total_miles, 1015);
    assert!(ride.show_roh);
    assert!(!ride.is_pillion);
    assert_eq!(ride.event_name.as_deref(), Some("RBLR 1000 ('25)"));
    assert_eq!(ride.start_point.as_deref(), Some("Squires cafe"));
}

#[test]
fn test_reimporting_the_same_batch_changes_nothing() {
    let db = Database::open_in_memory().unwrap();
    let config = ImportConfig::default();

    let payload = document(vec![entrant_json(
        rider_json("Jane", "Doe", "83799"),
        json!({}),
        8,
        "C-SCW",
    )]);

    let first = import_event_results(&db, &config, &payload, "2025-06-07").unwrap();
    let second = import_event_results(&db, &config, &payload, "2025-06-07").unwrap();

    assert_eq!(first.new_rides, 1);
    assert_eq!(second.new_rides, 0);
    assert_eq!(second.new_riders, 0);
    assert!(second.route_counts.is_empty());

    assert_eq!(db.count_riders().unwrap(), 1);
    assert_eq!(db.count_rides().unwrap(), 1);
}

#[test]
fn test_late_finisher_gets_late_ride_name_without_roh() {
    let db = Database::open_in_memory().unwrap();
    let config = ImportConfig::default();

    let payload = document(vec![entrant_json(
        rider_json("Jane", "Doe", "83799"),
        json!({}),
        10,
        "C-SCW",
    )]);

    let stats = import_event_results(&db, &config, &payload, "2025-06-07").unwrap();
    assert_eq!(stats.new_rides, 1);
    // Late finishers are not IBA-qualifying, so no notice-list entry
    assert!(stats.new_members.is_empty());

    let rider_id = db.find_rider_by_iba("83799").unwrap().unwrap();
    let ride = db
        .find_ride(rider_id, "2025-06-07", "RBLR1000+SC")
        .unwrap()
        .expect("late ride missing");
    assert!(!ride.show_roh);
}

#[test]
fn test_non_finisher_statuses_are_skipped_entirely() {
    let db = Database::open_in_memory().unwrap();
    let config = ImportConfig::default();

    let payload = document(vec![
        entrant_json(rider_json("Jane", "Doe", "83799"), json!({}), 2, "C-SCW"),
        entrant_json(rider_json("John", "Smith", ""), json!({}), 0, "A-NCW"),
    ]);

    let stats = import_event_results(&db, &config, &payload, "2025-06-07").unwrap();

    assert_eq!(stats.new_rides, 0);
    assert_eq!(stats.new_riders, 0);
    assert_eq!(db.count_riders().unwrap(), 0);
    assert_eq!(db.count_rides().unwrap(), 0);
}

#[test]
fn test_unknown_route_code_uses_default_route() {
    let db = Database::open_in_memory().unwrap();
    let config = ImportConfig::default();

    let payload = document(vec![entrant_json(
        rider_json("Jane", "Doe", "83799"),
        json!({}),
        8,
        "Z-XXX",
    )]);

    let stats = import_event_results(&db, &config, &payload, "2025-06-07").unwrap();
    assert_eq!(stats.route_counts.get("A-NCW"), Some(&1));

    let rider_id = db.find_rider_by_iba("83799").unwrap().unwrap();
    let ride = db
        .find_ride(rider_id, "2025-06-07", "RBLR1000-NC")
        .unwrap()
        .expect("default-route ride missing");
    assert_eq!(ride.total_miles, 1006);
}

#[test]
fn test_sub_thousand_route_is_not_roh_eligible() {
    let db = Database::open_in_memory().unwrap();
    let config = ImportConfig::default();

    let payload = document(vec![entrant_json(
        rider_json("Jane", "Doe", "83799"),
        json!({}),
        8,
        "E-5CW",
    )]);

    let stats = import_event_results(&db, &config, &payload, "2025-06-07").unwrap();
    assert_eq!(stats.new_rides, 1);
    assert!(stats.new_members.is_empty());

    let rider_id = db.find_rider_by_iba("83799").unwrap().unwrap();
    let ride = db
        .find_ride(rider_id, "2025-06-07", "RBLR1000-5C")
        .unwrap()
        .unwrap();
    assert!(!ride.show_roh);
    assert_eq!(ride.total_miles, 504);
}

#[test]
fn test_pillion_gets_own_identity_bike_and_ride() {
    let db = Database::open_in_memory().unwrap();
    let config = ImportConfig::default();

    let payload = document(vec![entrant_json(
        rider_json("Jane", "Doe", "83799"),
        rider_json("Mary", "Doe", ""),
        8,
        "C-SCW",
    )]);

    let stats = import_event_results(&db, &config, &payload, "2025-06-07").unwrap();

    assert_eq!(stats.new_riders, 1);
    assert_eq!(stats.new_pillions, 1);
    assert_eq!(stats.new_rides, 2);
    assert_eq!(stats.route_counts.get("C-SCW"), Some(&2));

    assert_eq!(db.count_riders().unwrap(), 2);
    assert_eq!(db.count_bikes().unwrap(), 2);
    assert_eq!(db.count_rides().unwrap(), 2);

    let pillion_id = db.find_rider_by_name("Mary Doe").unwrap().expect("pillion missing");
    let pillion = db.get_rider(pillion_id).unwrap().unwrap();
    assert!(pillion.is_pillion);

    let ride = db
        .find_ride(pillion_id, "2025-06-07", "RBLR1000-SC")
        .unwrap()
        .unwrap();
    assert!(ride.is_pillion);
    assert_eq!(ride.cert_name, "Mary Doe");
}

#[test]
fn test_unparseable_timestamps_degrade_to_zero_duration() {
    let db = Database::open_in_memory().unwrap();
    let config = ImportConfig::default();

    let mut entrant = entrant_json(rider_json("Jane", "Doe", "83799"), json!({}), 8, "C-SCW");
    entrant["StartTime"] = json!("06:00");

    let stats = import_event_results(&db, &config, &document(vec![entrant]), "2025-06-07").unwrap();
    assert_eq!(stats.new_rides, 1);

    let rider_id = db.find_rider_by_iba("83799").unwrap().unwrap();
    let ride = db
        .find_ride(rider_id, "2025-06-07", "RBLR1000-SC")
        .unwrap()
        .unwrap();
    assert_eq!(ride.ride_hours, 0);
    assert_eq!(ride.ride_mins, 0);
}

#[test]
fn test_returning_rider_is_matched_and_refreshed() {
    let db = Database::open_in_memory().unwrap();
    let config = ImportConfig::default();

    let payload = document(vec![entrant_json(
        rider_json("Jane", "Doe", "83799"),
        json!({}),
        8,
        "C-SCW",
    )]);
    import_event_results(&db, &config, &payload, "2025-06-07").unwrap();

    let mut rider = rider_json("Jane", "Doe", "83799");
    rider["Email"] = json!("jane.new@example.com");
    let next_year = document(vec![entrant_json(rider, json!({}), 8, "A-NCW")]);

    let stats = import_event_results(&db, &config, &next_year, "2026-06-06").unwrap();

    assert_eq!(stats.new_riders, 0);
    assert_eq!(stats.new_rides, 1);
    assert_eq!(db.count_riders().unwrap(), 1);

    let rider_id = db.find_rider_by_iba("83799").unwrap().unwrap();
    let stored = db.get_rider(rider_id).unwrap().unwrap();
    assert_eq!(stored.email, "jane.new@example.com");
    assert_eq!(stored.date_last_active, "2026-06-06");
}
