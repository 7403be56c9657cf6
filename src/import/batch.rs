//! Batch import orchestration.
//!
//! One call imports one payload inside one store transaction. Payloads are
//! decoded and batch parameters validated before the transaction begins, so
//! a malformed batch never mutates the store. A store failure mid-batch
//! propagates and leaves the open transaction to the store.

use crate::import::parser_csv;
use crate::import::parser_json;
use crate::import::types::{Entrant, EntrantStatus, ParseError, Person, RallyRow};
use crate::reconcile::address;
use crate::reconcile::bike::resolve_bike;
use crate::reconcile::duration::ride_length;
use crate::reconcile::identity::{membership_number, resolve_identity, PersonDetails, PersonRecord};
use crate::reconcile::ride::{record_rally_result, upsert_ride, RallyResultRecord, RideRecord};
use crate::reconcile::stats::RunStats;
use crate::routes::{self, Route};
use crate::storage::config::ImportConfig;
use crate::storage::database::{Database, DatabaseError};
use chrono::NaiveDate;
use thiserror::Error;

/// Errors that abort an import batch.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("malformed payload: {0}")]
    Payload(#[from] ParseError),

    #[error("missing batch parameter: {0}")]
    MissingParameter(&'static str),

    #[error("invalid batch parameter: {0}")]
    InvalidParameter(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Import a structured results document.
///
/// `ride_date` is the event ("Saturday") date in ISO form; it becomes the
/// start and finish date of every imported ride and the last-active date of
/// every touched identity. Returns the batch statistics.
pub fn import_event_results(
    db: &Database,
    config: &ImportConfig,
    payload: &str,
    ride_date: &str,
) -> Result<RunStats, ImportError> {
    let ride_date = ride_date.trim();
    if ride_date.is_empty() {
        return Err(ImportError::MissingParameter("ride date"));
    }
    if NaiveDate::parse_from_str(ride_date, "%Y-%m-%d").is_err() {
        return Err(ImportError::InvalidParameter(format!(
            "ride date '{ride_date}' is not a YYYY-MM-DD date"
        )));
    }

    let doc = parser_json::parse_results(payload)?;
    tracing::info!(
        filetype = %doc.filetype,
        as_at = %doc.asat,
        entrants = doc.entrants.len(),
        "importing event results"
    );

    let event_name = format!("RBLR 1000 ('{})", &ride_date[2..4]);
    let mut stats = RunStats::new();

    db.begin_batch()?;

    for entrant in &doc.entrants {
        let status = EntrantStatus::from_code(entrant.entrant_status);
        if !status.completed() {
            tracing::debug!(
                entrant_id = entrant.entrant_id,
                status = entrant.entrant_status,
                "entrant did not complete, skipping"
            );
            continue;
        }

        import_entrant(db, config, entrant, status, ride_date, &event_name, &mut stats)?;
    }

    db.commit_batch()?;

    tracing::info!(
        new_rides = stats.new_rides,
        new_riders = stats.new_riders,
        new_pillions = stats.new_pillions,
        "event import complete"
    );

    Ok(stats)
}

/// Import a tabular finisher sheet for the given rally.
///
/// An unknown rally code is registered in the rally catalog under the
/// supplied title. The event key is the rally code plus the two-digit year.
pub fn import_rally_sheet(
    db: &Database,
    payload: &str,
    rally_code: &str,
    rally_year: &str,
    rally_title: &str,
) -> Result<RunStats, ImportError> {
    let code = rally_code.trim().to_uppercase();
    if code.is_empty() {
        return Err(ImportError::MissingParameter("rally code"));
    }

    let rows = parser_csv::parse_sheet(payload)?;
    let rally_key = format!("{}{}", code, short_year(rally_year));
    let today = chrono::Local::now().format("%Y-%m-%d").to_string();

    tracing::info!(rally = %rally_key, rows = rows.len(), "importing rally sheet");

    let mut stats = RunStats::new();

    db.begin_batch()?;

    if db.rally_title(&code)?.is_none() {
        tracing::info!(code = %code, title = rally_title, "registering new rally");
        db.insert_rally(&code, rally_title)?;
    }

    for row in &rows {
        import_sheet_person(db, row, false, &rally_key, &today, &mut stats)?;
        if !row.pillion_name.is_empty() {
            import_sheet_person(db, row, true, &rally_key, &today, &mut stats)?;
        }
    }

    db.commit_batch()?;

    tracing::info!(
        new_rides = stats.new_rides,
        new_riders = stats.new_riders,
        new_pillions = stats.new_pillions,
        "rally import complete"
    );

    Ok(stats)
}

/// Per-entrant fields shared by the rider and pillion passes.
struct EntrantRide<'a> {
    route_code: &'static str,
    route: Route,
    qualifying: bool,
    ride_hours: i64,
    ride_mins: i64,
    kms_odo: bool,
    ride_date: &'a str,
    event_name: &'a str,
    verifier: &'a str,
}

fn import_entrant(
    db: &Database,
    config: &ImportConfig,
    entrant: &Entrant,
    status: EntrantStatus,
    ride_date: &str,
    event_name: &str,
    stats: &mut RunStats,
) -> Result<(), DatabaseError> {
    let (route_code, route) =
        routes::resolve(&entrant.route, status.is_late(), &config.default_route);
    let qualifying = status.is_finisher() && route.miles >= config.min_qualifying_miles;
    let (ride_hours, ride_mins) = ride_length(&entrant.start_time, &entrant.finish_time);

    let shared = EntrantRide {
        route_code,
        route,
        qualifying,
        ride_hours,
        ride_mins,
        kms_odo: entrant.odo_counts == "K",
        ride_date,
        event_name,
        verifier: &config.verifier,
    };

    import_entrant_person(db, entrant, &entrant.rider, false, &shared, stats)?;
    if entrant.pillion.is_present() {
        import_entrant_person(db, entrant, &entrant.pillion, true, &shared, stats)?;
    }

    Ok(())
}

fn import_entrant_person(
    db: &Database,
    entrant: &Entrant,
    person: &Person,
    is_pillion: bool,
    shared: &EntrantRide<'_>,
    stats: &mut RunStats,
) -> Result<(), DatabaseError> {
    let record = person_record(person, is_pillion);

    let identity = resolve_identity(db, &record, shared.ride_date, shared.qualifying, stats)?;
    let bike_id = resolve_bike(db, identity.rider_id, &entrant.bike, &entrant.bike_reg, shared.kms_odo)?;

    let ride = RideRecord {
        rider_id: identity.rider_id,
        bike_id,
        cert_name: record.name,
        date_start: shared.ride_date.to_string(),
        date_finish: shared.ride_date.to_string(),
        ride_name: shared.route.ride_name.to_string(),
        is_pillion,
        event_name: shared.event_name.to_string(),
        kms_odo: shared.kms_odo,
        total_miles: shared.route.miles,
        start_point: shared.route.start.to_string(),
        finish_point: shared.route.finish.to_string(),
        mid_points: shared.route.via.to_string(),
        show_roh: shared.qualifying,
        odo_start: entrant.odo_start.clone(),
        odo_finish: entrant.odo_finish.clone(),
        time_start: entrant.start_time.clone(),
        time_finish: entrant.finish_time.clone(),
        ride_hours: shared.ride_hours,
        ride_mins: shared.ride_mins,
        notes: entrant.notes.clone(),
        admin_date: shared.ride_date.to_string(),
        verifier: shared.verifier.to_string(),
    };

    upsert_ride(db, &ride, shared.route_code, stats)?;
    Ok(())
}

/// Build a `PersonRecord` from a structured-export person.
fn person_record(person: &Person, is_pillion: bool) -> PersonRecord {
    PersonRecord {
        name: format!("{} {}", person.first, person.last),
        iba_number: membership_number(&person.iba),
        postal_address: address::normalize_components(
            &person.address1,
            &person.address2,
            &person.town,
            &person.county,
        ),
        postcode: person.postcode.clone(),
        country: person.country.clone(),
        email: person.email.clone(),
        phone: person.phone.clone(),
        is_pillion,
        details: Some(PersonDetails {
            first_name: person.first.trim().to_string(),
            last_name: person.last.trim().to_string(),
            address1: person.address1.trim().to_string(),
            address2: person.address2.trim().to_string(),
            town: person.town.trim().to_string(),
            county: person.county.trim().to_string(),
        }),
    }
}

fn import_sheet_person(
    db: &Database,
    row: &RallyRow,
    is_pillion: bool,
    rally_key: &str,
    today: &str,
    stats: &mut RunStats,
) -> Result<(), DatabaseError> {
    let (name, iba) = if is_pillion {
        (&row.pillion_name, row.pillion_iba)
    } else {
        (&row.rider_name, row.rider_iba)
    };

    let record = PersonRecord {
        name: name.clone(),
        iba_number: if iba > 0 { Some(iba.to_string()) } else { None },
        postal_address: address::normalize_legacy(&row.postal_address),
        postcode: row.postcode.clone(),
        country: row.country.clone(),
        email: row.email.clone(),
        phone: row.phone.clone(),
        is_pillion,
        details: None,
    };

    let identity = resolve_identity(db, &record, today, true, stats)?;

    // The odometer unit switch is not present in the sheet export
    let bike_id = resolve_bike(db, identity.rider_id, &row.bike, &row.bike_reg, false)?;

    let result = RallyResultRecord {
        rally_key: rally_key.to_string(),
        finish_position: row.placing,
        rider_id: identity.rider_id,
        bike_id,
        miles: row.miles,
        points: row.points,
        country: row.country.clone(),
    };

    record_rally_result(db, &result, stats)?;
    Ok(())
}

/// The last two digits of a year parameter ("2025" -> "25").
fn short_year(year: &str) -> &str {
    year.get(2..).unwrap_or(year)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_ride_date_is_rejected_before_processing() {
        let db = Database::open_in_memory().unwrap();
        let config = ImportConfig::default();

        let result = import_event_results(&db, &config, r#"{"Entrants": []}"#, "  ");
        assert!(matches!(result, Err(ImportError::MissingParameter(_))));
    }

    #[test]
    fn test_invalid_ride_date_is_rejected_before_processing() {
        let db = Database::open_in_memory().unwrap();
        let config = ImportConfig::default();

        let result = import_event_results(&db, &config, r#"{"Entrants": []}"#, "07/06/2025");
        assert!(matches!(result, Err(ImportError::InvalidParameter(_))));
    }

    #[test]
    fn test_malformed_payload_aborts_without_mutation() {
        let db = Database::open_in_memory().unwrap();
        let config = ImportConfig::default();

        let result = import_event_results(&db, &config, "not json", "2025-06-07");
        assert!(matches!(result, Err(ImportError::Payload(_))));
        assert_eq!(db.count_riders().unwrap(), 0);
        assert_eq!(db.count_rides().unwrap(), 0);
    }

    #[test]
    fn test_missing_rally_code_is_rejected() {
        let db = Database::open_in_memory().unwrap();

        let result = import_rally_sheet(&db, "", "  ", "2025", "");
        assert!(matches!(result, Err(ImportError::MissingParameter(_))));
    }

    #[test]
    fn test_short_year() {
        assert_eq!(short_year("2025"), "25");
        assert_eq!(short_year("25"), "25");
        assert_eq!(short_year(""), "");
    }
}
