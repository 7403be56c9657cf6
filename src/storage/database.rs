//! Database operations using rusqlite.
//!
//! The importer is the only writer; one import batch runs inside a single
//! explicit transaction. All statements are parameterized. Lookups return
//! a caller-supplied default (`None`, `0`, `false`) when no row matches.

use crate::reconcile::bike::Bike;
use crate::reconcile::identity::{PersonRecord, Rider};
use crate::reconcile::ride::{RallyResultRecord, Ride, RideRecord};
use crate::storage::schema::{CURRENT_VERSION, SCHEMA, SCHEMA_VERSION_TABLE};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::path::Path;
use thiserror::Error;

/// Database wrapper for SQLite operations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create a database at the given path.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| DatabaseError::IoError(e.to_string()))?;
            }
        }

        let conn =
            Connection::open(path).map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        let db = Self { conn };
        db.initialize()?;

        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        let db = Self { conn };
        db.initialize()?;

        Ok(db)
    }

    /// Initialize the database schema.
    fn initialize(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(SCHEMA_VERSION_TABLE)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

        let current_version = self.get_schema_version()?;

        if current_version < CURRENT_VERSION {
            self.migrate(current_version)?;
        }

        Ok(())
    }

    /// Get the current schema version.
    fn get_schema_version(&self) -> Result<i32, DatabaseError> {
        let result: SqliteResult<i32> = self.conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        );

        match result {
            Ok(version) => Ok(version),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
            Err(e) => Err(DatabaseError::QueryFailed(e.to_string())),
        }
    }

    /// Run database migrations.
    fn migrate(&self, from_version: i32) -> Result<(), DatabaseError> {
        if from_version < 1 {
            self.conn
                .execute_batch(SCHEMA)
                .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

            self.conn
                .execute(
                    "INSERT INTO schema_version (version, applied_at) VALUES (?, datetime('now'))",
                    [CURRENT_VERSION],
                )
                .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

            tracing::info!("Database migrated to version {}", CURRENT_VERSION);
        }

        // Future migrations would go here:
        // if from_version < 2 { ... }

        Ok(())
    }

    /// Get a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    // ========== Batch Transaction Control ==========

    /// Begin the import batch transaction.
    ///
    /// One batch is one transaction; a failure mid-batch leaves the open
    /// transaction to the store (rolled back when the connection closes).
    pub fn begin_batch(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch("BEGIN")
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))
    }

    /// Commit the import batch transaction.
    pub fn commit_batch(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch("COMMIT")
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))
    }

    // ========== Rider Operations ==========

    /// Find a rider by exact membership number.
    pub fn find_rider_by_iba(&self, iba_number: &str) -> Result<Option<i64>, DatabaseError> {
        self.first_integer(
            "SELECT rider_id FROM riders WHERE iba_number = ?1",
            params![iba_number],
        )
    }

    /// Find a rider by exact (case-sensitive) display name.
    pub fn find_rider_by_name(&self, name: &str) -> Result<Option<i64>, DatabaseError> {
        self.first_integer(
            "SELECT rider_id FROM riders WHERE name = ?1",
            params![name],
        )
    }

    /// Allocate the next rider key.
    ///
    /// Keys are application-assigned; this relies on the single-writer
    /// import model of the roster database.
    pub fn next_rider_id(&self) -> Result<i64, DatabaseError> {
        self.next_key("SELECT IFNULL(MAX(rider_id), 0) + 1 FROM riders")
    }

    /// Insert a new rider with an application-assigned key.
    pub fn insert_rider(
        &self,
        rider_id: i64,
        person: &PersonRecord,
        last_active: &str,
    ) -> Result<(), DatabaseError> {
        let d = person.details.as_ref();
        self.conn
            .execute(
                "INSERT INTO riders (rider_id, name, first_name, last_name, iba_number,
                 postal_address, address1, address2, town, county, postcode, country,
                 email, phone, is_pillion, date_last_active)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
                params![
                    rider_id,
                    person.name,
                    d.map(|d| d.first_name.as_str()),
                    d.map(|d| d.last_name.as_str()),
                    person.iba_number,
                    person.postal_address,
                    d.map(|d| d.address1.as_str()),
                    d.map(|d| d.address2.as_str()),
                    d.map(|d| d.town.as_str()),
                    d.map(|d| d.county.as_str()),
                    person.postcode,
                    person.country,
                    person.email,
                    person.phone,
                    person.is_pillion as i32,
                    last_active,
                ],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    /// Update the mutable contact/address/last-active fields of a matched
    /// rider. Name and membership number are never overwritten here.
    pub fn update_rider_contact(
        &self,
        rider_id: i64,
        person: &PersonRecord,
        last_active: &str,
    ) -> Result<(), DatabaseError> {
        let result = match person.details.as_ref() {
            Some(d) => self.conn.execute(
                "UPDATE riders SET postal_address = ?2, postcode = ?3, country = ?4,
                 email = ?5, phone = ?6, date_last_active = ?7, first_name = ?8,
                 last_name = ?9, address1 = ?10, address2 = ?11, town = ?12, county = ?13
                 WHERE rider_id = ?1",
                params![
                    rider_id,
                    person.postal_address,
                    person.postcode,
                    person.country,
                    person.email,
                    person.phone,
                    last_active,
                    d.first_name,
                    d.last_name,
                    d.address1,
                    d.address2,
                    d.town,
                    d.county,
                ],
            ),
            None => self.conn.execute(
                "UPDATE riders SET postal_address = ?2, postcode = ?3, country = ?4,
                 email = ?5, phone = ?6, date_last_active = ?7
                 WHERE rider_id = ?1",
                params![
                    rider_id,
                    person.postal_address,
                    person.postcode,
                    person.country,
                    person.email,
                    person.phone,
                    last_active,
                ],
            ),
        };

        result.map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        Ok(())
    }

    /// Get a rider by key.
    pub fn get_rider(&self, rider_id: i64) -> Result<Option<Rider>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT rider_id, name, first_name, last_name, iba_number, postal_address,
                 address1, address2, town, county, postcode, country, email, phone,
                 is_pillion, date_last_active FROM riders WHERE rider_id = ?1",
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let result = stmt.query_row(params![rider_id], |row| {
            Ok(RiderRow {
                rider_id: row.get(0)?,
                name: row.get(1)?,
                first_name: row.get(2)?,
                last_name: row.get(3)?,
                iba_number: row.get(4)?,
                postal_address: row.get(5)?,
                address1: row.get(6)?,
                address2: row.get(7)?,
                town: row.get(8)?,
                county: row.get(9)?,
                postcode: row.get(10)?,
                country: row.get(11)?,
                email: row.get(12)?,
                phone: row.get(13)?,
                is_pillion: row.get(14)?,
                date_last_active: row.get(15)?,
            })
        });

        match result {
            Ok(row) => Ok(Some(row.into_rider())),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DatabaseError::QueryFailed(e.to_string())),
        }
    }

    /// Count riders in the roster.
    pub fn count_riders(&self) -> Result<usize, DatabaseError> {
        self.count("SELECT COUNT(*) FROM riders")
    }

    // ========== Bike Operations ==========

    /// Find a bike for a rider by description, accepting either a matching
    /// registration or an empty stored registration.
    pub fn find_bike(
        &self,
        rider_id: i64,
        description: &str,
        registration: &str,
    ) -> Result<Option<i64>, DatabaseError> {
        self.first_integer(
            "SELECT bike_id FROM bikes WHERE rider_id = ?1 AND description = ?2
             AND (IFNULL(registration, '') = ?3 OR IFNULL(registration, '') = '')",
            params![rider_id, description, registration],
        )
    }

    /// Allocate the next bike key.
    pub fn next_bike_id(&self) -> Result<i64, DatabaseError> {
        self.next_key("SELECT IFNULL(MAX(bike_id), 0) + 1 FROM bikes")
    }

    /// Insert a new bike with an application-assigned key.
    pub fn insert_bike(
        &self,
        bike_id: i64,
        rider_id: i64,
        description: &str,
        registration: &str,
        kms_odo: bool,
    ) -> Result<(), DatabaseError> {
        self.conn
            .execute(
                "INSERT INTO bikes (bike_id, rider_id, description, registration, kms_odo)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![bike_id, rider_id, description, registration, kms_odo as i32],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    /// Update a matched bike's unit flag and registration, but only while
    /// the stored registration is still empty.
    pub fn claim_bike_registration(
        &self,
        bike_id: i64,
        rider_id: i64,
        registration: &str,
        kms_odo: bool,
    ) -> Result<(), DatabaseError> {
        self.conn
            .execute(
                "UPDATE bikes SET kms_odo = ?3, registration = ?4
                 WHERE bike_id = ?1 AND rider_id = ?2 AND IFNULL(registration, '') = ''",
                params![bike_id, rider_id, kms_odo as i32, registration],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    /// Get a bike by key.
    pub fn get_bike(&self, bike_id: i64) -> Result<Option<Bike>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT bike_id, rider_id, description, registration, kms_odo
                 FROM bikes WHERE bike_id = ?1",
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let result = stmt.query_row(params![bike_id], |row| {
            Ok(BikeRow {
                bike_id: row.get(0)?,
                rider_id: row.get(1)?,
                description: row.get(2)?,
                registration: row.get(3)?,
                kms_odo: row.get(4)?,
            })
        });

        match result {
            Ok(row) => Ok(Some(row.into_bike())),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DatabaseError::QueryFailed(e.to_string())),
        }
    }

    /// Count bikes in the roster.
    pub fn count_bikes(&self) -> Result<usize, DatabaseError> {
        self.count("SELECT COUNT(*) FROM bikes")
    }

    // ========== Ride Operations ==========

    /// Find the first ride matching (rider, start date, ride name).
    pub fn find_ride(
        &self,
        rider_id: i64,
        date_start: &str,
        ride_name: &str,
    ) -> Result<Option<Ride>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT ride_id, rider_id, bike_id, cert_name, date_start, date_finish,
                 ride_name, is_pillion, event_name, kms_odo, total_miles, start_point,
                 finish_point, mid_points, catalog_ride_id, show_roh, odo_start,
                 odo_finish, time_start, time_finish, ride_hours, ride_mins, notes
                 FROM rides WHERE rider_id = ?1 AND date_start = ?2 AND ride_name = ?3",
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let result = stmt.query_row(params![rider_id, date_start, ride_name], |row| {
            Ok(RideRow {
                ride_id: row.get(0)?,
                rider_id: row.get(1)?,
                bike_id: row.get(2)?,
                cert_name: row.get(3)?,
                date_start: row.get(4)?,
                date_finish: row.get(5)?,
                ride_name: row.get(6)?,
                is_pillion: row.get(7)?,
                event_name: row.get(8)?,
                kms_odo: row.get(9)?,
                total_miles: row.get(10)?,
                start_point: row.get(11)?,
                finish_point: row.get(12)?,
                mid_points: row.get(13)?,
                catalog_ride_id: row.get(14)?,
                show_roh: row.get(15)?,
                odo_start: row.get(16)?,
                odo_finish: row.get(17)?,
                time_start: row.get(18)?,
                time_finish: row.get(19)?,
                ride_hours: row.get(20)?,
                ride_mins: row.get(21)?,
                notes: row.get(22)?,
            })
        });

        match result {
            Ok(row) => Ok(Some(row.into_ride())),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DatabaseError::QueryFailed(e.to_string())),
        }
    }

    /// Allocate the next ride key.
    pub fn next_ride_id(&self) -> Result<i64, DatabaseError> {
        self.next_key("SELECT IFNULL(MAX(ride_id), 0) + 1 FROM rides")
    }

    /// Insert a new ride with an application-assigned key and catalog id.
    pub fn insert_ride(
        &self,
        ride_id: i64,
        catalog_ride_id: i64,
        ride: &RideRecord,
    ) -> Result<(), DatabaseError> {
        self.conn
            .execute(
                "INSERT INTO rides (ride_id, rider_id, bike_id, cert_name, date_start,
                 date_finish, ride_name, is_pillion, event_name, kms_odo, total_miles,
                 start_point, finish_point, mid_points, date_received, verifier,
                 date_verified, date_cert_sent, catalog_ride_id, date_pay_received,
                 date_pay_requested, show_roh, odo_start, odo_finish, time_start,
                 time_finish, ride_hours, ride_mins, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                 ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29)",
                params![
                    ride_id,
                    ride.rider_id,
                    ride.bike_id,
                    ride.cert_name,
                    ride.date_start,
                    ride.date_finish,
                    ride.ride_name,
                    ride.is_pillion as i32,
                    ride.event_name,
                    ride.kms_odo as i32,
                    ride.total_miles,
                    ride.start_point,
                    ride.finish_point,
                    ride.mid_points,
                    ride.admin_date,
                    ride.verifier,
                    ride.admin_date,
                    ride.admin_date,
                    catalog_ride_id,
                    ride.admin_date,
                    ride.admin_date,
                    ride.show_roh as i32,
                    ride.odo_start,
                    ride.odo_finish,
                    ride.time_start,
                    ride.time_finish,
                    ride.ride_hours,
                    ride.ride_mins,
                    ride.notes,
                ],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    /// Look up the catalog id for a canonical ride name (0 when absent).
    pub fn catalog_ride_id(&self, ride_name: &str) -> Result<i64, DatabaseError> {
        Ok(self
            .first_integer(
                "SELECT name_id FROM ride_names WHERE ride_name = ?1",
                params![ride_name],
            )?
            .unwrap_or(0))
    }

    /// Count rides in the roster.
    pub fn count_rides(&self) -> Result<usize, DatabaseError> {
        self.count("SELECT COUNT(*) FROM rides")
    }

    // ========== Rally Operations ==========

    /// Get a rally's title by code.
    pub fn rally_title(&self, rally_code: &str) -> Result<Option<String>, DatabaseError> {
        let result: SqliteResult<String> = self.conn.query_row(
            "SELECT title FROM rallies WHERE rally_id = ?1",
            params![rally_code],
            |row| row.get(0),
        );

        match result {
            Ok(title) => Ok(Some(title)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DatabaseError::QueryFailed(e.to_string())),
        }
    }

    /// Insert a rally catalog entry.
    pub fn insert_rally(&self, rally_code: &str, title: &str) -> Result<(), DatabaseError> {
        self.conn
            .execute(
                "INSERT INTO rallies (rally_id, title) VALUES (?1, ?2)",
                params![rally_code, title],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    /// Check whether a rally result already exists for (rider, bike, rally key).
    pub fn rally_result_exists(
        &self,
        rider_id: i64,
        bike_id: i64,
        rally_key: &str,
    ) -> Result<bool, DatabaseError> {
        Ok(self
            .first_integer(
                "SELECT result_id FROM rally_results
                 WHERE rider_id = ?1 AND bike_id = ?2 AND rally_id = ?3",
                params![rider_id, bike_id, rally_key],
            )?
            .is_some())
    }

    /// Allocate the next rally result key.
    pub fn next_rally_result_id(&self) -> Result<i64, DatabaseError> {
        self.next_key("SELECT IFNULL(MAX(result_id), 0) + 1 FROM rally_results")
    }

    /// Insert a new rally result with an application-assigned key.
    pub fn insert_rally_result(
        &self,
        result_id: i64,
        result: &RallyResultRecord,
    ) -> Result<(), DatabaseError> {
        self.conn
            .execute(
                "INSERT INTO rally_results (result_id, rally_id, finish_position,
                 rider_id, bike_id, miles, points, country)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    result_id,
                    result.rally_key,
                    result.finish_position,
                    result.rider_id,
                    result.bike_id,
                    result.miles,
                    result.points,
                    result.country,
                ],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    /// Count rally results in the roster.
    pub fn count_rally_results(&self) -> Result<usize, DatabaseError> {
        self.count("SELECT COUNT(*) FROM rally_results")
    }

    // ========== Query Helpers ==========

    /// First integer of the first matching row, or `None`.
    fn first_integer(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Option<i64>, DatabaseError> {
        let result: SqliteResult<i64> = self.conn.query_row(sql, params, |row| row.get(0));

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DatabaseError::QueryFailed(e.to_string())),
        }
    }

    /// Next key for an application-assigned sequence (max + 1).
    fn next_key(&self, sql: &str) -> Result<i64, DatabaseError> {
        self.conn
            .query_row(sql, [], |row| row.get(0))
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))
    }

    fn count(&self, sql: &str) -> Result<usize, DatabaseError> {
        let count: i64 = self
            .conn
            .query_row(sql, [], |row| row.get(0))
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        Ok(count as usize)
    }
}

/// Intermediate struct for reading rider rows from database.
struct RiderRow {
    rider_id: i64,
    name: String,
    first_name: Option<String>,
    last_name: Option<String>,
    iba_number: Option<String>,
    postal_address: String,
    address1: Option<String>,
    address2: Option<String>,
    town: Option<String>,
    county: Option<String>,
    postcode: String,
    country: String,
    email: String,
    phone: String,
    is_pillion: i32,
    date_last_active: String,
}

impl RiderRow {
    fn into_rider(self) -> Rider {
        Rider {
            rider_id: self.rider_id,
            name: self.name,
            first_name: self.first_name,
            last_name: self.last_name,
            iba_number: self.iba_number,
            postal_address: self.postal_address,
            address1: self.address1,
            address2: self.address2,
            town: self.town,
            county: self.county,
            postcode: self.postcode,
            country: self.country,
            email: self.email,
            phone: self.phone,
            is_pillion: self.is_pillion != 0,
            date_last_active: self.date_last_active,
        }
    }
}

/// Intermediate struct for reading bike rows from database.
struct BikeRow {
    bike_id: i64,
    rider_id: i64,
    description: String,
    registration: Option<String>,
    kms_odo: i32,
}

impl BikeRow {
    fn into_bike(self) -> Bike {
        Bike {
            bike_id: self.bike_id,
            rider_id: self.rider_id,
            description: self.description,
            registration: self.registration,
            kms_odo: self.kms_odo != 0,
        }
    }
}

/// Intermediate struct for reading ride rows from database.
struct RideRow {
    ride_id: i64,
    rider_id: i64,
    bike_id: i64,
    cert_name: String,
    date_start: String,
    date_finish: Option<String>,
    ride_name: String,
    is_pillion: i32,
    event_name: Option<String>,
    kms_odo: i32,
    total_miles: i64,
    start_point: Option<String>,
    finish_point: Option<String>,
    mid_points: Option<String>,
    catalog_ride_id: i64,
    show_roh: i32,
    odo_start: Option<String>,
    odo_finish: Option<String>,
    time_start: Option<String>,
    time_finish: Option<String>,
    ride_hours: i64,
    ride_mins: i64,
    notes: Option<String>,
}

impl RideRow {
    fn into_ride(self) -> Ride {
        Ride {
            ride_id: self.ride_id,
            rider_id: self.rider_id,
            bike_id: self.bike_id,
            cert_name: self.cert_name,
            date_start: self.date_start,
            date_finish: self.date_finish,
            ride_name: self.ride_name,
            is_pillion: self.is_pillion != 0,
            event_name: self.event_name,
            kms_odo: self.kms_odo != 0,
            total_miles: self.total_miles,
            start_point: self.start_point,
            finish_point: self.finish_point,
            mid_points: self.mid_points,
            catalog_ride_id: self.catalog_ride_id,
            show_roh: self.show_roh != 0,
            odo_start: self.odo_start,
            odo_finish: self.odo_finish,
            time_start: self.time_start,
            time_finish: self.time_finish,
            ride_hours: self.ride_hours,
            ride_mins: self.ride_mins,
            notes: self.notes,
        }
    }
}

/// Database errors.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),
}
