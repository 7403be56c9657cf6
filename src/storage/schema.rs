//! Database schema definitions for the rides roster.

/// SQL schema for creating all roster tables.
pub const SCHEMA: &str = r#"
-- Riders table: one row per person known to the roster
CREATE TABLE IF NOT EXISTS riders (
    rider_id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    first_name TEXT,
    last_name TEXT,
    iba_number TEXT,
    postal_address TEXT NOT NULL DEFAULT '',
    address1 TEXT,
    address2 TEXT,
    town TEXT,
    county TEXT,
    postcode TEXT NOT NULL DEFAULT '',
    country TEXT NOT NULL DEFAULT '',
    email TEXT NOT NULL DEFAULT '',
    phone TEXT NOT NULL DEFAULT '',
    is_pillion INTEGER NOT NULL DEFAULT 0,
    date_last_active TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_riders_iba_number ON riders(iba_number);
CREATE INDEX IF NOT EXISTS idx_riders_name ON riders(name);

-- Bikes table: each bike belongs to exactly one rider
CREATE TABLE IF NOT EXISTS bikes (
    bike_id INTEGER PRIMARY KEY,
    rider_id INTEGER NOT NULL REFERENCES riders(rider_id),
    description TEXT NOT NULL,
    registration TEXT,
    kms_odo INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_bikes_rider_id ON bikes(rider_id);

-- Rides table: one completed ride attempt per row
CREATE TABLE IF NOT EXISTS rides (
    ride_id INTEGER PRIMARY KEY,
    rider_id INTEGER NOT NULL REFERENCES riders(rider_id),
    bike_id INTEGER NOT NULL REFERENCES bikes(bike_id),
    cert_name TEXT NOT NULL,
    date_start TEXT NOT NULL,
    date_finish TEXT,
    ride_name TEXT NOT NULL,
    is_pillion INTEGER NOT NULL DEFAULT 0,
    event_name TEXT,
    kms_odo INTEGER NOT NULL DEFAULT 0,
    total_miles INTEGER NOT NULL DEFAULT 0,
    start_point TEXT,
    finish_point TEXT,
    mid_points TEXT,
    date_received TEXT,
    verifier TEXT,
    date_verified TEXT,
    date_cert_sent TEXT,
    catalog_ride_id INTEGER NOT NULL DEFAULT 0,
    date_pay_received TEXT,
    date_pay_requested TEXT,
    show_roh INTEGER NOT NULL DEFAULT 0,
    odo_start TEXT,
    odo_finish TEXT,
    time_start TEXT,
    time_finish TEXT,
    ride_hours INTEGER NOT NULL DEFAULT 0,
    ride_mins INTEGER NOT NULL DEFAULT 0,
    notes TEXT
);

CREATE INDEX IF NOT EXISTS idx_rides_rider_date ON rides(rider_id, date_start);

-- Ride name catalog used by downstream certificate tooling.
-- Never written by the importer.
CREATE TABLE IF NOT EXISTS ride_names (
    name_id INTEGER PRIMARY KEY,
    ride_name TEXT NOT NULL UNIQUE
);

-- Rally catalog
CREATE TABLE IF NOT EXISTS rallies (
    rally_id TEXT PRIMARY KEY,
    title TEXT NOT NULL DEFAULT ''
);

-- Rally results: one finishing record per rider (or pillion) per rally
CREATE TABLE IF NOT EXISTS rally_results (
    result_id INTEGER PRIMARY KEY,
    rally_id TEXT NOT NULL,
    finish_position INTEGER NOT NULL DEFAULT 0,
    rider_id INTEGER NOT NULL REFERENCES riders(rider_id),
    bike_id INTEGER NOT NULL REFERENCES bikes(bike_id),
    miles INTEGER NOT NULL DEFAULT 0,
    points INTEGER NOT NULL DEFAULT 0,
    country TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS idx_rally_results_keys ON rally_results(rider_id, bike_id, rally_id);
"#;

/// SQL for schema version tracking (migrations)
pub const SCHEMA_VERSION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);
"#;

/// Current schema version
pub const CURRENT_VERSION: i32 = 1;
