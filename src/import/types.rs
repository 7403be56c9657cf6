//! Typed records for the two results-export payload shapes.

use serde::Deserialize;
use thiserror::Error;

/// Status code denoting an on-time finisher.
pub const FINISHER: i64 = 8;

/// Status code denoting a late finisher.
pub const LATE_FINISHER: i64 = 10;

/// Classification of an entrant's numeric status code.
///
/// Finisher and late finisher are the two completed-attempt statuses; every
/// other code (no-show, withdrawn, ...) is non-qualifying and produces no
/// ride.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntrantStatus {
    Finisher,
    LateFinisher,
    Other(i64),
}

impl EntrantStatus {
    pub fn from_code(code: i64) -> Self {
        match code {
            FINISHER => EntrantStatus::Finisher,
            LATE_FINISHER => EntrantStatus::LateFinisher,
            other => EntrantStatus::Other(other),
        }
    }

    /// Whether the status represents a completed ride attempt.
    pub fn completed(&self) -> bool {
        !matches!(self, EntrantStatus::Other(_))
    }

    pub fn is_finisher(&self) -> bool {
        matches!(self, EntrantStatus::Finisher)
    }

    pub fn is_late(&self) -> bool {
        matches!(self, EntrantStatus::LateFinisher)
    }
}

/// One person on an entrant record of the structured export.
///
/// Field names follow the upstream export contract.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Person {
    pub first: String,
    pub last: String,
    #[serde(rename = "IBA")]
    pub iba: String,
    #[serde(rename = "RBL")]
    pub rbl: String,
    pub email: String,
    pub phone: String,
    pub address1: String,
    pub address2: String,
    pub town: String,
    pub county: String,
    pub postcode: String,
    pub country: String,
}

impl Person {
    /// Whether the record actually names a person.
    pub fn is_present(&self) -> bool {
        !self.first.is_empty() || !self.last.is_empty() || !self.iba.is_empty()
    }
}

/// One entrant record of the structured export.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Entrant {
    #[serde(rename = "EntrantID")]
    pub entrant_id: i64,
    pub entrant_status: i64,
    pub rider: Person,
    pub pillion: Person,
    pub bike: String,
    pub bike_reg: String,
    pub route: String,
    pub odo_start: String,
    pub odo_finish: String,
    /// Odometer unit code: "K" = kilometres, anything else = miles
    pub odo_counts: String,
    pub start_time: String,
    pub finish_time: String,
    pub notes: String,
}

/// The structured results export: a format tag, an as-of timestamp, and an
/// ordered list of entrants.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ResultsDocument {
    pub filetype: String,
    pub asat: String,
    pub entrants: Vec<Entrant>,
}

/// One data row of the tabular finisher sheet, with positionally-fixed
/// columns.
#[derive(Debug, Clone, Default)]
pub struct RallyRow {
    pub rider_name: String,
    pub pillion_name: String,
    pub bike: String,
    pub placing: i64,
    pub miles: i64,
    pub points: i64,
    pub rider_iba: i64,
    pub pillion_iba: i64,
    pub bike_reg: String,
    pub class: i64,
    pub phone: String,
    pub email: String,
    pub postcode: String,
    pub country: String,
    pub postal_address: String,
    pub rider_rbl: String,
    pub novice_rider: String,
    pub novice_pillion: String,
}

/// Payload decoding errors. Fatal to the batch; raised before any store
/// mutation.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid results document: {0}")]
    InvalidDocument(String),

    #[error("invalid results sheet: {0}")]
    InvalidSheet(String),
}
