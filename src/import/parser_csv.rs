//! Tabular finisher-sheet parser.
//!
//! The sheet is a comma-delimited export with one header row followed by
//! data rows whose columns are positionally fixed. Numeric columns are
//! lenient: anything unparseable counts as zero.

use crate::import::types::{ParseError, RallyRow};

/// Decode a tabular finisher sheet.
pub fn parse_sheet(payload: &str) -> Result<Vec<RallyRow>, ParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(payload.as_bytes());

    let mut rows = Vec::new();

    for record in reader.records() {
        let record = record.map_err(|e| ParseError::InvalidSheet(e.to_string()))?;
        let field = |index: usize| record.get(index).unwrap_or("").to_string();

        rows.push(RallyRow {
            rider_name: field(0),
            pillion_name: field(1),
            bike: field(2),
            placing: intval(record.get(3)),
            miles: intval(record.get(4)),
            points: intval(record.get(5)),
            rider_iba: intval(record.get(6)),
            pillion_iba: intval(record.get(7)),
            bike_reg: field(8),
            class: intval(record.get(9)),
            phone: field(10),
            email: field(11),
            postcode: field(12),
            country: field(13),
            postal_address: field(14),
            rider_rbl: field(15),
            novice_rider: field(16),
            novice_pillion: field(17),
        });
    }

    Ok(rows)
}

/// Lenient integer column: unparseable or missing values count as zero.
fn intval(value: Option<&str>) -> i64 {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(0)
}
