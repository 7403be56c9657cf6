//! Structured results-document parser.

use crate::import::types::{ParseError, ResultsDocument};

/// Decode a structured results export.
pub fn parse_results(payload: &str) -> Result<ResultsDocument, ParseError> {
    serde_json::from_str(payload).map_err(|e| ParseError::InvalidDocument(e.to_string()))
}
