//! Payload decoding and batch import.

pub mod batch;
pub mod parser_csv;
pub mod parser_json;
pub mod types;

pub use batch::{import_event_results, import_rally_sheet, ImportError};
pub use types::{Entrant, EntrantStatus, ParseError, Person, RallyRow, ResultsDocument};
