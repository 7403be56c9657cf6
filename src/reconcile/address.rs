//! Postal address normalization for the roster's textual store.
//!
//! Addresses are stored over multiple lines in a single text field. Two
//! input shapes exist: the structured exports carry separate components,
//! while the legacy tabular exports carry one pre-joined string whose
//! segments are separated by " | ".

/// Line-break sequence recognized by the store's text representation.
const LINE_BREAK: &str = "\r\n";

/// Segment delimiter used by the legacy pre-joined address strings.
const LEGACY_DELIMITER: &str = " | ";

/// Fold separate address components into the storage representation.
///
/// Components are trimmed and quote-escaped; empty components are omitted
/// rather than producing blank lines.
pub fn normalize_components(
    address1: &str,
    address2: &str,
    town: &str,
    county: &str,
) -> String {
    let mut lines: Vec<String> = Vec::with_capacity(4);

    for component in [address1, address2, town, county] {
        let trimmed = component.trim();
        if trimmed.is_empty() {
            continue;
        }
        lines.push(escape_quotes(trimmed));
    }

    lines.join(LINE_BREAK)
}

/// Fold a legacy pre-joined address string into the storage representation.
///
/// A multi-segment address is stored verbatim in one field rather than
/// split across lines; this mismatch with [`normalize_components`] is
/// inherited from an upstream export format and deliberately preserved.
pub fn normalize_legacy(address: &str) -> String {
    let segments: Vec<&str> = address.split(LEGACY_DELIMITER).collect();

    if segments.len() > 1 {
        return address.to_string();
    }

    escape_quotes(address.trim())
}

/// Double any literal quote character.
fn escape_quotes(value: &str) -> String {
    value.replace('\'', "''")
}
