// Entity Models - one module per clinic entity
//
// Each entity module has:
// - A raw record type (loosely typed, tolerant of alternate field names)
// - A clean entity type (the shape the report exposes)
// - A folder that dedups raw records by normalized name and merges duplicates

pub mod doctor;
pub mod payment;
pub mod person;
pub mod treatment;

pub use doctor::{parse_specialty, Doctor, DoctorFolder, RawDoctor, UNKNOWN_SPECIALTY};
pub use payment::{
    infer_delay, score_to_stars, split_payment_names, PaymentFolder, PaymentMethod, RawPayment,
    SplitPayment,
};
pub use person::{Person, PersonFolder, RawPerson};
pub use treatment::{format_cost, CostInfo, RawTreatment, Treatment, TreatmentFolder};

/// Fallback display name when a record carries no usable name at all.
pub const UNKNOWN_LABEL: &str = "نامشخص";

/// Separator between accumulated note fragments (Persian semicolon + space).
pub const NOTE_SEPARATOR: &str = "؛ ";

/// Parse a loosely typed numeric field: JSON number, or a numeric-looking
/// string with ASCII thousands separators. Anything else is absent.
pub(crate) fn parse_numeric(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64().filter(|n| n.is_finite()),
        serde_json::Value::String(s) => {
            let cleaned = crate::normalize::normalize_text(s).replace(',', "");
            cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
        }
        _ => None,
    }
}

/// Append a note fragment unless an identical fragment is already present.
pub(crate) fn append_note(notes: &mut Option<String>, note: &str) {
    if note.is_empty() {
        return;
    }
    match notes {
        Some(existing) => {
            if !existing.split(NOTE_SEPARATOR).any(|n| n == note) {
                existing.push_str(NOTE_SEPARATOR);
                existing.push_str(note);
            }
        }
        None => *notes = Some(note.to_string()),
    }
}

/// Join collected note fragments, or None when there are none.
pub(crate) fn join_notes(notes: &[String]) -> Option<String> {
    if notes.is_empty() {
        None
    } else {
        Some(notes.join(NOTE_SEPARATOR))
    }
}
