// 👤 Person Entity - registered clinic visitors
// Raw submissions may carry the name as one field or split first/last;
// duplicates (same normalized full name) collapse into one person with a
// submission count and the earliest first-seen timestamp.

use crate::normalize::{normalize_name, normalize_text};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// RAW RECORD
// ============================================================================

/// Raw person record as it arrives from the intake form, an API export,
/// or a pasted JSON blob. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPerson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,

    #[serde(default, rename = "firstName", skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(default, rename = "lastName", skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, rename = "fullName", skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,

    #[serde(
        default,
        rename = "createdAt",
        alias = "created_at",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<String>,
}

impl RawPerson {
    /// Resolve the display name: `fullName`, then `name`, then the
    /// concatenation of first and last name. Normalized; may be empty.
    pub fn resolve_full_name(&self) -> String {
        let explicit = self
            .full_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.name.as_deref().filter(|s| !s.is_empty()));

        match explicit {
            Some(name) => normalize_text(name),
            None => normalize_text(&format!(
                "{} {}",
                self.first_name.as_deref().unwrap_or(""),
                self.last_name.as_deref().unwrap_or("")
            )),
        }
    }
}

// ============================================================================
// CLEAN ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_seen: Option<String>,

    /// Number of raw records that collapsed into this person (always >= 1).
    pub submissions: u32,
}

// ============================================================================
// FOLDER
// ============================================================================

/// Dedups raw person records by normalized full name, preserving the order
/// in which keys were first seen.
pub struct PersonFolder {
    entries: Vec<Person>,
    index: HashMap<String, usize>,
}

impl PersonFolder {
    pub fn new() -> Self {
        PersonFolder {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Fold one raw record. Nameless records are skipped entirely.
    pub fn fold(&mut self, raw: &RawPerson) {
        let full = raw.resolve_full_name();
        if full.is_empty() {
            return;
        }

        let key = normalize_name(&full);
        let first_seen = raw.created_at.clone();

        match self.index.get(&key) {
            Some(&i) => {
                let person = &mut self.entries[i];
                person.submissions += 1;
                person.first_seen = earliest_date(person.first_seen.take(), first_seen);
            }
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push(Person {
                    name: full,
                    first_seen,
                    submissions: 1,
                });
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<Person> {
        self.entries
    }
}

impl Default for PersonFolder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TIMESTAMP HELPERS
// ============================================================================

/// Pick the earlier of two timestamp strings. A missing side loses to the
/// present one; an unparseable side loses to a parseable one.
fn earliest_date(a: Option<String>, b: Option<String>) -> Option<String> {
    match (a, b) {
        (None, b) => b,
        (a, None) => a,
        (Some(a), Some(b)) => match (parse_timestamp(&a), parse_timestamp(&b)) {
            (Some(da), Some(db)) if da <= db => Some(a),
            (Some(_), Some(_)) => Some(b),
            (Some(_), None) => Some(a),
            (None, Some(_)) => Some(b),
            (None, None) => Some(a),
        },
    }
}

/// Parse a timestamp string (supports RFC 3339, date-time, and plain date).
fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }

    None
}

// ============================================================================
// TESTS
// ============================================================================
