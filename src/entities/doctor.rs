// 🩺 Doctor Entity - referring doctors with specialty inference
// An explicit specialty is taken verbatim; otherwise the specialty is
// inferred from keywords in the doctor's name. First occurrence of a
// normalized name wins; there is no merge beyond existence.

use crate::normalize::{normalize_name, normalize_text};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Specialty shown when neither the record nor the name gives a signal.
pub const UNKNOWN_SPECIALTY: &str = "نامشخص";

/// Specialty label -> name keywords, checked in order; first match wins.
const SPECIALTY_KEYWORDS: [(&str, &[&str]); 7] = [
    ("عمومی", &["عمومی"]),
    ("ترمیمی و زیبایی", &["ترمیم", "زیبایی"]),
    ("ارتودنسی", &["ارتودنسی"]),
    ("پریو/ایمپلنت", &["پریو", "لثه", "ایمپلنت"]),
    ("درمان ریشه (اندو)", &["ریشه", "اندو"]),
    ("اطفال", &["اطفال"]),
    ("فک و صورت", &["فک", "صورت"]),
];

// ============================================================================
// RAW RECORD
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDoctor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, rename = "doctorName", skip_serializing_if = "Option::is_none")]
    pub doctor_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
}

impl RawDoctor {
    fn resolve_name(&self) -> String {
        let raw = self
            .name
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.doctor_name.as_deref())
            .unwrap_or("");
        normalize_text(raw)
    }
}

// ============================================================================
// CLEAN ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub name: String,
    pub specialty: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Resolve a doctor's specialty: explicit value verbatim when supplied,
/// otherwise keyword inference over the normalized name.
pub fn parse_specialty(name: &str, explicit: Option<&str>) -> String {
    let explicit = normalize_text(explicit.unwrap_or(""));
    if !explicit.is_empty() {
        return explicit;
    }

    let normalized = normalize_text(name);
    for (label, keywords) in SPECIALTY_KEYWORDS.iter() {
        if keywords.iter().any(|kw| normalized.contains(kw)) {
            return (*label).to_string();
        }
    }
    UNKNOWN_SPECIALTY.to_string()
}

// ============================================================================
// FOLDER
// ============================================================================

/// Dedups doctors by normalized name; the first record for a key wins.
pub struct DoctorFolder {
    entries: Vec<Doctor>,
    index: HashMap<String, usize>,
}

impl DoctorFolder {
    pub fn new() -> Self {
        DoctorFolder {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn fold(&mut self, raw: &RawDoctor) {
        let name = raw.resolve_name();
        if name.is_empty() {
            return;
        }

        let key = normalize_name(&name);
        if self.index.contains_key(&key) {
            return;
        }

        let specialty = parse_specialty(&name, raw.specialty.as_deref());
        self.index.insert(key, self.entries.len());
        self.entries.push(Doctor {
            name,
            specialty,
            notes: None,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<Doctor> {
        self.entries
    }
}

impl Default for DoctorFolder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
