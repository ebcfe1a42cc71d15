// 🦷 Treatment Entity - offered treatments with profitability tiers
// Duplicate names merge: the strictly better profitability tier wins, the
// first non-empty cost display sticks, and suspicious costs get flagged.

use super::{append_note, join_notes, parse_numeric};
use crate::normalize::{normalize_name, normalize_text};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Note attached when a cost looks like a data-entry unit error.
pub const REVIEW_NOTE: &str = "نیاز به اصلاح";

/// Profitability tiers, best first. Position is the merge ordinal:
/// a lower index never gives way to a higher one.
const PROFITABILITY_ORDER: [&str; 4] = ["very-high", "high", "medium", "low"];

const DEFAULT_PROFITABILITY: &str = "medium";

fn profitability_display(key: &str) -> Option<&'static str> {
    match key {
        "very-high" => Some("خیلی پرسود"),
        "high" => Some("پرسود"),
        "medium" => Some("متوسط"),
        "low" => Some("کم‌سود"),
        _ => None,
    }
}

fn tier_ordinal(key: &str) -> Option<usize> {
    PROFITABILITY_ORDER.iter().position(|k| *k == key)
}

/// Resolve a raw profitability string into (key, display label).
/// Missing defaults to medium; unknown tiers pass through verbatim.
pub(crate) fn map_profitability(raw: Option<&str>) -> (String, String) {
    let raw = raw.filter(|s| !s.is_empty());
    let key = raw.unwrap_or(DEFAULT_PROFITABILITY).to_lowercase();
    let display = profitability_display(&key)
        .map(str::to_string)
        .or_else(|| raw.map(str::to_string))
        .unwrap_or_else(|| "متوسط".to_string());
    (key, display)
}

// ============================================================================
// RAW RECORD
// ============================================================================

/// Raw treatment record. Cost may arrive as `cost` or `price`, as a number
/// or a numeric string with thousands separators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTreatment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profitability: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(
        default,
        rename = "createdAt",
        alias = "created_at",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<String>,
}

impl RawTreatment {
    fn cost_value(&self) -> Option<&serde_json::Value> {
        self.cost
            .as_ref()
            .filter(|v| !v.is_null())
            .or(self.price.as_ref())
    }
}

// ============================================================================
// CLEAN ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Treatment {
    pub name: String,

    /// Canonical tier key ("very-high".."low", or a passthrough string).
    pub profitability: String,

    /// Persian display label for the tier.
    pub profitability_label: String,

    /// Grouped-digit display, or "-" when no cost was supplied.
    pub cost: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

// ============================================================================
// COST FORMATTER
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct CostInfo {
    pub display: String,
    pub needs_review: bool,
}

/// Format a loosely typed cost value for display.
///
/// Numeric input gets Persian-locale grouped digits; a positive value below
/// `review_threshold` is flagged for review (almost certainly a missing-zeros
/// entry error, not a hard failure). Non-numeric strings display verbatim;
/// absent input displays "-".
pub fn format_cost(value: Option<&serde_json::Value>, review_threshold: f64) -> CostInfo {
    let value = match value {
        Some(v) if !v.is_null() => v,
        _ => {
            return CostInfo {
                display: "-".to_string(),
                needs_review: false,
            }
        }
    };

    if let Some(numeric) = parse_numeric(value) {
        return CostInfo {
            display: format_persian_number(numeric),
            needs_review: numeric > 0.0 && numeric < review_threshold,
        };
    }

    let text = match value {
        serde_json::Value::String(s) => normalize_text(s),
        _ => String::new(),
    };
    CostInfo {
        display: if text.is_empty() { "-".to_string() } else { text },
        needs_review: false,
    }
}

/// Grouped-digit rendering with Persian digits, matching what the fa-IR
/// locale produces: U+066C between groups, U+066B before fractions.
fn format_persian_number(value: f64) -> String {
    let negative = value < 0.0;
    let abs = value.abs();

    let (int_part, frac_part) = if abs.fract() == 0.0 {
        (format!("{:.0}", abs), String::new())
    } else {
        let fixed = format!("{:.3}", abs);
        let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
        match trimmed.split_once('.') {
            Some((i, f)) => (i.to_string(), f.to_string()),
            None => (trimmed.to_string(), String::new()),
        }
    };

    let digits: Vec<char> = int_part.chars().collect();
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('\u{066C}');
        }
        out.push(persian_digit(*c));
    }
    if !frac_part.is_empty() {
        out.push('\u{066B}');
        out.extend(frac_part.chars().map(persian_digit));
    }
    out
}

fn persian_digit(c: char) -> char {
    match c.to_digit(10) {
        Some(d) => char::from_u32(0x06F0 + d).unwrap_or(c),
        None => c,
    }
}

// ============================================================================
// FOLDER
// ============================================================================

/// Dedups treatments by normalized name with the monotonic-tier merge policy.
pub struct TreatmentFolder {
    review_threshold: f64,
    entries: Vec<Treatment>,
    index: HashMap<String, usize>,
}

impl TreatmentFolder {
    pub fn new(review_threshold: f64) -> Self {
        TreatmentFolder {
            review_threshold,
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Fold one raw record. Nameless records are skipped.
    pub fn fold(&mut self, raw: &RawTreatment) {
        let name = normalize_text(raw.name.as_deref().unwrap_or(""));
        if name.is_empty() {
            return;
        }

        let key = normalize_name(&name);
        let (prof_key, prof_label) = map_profitability(raw.profitability.as_deref());
        let cost = format_cost(raw.cost_value(), self.review_threshold);
        let description = normalize_text(raw.description.as_deref().unwrap_or(""));

        match self.index.get(&key) {
            Some(&i) => {
                let entry = &mut self.entries[i];

                // Keep the strictly better tier; unknown tiers never displace
                // a known one, and a known one always displaces unknown.
                let current = tier_ordinal(&entry.profitability);
                if let Some(incoming) = tier_ordinal(&prof_key) {
                    if current.map_or(true, |c| incoming < c) {
                        entry.profitability = prof_key;
                        entry.profitability_label = prof_label;
                    }
                }

                // Cost display is filled once and never overwritten after.
                if entry.cost == "-" && cost.display != "-" {
                    entry.cost = cost.display;
                }
                if cost.needs_review {
                    append_note(&mut entry.notes, REVIEW_NOTE);
                }
                if !description.is_empty() {
                    append_note(&mut entry.notes, &description);
                }
            }
            None => {
                let mut notes: Vec<String> = Vec::new();
                if cost.needs_review {
                    notes.push(REVIEW_NOTE.to_string());
                }
                if !description.is_empty() {
                    notes.push(description);
                }

                self.index.insert(key, self.entries.len());
                self.entries.push(Treatment {
                    name,
                    profitability: prof_key,
                    profitability_label: prof_label,
                    cost: cost.display,
                    notes: join_notes(&notes),
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

    pub fn into_entries(self) -> Vec<Treatment> {
        self.entries
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const THRESHOLD: f64 = 1000.0;

    fn raw(name: &str, profitability: &str, cost: serde_json::Value) -> RawTreatment {
        RawTreatment {
            name: Some(name.to_string()),
            profitability: Some(profitability.to_string()),
            cost: Some(cost),
            ..Default::default()
        }
    }

    #[test]
    fn test_format_cost_absent() {
        let info = format_cost(None, THRESHOLD);
        assert_eq!(info.display, "-");
        assert!(!info.needs_review);

        let info = format_cost(Some(&json!(null)), THRESHOLD);
        assert_eq!(info.display, "-");
        assert!(!info.needs_review);
    }

    #[test]
    fn test_format_cost_flags_small_values() {
        let info = format_cost(Some(&json!(500)), THRESHOLD);
        assert_eq!(info.display, "۵۰۰");
        assert!(info.needs_review);

        let info = format_cost(Some(&json!(5_000_000)), THRESHOLD);
        assert_eq!(info.display, "۵٬۰۰۰٬۰۰۰");
        assert!(!info.needs_review);

        // zero is not flagged
        let info = format_cost(Some(&json!(0)), THRESHOLD);
        assert!(!info.needs_review);
    }

    #[test]
    fn test_format_cost_threshold_is_policy() {
        assert!(format_cost(Some(&json!(4000)), 5000.0).needs_review);
        assert!(!format_cost(Some(&json!(4000)), 1000.0).needs_review);
    }

    #[test]
    fn test_format_cost_parses_separated_string() {
        let info = format_cost(Some(&json!("2,500,000")), THRESHOLD);
        assert_eq!(info.display, "۲٬۵۰۰٬۰۰۰");
        assert!(!info.needs_review);
    }

    #[test]
    fn test_format_cost_non_numeric_displays_verbatim() {
        let info = format_cost(Some(&json!("توافقی")), THRESHOLD);
        assert_eq!(info.display, "توافقی");
        assert!(!info.needs_review);

        let info = format_cost(Some(&json!("")), THRESHOLD);
        assert_eq!(info.display, "-");
    }

    #[test]
    fn test_persian_number_fraction() {
        assert_eq!(format_persian_number(12.5), "۱۲٫۵");
        assert_eq!(format_persian_number(1234.0), "۱٬۲۳۴");
        assert_eq!(format_persian_number(-1000.0), "-۱٬۰۰۰");
    }

    #[test]
    fn test_map_profitability_defaults_and_passthrough() {
        assert_eq!(
            map_profitability(Some("very-high")),
            ("very-high".to_string(), "خیلی پرسود".to_string())
        );
        assert_eq!(
            map_profitability(None),
            ("medium".to_string(), "متوسط".to_string())
        );
        assert_eq!(
            map_profitability(Some("")),
            ("medium".to_string(), "متوسط".to_string())
        );
        // unknown tier passes through for display, lowercased as key
        assert_eq!(
            map_profitability(Some("Custom")),
            ("custom".to_string(), "Custom".to_string())
        );
    }

    #[test]
    fn test_tier_merge_is_monotonic() {
        let mut folder = TreatmentFolder::new(THRESHOLD);
        folder.fold(&raw("ایمپلنت", "medium", json!(2_000_000)));
        folder.fold(&raw("ایمپلنت", "high", json!(2_000_000)));
        folder.fold(&raw("ایمپلنت", "low", json!(2_000_000)));

        let treatments = folder.into_entries();
        assert_eq!(treatments.len(), 1);
        assert_eq!(treatments[0].profitability, "high");
        assert_eq!(treatments[0].profitability_label, "پرسود");
    }

    #[test]
    fn test_known_tier_displaces_unknown() {
        let mut folder = TreatmentFolder::new(THRESHOLD);
        folder.fold(&raw("جرم‌گیری", "custom", json!(800_000)));
        folder.fold(&raw("جرم‌گیری", "low", json!(800_000)));

        let treatments = folder.into_entries();
        assert_eq!(treatments[0].profitability, "low");
    }

    #[test]
    fn test_cost_filled_once_never_overwritten() {
        let mut folder = TreatmentFolder::new(THRESHOLD);
        folder.fold(&RawTreatment {
            name: Some("عصب‌کشی".to_string()),
            ..Default::default()
        });
        folder.fold(&raw("عصب‌کشی", "medium", json!(3_000_000)));
        folder.fold(&raw("عصب‌کشی", "medium", json!(9_000_000)));

        let treatments = folder.into_entries();
        assert_eq!(treatments[0].cost, "۳٬۰۰۰٬۰۰۰");
    }

    #[test]
    fn test_review_note_attached_once() {
        let mut folder = TreatmentFolder::new(THRESHOLD);
        folder.fold(&raw("کشیدن دندان", "medium", json!(500)));
        folder.fold(&raw("کشیدن دندان", "medium", json!(700)));

        let treatments = folder.into_entries();
        let notes = treatments[0].notes.as_deref().unwrap();
        assert_eq!(notes.matches(REVIEW_NOTE).count(), 1);
    }

    #[test]
    fn test_description_appended_if_unseen() {
        let mut folder = TreatmentFolder::new(THRESHOLD);
        folder.fold(&RawTreatment {
            name: Some("ارتودنسی".to_string()),
            description: Some("دو فک".to_string()),
            ..Default::default()
        });
        folder.fold(&RawTreatment {
            name: Some("ارتودنسی".to_string()),
            description: Some("دو فک".to_string()),
            ..Default::default()
        });
        folder.fold(&RawTreatment {
            name: Some("ارتودنسی".to_string()),
            description: Some("نامرئی".to_string()),
            ..Default::default()
        });

        let treatments = folder.into_entries();
        assert_eq!(treatments[0].notes.as_deref(), Some("دو فک؛ نامرئی"));
    }

    #[test]
    fn test_price_is_cost_fallback() {
        let mut folder = TreatmentFolder::new(THRESHOLD);
        folder.fold(&RawTreatment {
            name: Some("لمینت".to_string()),
            price: Some(json!(12_000_000)),
            ..Default::default()
        });

        let treatments = folder.into_entries();
        assert_eq!(treatments[0].cost, "۱۲٬۰۰۰٬۰۰۰");
    }
}
