// 💳 Payment Method Entity - how people pay
// A single raw record's `type` field may bundle several methods
// ("نقد - کارت بانکی"); each bundled name becomes its own entity tagged
// with a note referencing the original bundle string.

use super::{append_note, join_notes, parse_numeric, UNKNOWN_LABEL};
use crate::normalize::{normalize_name, normalize_text};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Delay label for methods that involve a post-dated check.
pub const DELAY_CHECK: &str = "نیازمند زمان‌بندی (چک)";
/// Delay label for installment plans.
pub const DELAY_INSTALLMENT: &str = "اقساطی";
/// Delay label for cash (no delay).
pub const DELAY_NONE: &str = "بدون تأخیر";

// ============================================================================
// RAW RECORD
// ============================================================================

/// Raw payment record. `type` and `name` are interchangeable; score may be
/// a number or a numeric string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPayment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,

    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub payment_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<String>,

    #[serde(
        default,
        rename = "createdAt",
        alias = "created_at",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<String>,
}

// ============================================================================
// CLEAN ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethod {
    pub name: String,

    /// Highest score seen across merged records (monotonically non-decreasing).
    pub best_score: f64,

    /// Display label derived from `best_score`.
    pub stars: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

// ============================================================================
// SCORE -> STARS
// ============================================================================

/// Map a 0-10 score onto the star label shown in tables and charts.
/// Display policy with exact thresholds; out-of-range scores fall into
/// the nearest bucket.
pub fn score_to_stars(score: f64) -> &'static str {
    if score >= 10.0 {
        "5⭐"
    } else if score == 9.0 {
        "4.5⭐"
    } else if score == 8.0 {
        "4⭐"
    } else if score == 7.0 {
        "3⭐"
    } else if score >= 5.0 {
        "2⭐"
    } else {
        "1⭐"
    }
}

// ============================================================================
// NAME SPLITTER
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct SplitPayment {
    /// At least one name, in input order.
    pub names: Vec<String>,
    /// Set when the input bundled two or more method names.
    pub bundle_note: Option<String>,
}

/// Split a raw payment type string into individual method names.
///
/// Delimiters: en-dash, em-dash, hyphen, Persian comma, ASCII comma, slash,
/// or the Persian conjunction " و " surrounded by spaces. An empty or
/// all-delimiter input yields the single fallback name so the record never
/// silently produces zero entities.
pub fn split_payment_names(raw: &str) -> SplitPayment {
    let cleaned = normalize_text(raw);
    if cleaned.is_empty() {
        return SplitPayment {
            names: vec![UNKNOWN_LABEL.to_string()],
            bundle_note: None,
        };
    }

    // The conjunction is a word, not a char; mark it before splitting.
    let marked = cleaned.replace(" و ", "\u{0}");
    let parts: Vec<String> = marked
        .split(|c: char| matches!(c, '–' | '—' | '-' | '،' | ',' | '/' | '\u{0}'))
        .map(normalize_text)
        .filter(|p| !p.is_empty())
        .collect();

    match parts.len() {
        0 => SplitPayment {
            names: vec![UNKNOWN_LABEL.to_string()],
            bundle_note: None,
        },
        1 => SplitPayment {
            names: parts,
            bundle_note: None,
        },
        _ => SplitPayment {
            names: parts,
            bundle_note: Some(cleaned),
        },
    }
}

// ============================================================================
// DELAY INFERENCE
// ============================================================================

/// Infer a typical settlement delay from a free-text description.
/// Check beats installment beats cash; no keyword means no signal.
pub fn infer_delay(description: Option<&str>) -> Option<String> {
    let desc = normalize_text(description?);
    if desc.is_empty() {
        return None;
    }
    let lower = desc.to_lowercase();

    if desc.contains("چک") || lower.contains("cheque") || lower.contains("check") {
        return Some(DELAY_CHECK.to_string());
    }
    if desc.contains("قسط") || lower.contains("installment") {
        return Some(DELAY_INSTALLMENT.to_string());
    }
    if desc.contains("نقد") || lower.contains("cash") {
        return Some(DELAY_NONE.to_string());
    }
    None
}

// ============================================================================
// FOLDER
// ============================================================================

/// Dedups payment method names (after bundle splitting) by normalized name.
pub struct PaymentFolder {
    entries: Vec<PaymentMethod>,
    index: HashMap<String, usize>,
}

impl PaymentFolder {
    pub fn new() -> Self {
        PaymentFolder {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Fold one raw record, producing or merging one entity per split name.
    pub fn fold(&mut self, raw: &RawPayment) {
        let raw_name = raw
            .payment_type
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(raw.name.as_deref())
            .unwrap_or("");

        let split = split_payment_names(raw_name);
        let score = raw
            .score
            .as_ref()
            .and_then(parse_numeric)
            .unwrap_or(0.0);
        let delay = infer_delay(
            raw.delay
                .as_deref()
                .filter(|s| !s.is_empty())
                .or(raw.description.as_deref()),
        );

        for name in &split.names {
            let key = normalize_name(name);

            let mut notes: Vec<String> = Vec::new();
            if let Some(bundle) = &split.bundle_note {
                if bundle != name {
                    notes.push(format!("بخشی از: {}", bundle));
                }
            }
            if let Some(d) = &delay {
                if !notes.iter().any(|n| n == d) {
                    notes.push(d.clone());
                }
            }

            match self.index.get(&key) {
                Some(&i) => {
                    let entry = &mut self.entries[i];
                    if score > entry.best_score {
                        entry.best_score = score;
                        entry.stars = score_to_stars(score).to_string();
                    }
                    if entry.delay.is_none() {
                        entry.delay = delay.clone();
                    }
                    for note in &notes {
                        append_note(&mut entry.notes, note);
                    }
                }
                None => {
                    self.index.insert(key, self.entries.len());
                    self.entries.push(PaymentMethod {
                        name: name.clone(),
                        best_score: score,
                        stars: score_to_stars(score).to_string(),
                        delay: delay.clone(),
                        notes: join_notes(&notes),
                    });
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<PaymentMethod> {
        self.entries
    }
}

impl Default for PaymentFolder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
