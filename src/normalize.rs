// Text Normalization - canonical Persian strings and dedup keys
// Records typed on Arabic vs Persian keyboard layouts must collapse to the
// same entity, so letter variants are folded before any key comparison.

/// Normalize free text: fold Arabic-script letter variants to their Persian
/// equivalents, collapse whitespace runs to a single space, trim.
///
/// Total function: empty input returns an empty string, never fails.
pub fn normalize_text(value: &str) -> String {
    let folded: String = value
        .chars()
        .map(|c| match c {
            '\u{064A}' => '\u{06CC}', // ي (Arabic yeh) -> ی (Persian yeh)
            '\u{0643}' => '\u{06A9}', // ك (Arabic kaf) -> ک (Persian keheh)
            other => other,
        })
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Dedup key for an entity name: normalized text, lowercased.
///
/// Every map that collapses raw records into entities keys on this.
pub fn normalize_name(value: &str) -> String {
    normalize_text(value).to_lowercase()
}

// ============================================================================
// TESTS
// ============================================================================
