// Match Decision Engine - blocking keys + weighted pairwise decisions
// Blocking bounds which pairs are ever compared; the engine decides
// whether two in-block records are the same person.

use crate::addresses::normalize_zip;
use crate::db::DonorRecord;
use crate::similarity::jaro_winkler;
use serde::{Deserialize, Serialize};

// ============================================================================
// BLOCKING KEY
// ============================================================================

/// Blocking key `last_name[:5] | zip[:3] | first_initial`, pipe-delimited.
/// Missing components render as empty segments so partial records still
/// group. The key is a filter, not a guarantee: records that disagree on
/// any component are never compared in the clustering pass.
pub fn create_blocking_key(last_name: &str, zipcode: &str, first_initial: &str) -> String {
    let ln: String = last_name
        .to_uppercase()
        .trim()
        .chars()
        .take(5)
        .collect();
    let z: String = if zipcode.is_empty() {
        String::new()
    } else {
        normalize_zip(zipcode).chars().take(3).collect()
    };
    let fi: String = first_initial.to_uppercase().chars().take(1).collect();
    format!("{}|{}|{}", ln, z, fi)
}

/// Leading digit run of a street line. No leading digit yields an empty
/// string, which never counts as equal to another empty street number.
pub fn extract_street_number(address: &str) -> String {
    address
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect()
}

// ============================================================================
// MATCH DECISION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchDecision {
    pub is_match: bool,
    /// Accumulated evidence score in [0.0, 1.0]
    pub score: f64,
}

impl MatchDecision {
    fn non_match() -> Self {
        MatchDecision {
            is_match: false,
            score: 0.0,
        }
    }
}

// ============================================================================
// MATCH ENGINE
// ============================================================================

/// Weighted pairwise match policy for two records sharing a block.
pub struct MatchEngine {
    /// First-name similarity at or above this earns the strong weight (default 0.9)
    pub strong_first_name_threshold: f64,

    /// First-name similarity at or above this earns the weak weight (default 0.8)
    pub weak_first_name_threshold: f64,

    /// Weight for a strong first-name signal (default 0.4)
    pub strong_first_name_weight: f64,

    /// Weight for a weak first-name signal (default 0.3)
    pub weak_first_name_weight: f64,

    /// Weight for equal normalized ZIPs (default 0.3)
    pub zip_weight: f64,

    /// Weight for equal, non-empty street numbers (default 0.3)
    pub street_number_weight: f64,

    /// Total score required to declare a match (default 0.6)
    pub match_threshold: f64,
}

impl MatchEngine {
    pub fn new() -> Self {
        MatchEngine {
            strong_first_name_threshold: 0.9,
            weak_first_name_threshold: 0.8,
            strong_first_name_weight: 0.4,
            weak_first_name_weight: 0.3,
            zip_weight: 0.3,
            street_number_weight: 0.3,
            match_threshold: 0.6,
        }
    }

    /// Decide whether two records represent the same person.
    ///
    /// Hard gate: last names must match exactly (case-insensitive).
    /// Missing counterpart data never errors; absence simply fails that
    /// signal's contribution.
    pub fn match_records(&self, r1: &DonorRecord, r2: &DonorRecord) -> MatchDecision {
        let ln1 = r1.last_name.as_deref().unwrap_or("");
        let ln2 = r2.last_name.as_deref().unwrap_or("");
        if ln1.to_uppercase() != ln2.to_uppercase() {
            return MatchDecision::non_match();
        }

        let fn_sim = jaro_winkler(
            r1.first_name.as_deref().unwrap_or(""),
            r2.first_name.as_deref().unwrap_or(""),
        );
        let zip_match = normalize_zip(&r1.zip_code) == normalize_zip(&r2.zip_code);
        let sn1 = extract_street_number(&r1.street_address);
        let sn2 = extract_street_number(&r2.street_address);
        let street_match = sn1 == sn2 && !sn1.is_empty();

        let mut score = if fn_sim >= self.strong_first_name_threshold {
            self.strong_first_name_weight
        } else if fn_sim >= self.weak_first_name_threshold {
            self.weak_first_name_weight
        } else {
            0.0
        };
        if zip_match {
            score += self.zip_weight;
        }
        if street_match {
            score += self.street_number_weight;
        }

        MatchDecision {
            is_match: score >= self.match_threshold,
            score,
        }
    }
}

impl Default for MatchEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DonorRecord;

    fn record(id: i64, first: &str, last: &str, street: &str, zip: &str) -> DonorRecord {
        DonorRecord {
            id,
            first_name: if first.is_empty() {
                None
            } else {
                Some(first.to_string())
            },
            last_name: if last.is_empty() {
                None
            } else {
                Some(last.to_string())
            },
            street_address: street.to_string(),
            zip_code: zip.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_blocking_key_shape() {
        assert_eq!(create_blocking_key("SMITH", "27601", "J"), "SMITH|276|J");
        assert_eq!(create_blocking_key("Huebner", "28202-1234", "f"), "HUEBN|282|F");
    }

    #[test]
    fn test_blocking_key_missing_components() {
        assert_eq!(create_blocking_key("", "", ""), "||");
        assert_eq!(create_blocking_key("LEE", "", "K"), "LEE||K");
    }

    #[test]
    fn test_extract_street_number() {
        assert_eq!(extract_street_number("123 Main St"), "123");
        assert_eq!(extract_street_number("  456 Oak Ave"), "456");
        assert_eq!(extract_street_number("PO Box 99"), "");
        assert_eq!(extract_street_number(""), "");
    }

    #[test]
    fn test_last_name_hard_gate() {
        let engine = MatchEngine::new();
        let r1 = record(1, "JOHN", "SMITH", "123 Main St", "27601");
        let r2 = record(2, "JOHN", "SMYTHE", "123 Main St", "27601");
        let d = engine.match_records(&r1, &r2);
        assert!(!d.is_match);
        assert_eq!(d.score, 0.0);
    }

    #[test]
    fn test_strong_match_same_person() {
        let engine = MatchEngine::new();
        let r1 = record(1, "JOHN", "SMITH", "123 Main St", "27601");
        let r2 = record(2, "JOHN", "SMITH", "123 Main Street", "27601");
        let d = engine.match_records(&r1, &r2);
        assert!(d.is_match);
        assert!((d.score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_different_first_name_fails_threshold() {
        let engine = MatchEngine::new();
        // Last names match but nothing else does
        let r1 = record(1, "JOHN", "SMITH", "123 Main St", "27601");
        let r2 = record(2, "JANE", "SMITH", "456 Oak Ave", "27603");
        let d = engine.match_records(&r1, &r2);
        assert!(!d.is_match);
        assert!(d.score < engine.match_threshold);
    }

    #[test]
    fn test_empty_street_numbers_never_match() {
        let engine = MatchEngine::new();
        // ZIP equal (0.3) + blank street numbers must NOT add 0.3
        let r1 = record(1, "PAT", "LEE", "PO Box 10", "27601");
        let r2 = record(2, "TERRY", "LEE", "PO Box 20", "27601");
        let d = engine.match_records(&r1, &r2);
        assert!(!d.is_match);
        assert!((d.score - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_zip_plus_street_number_without_first_name() {
        let engine = MatchEngine::new();
        let r1 = record(1, "ROBERT", "JONES", "789 Pine Rd", "28202");
        let r2 = record(2, "BOB", "JONES", "789 Pine Road", "28202");
        // First-name similarity is low, but ZIP + street number reach 0.6
        let d = engine.match_records(&r1, &r2);
        assert!(d.is_match);
        assert!((d.score - 0.6).abs() < 1e-9);
    }
}
