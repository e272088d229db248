// Fragmentation Detector - audit pass for split identities
// Blocking is a filter, not a guarantee: one real person can end up with
// several master ids. This pass groups resolved records by exact
// (zip, house number) and surfaces high-overlap name pairs with
// different ids as alias candidates. Advisory only - it never mutates
// identity state itself.

use crate::db::DonorRecord;
use crate::similarity::token_set_ratio;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

// ============================================================================
// SUGGESTION
// ============================================================================

/// A suggested merge, pending human review before promotion to an alias.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentSuggestion {
    pub zip_code: String,
    pub house_number: String,
    pub name_1: String,
    pub name_2: String,
    pub id_1: String,
    pub id_2: String,

    /// Token-set overlap score, 0-100
    pub similarity: u32,

    /// "pending" until flipped externally to "approved"
    pub review_status: String,
}

impl FragmentSuggestion {
    /// Column order of the review export, matching the field order above.
    pub const CSV_HEADER: &'static [&'static str] = &[
        "zip_code",
        "house_number",
        "name_1",
        "name_2",
        "id_1",
        "id_2",
        "similarity",
        "review_status",
    ];
}

// ============================================================================
// DETECTOR
// ============================================================================

pub struct FragmentationDetector {
    /// Minimum token-set score to emit a suggestion (default 85)
    pub similarity_threshold: u32,
}

impl FragmentationDetector {
    pub fn new() -> Self {
        FragmentationDetector {
            similarity_threshold: 85,
        }
    }

    pub fn with_threshold(similarity_threshold: u32) -> Self {
        FragmentationDetector {
            similarity_threshold,
        }
    }

    /// Find pairs of distinct master ids that likely share a true person.
    ///
    /// Records are reduced to distinct `(master_id, donor_name,
    /// house_number, zip)` tuples first, then grouped by exact
    /// `(zip, house_number)`. Records without a parsed last name, a
    /// resolved master id, a ZIP, or a house number are skipped.
    pub fn find_fragments(&self, records: &[DonorRecord]) -> Vec<FragmentSuggestion> {
        // Distinct tuples, first-seen order
        let mut seen: HashSet<(String, String, String, String)> = HashSet::new();
        let mut rows: Vec<(String, String, String, String)> = Vec::new();
        for r in records {
            if r.last_name.is_none() {
                continue;
            }
            let master_id = match &r.master_person_id {
                Some(id) => id.clone(),
                None => continue,
            };
            let house_number = r
                .street_address
                .split_whitespace()
                .next()
                .unwrap_or("")
                .to_string();
            if r.zip_code.is_empty() || house_number.is_empty() {
                continue;
            }
            let row = (
                master_id,
                r.donor_name.clone(),
                house_number,
                r.zip_code.clone(),
            );
            if seen.insert(row.clone()) {
                rows.push(row);
            }
        }

        // Exact-match grouping by (zip, house number) - not blocking
        let mut groups: BTreeMap<(String, String), Vec<usize>> = BTreeMap::new();
        for (idx, row) in rows.iter().enumerate() {
            groups
                .entry((row.3.clone(), row.2.clone()))
                .or_default()
                .push(idx);
        }

        let mut suggestions = Vec::new();
        for ((zip_code, house_number), members) in &groups {
            if members.len() < 2 {
                continue;
            }
            for a in 0..members.len() {
                for b in (a + 1)..members.len() {
                    let (id_1, name_1, ..) = &rows[members[a]];
                    let (id_2, name_2, ..) = &rows[members[b]];
                    if id_1 == id_2 {
                        continue;
                    }
                    let score = token_set_ratio(name_1, name_2);
                    if score >= self.similarity_threshold {
                        suggestions.push(FragmentSuggestion {
                            zip_code: zip_code.clone(),
                            house_number: house_number.clone(),
                            name_1: name_1.clone(),
                            name_2: name_2.clone(),
                            id_1: id_1.clone(),
                            id_2: id_2.clone(),
                            similarity: score,
                            review_status: "pending".to_string(),
                        });
                    }
                }
            }
        }

        suggestions
    }
}

impl Default for FragmentationDetector {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
