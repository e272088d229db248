// Fuzzy Review Matching - suggestions for donors the alias pass missed
// Output goes to human review: rows start as "pending" and only
// externally-approved rows are ever promoted into the alias table.

use crate::aliases::Alias;
use crate::db::DonorRecord;
use crate::similarity::token_sort_ratio;
use serde::{Deserialize, Serialize};

pub const DEFAULT_REVIEW_THRESHOLD: u32 = 88;

// ============================================================================
// SUGGESTION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuzzyMatchSuggestion {
    pub original_id: i64,
    pub original_name: String,
    pub suggested_alias: String,
    pub canonical_name: String,
    pub suggested_master_person_id: String,

    /// Token-sort similarity, 0-100
    pub similarity_score: u32,

    /// "pending" until flipped externally to "approved"
    pub review_status: String,
}

impl FuzzyMatchSuggestion {
    /// Column order of the review export, matching the field order above.
    pub const CSV_HEADER: &'static [&'static str] = &[
        "original_id",
        "original_name",
        "suggested_alias",
        "canonical_name",
        "suggested_master_person_id",
        "similarity_score",
        "review_status",
    ];
}

// ============================================================================
// MATCHING
// ============================================================================

/// For each donor still lacking a `master_person_id`, find the best
/// known alias by token-sort similarity. Suggestions at or above the
/// threshold are returned sorted by score descending; ties keep the
/// first-encountered alias.
pub fn find_fuzzy_matches(
    records: &[DonorRecord],
    aliases: &[Alias],
    threshold: u32,
) -> Vec<FuzzyMatchSuggestion> {
    let mut suggestions = Vec::new();

    for record in records {
        if record.master_person_id.is_some() || record.donor_name.trim().is_empty() {
            continue;
        }

        let mut best: Option<&Alias> = None;
        let mut best_score = 0u32;
        for alias in aliases {
            let score = token_sort_ratio(&record.donor_name, &alias.alias_name);
            if score > best_score {
                best_score = score;
                best = Some(alias);
            }
        }

        if let Some(alias) = best {
            if best_score >= threshold {
                suggestions.push(FuzzyMatchSuggestion {
                    original_id: record.id,
                    original_name: record.donor_name.clone(),
                    suggested_alias: alias.alias_name.clone(),
                    canonical_name: alias.canonical_name.clone(),
                    suggested_master_person_id: alias.master_person_id.clone(),
                    similarity_score: best_score,
                    review_status: "pending".to_string(),
                });
            }
        }
    }

    suggestions.sort_by(|a, b| b.similarity_score.cmp(&a.similarity_score));
    suggestions
}

/// Convert externally-approved review rows into new alias entries.
/// Pending or rejected rows are ignored.
pub fn promote_approved(suggestions: &[FuzzyMatchSuggestion]) -> Vec<Alias> {
    suggestions
        .iter()
        .filter(|s| s.review_status == "approved")
        .map(|s| Alias {
            alias_name: s.original_name.clone(),
            canonical_name: s.canonical_name.clone(),
            master_person_id: s.suggested_master_person_id.clone(),
            match_type: "fuzzy".to_string(),
            confidence: s.similarity_score as f64 / 100.0,
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
