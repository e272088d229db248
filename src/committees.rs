// Committee-Candidate Linker - county constraint + fuzzy name matching
// An independent matching pass: committees never mix into the donor
// identity graph, only the similarity scorer is shared.

use crate::db::DonorRecord;
use crate::similarity::token_sort_ratio;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const COMMITTEE_MATCH_TYPE: &str = "county+fuzzy_name";

// ============================================================================
// INPUT RECORDS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Committee {
    pub committee_id: String,
    pub committee_name: String,
    pub county_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub name_on_ballot: String,
    pub county_name: String,
    #[serde(default)]
    pub party: String,
    #[serde(default)]
    pub contest_name: String,
}

// ============================================================================
// MATCH ROW
// ============================================================================

/// At most one row per committee: the best-scoring candidate in the same
/// county, if any clears the threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitteeCandidateMatch {
    pub committee_id: String,
    pub committee_name: String,
    pub candidate_id: String,
    pub candidate_name: String,
    pub party: String,
    pub contest_name: String,

    /// Lower-cased, trimmed county the match was constrained to
    pub county_name: String,

    pub confidence: f64,
    pub match_type: String,
}

impl CommitteeCandidateMatch {
    /// Column order of the match export, matching the field order above.
    pub const CSV_HEADER: &'static [&'static str] = &[
        "committee_id",
        "committee_name",
        "candidate_id",
        "candidate_name",
        "party",
        "contest_name",
        "county_name",
        "confidence",
        "match_type",
    ];
}

// ============================================================================
// LINKER
// ============================================================================

pub struct CommitteeLinker {
    /// Minimum token-sort similarity in [0.0, 1.0] (default 0.85)
    pub score_threshold: f64,
}

impl CommitteeLinker {
    pub fn new() -> Self {
        CommitteeLinker {
            score_threshold: 0.85,
        }
    }

    pub fn with_threshold(score_threshold: f64) -> Self {
        CommitteeLinker { score_threshold }
    }

    /// Token-order-insensitive similarity between a committee name and a
    /// candidate name, in [0.0, 1.0].
    pub fn name_score(&self, committee_name: &str, candidate_name: &str) -> f64 {
        if committee_name.is_empty() || candidate_name.is_empty() {
            return 0.0;
        }
        let score = token_sort_ratio(
            committee_name.to_lowercase().trim(),
            candidate_name.to_lowercase().trim(),
        );
        score as f64 / 100.0
    }

    /// Link each committee to its best same-county candidate. Ties keep
    /// the first-encountered candidate (strict `>` on the running best).
    /// Committees with no county or name yield no match.
    pub fn link(
        &self,
        committees: &[Committee],
        candidates: &[Candidate],
    ) -> Vec<CommitteeCandidateMatch> {
        let mut matches = Vec::new();

        for committee in committees {
            let county = committee.county_name.to_lowercase().trim().to_string();
            if county.is_empty() || committee.committee_name.is_empty() {
                continue;
            }

            let mut best: Option<&Candidate> = None;
            let mut best_score = 0.0_f64;

            for candidate in candidates {
                if candidate.county_name.to_lowercase().trim() != county {
                    continue;
                }
                let score = self.name_score(&committee.committee_name, &candidate.name_on_ballot);
                if score > best_score && score >= self.score_threshold {
                    best_score = score;
                    best = Some(candidate);
                }
            }

            if let Some(candidate) = best {
                matches.push(CommitteeCandidateMatch {
                    committee_id: committee.committee_id.clone(),
                    committee_name: committee.committee_name.clone(),
                    candidate_id: candidate.id.clone(),
                    candidate_name: candidate.name_on_ballot.clone(),
                    party: candidate.party.clone(),
                    contest_name: candidate.contest_name.clone(),
                    county_name: county.clone(),
                    confidence: best_score,
                    match_type: COMMITTEE_MATCH_TYPE.to_string(),
                });
            }
        }

        matches
    }
}

impl Default for CommitteeLinker {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// DONOR ENRICHMENT
// ============================================================================

/// Back-fill `candidate_id` onto donor records through their filing
/// committee. Idempotent: records whose candidate_id already equals the
/// match target are untouched. Returns the number of records updated.
pub fn enrich_donors(records: &mut [DonorRecord], matches: &[CommitteeCandidateMatch]) -> usize {
    let by_committee: HashMap<&str, &str> = matches
        .iter()
        .map(|m| (m.committee_id.as_str(), m.candidate_id.as_str()))
        .collect();

    let mut updated = 0;
    for record in records.iter_mut() {
        let Some(committee_id) = record.committee_id.as_deref() else {
            continue;
        };
        if let Some(&candidate_id) = by_committee.get(committee_id) {
            if record.candidate_id.as_deref() != Some(candidate_id) {
                record.candidate_id = Some(candidate_id.to_string());
                updated += 1;
            }
        }
    }
    updated
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn committee(id: &str, name: &str, county: &str) -> Committee {
        Committee {
            committee_id: id.to_string(),
            committee_name: name.to_string(),
            county_name: county.to_string(),
        }
    }

    fn candidate(id: &str, name: &str, county: &str) -> Candidate {
        Candidate {
            id: id.to_string(),
            name_on_ballot: name.to_string(),
            county_name: county.to_string(),
            party: "UNA".to_string(),
            contest_name: "COUNTY COMMISSIONER".to_string(),
        }
    }

    #[test]
    fn test_links_best_same_county_candidate() {
        let linker = CommitteeLinker::new();
        let committees = vec![committee("C1", "DOE, JANE", "Wake")];
        let candidates = vec![
            candidate("K1", "JANE DOE", "WAKE"),
            candidate("K2", "JOHN ROE", "WAKE"),
        ];

        let matches = linker.link(&committees, &candidates);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].candidate_id, "K1");
        assert_eq!(matches[0].match_type, COMMITTEE_MATCH_TYPE);
        assert_eq!(matches[0].county_name, "wake");
        assert!(matches[0].confidence >= 0.85);
    }

    #[test]
    fn test_county_constraint_is_hard() {
        let linker = CommitteeLinker::new();
        let committees = vec![committee("C1", "JANE DOE", "Wake")];
        // Perfect name score, wrong county
        let candidates = vec![candidate("K1", "JANE DOE", "Durham")];

        assert!(linker.link(&committees, &candidates).is_empty());
    }

    #[test]
    fn test_token_order_insensitive_name_score() {
        let linker = CommitteeLinker::new();
        assert_eq!(linker.name_score("DOE JANE", "JANE DOE"), 1.0);
        assert_eq!(linker.name_score("", "JANE DOE"), 0.0);
    }

    #[test]
    fn test_below_threshold_yields_no_match() {
        let linker = CommitteeLinker::new();
        let committees = vec![committee("C1", "FRIENDS OF GOOD GOVERNMENT", "Wake")];
        let candidates = vec![candidate("K1", "JANE DOE", "WAKE")];

        assert!(linker.link(&committees, &candidates).is_empty());
    }

    #[test]
    fn test_tie_keeps_first_encountered() {
        let linker = CommitteeLinker::new();
        let committees = vec![committee("C1", "JANE DOE", "Wake")];
        // Two identically-named candidates: strict > keeps the first
        let candidates = vec![
            candidate("K1", "JANE DOE", "WAKE"),
            candidate("K2", "JANE DOE", "WAKE"),
        ];

        let matches = linker.link(&committees, &candidates);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].candidate_id, "K1");
    }

    #[test]
    fn test_committee_missing_fields_skipped() {
        let linker = CommitteeLinker::new();
        let committees = vec![
            committee("C1", "JANE DOE", ""),
            committee("C2", "", "Wake"),
        ];
        let candidates = vec![candidate("K1", "JANE DOE", "WAKE")];

        assert!(linker.link(&committees, &candidates).is_empty());
    }

    fn donor(id: i64, committee_id: Option<&str>) -> DonorRecord {
        DonorRecord {
            id,
            donor_name: "JOHN A SMITH".to_string(),
            committee_id: committee_id.map(|s| s.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_enrich_donors_backfills_candidate_id() {
        let linker = CommitteeLinker::new();
        let committees = vec![committee("C1", "JANE DOE", "Wake")];
        let candidates = vec![candidate("K1", "JANE DOE", "WAKE")];
        let matches = linker.link(&committees, &candidates);

        let mut records = vec![
            donor(1, Some("C1")),
            donor(2, Some("C99")),
            donor(3, None),
        ];
        let updated = enrich_donors(&mut records, &matches);

        assert_eq!(updated, 1);
        assert_eq!(records[0].candidate_id.as_deref(), Some("K1"));
        // Unmatched committee and missing committee stay absent
        assert_eq!(records[1].candidate_id, None);
        assert_eq!(records[2].candidate_id, None);
    }

    #[test]
    fn test_enrich_donors_idempotent() {
        let matches = vec![CommitteeCandidateMatch {
            committee_id: "C1".to_string(),
            committee_name: "JANE DOE".to_string(),
            candidate_id: "K1".to_string(),
            candidate_name: "JANE DOE".to_string(),
            party: "UNA".to_string(),
            contest_name: "MAYOR".to_string(),
            county_name: "wake".to_string(),
            confidence: 1.0,
            match_type: COMMITTEE_MATCH_TYPE.to_string(),
        }];
        let mut records = vec![donor(1, Some("C1"))];

        assert_eq!(enrich_donors(&mut records, &matches), 1);
        // Second pass: state already correct, zero writes
        assert_eq!(enrich_donors(&mut records, &matches), 0);
        assert_eq!(records[0].candidate_id.as_deref(), Some("K1"));
    }

    #[test]
    fn test_at_most_one_row_per_committee() {
        let linker = CommitteeLinker::new();
        let committees = vec![committee("C1", "JANE DOE", "Wake")];
        // Both clear the threshold; only the best-score row is kept
        let candidates = vec![
            candidate("K1", "JANE A DOE", "WAKE"),
            candidate("K2", "JANE DOE", "WAKE"),
        ];

        let matches = linker.link(&committees, &candidates);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].candidate_id, "K2");
        assert_eq!(matches[0].confidence, 1.0);
    }
}
