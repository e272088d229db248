// Spouse Inferencer - co-residence + shared surname
// Uses a looser household key than the household linker (house number,
// raw street name, ZIP); the two key definitions are intentionally kept
// distinct because unifying them would change which pairs are inferred.

use crate::db::DonorRecord;
use crate::matching::extract_street_number;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub const SPOUSE_CONFIDENCE: f64 = 0.95;
pub const SPOUSE_SOURCE: &str = "address_lastname_match";

// ============================================================================
// SPOUSE PAIR
// ============================================================================

/// One directed row per unordered pair (i<j by iteration order within
/// the household group, not by id value).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpousePair {
    pub donor_id: i64,
    pub spouse_id: i64,
    pub household_key: String,
    pub confidence: f64,
    pub source: String,
}

// ============================================================================
// INFERENCE
// ============================================================================

/// Loose co-residence key: `house-number_street-name_zip`, lower-cased.
pub fn spouse_household_key(record: &DonorRecord) -> String {
    let house_number = extract_street_number(&record.street_address);
    let street_name = record
        .street_address
        .trim()
        .trim_start_matches(|c: char| c.is_ascii_digit())
        .trim();
    format!("{}_{}_{}", house_number, street_name, record.zip_code).to_lowercase()
}

/// Emit a spouse-pair suggestion for every distinct pair of co-resident
/// records sharing an exact case-insensitive last name. No similarity
/// scoring: surname equality plus co-residence is the entire signal.
pub fn infer_spouse_pairs(records: &[DonorRecord]) -> Vec<SpousePair> {
    let mut households: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (idx, r) in records.iter().enumerate() {
        households.entry(spouse_household_key(r)).or_default().push(idx);
    }

    let mut pairs = Vec::new();
    for (key, members) in &households {
        if members.len() < 2 {
            continue;
        }
        for a in 0..members.len() {
            for b in (a + 1)..members.len() {
                let r1 = &records[members[a]];
                let r2 = &records[members[b]];
                let ln1 = r1.last_name.as_deref().unwrap_or("").to_uppercase();
                let ln2 = r2.last_name.as_deref().unwrap_or("").to_uppercase();
                if !ln1.is_empty() && ln1 == ln2 {
                    pairs.push(SpousePair {
                        donor_id: r1.id,
                        spouse_id: r2.id,
                        household_key: key.clone(),
                        confidence: SPOUSE_CONFIDENCE,
                        source: SPOUSE_SOURCE.to_string(),
                    });
                }
            }
        }
    }

    pairs
}

/// Back-fill `spouse_id` and `has_spouse` onto donor records, covering
/// both directions of each pair.
pub fn apply_spouse_links(records: &mut [DonorRecord], pairs: &[SpousePair]) {
    let mut lookup: HashMap<i64, i64> = HashMap::new();
    for p in pairs {
        lookup.insert(p.donor_id, p.spouse_id);
    }
    // Reverse direction last so it wins on collisions
    for p in pairs {
        lookup.insert(p.spouse_id, p.donor_id);
    }

    for r in records.iter_mut() {
        r.spouse_id = lookup.get(&r.id).copied();
        r.has_spouse = r.spouse_id.is_some();
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, last: &str, street: &str, zip: &str) -> DonorRecord {
        DonorRecord {
            id,
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
    fn test_spouse_household_key() {
        let r = record(1, "SMITH", "123 Main St", "27601");
        assert_eq!(spouse_household_key(&r), "123_main st_27601");
    }

    #[test]
    fn test_same_surname_same_address_paired() {
        let records = vec![
            record(1, "SMITH", "123 Main St", "27601"),
            record(2, "SMITH", "123 Main St", "27601"),
        ];
        let pairs = infer_spouse_pairs(&records);

        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].donor_id, 1);
        assert_eq!(pairs[0].spouse_id, 2);
        assert_eq!(pairs[0].confidence, SPOUSE_CONFIDENCE);
        assert_eq!(pairs[0].source, SPOUSE_SOURCE);
    }

    #[test]
    fn test_different_surname_not_paired() {
        let records = vec![
            record(1, "SMITH", "123 Main St", "27601"),
            record(2, "JONES", "123 Main St", "27601"),
        ];
        assert!(infer_spouse_pairs(&records).is_empty());
    }

    #[test]
    fn test_surname_comparison_case_insensitive() {
        let records = vec![
            record(1, "Smith", "123 Main St", "27601"),
            record(2, "SMITH", "123 Main St", "27601"),
        ];
        assert_eq!(infer_spouse_pairs(&records).len(), 1);
    }

    #[test]
    fn test_different_address_not_paired() {
        let records = vec![
            record(1, "SMITH", "123 Main St", "27601"),
            record(2, "SMITH", "125 Main St", "27601"),
        ];
        assert!(infer_spouse_pairs(&records).is_empty());
    }

    #[test]
    fn test_missing_surnames_not_paired() {
        let records = vec![
            record(1, "", "123 Main St", "27601"),
            record(2, "", "123 Main St", "27601"),
        ];
        assert!(infer_spouse_pairs(&records).is_empty());
    }

    #[test]
    fn test_three_members_emit_all_pairs() {
        // Adult child at the same address: one row per unordered pair
        let records = vec![
            record(1, "SMITH", "123 Main St", "27601"),
            record(2, "SMITH", "123 Main St", "27601"),
            record(3, "SMITH", "123 Main St", "27601"),
        ];
        assert_eq!(infer_spouse_pairs(&records).len(), 3);
    }

    #[test]
    fn test_spouse_backfill_both_directions() {
        let mut records = vec![
            record(1, "SMITH", "123 Main St", "27601"),
            record(2, "SMITH", "123 Main St", "27601"),
            record(3, "DOE", "456 Oak Ave", "27701"),
        ];
        let pairs = infer_spouse_pairs(&records);
        apply_spouse_links(&mut records, &pairs);

        assert_eq!(records[0].spouse_id, Some(2));
        assert!(records[0].has_spouse);
        assert_eq!(records[1].spouse_id, Some(1));
        assert!(records[1].has_spouse);
        assert_eq!(records[2].spouse_id, None);
        assert!(!records[2].has_spouse);
    }
}
