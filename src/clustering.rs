// Identity Clusterer - deterministic master ids within blocks
// Greedy seed propagation: the first unassigned record in a block mints
// an id and hands it to every later in-block record it matches. This is
// not transitive closure; blocking misses are caught by the
// fragmentation audit instead.

use crate::db::DonorRecord;
use crate::matching::{create_blocking_key, extract_street_number, MatchEngine};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};

// ============================================================================
// MASTER ID
// ============================================================================

/// Content-addressed master id: SHA-256 over the pipe-joined canonical key
/// `last_name|first_name[:3]|zip[:5]|street_number`, truncated to 12 hex
/// characters, upper-cased, prefixed `MP_`. Identical canonical keys
/// always yield the identical id.
pub fn generate_master_id(
    last_name: &str,
    first_name: &str,
    zipcode: &str,
    street_number: &str,
) -> String {
    let key = format!(
        "{}|{}|{}|{}",
        last_name.to_uppercase().trim(),
        first_name
            .to_uppercase()
            .trim()
            .chars()
            .take(3)
            .collect::<String>(),
        zipcode.chars().take(5).collect::<String>(),
        street_number,
    );
    let digest = Sha256::digest(key.as_bytes());
    let hex = format!("{:x}", digest);
    format!("MP_{}", hex[..12].to_uppercase())
}

// ============================================================================
// CLUSTERER
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct ClusterStats {
    pub blocks: usize,
    pub clusters_minted: usize,
    pub records_absorbed: usize,
}

pub struct IdentityClusterer {
    pub engine: MatchEngine,
}

impl IdentityClusterer {
    pub fn new() -> Self {
        IdentityClusterer {
            engine: MatchEngine::new(),
        }
    }

    /// Assign `master_person_id` to every record.
    ///
    /// Iteration order within a block is input order and determines which
    /// record seeds each cluster; ids are content-addressed, so the id
    /// value itself does not depend on block processing order.
    pub fn assign_master_ids(&self, records: &mut [DonorRecord]) -> ClusterStats {
        let mut blocks: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, r) in records.iter().enumerate() {
            let first_initial: String = r
                .first_name
                .as_deref()
                .unwrap_or("")
                .chars()
                .take(1)
                .collect();
            let key = create_blocking_key(
                r.last_name.as_deref().unwrap_or(""),
                &r.zip_code,
                &first_initial,
            );
            blocks.entry(key).or_default().push(idx);
        }

        let mut stats = ClusterStats {
            blocks: blocks.len(),
            ..Default::default()
        };

        for block in blocks.values() {
            let mut assigned: HashSet<i64> = HashSet::new();
            for (pos, &i) in block.iter().enumerate() {
                if assigned.contains(&records[i].id) {
                    continue;
                }

                let street_num = extract_street_number(&records[i].street_address);
                let master_id = generate_master_id(
                    records[i].last_name.as_deref().unwrap_or(""),
                    records[i].first_name.as_deref().unwrap_or(""),
                    &records[i].zip_code,
                    &street_num,
                );
                records[i].master_person_id = Some(master_id.clone());
                assigned.insert(records[i].id);
                stats.clusters_minted += 1;

                // Propagate the seed's id to later unassigned matches
                for &j in &block[pos + 1..] {
                    if assigned.contains(&records[j].id) {
                        continue;
                    }
                    if self.engine.match_records(&records[i], &records[j]).is_match {
                        records[j].master_person_id = Some(master_id.clone());
                        assigned.insert(records[j].id);
                        stats.records_absorbed += 1;
                    }
                }
            }
        }

        stats
    }
}

impl Default for IdentityClusterer {
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
            first_name: Some(first.to_string()),
            last_name: Some(last.to_string()),
            street_address: street.to_string(),
            zip_code: zip.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_master_id_deterministic() {
        let a = generate_master_id("SMITH", "JOHN", "27601", "123");
        let b = generate_master_id("SMITH", "JOHN", "27601", "123");
        assert_eq!(a, b);
        assert!(a.starts_with("MP_"));
        assert_eq!(a.len(), 15);
    }

    #[test]
    fn test_master_id_component_normalization() {
        // Case, trim, and the first-name/zip truncations all fold in
        let a = generate_master_id("smith", " JOHNATHAN ", "276011234", "123");
        let b = generate_master_id("SMITH", "JOH", "27601", "123");
        assert_eq!(a, b);
    }

    #[test]
    fn test_master_id_distinct_keys_distinct_ids() {
        let a = generate_master_id("SMITH", "JOHN", "27601", "123");
        let b = generate_master_id("SMITH", "JANE", "27601", "456");
        assert_ne!(a, b);
    }

    #[test]
    fn test_same_person_variants_share_id() {
        let clusterer = IdentityClusterer::new();
        let mut records = vec![
            record(1, "JOHN", "SMITH", "123 Main St", "27601"),
            record(2, "JOHN", "SMITH", "123 Main Street", "27601"),
            record(3, "JANE", "SMITH", "456 Oak Ave", "27601"),
        ];
        clusterer.assign_master_ids(&mut records);

        assert_eq!(records[0].master_person_id, records[1].master_person_id);
        assert!(records[0].master_person_id.is_some());
        assert_ne!(records[0].master_person_id, records[2].master_person_id);
        assert!(records[2].master_person_id.is_some());
    }

    #[test]
    fn test_different_blocks_never_compared() {
        let clusterer = IdentityClusterer::new();
        // Same true person, last-name spelling differs -> different blocks
        let mut records = vec![
            record(1, "FRED", "HUEBNER", "77 Elm St", "27601"),
            record(2, "FRED", "HEUBNER", "77 Elm St", "27601"),
        ];
        let stats = clusterer.assign_master_ids(&mut records);

        assert_eq!(stats.blocks, 2);
        assert_ne!(records[0].master_person_id, records[1].master_person_id);
    }

    #[test]
    fn test_seed_order_determines_seed_not_id() {
        let clusterer = IdentityClusterer::new();
        let mut forward = vec![
            record(1, "JOHN", "SMITH", "123 Main St", "27601"),
            record(2, "JOHN", "SMITH", "123 Main Street", "27601"),
        ];
        let mut reversed = vec![
            record(2, "JOHN", "SMITH", "123 Main Street", "27601"),
            record(1, "JOHN", "SMITH", "123 Main St", "27601"),
        ];
        clusterer.assign_master_ids(&mut forward);
        clusterer.assign_master_ids(&mut reversed);

        // Both orders produce one cluster with the same content-addressed id
        assert_eq!(forward[0].master_person_id, reversed[0].master_person_id);
        assert_eq!(forward[0].master_person_id, forward[1].master_person_id);
    }

    #[test]
    fn test_stats_counts() {
        let clusterer = IdentityClusterer::new();
        let mut records = vec![
            record(1, "JOHN", "SMITH", "123 Main St", "27601"),
            record(2, "JOHN", "SMITH", "123 Main Street", "27601"),
            record(3, "JANE", "SMITH", "456 Oak Ave", "27601"),
        ];
        let stats = clusterer.assign_master_ids(&mut records);

        // JOHN pair shares a block (J initial); JANE is her own block
        assert_eq!(stats.clusters_minted, 2);
        assert_eq!(stats.records_absorbed, 1);
    }
}
