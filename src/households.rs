// Household Linker - deterministic household ids from normalized addresses
// Two records at the same normalized address always get the same
// household_id, independent of record id or ordering.

use crate::addresses::{normalize_city, normalize_street, normalize_zip};
use crate::db::DonorRecord;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use uuid::Uuid;

// ============================================================================
// ADDRESS KEY + ID
// ============================================================================

/// Household grouping key: normalized `street|city|zip`. Requires street
/// and ZIP; records lacking either get no key (absent, not a sentinel).
pub fn household_address_key(street: &str, city: &str, zipcode: &str) -> Option<String> {
    let street = normalize_street(street);
    let city = normalize_city(city);
    let zip = normalize_zip(zipcode);

    if street.is_empty() || zip.is_empty() {
        return None;
    }
    Some(format!("{}|{}|{}", street, city, zip))
}

/// Content-addressed household id: a UUID built from the first 16 bytes
/// of the SHA-256 digest of the address key. Not random - the same
/// address always produces the same id.
pub fn generate_household_id(address_key: &str) -> String {
    let digest = Sha256::digest(address_key.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    Uuid::from_bytes(bytes).to_string()
}

// ============================================================================
// ASSIGNMENT
// ============================================================================

/// Assign `household_id` and `address_key` to every record with enough
/// address data. Returns the number of records that received an id.
pub fn assign_household_ids(records: &mut [DonorRecord]) -> usize {
    let mut assigned = 0;
    for r in records.iter_mut() {
        match household_address_key(&r.street_address, &r.city, &r.zip_code) {
            Some(key) => {
                r.household_id = Some(generate_household_id(&key));
                r.address_key = Some(key);
                assigned += 1;
            }
            None => {
                r.household_id = None;
                r.address_key = None;
            }
        }
    }
    assigned
}

// ============================================================================
// SUMMARY TABLE
// ============================================================================

/// Derived household summary, fully recomputable from donor records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Household {
    pub household_id: String,
    pub address_key: String,
    pub member_count: usize,

    /// Up to 5 distinct member names, comma-joined
    pub sample_members: String,
}

/// Build the households summary from records that already carry ids.
pub fn build_households(records: &[DonorRecord]) -> Vec<Household> {
    let mut groups: BTreeMap<&str, (&str, usize, Vec<&str>)> = BTreeMap::new();
    for r in records {
        let (Some(hid), Some(key)) = (&r.household_id, &r.address_key) else {
            continue;
        };
        let entry = groups.entry(hid).or_insert((key, 0, Vec::new()));
        entry.1 += 1;
        if !entry.2.contains(&r.donor_name.as_str()) && entry.2.len() < 5 {
            entry.2.push(&r.donor_name);
        }
    }

    groups
        .into_iter()
        .map(|(hid, (key, count, members))| Household {
            household_id: hid.to_string(),
            address_key: key.to_string(),
            member_count: count,
            sample_members: members.join(", "),
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
