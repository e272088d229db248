// Alias Overrides - curated truth beats statistical inference
// The alias table is maintained by a human-review workflow outside the
// engine and consumed read-only through the AliasLookup trait.

use crate::db::DonorRecord;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

// ============================================================================
// ALIAS RECORD
// ============================================================================

/// Curated mapping from an observed name string to a master identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alias {
    pub alias_name: String,
    pub canonical_name: String,
    pub master_person_id: String,

    /// How the alias was established ("manual", "fuzzy", ...)
    pub match_type: String,

    pub confidence: f64,
}

// ============================================================================
// LOOKUP
// ============================================================================

/// Read-only view of the curated alias store.
pub trait AliasLookup {
    /// Master id for a donor name, matched on case-normalized equality.
    fn lookup(&self, donor_name: &str) -> Option<&str>;
}

/// In-memory alias table keyed by upper-cased, trimmed alias name.
pub struct AliasTable {
    by_name: HashMap<String, Alias>,
}

impl AliasTable {
    pub fn new() -> Self {
        AliasTable {
            by_name: HashMap::new(),
        }
    }

    pub fn from_aliases(aliases: Vec<Alias>) -> Self {
        let mut by_name = HashMap::new();
        for alias in aliases {
            by_name.insert(normalize_alias_key(&alias.alias_name), alias);
        }
        AliasTable { by_name }
    }

    /// Load a curated alias table from a JSON array file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read alias file: {:?}", path.as_ref()))?;
        let aliases: Vec<Alias> =
            serde_json::from_str(&content).context("Failed to parse alias JSON")?;
        Ok(AliasTable::from_aliases(aliases))
    }

    pub fn aliases(&self) -> impl Iterator<Item = &Alias> {
        self.by_name.values()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl Default for AliasTable {
    fn default() -> Self {
        Self::new()
    }
}

impl AliasLookup for AliasTable {
    fn lookup(&self, donor_name: &str) -> Option<&str> {
        self.by_name
            .get(&normalize_alias_key(donor_name))
            .map(|a| a.master_person_id.as_str())
    }
}

fn normalize_alias_key(name: &str) -> String {
    name.to_uppercase().trim().to_string()
}

// ============================================================================
// OVERRIDE PASS
// ============================================================================

/// Overwrite `master_person_id` wherever a curated alias matches the raw
/// donor name. Runs after blocking-based clustering and strictly
/// overrides its output. Idempotent: records whose id already equals the
/// alias target are untouched, so a second pass performs zero writes.
/// Returns the number of records updated.
pub fn apply_overrides(records: &mut [DonorRecord], aliases: &dyn AliasLookup) -> usize {
    let mut updated = 0;
    for record in records.iter_mut() {
        if let Some(target) = aliases.lookup(&record.donor_name) {
            if record.master_person_id.as_deref() != Some(target) {
                record.master_person_id = Some(target.to_string());
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

    fn alias(name: &str, id: &str) -> Alias {
        Alias {
            alias_name: name.to_string(),
            canonical_name: name.to_string(),
            master_person_id: id.to_string(),
            match_type: "manual".to_string(),
            confidence: 1.0,
        }
    }

    fn donor(id: i64, name: &str, master: Option<&str>) -> DonorRecord {
        DonorRecord {
            id,
            donor_name: name.to_string(),
            master_person_id: master.map(|s| s.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_lookup_case_and_whitespace_insensitive() {
        let table = AliasTable::from_aliases(vec![alias("BOB JONES JR", "MP_AAA111BBB222")]);
        assert_eq!(table.lookup("bob jones jr"), Some("MP_AAA111BBB222"));
        assert_eq!(table.lookup("  Bob Jones Jr  "), Some("MP_AAA111BBB222"));
        assert_eq!(table.lookup("ROBERT JONES"), None);
    }

    #[test]
    fn test_override_beats_clustered_id() {
        let table = AliasTable::from_aliases(vec![alias("BOB JONES", "MP_CURATED00001")]);
        let mut records = vec![donor(1, "BOB JONES", Some("MP_CLUSTERED001"))];

        let updated = apply_overrides(&mut records, &table);
        assert_eq!(updated, 1);
        assert_eq!(records[0].master_person_id.as_deref(), Some("MP_CURATED00001"));
    }

    #[test]
    fn test_override_fills_unassigned() {
        let table = AliasTable::from_aliases(vec![alias("BOB JONES", "MP_CURATED00001")]);
        let mut records = vec![donor(1, "BOB JONES", None)];

        assert_eq!(apply_overrides(&mut records, &table), 1);
        assert_eq!(records[0].master_person_id.as_deref(), Some("MP_CURATED00001"));
    }

    #[test]
    fn test_override_idempotent() {
        let table = AliasTable::from_aliases(vec![alias("BOB JONES", "MP_CURATED00001")]);
        let mut records = vec![
            donor(1, "BOB JONES", Some("MP_CLUSTERED001")),
            donor(2, "UNRELATED NAME", Some("MP_CLUSTERED002")),
        ];

        assert_eq!(apply_overrides(&mut records, &table), 1);
        // Second pass: state already correct, zero writes
        assert_eq!(apply_overrides(&mut records, &table), 0);
        assert_eq!(records[1].master_person_id.as_deref(), Some("MP_CLUSTERED002"));
    }

    #[test]
    fn test_unmapped_names_untouched() {
        let table = AliasTable::new();
        let mut records = vec![donor(1, "ANYONE", Some("MP_X"))];
        assert_eq!(apply_overrides(&mut records, &table), 0);
        assert_eq!(records[0].master_person_id.as_deref(), Some("MP_X"));
    }
}
