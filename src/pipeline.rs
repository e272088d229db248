// Pipeline Steps - batch orchestration over the storage boundary
// Each step loads the full record set, runs one engine pass in memory,
// and writes the full result back. Single-threaded and synchronous by
// design; input order is stable (donors load ordered by id) so runs are
// reproducible.

use crate::addresses::{normalize_city, normalize_state, normalize_street, normalize_zip};
use crate::aliases::{apply_overrides, AliasTable};
use crate::clustering::IdentityClusterer;
use crate::committees::{enrich_donors, CommitteeCandidateMatch, CommitteeLinker};
use crate::db;
use crate::export::write_csv;
use crate::fragmentation::{FragmentSuggestion, FragmentationDetector};
use crate::households::{assign_household_ids, build_households};
use crate::names::parse_name;
use crate::review::{find_fuzzy_matches, FuzzyMatchSuggestion, DEFAULT_REVIEW_THRESHOLD};
use crate::spouses::{apply_spouse_links, infer_spouse_pairs};
use anyhow::Result;
use rusqlite::Connection;
use std::path::Path;

// ============================================================================
// INGEST
// ============================================================================

pub fn import_donors(conn: &mut Connection, csv_path: &Path) -> Result<usize> {
    let records = db::load_donor_csv(csv_path)?;
    db::save_donors(conn, &records)?;
    println!("✓ Imported {} donor records", records.len());
    Ok(records.len())
}

pub fn import_aliases(conn: &mut Connection, json_path: &Path) -> Result<usize> {
    let table = AliasTable::from_file(json_path)?;
    let aliases: Vec<_> = table.aliases().cloned().collect();
    db::save_aliases(conn, &aliases)?;
    println!("✓ Imported {} aliases", aliases.len());
    Ok(aliases.len())
}

pub fn import_committees(conn: &mut Connection, csv_path: &Path) -> Result<usize> {
    let committees = db::load_committee_csv(csv_path)?;
    db::save_committees(conn, &committees)?;
    println!("✓ Imported {} committees", committees.len());
    Ok(committees.len())
}

pub fn import_candidates(conn: &mut Connection, csv_path: &Path) -> Result<usize> {
    let candidates = db::load_candidate_csv(csv_path)?;
    db::save_candidates(conn, &candidates)?;
    println!("✓ Imported {} candidates", candidates.len());
    Ok(candidates.len())
}

// ============================================================================
// RESOLUTION STEPS
// ============================================================================

/// Parse raw donor names into structured fields.
pub fn run_parse(conn: &mut Connection) -> Result<usize> {
    let mut records = db::get_all_donors(conn)?;
    for r in records.iter_mut() {
        let parsed = parse_name(&r.donor_name);
        r.prefix = parsed.prefix;
        r.first_name = parsed.first_name;
        r.middle_name = parsed.middle_name;
        r.last_name = parsed.last_name;
        r.suffix = parsed.suffix;
        r.nickname = parsed.nickname;
    }
    db::save_donors(conn, &records)?;
    println!("✓ Parsed names for {} records", records.len());
    Ok(records.len())
}

/// Normalize address fields in place.
pub fn run_normalize(conn: &mut Connection) -> Result<usize> {
    let mut records = db::get_all_donors(conn)?;
    for r in records.iter_mut() {
        r.street_address = normalize_street(&r.street_address);
        r.city = normalize_city(&r.city);
        r.state = normalize_state(&r.state);
        r.zip_code = normalize_zip(&r.zip_code);
    }
    db::save_donors(conn, &records)?;
    println!("✓ Normalized addresses for {} records", records.len());
    Ok(records.len())
}

/// Assign household ids and rebuild the households summary table.
pub fn run_households(conn: &mut Connection) -> Result<usize> {
    let mut records = db::get_all_donors(conn)?;
    let assigned = assign_household_ids(&mut records);
    let households = build_households(&records);
    db::save_donors(conn, &records)?;
    db::save_households(conn, &households)?;
    println!(
        "✓ Assigned {} household ids across {} households",
        assigned,
        households.len()
    );
    Ok(households.len())
}

/// Infer spouse pairs and back-fill spouse columns.
pub fn run_spouses(conn: &mut Connection) -> Result<usize> {
    let mut records = db::get_all_donors(conn)?;
    let pairs = infer_spouse_pairs(&records);
    apply_spouse_links(&mut records, &pairs);
    db::save_spouse_pairs(conn, &pairs)?;
    db::save_donors(conn, &records)?;
    println!("✓ Inferred {} spouse pairs", pairs.len());
    Ok(pairs.len())
}

/// Cluster records within blocks and assign master ids.
pub fn run_master_ids(conn: &mut Connection) -> Result<usize> {
    let mut records = db::get_all_donors(conn)?;
    let clusterer = IdentityClusterer::new();
    let stats = clusterer.assign_master_ids(&mut records);
    db::save_donors(conn, &records)?;
    println!(
        "✓ Minted {} master identities across {} blocks ({} records absorbed into existing clusters)",
        stats.clusters_minted, stats.blocks, stats.records_absorbed
    );
    Ok(stats.clusters_minted)
}

/// Apply curated alias overrides on top of clustered ids.
pub fn run_aliases(conn: &mut Connection) -> Result<usize> {
    let mut records = db::get_all_donors(conn)?;
    let table = AliasTable::from_aliases(db::get_all_aliases(conn)?);
    let updated = apply_overrides(&mut records, &table);
    db::save_donors(conn, &records)?;
    println!("✓ Alias overrides applied: {} records updated", updated);
    Ok(updated)
}

// ============================================================================
// ADVISORY PASSES
// ============================================================================

/// Audit resolved records for split identities; export for review.
pub fn run_fragmentation(conn: &Connection, output: &Path) -> Result<usize> {
    let records = db::get_all_donors(conn)?;
    let detector = FragmentationDetector::new();
    let suggestions = detector.find_fragments(&records);
    write_csv(output, FragmentSuggestion::CSV_HEADER, &suggestions)?;
    println!(
        "✓ Found {} potential duplicate clusters, exported to {:?}",
        suggestions.len(),
        output
    );
    Ok(suggestions.len())
}

/// Link committees to candidates, back-fill `candidate_id` onto donors
/// through their filing committee, and export the matches for review.
pub fn run_committees(conn: &mut Connection, output: &Path) -> Result<usize> {
    let committees = db::get_all_committees(conn)?;
    let candidates = db::get_all_candidates(conn)?;
    let linker = CommitteeLinker::new();
    let matches = linker.link(&committees, &candidates);
    db::save_committee_matches(conn, &matches)?;

    let mut records = db::get_all_donors(conn)?;
    let enriched = enrich_donors(&mut records, &matches);
    db::save_donors(conn, &records)?;

    write_csv(output, CommitteeCandidateMatch::CSV_HEADER, &matches)?;
    println!(
        "✓ Matched {} of {} committees to candidates, enriched {} donor records",
        matches.len(),
        committees.len(),
        enriched
    );
    Ok(matches.len())
}

/// Suggest fuzzy alias matches for still-unresolved donors; export for
/// review. Approved rows are promoted externally via the alias import.
pub fn run_review(conn: &Connection, output: &Path) -> Result<usize> {
    let records = db::get_all_donors(conn)?;
    let aliases = db::get_all_aliases(conn)?;
    let suggestions = find_fuzzy_matches(&records, &aliases, DEFAULT_REVIEW_THRESHOLD);
    write_csv(output, FuzzyMatchSuggestion::CSV_HEADER, &suggestions)?;
    println!(
        "✓ Found {} fuzzy match suggestions, exported to {:?}",
        suggestions.len(),
        output
    );
    Ok(suggestions.len())
}

// ============================================================================
// FULL PIPELINE
// ============================================================================

/// Run every step in order. Advisory exports land in `export_dir`.
pub fn run_full(conn: &mut Connection, export_dir: &Path) -> Result<()> {
    run_parse(conn)?;
    run_normalize(conn)?;
    run_households(conn)?;
    run_spouses(conn)?;
    run_master_ids(conn)?;
    run_aliases(conn)?;
    run_fragmentation(conn, &export_dir.join("merge_candidates.csv"))?;
    run_committees(conn, &export_dir.join("committee_candidate_matches.csv"))?;
    run_review(conn, &export_dir.join("fuzzy_matches_review.csv"))?;
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
