// Storage boundary - SQLite persistence for raw and resolved records
// The engine itself is pure and in-memory; everything durable crosses
// through this module.

use crate::aliases::Alias;
use crate::committees::{Candidate, Committee, CommitteeCandidateMatch};
use crate::households::Household;
use crate::spouses::SpousePair;
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ============================================================================
// DONOR RECORD
// ============================================================================

/// One raw contribution row plus everything the engine derives for it.
/// Identity-neutral attributes come from ingestion; `master_person_id`,
/// `household_id`, `address_key`, and the spouse columns are assigned by
/// the resolution passes. Records are never deleted by the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DonorRecord {
    pub id: i64,

    /// Raw name string as scraped from the filing
    #[serde(default)]
    pub donor_name: String,

    // Parsed name parts (absent until the parse step runs)
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub suffix: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,

    // Address fields (overwritten in place by the normalize step)
    #[serde(default, rename = "street_line_1")]
    pub street_address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip_code: String,

    /// Filing committee, joined to `committee_candidates` by the enrich pass
    #[serde(default)]
    pub committee_id: Option<String>,

    /// Candidate the filing committee resolved to (absent until the
    /// committee linking step runs)
    #[serde(default)]
    pub candidate_id: Option<String>,

    // Engine-assigned identity state
    #[serde(default)]
    pub master_person_id: Option<String>,
    #[serde(default)]
    pub household_id: Option<String>,
    #[serde(default)]
    pub address_key: Option<String>,
    #[serde(default)]
    pub spouse_id: Option<i64>,
    #[serde(default)]
    pub has_spouse: bool,
}

// ============================================================================
// SCHEMA
// ============================================================================

pub fn setup_database(conn: &Connection) -> Result<()> {
    // WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS donors (
            id INTEGER PRIMARY KEY,
            donor_name TEXT NOT NULL,
            prefix TEXT,
            first_name TEXT,
            middle_name TEXT,
            last_name TEXT,
            suffix TEXT,
            nickname TEXT,
            street_line_1 TEXT NOT NULL DEFAULT '',
            city TEXT NOT NULL DEFAULT '',
            state TEXT NOT NULL DEFAULT '',
            zip_code TEXT NOT NULL DEFAULT '',
            committee_id TEXT,
            candidate_id TEXT,
            master_person_id TEXT,
            household_id TEXT,
            address_key TEXT,
            spouse_id INTEGER,
            has_spouse INTEGER NOT NULL DEFAULT 0,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS person_aliases (
            alias_name TEXT PRIMARY KEY,
            canonical_name TEXT NOT NULL,
            master_person_id TEXT NOT NULL,
            match_type TEXT NOT NULL,
            confidence REAL NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS committees (
            committee_id TEXT PRIMARY KEY,
            committee_name TEXT NOT NULL,
            county_name TEXT NOT NULL DEFAULT ''
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS candidates (
            id TEXT PRIMARY KEY,
            name_on_ballot TEXT NOT NULL,
            county_name TEXT NOT NULL DEFAULT '',
            party TEXT NOT NULL DEFAULT '',
            contest_name TEXT NOT NULL DEFAULT ''
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS donor_spouses (
            donor_id INTEGER NOT NULL,
            spouse_id INTEGER NOT NULL,
            household_key TEXT NOT NULL,
            confidence REAL NOT NULL,
            source TEXT NOT NULL,
            created_at TEXT NOT NULL,
            PRIMARY KEY (donor_id, spouse_id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS committee_candidates (
            committee_id TEXT PRIMARY KEY,
            committee_name TEXT NOT NULL,
            candidate_id TEXT NOT NULL,
            candidate_name TEXT NOT NULL,
            party TEXT NOT NULL DEFAULT '',
            contest_name TEXT NOT NULL DEFAULT '',
            county_name TEXT NOT NULL,
            confidence REAL NOT NULL,
            match_type TEXT NOT NULL,
            matched_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS households (
            household_id TEXT PRIMARY KEY,
            address_key TEXT NOT NULL,
            member_count INTEGER NOT NULL,
            sample_members TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_donors_master ON donors(master_person_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_donors_household ON donors(household_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_donors_zip ON donors(zip_code)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// CSV INGEST
// ============================================================================

/// Load raw donor rows from CSV. Expected headers: id, donor_name,
/// street_line_1, city, state, zip_code, and optionally committee_id.
pub fn load_donor_csv(csv_path: &Path) -> Result<Vec<DonorRecord>> {
    let mut rdr = csv::Reader::from_path(csv_path)
        .with_context(|| format!("Failed to open donor CSV: {:?}", csv_path))?;

    let mut records = Vec::new();
    for result in rdr.deserialize() {
        let record: DonorRecord = result.context("Failed to deserialize donor row")?;
        records.push(record);
    }
    Ok(records)
}

pub fn load_committee_csv(csv_path: &Path) -> Result<Vec<Committee>> {
    let mut rdr = csv::Reader::from_path(csv_path)
        .with_context(|| format!("Failed to open committee CSV: {:?}", csv_path))?;

    let mut committees = Vec::new();
    for result in rdr.deserialize() {
        let committee: Committee = result.context("Failed to deserialize committee row")?;
        committees.push(committee);
    }
    Ok(committees)
}

pub fn load_candidate_csv(csv_path: &Path) -> Result<Vec<Candidate>> {
    let mut rdr = csv::Reader::from_path(csv_path)
        .with_context(|| format!("Failed to open candidate CSV: {:?}", csv_path))?;

    let mut candidates = Vec::new();
    for result in rdr.deserialize() {
        let candidate: Candidate = result.context("Failed to deserialize candidate row")?;
        candidates.push(candidate);
    }
    Ok(candidates)
}

// ============================================================================
// DONORS
// ============================================================================

/// Upsert donor rows (whole-row replace; step functions save the full
/// record set they loaded).
pub fn save_donors(conn: &mut Connection, records: &[DonorRecord]) -> Result<usize> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO donors (
                id, donor_name, prefix, first_name, middle_name, last_name,
                suffix, nickname, street_line_1, city, state, zip_code,
                committee_id, candidate_id, master_person_id, household_id,
                address_key, spouse_id, has_spouse
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
        )?;
        for r in records {
            stmt.execute(params![
                r.id,
                r.donor_name,
                r.prefix,
                r.first_name,
                r.middle_name,
                r.last_name,
                r.suffix,
                r.nickname,
                r.street_address,
                r.city,
                r.state,
                r.zip_code,
                r.committee_id,
                r.candidate_id,
                r.master_person_id,
                r.household_id,
                r.address_key,
                r.spouse_id,
                r.has_spouse,
            ])?;
        }
    }
    tx.commit()?;
    Ok(records.len())
}

pub fn get_all_donors(conn: &Connection) -> Result<Vec<DonorRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, donor_name, prefix, first_name, middle_name, last_name,
                suffix, nickname, street_line_1, city, state, zip_code,
                committee_id, candidate_id, master_person_id, household_id,
                address_key, spouse_id, has_spouse
         FROM donors
         ORDER BY id",
    )?;

    let records = stmt
        .query_map([], |row| {
            Ok(DonorRecord {
                id: row.get(0)?,
                donor_name: row.get(1)?,
                prefix: row.get(2)?,
                first_name: row.get(3)?,
                middle_name: row.get(4)?,
                last_name: row.get(5)?,
                suffix: row.get(6)?,
                nickname: row.get(7)?,
                street_address: row.get(8)?,
                city: row.get(9)?,
                state: row.get(10)?,
                zip_code: row.get(11)?,
                committee_id: row.get(12)?,
                candidate_id: row.get(13)?,
                master_person_id: row.get(14)?,
                household_id: row.get(15)?,
                address_key: row.get(16)?,
                spouse_id: row.get(17)?,
                has_spouse: row.get(18)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(records)
}

pub fn count_donors(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM donors", [], |row| row.get(0))?;
    Ok(count)
}

// ============================================================================
// ALIASES
// ============================================================================

pub fn save_aliases(conn: &mut Connection, aliases: &[Alias]) -> Result<usize> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO person_aliases (
                alias_name, canonical_name, master_person_id, match_type, confidence
            ) VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for a in aliases {
            stmt.execute(params![
                a.alias_name,
                a.canonical_name,
                a.master_person_id,
                a.match_type,
                a.confidence,
            ])?;
        }
    }
    tx.commit()?;
    Ok(aliases.len())
}

pub fn get_all_aliases(conn: &Connection) -> Result<Vec<Alias>> {
    let mut stmt = conn.prepare(
        "SELECT alias_name, canonical_name, master_person_id, match_type, confidence
         FROM person_aliases
         ORDER BY alias_name",
    )?;

    let aliases = stmt
        .query_map([], |row| {
            Ok(Alias {
                alias_name: row.get(0)?,
                canonical_name: row.get(1)?,
                master_person_id: row.get(2)?,
                match_type: row.get(3)?,
                confidence: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(aliases)
}

// ============================================================================
// COMMITTEES & CANDIDATES
// ============================================================================

pub fn save_committees(conn: &mut Connection, committees: &[Committee]) -> Result<usize> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO committees (committee_id, committee_name, county_name)
             VALUES (?1, ?2, ?3)",
        )?;
        for c in committees {
            stmt.execute(params![c.committee_id, c.committee_name, c.county_name])?;
        }
    }
    tx.commit()?;
    Ok(committees.len())
}

pub fn get_all_committees(conn: &Connection) -> Result<Vec<Committee>> {
    let mut stmt = conn.prepare(
        "SELECT committee_id, committee_name, county_name FROM committees ORDER BY committee_id",
    )?;

    let committees = stmt
        .query_map([], |row| {
            Ok(Committee {
                committee_id: row.get(0)?,
                committee_name: row.get(1)?,
                county_name: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(committees)
}

pub fn save_candidates(conn: &mut Connection, candidates: &[Candidate]) -> Result<usize> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO candidates (id, name_on_ballot, county_name, party, contest_name)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for c in candidates {
            stmt.execute(params![
                c.id,
                c.name_on_ballot,
                c.county_name,
                c.party,
                c.contest_name,
            ])?;
        }
    }
    tx.commit()?;
    Ok(candidates.len())
}

pub fn get_all_candidates(conn: &Connection) -> Result<Vec<Candidate>> {
    let mut stmt = conn.prepare(
        "SELECT id, name_on_ballot, county_name, party, contest_name
         FROM candidates
         ORDER BY id",
    )?;

    let candidates = stmt
        .query_map([], |row| {
            Ok(Candidate {
                id: row.get(0)?,
                name_on_ballot: row.get(1)?,
                county_name: row.get(2)?,
                party: row.get(3)?,
                contest_name: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(candidates)
}

// ============================================================================
// DERIVED RELATIONS (fully recomputable - replaced wholesale)
// ============================================================================

pub fn save_spouse_pairs(conn: &mut Connection, pairs: &[SpousePair]) -> Result<usize> {
    let now = Utc::now().to_rfc3339();
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM donor_spouses", [])?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO donor_spouses (
                donor_id, spouse_id, household_key, confidence, source, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for p in pairs {
            stmt.execute(params![
                p.donor_id,
                p.spouse_id,
                p.household_key,
                p.confidence,
                p.source,
                now,
            ])?;
        }
    }
    tx.commit()?;
    Ok(pairs.len())
}

pub fn save_committee_matches(
    conn: &mut Connection,
    matches: &[CommitteeCandidateMatch],
) -> Result<usize> {
    let now = Utc::now().to_rfc3339();
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO committee_candidates (
                committee_id, committee_name, candidate_id, candidate_name,
                party, contest_name, county_name, confidence, match_type, matched_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )?;
        for m in matches {
            stmt.execute(params![
                m.committee_id,
                m.committee_name,
                m.candidate_id,
                m.candidate_name,
                m.party,
                m.contest_name,
                m.county_name,
                m.confidence,
                m.match_type,
                now,
            ])?;
        }
    }
    tx.commit()?;
    Ok(matches.len())
}

pub fn save_households(conn: &mut Connection, households: &[Household]) -> Result<usize> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM households", [])?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO households (household_id, address_key, member_count, sample_members)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for h in households {
            stmt.execute(params![
                h.household_id,
                h.address_key,
                h.member_count as i64,
                h.sample_members,
            ])?;
        }
    }
    tx.commit()?;
    Ok(households.len())
}

// ============================================================================
// TESTS
// ============================================================================
