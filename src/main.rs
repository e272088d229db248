use anyhow::{bail, Result};
use rusqlite::Connection;
use std::env;
use std::path::{Path, PathBuf};

use donor_resolution::db::setup_database;
use donor_resolution::pipeline;

const DEFAULT_DB_PATH: &str = "donors.db";
const DEFAULT_EXPORT_DIR: &str = "exports";

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return Ok(());
    }

    let db_path = env::var("DONOR_DB").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());
    let mut conn = Connection::open(Path::new(&db_path))?;
    setup_database(&conn)?;

    let export_dir = PathBuf::from(DEFAULT_EXPORT_DIR);

    match args[1].as_str() {
        "import-donors" => {
            let csv_path = require_arg(&args, 2, "path to donors CSV")?;
            pipeline::import_donors(&mut conn, Path::new(&csv_path))?;
        }
        "import-aliases" => {
            let json_path = require_arg(&args, 2, "path to aliases JSON")?;
            pipeline::import_aliases(&mut conn, Path::new(&json_path))?;
        }
        "import-committees" => {
            let csv_path = require_arg(&args, 2, "path to committees CSV")?;
            pipeline::import_committees(&mut conn, Path::new(&csv_path))?;
        }
        "import-candidates" => {
            let csv_path = require_arg(&args, 2, "path to candidates CSV")?;
            pipeline::import_candidates(&mut conn, Path::new(&csv_path))?;
        }
        "parse" => {
            pipeline::run_parse(&mut conn)?;
        }
        "normalize" => {
            pipeline::run_normalize(&mut conn)?;
        }
        "households" => {
            pipeline::run_households(&mut conn)?;
        }
        "spouses" => {
            pipeline::run_spouses(&mut conn)?;
        }
        "master-ids" => {
            pipeline::run_master_ids(&mut conn)?;
        }
        "aliases" => {
            pipeline::run_aliases(&mut conn)?;
        }
        "fragmentation" => {
            pipeline::run_fragmentation(&conn, &export_dir.join("merge_candidates.csv"))?;
        }
        "committees" => {
            pipeline::run_committees(&mut conn, &export_dir.join("committee_candidate_matches.csv"))?;
        }
        "review" => {
            pipeline::run_review(&conn, &export_dir.join("fuzzy_matches_review.csv"))?;
        }
        "full" => {
            println!("🗄️  Donor Identity Resolution v{}", donor_resolution::VERSION);
            println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
            pipeline::run_full(&mut conn, &export_dir)?;
            println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
            println!("🎉 Pipeline complete, exports in {:?}", export_dir);
        }
        other => {
            print_usage();
            bail!("Unknown command: {}", other);
        }
    }

    Ok(())
}

fn require_arg(args: &[String], index: usize, what: &str) -> Result<String> {
    match args.get(index) {
        Some(value) => Ok(value.clone()),
        None => bail!("Missing argument: {}", what),
    }
}

fn print_usage() {
    println!("Donor Identity Resolution v{}", donor_resolution::VERSION);
    println!();
    println!("Usage: donor-resolution <command> [args]");
    println!();
    println!("Imports:");
    println!("  import-donors <csv>       Load donor records");
    println!("  import-aliases <json>     Load curated alias table");
    println!("  import-committees <csv>   Load committees");
    println!("  import-candidates <csv>   Load candidates");
    println!();
    println!("Steps:");
    println!("  parse                     Parse donor names into structured fields");
    println!("  normalize                 Normalize address fields");
    println!("  households                Assign household ids");
    println!("  spouses                   Infer spouse pairs");
    println!("  master-ids                Cluster records and mint master ids");
    println!("  aliases                   Apply curated alias overrides");
    println!("  fragmentation             Export split-identity merge candidates");
    println!("  committees                Link committees to candidates");
    println!("  review                    Export fuzzy alias suggestions");
    println!();
    println!("  full                      Run every step in order");
    println!();
    println!("Database path comes from DONOR_DB (default: {})", DEFAULT_DB_PATH);
}
