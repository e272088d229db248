// Donor Identity Resolution - Core Library
// Exposes all modules for use in the CLI and tests

pub mod addresses;
pub mod aliases;
pub mod clustering;
pub mod committees;
pub mod db;
pub mod export;
pub mod fragmentation;
pub mod households;
pub mod matching;
pub mod names;
pub mod pipeline;
pub mod review;
pub mod similarity;
pub mod spouses;

// Re-export commonly used types
pub use addresses::{
    create_address_key, normalize_city, normalize_full_address, normalize_state,
    normalize_street, normalize_zip, NormalizedAddress,
};
pub use aliases::{apply_overrides, Alias, AliasLookup, AliasTable};
pub use clustering::{generate_master_id, ClusterStats, IdentityClusterer};
pub use committees::{enrich_donors, Candidate, Committee, CommitteeCandidateMatch, CommitteeLinker};
pub use db::{setup_database, DonorRecord};
pub use export::write_csv;
pub use fragmentation::{FragmentSuggestion, FragmentationDetector};
pub use households::{
    assign_household_ids, build_households, generate_household_id, household_address_key,
    Household,
};
pub use matching::{create_blocking_key, extract_street_number, MatchDecision, MatchEngine};
pub use names::{parse_name, title_case, ParsedName};
pub use review::{find_fuzzy_matches, promote_approved, FuzzyMatchSuggestion};
pub use similarity::{jaro_winkler, token_set_ratio, token_sort_ratio};
pub use spouses::{apply_spouse_links, infer_spouse_pairs, SpousePair};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
