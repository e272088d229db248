// Address Normalizer - street/city/state/ZIP into comparable tokens
// "123 Main Street" and "123 MAIN ST" must normalize identically.

use serde::{Deserialize, Serialize};

// ============================================================================
// ABBREVIATION TABLES (immutable process-wide tables)
// ============================================================================

/// Whole-word street-type, directional, and unit abbreviations.
pub const STREET_ABBREVS: &[(&str, &str)] = &[
    ("STREET", "ST"),
    ("AVENUE", "AVE"),
    ("BOULEVARD", "BLVD"),
    ("DRIVE", "DR"),
    ("LANE", "LN"),
    ("ROAD", "RD"),
    ("COURT", "CT"),
    ("CIRCLE", "CIR"),
    ("PLACE", "PL"),
    ("TERRACE", "TER"),
    ("TRAIL", "TRL"),
    ("HIGHWAY", "HWY"),
    ("PARKWAY", "PKWY"),
    ("WAY", "WAY"),
    ("NORTH", "N"),
    ("SOUTH", "S"),
    ("EAST", "E"),
    ("WEST", "W"),
    ("NORTHEAST", "NE"),
    ("NORTHWEST", "NW"),
    ("SOUTHEAST", "SE"),
    ("SOUTHWEST", "SW"),
    ("APARTMENT", "APT"),
    ("SUITE", "STE"),
    ("BUILDING", "BLDG"),
    ("FLOOR", "FL"),
    ("UNIT", "UNIT"),
];

/// Full state names to USPS abbreviations. Unknown names pass through.
pub const STATE_ABBREVS: &[(&str, &str)] = &[
    ("NORTH CAROLINA", "NC"),
    ("SOUTH CAROLINA", "SC"),
    ("VIRGINIA", "VA"),
    ("WEST VIRGINIA", "WV"),
    ("GEORGIA", "GA"),
    ("TENNESSEE", "TN"),
    ("FLORIDA", "FL"),
    ("ALABAMA", "AL"),
    ("KENTUCKY", "KY"),
    ("MARYLAND", "MD"),
    ("DISTRICT OF COLUMBIA", "DC"),
    ("NEW YORK", "NY"),
    ("NEW JERSEY", "NJ"),
    ("PENNSYLVANIA", "PA"),
    ("TEXAS", "TX"),
    ("CALIFORNIA", "CA"),
];

// ============================================================================
// NORMALIZERS
// ============================================================================

/// Normalize a street line: uppercase, strip `.`/`,`/`#`, collapse
/// whitespace, abbreviate whole words only ("STREETSIDE" is untouched).
pub fn normalize_street(address: &str) -> String {
    if address.is_empty() {
        return String::new();
    }

    let upper = address.to_uppercase();
    let stripped: String = upper
        .chars()
        .filter(|c| !matches!(c, '.' | ',' | '#'))
        .collect();

    let mut tokens: Vec<String> = stripped
        .split_whitespace()
        .map(|t| t.to_string())
        .collect();

    // "POST OFFICE BOX" is the one multi-word phrase in the table
    collapse_po_box(&mut tokens);

    for token in &mut tokens {
        if let Some((_, abbrev)) = STREET_ABBREVS.iter().find(|(full, _)| full == token) {
            *token = abbrev.to_string();
        }
    }

    tokens.join(" ")
}

fn collapse_po_box(tokens: &mut Vec<String>) {
    let mut i = 0;
    while i + 3 <= tokens.len() {
        if tokens[i] == "POST" && tokens[i + 1] == "OFFICE" && tokens[i + 2] == "BOX" {
            tokens.splice(i..i + 3, ["PO".to_string(), "BOX".to_string()]);
        }
        i += 1;
    }
}

/// Normalize a city name: uppercase, collapse whitespace, standard
/// SAINT/MOUNT/FORT contractions.
pub fn normalize_city(city: &str) -> String {
    if city.is_empty() {
        return String::new();
    }

    let collapsed = city
        .to_uppercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    collapsed
        .replace("SAINT ", "ST ")
        .replace("MOUNT ", "MT ")
        .replace("FORT ", "FT ")
}

/// Normalize a state to its two-letter abbreviation. Two-letter input
/// passes through; unknown full names pass through unchanged.
pub fn normalize_state(state: &str) -> String {
    if state.is_empty() {
        return String::new();
    }

    let upper = state.to_uppercase().trim().to_string();
    if upper.chars().count() == 2 {
        return upper;
    }

    STATE_ABBREVS
        .iter()
        .find(|(full, _)| *full == upper)
        .map(|(_, abbrev)| abbrev.to_string())
        .unwrap_or(upper)
}

/// Normalize a ZIP to 5 digits: strip non-digits, truncate to 5 or
/// left-pad with zeros. Empty input stays empty.
pub fn normalize_zip(zipcode: &str) -> String {
    let digits: String = zipcode.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() >= 5 {
        digits.chars().take(5).collect()
    } else if !digits.is_empty() {
        format!("{:0>5}", digits)
    } else {
        String::new()
    }
}

// ============================================================================
// COMPOSITE KEY
// ============================================================================

/// All four components normalized together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

pub fn normalize_full_address(
    street: &str,
    city: &str,
    state: &str,
    zipcode: &str,
) -> NormalizedAddress {
    NormalizedAddress {
        street: normalize_street(street),
        city: normalize_city(city),
        state: normalize_state(state),
        zip: normalize_zip(zipcode),
    }
}

/// Pipe-delimited composite key for exact-match address grouping.
pub fn create_address_key(street: &str, city: &str, state: &str, zipcode: &str) -> String {
    let norm = normalize_full_address(street, city, state, zipcode);
    format!("{}|{}|{}|{}", norm.street, norm.city, norm.state, norm.zip)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_street_abbreviations() {
        assert_eq!(normalize_street("123 Main Street"), "123 MAIN ST");
        assert_eq!(normalize_street("456 Oak Avenue, Apt 2B"), "456 OAK AVE APT 2B");
        assert_eq!(
            normalize_street("1000 West Trade Street Suite 100"),
            "1000 W TRADE ST STE 100"
        );
    }

    #[test]
    fn test_street_whole_word_only() {
        // Partial-word tokens must not degrade
        assert_eq!(normalize_street("5 STREETSIDE LANE"), "5 STREETSIDE LN");
        assert_eq!(normalize_street("9 NORTHWOOD DRIVE"), "9 NORTHWOOD DR");
    }

    #[test]
    fn test_street_punctuation_stripped() {
        assert_eq!(normalize_street("P.O. Box 1234"), "PO BOX 1234");
        assert_eq!(normalize_street("Post Office Box 99"), "PO BOX 99");
        assert_eq!(normalize_street("12 Elm St. #4"), "12 ELM ST 4");
    }

    #[test]
    fn test_street_empty() {
        assert_eq!(normalize_street(""), "");
    }

    #[test]
    fn test_city_contractions() {
        assert_eq!(normalize_city("Saint Paul"), "ST PAUL");
        assert_eq!(normalize_city("Mount Airy"), "MT AIRY");
        assert_eq!(normalize_city("Fort Mill"), "FT MILL");
        assert_eq!(normalize_city("  winston   salem "), "WINSTON SALEM");
    }

    #[test]
    fn test_state_normalization() {
        assert_eq!(normalize_state("North Carolina"), "NC");
        assert_eq!(normalize_state("nc"), "NC");
        assert_eq!(normalize_state("District of Columbia"), "DC");
        // Unknown full names pass through
        assert_eq!(normalize_state("PUERTO RICO"), "PUERTO RICO");
        assert_eq!(normalize_state(""), "");
    }

    #[test]
    fn test_zip_normalization() {
        assert_eq!(normalize_zip("27601-1234"), "27601");
        assert_eq!(normalize_zip("123"), "00123");
        assert_eq!(normalize_zip(""), "");
        assert_eq!(normalize_zip("abc"), "");
        assert_eq!(normalize_zip(" 28202 "), "28202");
    }

    #[test]
    fn test_address_key() {
        let key = create_address_key("123 Main Street", "Raleigh", "North Carolina", "27601");
        assert_eq!(key, "123 MAIN ST|RALEIGH|NC|27601");

        // Variants collapse to the same key
        let key2 = create_address_key("123 MAIN ST", "raleigh", "NC", "27601-9999");
        assert_eq!(key, key2);
    }
}
