// Name Parser - raw donor name strings into structured 6-part records
// "DR. JAMES ARTHUR POPE JR" -> prefix/first/middle/last/suffix (+nickname)

use serde::{Deserialize, Serialize};

// ============================================================================
// VOCABULARIES (immutable process-wide tables)
// ============================================================================

/// Titles and honorifics recognized as name prefixes.
pub const PREFIXES: &[&str] = &[
    "MR", "MRS", "MS", "MISS", "DR", "REV", "HON", "JUDGE", "SEN", "REP",
    "GOV", "MAYOR", "PROF", "FR", "SR", "BROTHER", "SISTER", "PASTOR",
];

/// Generational suffixes and post-nominal credentials.
pub const SUFFIXES: &[&str] = &[
    "JR", "SR", "II", "III", "IV", "V", "VI", "VII", "VIII", "MD", "PHD",
    "ESQ", "CPA", "DDS", "RN", "JD", "DO", "MBA", "MPA", "PE", "RA", "AIA",
    "FAIA",
];

// ============================================================================
// PARSED NAME
// ============================================================================

/// Structured name parts. Missing information is absent, never a sentinel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedName {
    pub prefix: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub suffix: Option<String>,
    pub nickname: Option<String>,
}

// ============================================================================
// PARSING
// ============================================================================

/// Parse a raw name string into component parts.
///
/// Tolerates malformed punctuation, missing fields, and blank input; an
/// empty or prefix-only string yields an all-absent result rather than
/// an error.
pub fn parse_name(full_name: &str) -> ParsedName {
    let mut result = ParsedName::default();

    if full_name.trim().is_empty() {
        return result;
    }

    let mut name = full_name.to_uppercase().trim().to_string();

    // Extract a nickname enclosed in quotes or parentheses
    while let Some((start, end)) = find_nickname_span(&name) {
        let inner = name[start + 1..end].to_string();
        if result.nickname.is_none() && !inner.is_empty() {
            result.nickname = Some(title_case(&inner));
        }
        name.replace_range(start..=end, "");
    }

    // Strip periods, collapse whitespace
    let name = name.replace('.', "");
    let mut parts: Vec<&str> = name.split_whitespace().collect();

    if parts.is_empty() {
        return result;
    }

    if PREFIXES.contains(&parts[0]) {
        let prefix = title_case(parts.remove(0));
        result.prefix = Some(match prefix.as_str() {
            "Dr" => "Dr.".to_string(),
            "Mr" => "Mr.".to_string(),
            "Mrs" => "Mrs.".to_string(),
            "Ms" => "Ms.".to_string(),
            "Rev" => "Rev.".to_string(),
            _ => prefix,
        });
    }

    if parts.is_empty() {
        return result;
    }

    // Suffix keeps its case as written (already upper-cased above)
    if SUFFIXES.contains(parts.last().unwrap()) {
        result.suffix = parts.pop().map(|s| s.to_string());
    }

    if parts.is_empty() {
        return result;
    }

    match parts.len() {
        1 => {
            result.last_name = Some(title_case(parts[0]));
        }
        2 => {
            result.first_name = Some(title_case(parts[0]));
            result.last_name = Some(title_case(parts[1]));
        }
        _ => {
            result.first_name = Some(title_case(parts[0]));
            result.last_name = Some(title_case(parts[parts.len() - 1]));
            let middle: Vec<String> = parts[1..parts.len() - 1]
                .iter()
                .map(|p| title_case(p))
                .collect();
            result.middle_name = Some(middle.join(" "));
        }
    }

    result
}

/// Byte span of the first `"..."` or `(...)` group, inclusive of the
/// delimiters. Unclosed delimiters yield no span.
fn find_nickname_span(name: &str) -> Option<(usize, usize)> {
    let open = name.find(|c| c == '"' || c == '(')?;
    let close_rel = name[open + 1..].find(|c| c == '"' || c == ')')?;
    let close = open + 1 + close_rel;
    if close == open + 1 {
        // Empty group like "" or () - skip past it
        return None;
    }
    Some((open, close))
}

/// Title-case each alphabetic run: "SMITH-JONES" -> "Smith-Jones".
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

// ============================================================================
// TESTS
// ============================================================================
