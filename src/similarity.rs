// String Similarity - Jaro-Winkler + token ratios
// All downstream match thresholds are tuned to these exact formulas,
// so the implementations live here rather than behind a library.

// ============================================================================
// JARO-WINKLER
// ============================================================================

/// Jaro-Winkler similarity between two name strings, in [0.0, 1.0].
///
/// Inputs are upper-cased and trimmed before comparison. Either-empty
/// returns 0.0, exact equality short-circuits to 1.0. The Winkler boost
/// adds `0.1 * shared_prefix(<=4) * (1 - jaro)`.
pub fn jaro_winkler(name1: &str, name2: &str) -> f64 {
    if name1.is_empty() || name2.is_empty() {
        return 0.0;
    }

    let s1: Vec<char> = name1.to_uppercase().trim().chars().collect();
    let s2: Vec<char> = name2.to_uppercase().trim().chars().collect();

    if s1 == s2 {
        return 1.0;
    }

    let len1 = s1.len();
    let len2 = s2.len();
    if len1 == 0 || len2 == 0 {
        return 0.0;
    }

    // Characters may match within a sliding window of this radius
    let match_distance = (len1.max(len2) / 2).saturating_sub(1);

    let mut s1_matches = vec![false; len1];
    let mut s2_matches = vec![false; len2];
    let mut matches = 0usize;

    for i in 0..len1 {
        let lo = i.saturating_sub(match_distance);
        let hi = (i + match_distance + 1).min(len2);
        for j in lo..hi {
            if s2_matches[j] || s1[i] != s2[j] {
                continue;
            }
            s1_matches[i] = true;
            s2_matches[j] = true;
            matches += 1;
            break;
        }
    }

    if matches == 0 {
        return 0.0;
    }

    // Count transpositions among matched characters
    let mut transpositions = 0usize;
    let mut k = 0usize;
    for i in 0..len1 {
        if !s1_matches[i] {
            continue;
        }
        while !s2_matches[k] {
            k += 1;
        }
        if s1[i] != s2[k] {
            transpositions += 1;
        }
        k += 1;
    }

    let m = matches as f64;
    let jaro = (m / len1 as f64
        + m / len2 as f64
        + (m - transpositions as f64 / 2.0) / m)
        / 3.0;

    let prefix_len = s1
        .iter()
        .zip(s2.iter())
        .take(4)
        .filter(|(a, b)| a == b)
        .count();

    jaro + prefix_len as f64 * 0.1 * (1.0 - jaro)
}

// ============================================================================
// TOKEN RATIOS (0-100)
// ============================================================================

/// Lowercase, replace non-alphanumerics with spaces, trim.
fn full_process(s: &str) -> String {
    let cleaned: String = s
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    cleaned.trim().to_string()
}

/// Base pairwise ratio: indel similarity `2*LCS / (len1 + len2)` scaled
/// to 0-100 and rounded. Either-empty returns 0.
fn ratio(s1: &str, s2: &str) -> u32 {
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    // Two-row LCS table
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for i in 0..a.len() {
        for j in 0..b.len() {
            curr[j + 1] = if a[i] == b[j] {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    let lcs = prev[b.len()];

    let score = 200.0 * lcs as f64 / (a.len() + b.len()) as f64;
    score.round() as u32
}

/// Token-sort ratio: order-insensitive similarity in 0-100. Tokens are
/// sorted and rejoined before the pairwise ratio.
pub fn token_sort_ratio(s1: &str, s2: &str) -> u32 {
    let sorted_join = |s: &str| {
        let processed = full_process(s);
        let mut tokens: Vec<&str> = processed.split_whitespace().collect();
        tokens.sort_unstable();
        tokens.join(" ")
    };
    ratio(&sorted_join(s1), &sorted_join(s2))
}

/// Token-set ratio: order- and duplicate-insensitive similarity in 0-100.
///
/// Compares the sorted token intersection against each side's
/// intersection-plus-remainder and takes the best pairwise ratio, so a
/// name that is a token subset of another scores 100.
pub fn token_set_ratio(s1: &str, s2: &str) -> u32 {
    use std::collections::BTreeSet;

    let p1 = full_process(s1);
    let p2 = full_process(s2);
    let set1: BTreeSet<&str> = p1.split_whitespace().collect();
    let set2: BTreeSet<&str> = p2.split_whitespace().collect();

    let intersection: Vec<&str> = set1.intersection(&set2).copied().collect();
    let diff1: Vec<&str> = set1.difference(&set2).copied().collect();
    let diff2: Vec<&str> = set2.difference(&set1).copied().collect();

    let sorted_sect = intersection.join(" ");
    let combined_1 = format!("{} {}", sorted_sect, diff1.join(" ")).trim().to_string();
    let combined_2 = format!("{} {}", sorted_sect, diff2.join(" ")).trim().to_string();

    ratio(&sorted_sect, &combined_1)
        .max(ratio(&sorted_sect, &combined_2))
        .max(ratio(&combined_1, &combined_2))
}

// ============================================================================
// TESTS
// ============================================================================
