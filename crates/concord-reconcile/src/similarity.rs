//! Similarity scoring for human-facing suggestions.
//!
//! Used after the exact-match pass: a route with no documented counterpart
//! gets "did you mean" candidates ranked by a weighted path/method score.

/// Scoring constants. Empirically chosen for suggestion quality, so they are
/// configuration rather than invariants.
#[derive(Debug, Clone, Copy)]
pub struct SimilarityConfig {
    /// Weight of the path score in the composite.
    pub path_weight: f64,
    /// Weight of the method score in the composite.
    pub method_weight: f64,
    /// Candidates scoring below this are discarded.
    pub cutoff: f64,
    /// Score for two parameter segments that are not name variations.
    pub param_segment_score: f64,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            path_weight: 0.8,
            method_weight: 0.2,
            cutoff: 0.5,
            param_segment_score: 0.8,
        }
    }
}

/// Parameter names commonly used interchangeably, stored case/underscore
/// folded.
const SYNONYM_GROUPS: &[&[&str]] = &[
    &["id", "identifier", "key"],
    &["userid", "user"],
    &["uuid", "guid"],
    &["slug", "name"],
];

/// Composite similarity: weighted path + binary method.
pub fn composite(
    config: &SimilarityConfig,
    method_a: &str,
    path_a: &str,
    method_b: &str,
    path_b: &str,
) -> f64 {
    let method_score = if method_a.eq_ignore_ascii_case(method_b) {
        1.0
    } else {
        0.0
    };
    config.path_weight * path_similarity(config, path_a, path_b)
        + config.method_weight * method_score
}

/// Segment-wise path similarity; Levenshtein fallback when segment counts
/// differ.
pub fn path_similarity(config: &SimilarityConfig, a: &str, b: &str) -> f64 {
    let a = a.trim_end_matches('/');
    let b = b.trim_end_matches('/');
    if a == b {
        return 1.0;
    }

    let segs_a: Vec<&str> = a.split('/').filter(|s| !s.is_empty()).collect();
    let segs_b: Vec<&str> = b.split('/').filter(|s| !s.is_empty()).collect();

    if segs_a.len() != segs_b.len() {
        return normalized_levenshtein(a, b);
    }
    if segs_a.is_empty() {
        return 1.0;
    }

    let total: f64 = segs_a
        .iter()
        .zip(&segs_b)
        .map(|(sa, sb)| segment_score(config, sa, sb))
        .sum();
    total / segs_a.len() as f64
}

fn segment_score(config: &SimilarityConfig, a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    match (is_param_segment(a), is_param_segment(b)) {
        (true, true) => {
            if names_are_variations(param_name(a), param_name(b)) {
                1.0
            } else {
                config.param_segment_score
            }
        }
        _ => 0.0,
    }
}

fn is_param_segment(segment: &str) -> bool {
    segment.starts_with('{') && segment.ends_with('}')
}

fn param_name(segment: &str) -> &str {
    segment
        .trim_start_matches('{')
        .trim_end_matches('}')
        .trim_end_matches('?')
}

/// Exact match, synonym-group membership, or snake/camel equivalence.
fn names_are_variations(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    let fa = fold_name(a);
    let fb = fold_name(b);
    if fa == fb {
        return true;
    }
    SYNONYM_GROUPS
        .iter()
        .any(|group| group.contains(&fa.as_str()) && group.contains(&fb.as_str()))
}

/// Lowercase with separators removed, so `user_id` == `userId` == `UserID`.
fn fold_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-')
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Two-row Levenshtein distance.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            current[j + 1] = substitution.min(prev[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut prev, &mut current);
    }
    prev[b.len()]
}

/// `1 - distance / max_length`, in [0, 1].
pub fn normalized_levenshtein(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / max_len as f64
}
