use std::cmp::Ordering;

/// How a candidate identifier relates to what was typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchReason {
    Prefix,
    /// Within a small edit distance (typos such as `widht`).
    Similar(usize),
}

/// Ranks `candidates` against `partial`: case-insensitive prefix matches
/// first, then near misses by edit distance. Ties sort alphabetically.
pub fn rank<'c, I>(partial: &str, candidates: I, limit: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'c str>,
{
    let needle = partial.to_lowercase();
    let max_distance = (needle.chars().count() / 3).max(2);

    let mut ranked: Vec<(MatchReason, &str)> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let lower = candidate.to_lowercase();
            if lower.starts_with(&needle) {
                return Some((MatchReason::Prefix, candidate));
            }
            let distance = levenshtein(&needle, &lower);
            (distance <= max_distance).then_some((MatchReason::Similar(distance), candidate))
        })
        .collect();

    ranked.sort_by(|(ra, a), (rb, b)| match ra.cmp(rb) {
        Ordering::Equal => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
        other => other,
    });
    ranked.dedup_by(|(_, a), (_, b)| a == b);
    ranked
        .into_iter()
        .take(limit)
        .map(|(_, candidate)| candidate.to_string())
        .collect()
}

/// Classic Levenshtein distance over characters.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();
    let mut current = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != *cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b_chars.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_basics() {
        assert_eq!(levenshtein("widht", "width"), 2);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("same", "same"), 0);
    }

    #[test]
    fn prefix_matches_rank_before_typos() {
        let candidates = ["width", "wall_area", "height", "wastage"];
        let ranked = rank("wa", candidates, 10);
        assert_eq!(ranked, vec!["wastage", "wall_area"]);

        let ranked = rank("widht", candidates, 10);
        assert_eq!(ranked, vec!["width"]);
    }

    #[test]
    fn respects_limit() {
        let names: Vec<String> = (0..50).map(|i| format!("field_{}", i)).collect();
        let ranked = rank("field", names.iter().map(String::as_str), 30);
        assert_eq!(ranked.len(), 30);
    }
}
