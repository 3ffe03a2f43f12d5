//! Fuzzy label matching for option lists.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMatch {
    pub index: usize,
    pub score: i32,
    pub ranges: Vec<(usize, usize)>,
}

/// Ranks `labels` against `query`; labels that do not contain the query
/// characters in order are dropped. Ties keep the original order.
pub fn rank_labels<S: AsRef<str>>(query: &str, labels: &[S]) -> Vec<LabelMatch> {
    let query = query.trim();
    let mut out = Vec::new();
    for (index, label) in labels.iter().enumerate() {
        let label = label.as_ref();
        if query.is_empty() {
            out.push(LabelMatch {
                index,
                score: 0,
                ranges: Vec::new(),
            });
            continue;
        }
        let Some(indices) = matched_positions(query, label) else {
            continue;
        };
        out.push(LabelMatch {
            index,
            score: score(label, &indices),
            ranges: to_ranges(&indices),
        });
    }
    out.sort_by(|a, b| b.score.cmp(&a.score));
    out
}

fn matched_positions(query: &str, label: &str) -> Option<Vec<usize>> {
    let needle: Vec<char> = query.chars().flat_map(char::to_lowercase).collect();
    let hay: Vec<char> = label.chars().flat_map(char::to_lowercase).collect();

    if needle.len() <= hay.len() {
        let window = needle.len();
        if let Some(start) = (0..=hay.len() - window).find(|&s| hay[s..s + window] == needle[..]) {
            return Some((start..start + window).collect());
        }
    }

    let mut positions = Vec::with_capacity(needle.len());
    let mut next = 0;
    for (pos, ch) in hay.iter().enumerate() {
        if next == needle.len() {
            break;
        }
        if *ch == needle[next] {
            positions.push(pos);
            next += 1;
        }
    }
    (next == needle.len()).then_some(positions)
}

fn score(label: &str, positions: &[usize]) -> i32 {
    let chars: Vec<char> = label.chars().collect();
    let mut score = positions.len() as i32 * 10;

    if positions.first() == Some(&0) {
        score += 30;
    }
    let contiguous = positions.windows(2).all(|pair| pair[1] == pair[0] + 1);
    if contiguous {
        score += 40;
    }
    for pair in positions.windows(2) {
        let gap = pair[1].saturating_sub(pair[0] + 1) as i32;
        score -= gap * 2;
    }
    for &pos in positions {
        if pos > 0 && is_boundary(chars[pos - 1]) {
            score += 12;
        }
    }

    score - chars.len() as i32 / 2
}

fn to_ranges(positions: &[usize]) -> Vec<(usize, usize)> {
    let mut ranges: Vec<(usize, usize)> = Vec::new();
    for &pos in positions {
        match ranges.last_mut() {
            Some((_, end)) if *end == pos => *end = pos + 1,
            _ => ranges.push((pos, pos + 1)),
        }
    }
    ranges
}

fn is_boundary(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, '/' | '\\' | '_' | '-' | '.' | ':')
}

#[cfg(test)]
mod tests {
    use super::rank_labels;

    #[test]
    fn empty_query_keeps_everything_in_order() {
        let ranked = rank_labels("", &["b", "a"]);
        assert_eq!(ranked.iter().map(|m| m.index).collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn prefix_match_outranks_scattered_match() {
        let ranked = rank_labels("spr", &["misc/superpower", "sprites/hero"]);
        assert_eq!(ranked.first().map(|m| m.index), Some(1));
        assert_eq!(ranked.first().map(|m| m.ranges.clone()), Some(vec![(0, 3)]));
    }

    #[test]
    fn non_matching_labels_are_dropped() {
        let ranked = rank_labels("zz", &["alpha", "beta"]);
        assert!(ranked.is_empty());
    }
}
