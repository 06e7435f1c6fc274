//! Normalized edit-distance ratio.

/// Similarity of `a` and `b` on a 0-100 scale.
///
/// Computed as `2 * M / (len(a) + len(b))` where `M` is the length of the
/// longest common subsequence, i.e. the complement of the insert/delete edit
/// distance. Lengths count Unicode scalar values. Two empty strings score 0.
pub fn ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 0;
    }

    let common = lcs_len(&a, &b);
    // Round half up.
    ((200 * common + total / 2) / total) as u8
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
