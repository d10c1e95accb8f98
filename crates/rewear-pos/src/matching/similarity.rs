use std::cmp::min;

/// Lowercases and trims a name so comparisons ignore casing and stray padding.
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Classic edit distance with unit cost for insertion, deletion, and substitution.
///
/// Operates on Unicode scalar values, so `"Müller"` and `"Muller"` are one
/// substitution apart rather than two byte edits.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            let deletion = previous[j + 1] + 1;
            let insertion = current[j] + 1;
            current[j + 1] = min(substitution, min(deletion, insertion));
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

/// Normalized edit-distance similarity in `[0.0, 1.0]`.
///
/// Empty input on either side scores `0.0`, including two empty strings: a
/// missing name is never evidence that two records belong to the same person.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = normalize(a);
    let b = normalize(b);

    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }

    let longest = a.chars().count().max(b.chars().count());
    let distance = levenshtein(&a, &b);
    (1.0 - distance as f64 / longest as f64).clamp(0.0, 1.0)
}
