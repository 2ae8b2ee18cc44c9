//! Token normalization and edit distance.

/// Folds a token into its phonetic-confusability normal form: lowercase,
/// non-alphanumerics stripped, and confusable letter classes collapsed to
/// one representative each (labial stops b→p, voiced fricatives v→f and
/// z→s, semivowel/vowel mergers w→u and y→i).
pub fn normalize_token(token: &str) -> String {
    token
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'b' => 'p',
            'v' => 'f',
            'z' => 's',
            'w' => 'u',
            'y' => 'i',
            other => other,
        })
        .collect()
}

/// Levenshtein distance over characters, two-row formulation.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let m = a.len();
    let n = b.len();

    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    let mut prev = (0..=n).collect::<Vec<_>>();
    let mut curr = vec![0; n + 1];

    for i in 1..=m {
        curr[0] = i;
        for j in 1..=n {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}
