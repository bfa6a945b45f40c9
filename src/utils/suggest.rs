fn normalize_token(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];
    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_chars.len()]
}

fn distance(input: &str, candidate: &str) -> Option<usize> {
    let a = normalize_token(input);
    let b = normalize_token(candidate);
    if a.is_empty() || b.is_empty() {
        return None;
    }
    if a == b {
        return Some(0);
    }
    if a.contains(&b) || b.contains(&a) {
        return Some(1);
    }
    let allowed = (a.len() / 3).max(1);
    let score = levenshtein(&a, &b);
    (score <= allowed).then_some(score)
}

/// Closest candidates to `input`, best first.
pub fn suggest(input: &str, candidates: &[&str], limit: usize) -> Vec<String> {
    let mut scored: Vec<(&str, usize)> = candidates
        .iter()
        .filter_map(|candidate| distance(input, candidate).map(|score| (*candidate, score)))
        .collect();
    scored.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
    scored
        .into_iter()
        .take(limit.max(1))
        .map(|(candidate, _)| candidate.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::suggest;

    const TOOLS: &[&str] = &["ssh_exec", "rsync_copy", "list_credentials"];

    #[test]
    fn suggest_finds_near_misses() {
        assert_eq!(suggest("ssh_exce", TOOLS, 3), vec!["ssh_exec".to_string()]);
        assert_eq!(suggest("rsync", TOOLS, 3), vec!["rsync_copy".to_string()]);
    }

    #[test]
    fn suggest_ignores_unrelated_input() {
        assert!(suggest("deploy", TOOLS, 3).is_empty());
        assert!(suggest("", TOOLS, 3).is_empty());
    }
}
