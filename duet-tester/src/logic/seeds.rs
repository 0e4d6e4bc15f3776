use anyhow::{Result, bail};

/// Resolve seed tokens from the command line into concrete seed values.
///
/// Tokens must be integers. Negative values are folded onto the unsigned
/// range by absolute value. Duplicates are dropped while preserving
/// first-seen order, and an empty list falls back to the default
/// exploration seed.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    let mut seeds = Vec::new();

    for token in tokens {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Ok(value) = trimmed.parse::<u64>() {
            seeds.push(value);
            continue;
        }
        if let Ok(value) = trimmed.parse::<i64>() {
            seeds.push(value.unsigned_abs());
            continue;
        }
        bail!("Unrecognized seed token: {trimmed}");
    }

    let mut unique = Vec::with_capacity(seeds.len());
    for seed in seeds {
        if !unique.contains(&seed) {
            unique.push(seed);
        }
    }

    if unique.is_empty() {
        unique.push(1337);
    }

    Ok(unique)
}

/// Split a comma separated CLI argument into trimmed, non-empty tokens.
pub fn split_csv(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_exploration_seed() {
        let seeds = resolve_seed_inputs(&[]).unwrap();
        assert_eq!(seeds, vec![1337]);
    }

    #[test]
    fn parses_plain_numbers() {
        let tokens = vec!["42".to_string(), "7".to_string()];
        let seeds = resolve_seed_inputs(&tokens).unwrap();
        assert_eq!(seeds, vec![42, 7]);
    }

    #[test]
    fn folds_negative_numbers_onto_unsigned_range() {
        let tokens = vec!["-3".to_string()];
        let seeds = resolve_seed_inputs(&tokens).unwrap();
        assert_eq!(seeds, vec![3]);
    }

    #[test]
    fn deduplicates_preserving_order() {
        let tokens = vec!["9".to_string(), "4".to_string(), "9".to_string()];
        let seeds = resolve_seed_inputs(&tokens).unwrap();
        assert_eq!(seeds, vec![9, 4]);
    }

    #[test]
    fn rejects_unknown_tokens() {
        let tokens = vec!["not-a-seed".to_string()];
        let err = resolve_seed_inputs(&tokens).unwrap_err();
        assert!(err.to_string().contains("Unrecognized seed token"));
    }

    #[test]
    fn splits_and_trims_csv() {
        let tokens = split_csv(" 1, 2 ,,3 ");
        assert_eq!(tokens, vec!["1", "2", "3"]);
    }
}
