use anyhow::{Context, Result, bail};
use clap::ValueEnum;

use crate::simulation::BotStrategy;

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Parse seed tokens. Negative integers are folded to their magnitude;
/// duplicates are dropped while keeping first-seen order.
pub fn parse_seeds(tokens: &[String]) -> Result<Vec<u64>> {
    let mut seeds: Vec<u64> = Vec::new();
    for token in tokens {
        let seed = if let Ok(value) = token.parse::<u64>() {
            value
        } else if let Ok(value) = token.parse::<i64>() {
            value.unsigned_abs()
        } else {
            bail!("Unrecognized seed token: {token}");
        };
        if !seeds.contains(&seed) {
            seeds.push(seed);
        }
    }
    if seeds.is_empty() {
        seeds.push(1337);
    }
    Ok(seeds)
}

pub fn parse_table_sizes(tokens: &[String]) -> Result<Vec<usize>> {
    tokens
        .iter()
        .map(|token| {
            token
                .parse::<usize>()
                .with_context(|| format!("Unrecognized table size: {token}"))
        })
        .collect()
}

/// `all` expands to every strategy.
pub fn parse_strategies(tokens: &[String]) -> Result<Vec<BotStrategy>> {
    let mut strategies = Vec::new();
    for token in tokens {
        if token.eq_ignore_ascii_case("all") {
            strategies.extend_from_slice(BotStrategy::value_variants());
            continue;
        }
        match BotStrategy::from_str(token, true) {
            Ok(strategy) => strategies.push(strategy),
            Err(_) => bail!("Unknown bot strategy: {token}"),
        }
    }
    let mut unique = Vec::with_capacity(strategies.len());
    for strategy in strategies {
        if !unique.contains(&strategy) {
            unique.push(strategy);
        }
    }
    Ok(unique)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_csv_trims_and_filters() {
        let parts = split_csv(" alpha, ,beta,  gamma ");
        assert_eq!(parts, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn seeds_fold_negatives_and_dedupe() {
        let seeds = parse_seeds(&split_csv("42,-42,7")).unwrap();
        assert_eq!(seeds, vec![42, 7]);
        assert_eq!(parse_seeds(&[]).unwrap(), vec![1337]);
        assert!(parse_seeds(&split_csv("nope")).is_err());
    }

    #[test]
    fn strategies_accept_all_keyword() {
        let all = parse_strategies(&split_csv("all")).unwrap();
        assert_eq!(all.len(), 3);
        let one = parse_strategies(&split_csv("Sharp")).unwrap();
        assert_eq!(one, vec![BotStrategy::Sharp]);
        assert!(parse_strategies(&split_csv("psychic")).is_err());
    }

    #[test]
    fn table_sizes_must_be_numbers() {
        assert_eq!(parse_table_sizes(&split_csv("4, 8")).unwrap(), vec![4, 8]);
        assert!(parse_table_sizes(&split_csv("four")).is_err());
    }
}
