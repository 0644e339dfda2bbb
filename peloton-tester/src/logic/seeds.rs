use anyhow::{Context, Result, bail};

/// Resolve CLI seed tokens into numeric seeds.
///
/// Accepts decimal literals and `0x`-prefixed hex. Duplicates are dropped
/// while keeping the first occurrence.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    let mut seeds = Vec::with_capacity(tokens.len());
    for token in tokens {
        let seed = parse_seed(token).with_context(|| format!("invalid seed '{token}'"))?;
        if !seeds.contains(&seed) {
            seeds.push(seed);
        }
    }
    if seeds.is_empty() {
        bail!("at least one seed is required");
    }
    Ok(seeds)
}

fn parse_seed(token: &str) -> Result<u64> {
    let token = token.trim();
    let parsed = if let Some(hex) = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    {
        u64::from_str_radix(&hex.replace('_', ""), 16)?
    } else {
        token.replace('_', "").parse::<u64>()?
    };
    Ok(parsed)
}
