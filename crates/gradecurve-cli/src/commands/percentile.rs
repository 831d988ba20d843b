//! The `gradecurve percentile` command.

use anyhow::Result;

use gradecurve_core::estimate_percentile;

pub fn execute(distribution: String, target: f64) -> Result<()> {
    anyhow::ensure!(
        (0.0..=1.0).contains(&target),
        "target must be between 0.0 and 1.0"
    );

    let buckets = parse_distribution(&distribution)?;
    anyhow::ensure!(!buckets.is_empty(), "distribution must have at least one bucket");

    println!("{:.3}", estimate_percentile(&buckets, target));
    Ok(())
}

fn parse_distribution(s: &str) -> Result<Vec<(f64, f64)>> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (value, weight) = part
                .split_once(':')
                .ok_or_else(|| anyhow::anyhow!("invalid bucket '{part}' (expected value:weight)"))?;
            let value = value
                .trim()
                .parse::<f64>()
                .map_err(|_| anyhow::anyhow!("invalid bucket value: '{}'", value.trim()))?;
            let weight = weight
                .trim()
                .parse::<f64>()
                .map_err(|_| anyhow::anyhow!("invalid bucket weight: '{}'", weight.trim()))?;
            Ok((value, weight))
        })
        .collect()
}
