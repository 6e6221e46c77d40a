use std::collections::{BTreeMap, BTreeSet};

use super::types::{BeliefDistribution, CommonBelief, StrengthHistogram};
use super::{ensure_finite, top_n, Phase};
use crate::error::InsightResult;
use crate::model::CognitiveModel;

const MOST_COMMON_LIMIT: usize = 10;

struct BeliefTally {
    text: String,
    frequency: usize,
    strength_sum: f64,
    domains: BTreeSet<String>,
}

/// Belief counts per domain, strength histogram and most common statements.
pub fn analyze_beliefs(models: &[CognitiveModel]) -> InsightResult<BeliefDistribution> {
    let mut distribution = BeliefDistribution::default();
    let mut tallies: BTreeMap<String, BeliefTally> = BTreeMap::new();

    for model in models {
        for belief in &model.core_beliefs {
            ensure_finite(Phase::BeliefDistribution, "belief strength", belief.strength)?;

            for domain in &belief.related_domains {
                *distribution
                    .by_domain
                    .entry(domain.trim().to_lowercase())
                    .or_insert(0) += 1;
            }

            bucket(&mut distribution.by_strength, belief.strength);

            let tally = tallies
                .entry(belief.belief.trim().to_lowercase())
                .or_insert_with(|| BeliefTally {
                    text: belief.belief.trim().to_string(),
                    frequency: 0,
                    strength_sum: 0.0,
                    domains: BTreeSet::new(),
                });
            tally.frequency += 1;
            tally.strength_sum += belief.strength;
            tally
                .domains
                .extend(belief.related_domains.iter().map(|d| d.trim().to_lowercase()));
        }
    }

    let common = tallies
        .into_values()
        .map(|t| CommonBelief {
            average_strength: t.strength_sum / t.frequency as f64,
            belief: t.text,
            frequency: t.frequency,
            domains: t.domains.into_iter().collect(),
        })
        .collect();

    distribution.most_common = top_n(common, MOST_COMMON_LIMIT, |a, b| {
        b.frequency
            .cmp(&a.frequency)
            .then_with(|| a.belief.cmp(&b.belief))
    });

    Ok(distribution)
}

fn bucket(histogram: &mut StrengthHistogram, strength: f64) {
    if strength < 4.0 {
        histogram.low += 1;
    } else if strength < 7.0 {
        histogram.moderate += 1;
    } else if strength < 9.0 {
        histogram.high += 1;
    } else {
        histogram.extreme += 1;
    }
}
