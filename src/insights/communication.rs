use std::collections::{BTreeMap, BTreeSet};

use super::types::{CommunicationStyleDistribution, StyleCorrelation};
use super::{ensure_finite, Phase};
use crate::error::InsightResult;
use crate::model::{infer_distribution_style, CognitiveModel};

#[derive(Default)]
struct StyleTags {
    domains: BTreeSet<String>,
    emotions: BTreeSet<String>,
}

/// Inferred style counts, average verbosity/resistance and style correlations.
pub fn analyze_communication(
    models: &[CognitiveModel],
) -> InsightResult<CommunicationStyleDistribution> {
    if models.is_empty() {
        return Ok(CommunicationStyleDistribution::default());
    }

    let mut by_style = BTreeMap::new();
    let mut tags: BTreeMap<String, StyleTags> = BTreeMap::new();
    let mut verbosity_sum = 0.0;
    let mut resistance_sum = 0.0;

    for model in models {
        let style = &model.conversational_style;
        ensure_finite(Phase::CommunicationStyles, "verbosity", style.verbosity)?;
        ensure_finite(Phase::CommunicationStyles, "resistance", style.resistance)?;
        ensure_finite(Phase::CommunicationStyles, "insight level", style.insight_level)?;

        verbosity_sum += style.verbosity;
        resistance_sum += style.resistance;

        let label = infer_distribution_style(style).as_str().to_string();
        *by_style.entry(label.clone()).or_insert(0) += 1;

        let entry = tags.entry(label).or_default();
        entry.domains.extend(
            model
                .core_beliefs
                .iter()
                .flat_map(|b| b.related_domains.iter())
                .map(|d| d.trim().to_lowercase())
                .filter(|d| !d.is_empty()),
        );
        entry.emotions.extend(
            model
                .emotional_patterns
                .iter()
                .map(|e| e.emotion.trim().to_lowercase())
                .filter(|e| !e.is_empty()),
        );
    }

    let n = models.len() as f64;
    let correlations = tags
        .into_iter()
        .map(|(style, tags)| {
            let distinct = (tags.domains.len() + tags.emotions.len()) as f64;
            StyleCorrelation {
                style,
                belief_domains: tags.domains.into_iter().collect(),
                emotions: tags.emotions.into_iter().collect(),
                strength: (distinct / n).min(1.0),
            }
        })
        .collect();

    Ok(CommunicationStyleDistribution {
        by_style,
        average_verbosity: verbosity_sum / n,
        average_resistance: resistance_sum / n,
        correlations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::test_support::{belief, emotion, model, with_style};

    #[test]
    fn test_defensive_bucket_and_averages() {
        // plain with resistance 6 reports as defensive
        let a = with_style(model("a"), 5.0, 6.0, 6.0);
        let b = with_style(model("b"), 9.0, 4.0, 5.0);

        let distribution = analyze_communication(&[a, b]).unwrap();
        assert_eq!(distribution.by_style["defensive"], 1);
        assert_eq!(distribution.by_style["verbose"], 1);
        assert!((distribution.average_verbosity - 7.0).abs() < 1e-9);
        assert!((distribution.average_resistance - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_correlation_strength_is_capped() {
        let mut a = with_style(model("a"), 9.0, 4.0, 5.0);
        a.core_beliefs = vec![belief("x", 5.0, "work"), belief("y", 5.0, "self")];
        a.emotional_patterns = vec![emotion("fear", 5.0, &[]), emotion("anger", 5.0, &[])];

        let distribution = analyze_communication(&[a]).unwrap();
        let verbose = &distribution.correlations[0];
        assert_eq!(verbose.style, "verbose");
        assert_eq!(verbose.strength, 1.0);
        assert_eq!(verbose.emotions, vec!["anger".to_string(), "fear".to_string()]);
    }
}
