use std::collections::{BTreeMap, BTreeSet};

use super::types::{DistortionCombination, DistortionPatternAnalysis};
use super::top_n;
use crate::error::InsightResult;
use crate::model::CognitiveModel;

const COMBINATION_LIMIT: usize = 10;

/// Distortion frequency per type, recurring combinations and theme severity.
///
/// A combination is the full sorted set of types in one model; only sets
/// found in more than one model are reported.
pub fn analyze_distortions(models: &[CognitiveModel]) -> InsightResult<DistortionPatternAnalysis> {
    let mut by_type = BTreeMap::new();
    let mut combinations: BTreeMap<Vec<String>, usize> = BTreeMap::new();
    let mut severities: BTreeMap<String, (usize, f64)> = BTreeMap::new();

    for model in models {
        let mut types = BTreeSet::new();

        for pattern in &model.distortion_patterns {
            let kind = pattern.distortion_type.trim().to_lowercase();
            if kind.is_empty() {
                continue;
            }
            *by_type.entry(kind.clone()).or_insert(0) += 1;
            types.insert(kind);

            for theme in &pattern.trigger_themes {
                let entry = severities
                    .entry(theme.trim().to_lowercase())
                    .or_insert((0, 0.0));
                entry.0 += 1;
                entry.1 += pattern.frequency.severity();
            }
        }

        if types.len() >= 2 {
            *combinations
                .entry(types.into_iter().collect())
                .or_insert(0) += 1;
        }
    }

    let recurring = combinations
        .into_iter()
        .filter(|(_, frequency)| *frequency > 1)
        .map(|(types, frequency)| DistortionCombination {
            combination: types.join("+"),
            types,
            frequency,
        })
        .collect();

    Ok(DistortionPatternAnalysis {
        by_type,
        common_combinations: top_n(recurring, COMBINATION_LIMIT, |a, b| {
            b.frequency
                .cmp(&a.frequency)
                .then_with(|| a.combination.cmp(&b.combination))
        }),
        severity_by_theme: severities
            .into_iter()
            .filter(|(theme, _)| !theme.is_empty())
            .map(|(theme, (count, sum))| (theme, sum / count as f64))
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::test_support::{distortion, model};
    use crate::model::DistortionFrequency;

    #[test]
    fn test_single_model_combination_is_dropped() {
        let mut a = model("a");
        a.distortion_patterns = vec![
            distortion("labeling", &["failure"], DistortionFrequency::Rare),
            distortion("catastrophizing", &["failure"], DistortionFrequency::Frequent),
        ];
        let mut b = model("b");
        b.distortion_patterns = vec![
            distortion("catastrophizing", &[], DistortionFrequency::Rare),
            distortion("labeling", &[], DistortionFrequency::Rare),
        ];
        let mut c = model("c");
        c.distortion_patterns = vec![
            distortion("labeling", &[], DistortionFrequency::Rare),
            distortion("mind reading", &["rejection"], DistortionFrequency::Pervasive),
        ];

        let analysis = analyze_distortions(&[a, b, c]).unwrap();
        assert_eq!(analysis.common_combinations.len(), 1);
        assert_eq!(
            analysis.common_combinations[0].combination,
            "catastrophizing+labeling"
        );
        assert_eq!(analysis.common_combinations[0].frequency, 2);
        assert_eq!(analysis.by_type["labeling"], 3);
        assert!((analysis.severity_by_theme["failure"] - 3.5).abs() < 1e-9);
        assert_eq!(analysis.severity_by_theme["rejection"], 9.0);
    }

    #[test]
    fn test_empty_collection() {
        assert_eq!(analyze_distortions(&[]).unwrap(), DistortionPatternAnalysis::default());
    }
}
