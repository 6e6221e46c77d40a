use std::collections::{BTreeMap, BTreeSet};

use super::types::{EmotionStats, EmotionalChain, EmotionalPatternInsight, TriggerFrequency};
use super::{ensure_finite, top_n, Phase};
use crate::error::InsightResult;
use crate::model::CognitiveModel;

const TRIGGER_LIMIT: usize = 15;
const CHAIN_LIMIT: usize = 20;

/// Emotion frequency and intensity, common triggers and co-occurrence chains.
pub fn analyze_emotions(models: &[CognitiveModel]) -> InsightResult<EmotionalPatternInsight> {
    let mut intensity_sums: BTreeMap<String, (usize, f64)> = BTreeMap::new();
    let mut triggers: BTreeMap<String, (usize, BTreeSet<String>)> = BTreeMap::new();
    // models carrying each emotion, and each ordered pair
    let mut carriers: BTreeMap<String, usize> = BTreeMap::new();
    let mut pairs: BTreeMap<(String, String), usize> = BTreeMap::new();

    for model in models {
        let mut present = BTreeSet::new();

        for pattern in &model.emotional_patterns {
            ensure_finite(Phase::EmotionalPatterns, "emotion intensity", pattern.intensity)?;

            let emotion = pattern.emotion.trim().to_lowercase();
            if emotion.is_empty() {
                continue;
            }

            let entry = intensity_sums.entry(emotion.clone()).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += pattern.intensity;

            for trigger in &pattern.triggers {
                let trigger = trigger.trim().to_lowercase();
                if trigger.is_empty() {
                    continue;
                }
                let entry = triggers.entry(trigger).or_default();
                entry.0 += 1;
                entry.1.insert(emotion.clone());
            }

            present.insert(emotion);
        }

        for a in &present {
            *carriers.entry(a.clone()).or_insert(0) += 1;
            for b in present.iter().filter(|b| *b != a) {
                *pairs.entry((a.clone(), b.clone())).or_insert(0) += 1;
            }
        }
    }

    let by_emotion = intensity_sums
        .into_iter()
        .map(|(emotion, (frequency, sum))| {
            (
                emotion,
                EmotionStats {
                    frequency,
                    average_intensity: sum / frequency as f64,
                },
            )
        })
        .collect();

    let common_triggers = triggers
        .into_iter()
        .map(|(trigger, (frequency, emotions))| TriggerFrequency {
            trigger,
            frequency,
            emotions: emotions.into_iter().collect(),
        })
        .collect();

    let chains = pairs
        .into_iter()
        .map(|((from, to), co_occurrences)| {
            let base = carriers.get(&from).copied().unwrap_or(co_occurrences).max(1);
            EmotionalChain {
                strength: co_occurrences as f64 / base as f64,
                from,
                to,
                co_occurrences,
            }
        })
        .collect();

    Ok(EmotionalPatternInsight {
        by_emotion,
        common_triggers: top_n(common_triggers, TRIGGER_LIMIT, |a, b| {
            b.frequency
                .cmp(&a.frequency)
                .then_with(|| a.trigger.cmp(&b.trigger))
        }),
        emotional_chains: top_n(chains, CHAIN_LIMIT, |a, b| {
            b.strength
                .total_cmp(&a.strength)
                .then_with(|| b.co_occurrences.cmp(&a.co_occurrences))
                .then_with(|| a.from.cmp(&b.from))
                .then_with(|| a.to.cmp(&b.to))
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::test_support::{emotion, model};

    #[test]
    fn test_chain_strength_is_conditional_frequency() {
        let mut a = model("a");
        a.emotional_patterns = vec![emotion("Anxiety", 6.0, &["work"]), emotion("shame", 4.0, &[])];
        let mut b = model("b");
        b.emotional_patterns = vec![emotion("anxiety", 8.0, &["Work", "crowds"])];

        let insight = analyze_emotions(&[a, b]).unwrap();

        let anxiety = &insight.by_emotion["anxiety"];
        assert_eq!(anxiety.frequency, 2);
        assert!((anxiety.average_intensity - 7.0).abs() < 1e-9);

        let shame_to_anxiety = insight
            .emotional_chains
            .iter()
            .find(|c| c.from == "shame" && c.to == "anxiety")
            .unwrap();
        assert_eq!(shame_to_anxiety.strength, 1.0);
        let anxiety_to_shame = insight
            .emotional_chains
            .iter()
            .find(|c| c.from == "anxiety" && c.to == "shame")
            .unwrap();
        assert_eq!(anxiety_to_shame.strength, 0.5);

        assert_eq!(insight.common_triggers[0].trigger, "work");
        assert_eq!(insight.common_triggers[0].frequency, 2);
    }

    #[test]
    fn test_empty_collection() {
        assert_eq!(analyze_emotions(&[]).unwrap(), EmotionalPatternInsight::default());
    }
}
