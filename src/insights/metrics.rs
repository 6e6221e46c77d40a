use std::collections::BTreeSet;

use super::types::DatasetMetrics;
use super::{ensure_finite, Phase};
use crate::error::InsightResult;
use crate::model::CognitiveModel;

/// Assumed ceiling of distinct tags a single model contributes.
const TAGS_PER_MODEL: f64 = 20.0;

/// Average complexity, diversity and structural quality of a collection.
pub fn analyze_metrics(models: &[CognitiveModel]) -> InsightResult<DatasetMetrics> {
    if models.is_empty() {
        return Ok(DatasetMetrics::default());
    }

    let mut complexity_sum = 0.0;
    let mut quality_sum = 0.0;
    let mut tags = BTreeSet::new();

    for model in models {
        let resistance = model.conversational_style.resistance;
        ensure_finite(Phase::DatasetMetrics, "resistance", resistance)?;

        complexity_sum += 0.3 * model.core_beliefs.len() as f64
            + 0.2 * model.emotional_patterns.len() as f64
            + 0.3 * model.distortion_patterns.len() as f64
            + 0.2 * resistance / 10.0;

        let checks = [
            !model.core_beliefs.is_empty(),
            !model.emotional_patterns.is_empty(),
            !model.distortion_patterns.is_empty(),
            model.diagnosis_info.is_known(),
        ];
        quality_sum += checks.iter().filter(|c| **c).count() as f64 / checks.len() as f64;

        for belief in &model.core_beliefs {
            for domain in &belief.related_domains {
                tags.insert(format!("domain:{}", domain.trim().to_lowercase()));
            }
        }
        for emotion in &model.emotional_patterns {
            tags.insert(format!("emotion:{}", emotion.emotion.trim().to_lowercase()));
        }
        for distortion in &model.distortion_patterns {
            tags.insert(format!(
                "distortion:{}",
                distortion.distortion_type.trim().to_lowercase()
            ));
        }
    }

    let n = models.len() as f64;
    Ok(DatasetMetrics {
        average_complexity: complexity_sum / n,
        diversity_score: (tags.len() as f64 / (n * TAGS_PER_MODEL)).min(1.0),
        quality_score: quality_sum / n,
    })
}
