//! Keyword heuristics used during normalization.
//!
//! These are ordered `(tag, triggers)` rules evaluated against lower-cased
//! text with plain substring checks. Rule order and trigger substrings are
//! part of the observable behaviour; coverage is known to be incomplete.

use crate::model::{ConversationalStyle, PrimaryStyle, StyleDifficulty};

// ============================================================================
// Distortions
// ============================================================================

/// Cognitive distortion categories detected in automatic thoughts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DistortionType {
    /// Black-and-white thinking.
    AllOrNothing,
    /// Rigid rules about how things must be.
    ShouldStatements,
    /// Expecting the worst.
    Catastrophizing,
    /// Dwelling on negatives only.
    MentalFilter,
    /// Taking blame for external events.
    Personalization,
    /// Assuming others' thoughts.
    MindReading,
    /// Predicting negative outcomes.
    FortuneTelling,
    /// Treating feelings as facts.
    EmotionalReasoning,
    /// Global negative labels.
    Labeling,
}

impl DistortionType {
    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            DistortionType::AllOrNothing => "all-or-nothing thinking",
            DistortionType::ShouldStatements => "should statements",
            DistortionType::Catastrophizing => "catastrophizing",
            DistortionType::MentalFilter => "mental filter",
            DistortionType::Personalization => "personalization",
            DistortionType::MindReading => "mind reading",
            DistortionType::FortuneTelling => "fortune telling",
            DistortionType::EmotionalReasoning => "emotional reasoning",
            DistortionType::Labeling => "labeling",
        }
    }
}

impl std::fmt::Display for DistortionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

const DISTORTION_RULES: [(DistortionType, &[&str]); 9] = [
    (
        DistortionType::AllOrNothing,
        &["always", "never", "completely", "totally", "everything", "nothing", "every time"],
    ),
    (
        DistortionType::ShouldStatements,
        &["should", "must", "ought to", "have to"],
    ),
    (
        DistortionType::Catastrophizing,
        &["disaster", "terrible", "awful", "worst", "ruin", "unbearable", "can't stand"],
    ),
    (
        DistortionType::MentalFilter,
        &["only the bad", "nothing good", "doesn't count", "only see", "just the negative"],
    ),
    (
        DistortionType::Personalization,
        &["my fault", "because of me", "i caused", "blame myself", "i'm responsible"],
    ),
    (
        DistortionType::MindReading,
        &["they think", "he thinks", "she thinks", "everyone thinks", "judging me", "must think"],
    ),
    (
        DistortionType::FortuneTelling,
        &["will never", "going to fail", "will fail", "won't work", "i'll never", "is going to go wrong"],
    ),
    (
        DistortionType::EmotionalReasoning,
        &["i feel like", "because i feel", "i feel that", "feels like", "i feel so"],
    ),
    (
        DistortionType::Labeling,
        &["i'm a", "i am a", "loser", "failure", "idiot", "stupid", "worthless"],
    ),
];

/// Every distortion rule a thought matches, in rule order.
pub fn detect_distortions(thought: &str) -> Vec<DistortionType> {
    let text = thought.to_lowercase();
    DISTORTION_RULES
        .iter()
        .filter(|(_, triggers)| triggers.iter().any(|t| text.contains(t)))
        .map(|(kind, _)| *kind)
        .collect()
}

// ============================================================================
// Themes
// ============================================================================

/// Theme names with the stem that signals them.
const THEME_RULES: [(&str, &str); 5] = [
    ("failure", "fail"),
    ("rejection", "reject"),
    ("abandonment", "abandon"),
    ("criticism", "critic"),
    ("uncertainty", "uncertain"),
];

/// Trigger themes found in any of the given texts, in rule order.
pub fn extract_themes<S: AsRef<str>>(texts: &[S]) -> Vec<String> {
    let lowered: Vec<String> = texts.iter().map(|t| t.as_ref().to_lowercase()).collect();
    THEME_RULES
        .iter()
        .filter(|(_, stem)| lowered.iter().any(|t| t.contains(stem)))
        .map(|(theme, _)| theme.to_string())
        .collect()
}

// ============================================================================
// Formative experiences
// ============================================================================

const NEGATIVE_KEYWORDS: [&str; 5] = ["abuse", "trauma", "loss", "rejection", "failure"];

/// Emotional response attributed to a formative experience.
pub fn infer_emotional_response(context: &str) -> &'static str {
    let text = context.to_lowercase();
    if NEGATIVE_KEYWORDS.iter().any(|k| text.contains(k)) {
        "Fear, sadness, anger"
    } else {
        "Mixed emotions"
    }
}

// ============================================================================
// Belief categories
// ============================================================================

const BELIEF_CATEGORY_RULES: [(&str, &[&str]); 3] = [
    (
        "helpless",
        &["helpless", "incompetent", "powerless", "weak", "can't cope", "out of control", "trapped", "inadequate"],
    ),
    (
        "unlovable",
        &["unlovable", "unwanted", "alone", "rejected", "abandon", "unlikeable", "different", "bad person"],
    ),
    (
        "worthless",
        &["worthless", "failure", "useless", "burden", "don't deserve", "not good enough", "defective"],
    ),
];

/// Beck-style category (`helpless`, `unlovable`, `worthless`) of a belief, else `other`.
pub fn classify_belief_category(belief: &str) -> &'static str {
    let text = belief.to_lowercase();
    BELIEF_CATEGORY_RULES
        .iter()
        .find(|(_, triggers)| triggers.iter().any(|t| text.contains(t)))
        .map(|(category, _)| *category)
        .unwrap_or("other")
}

// ============================================================================
// Conversational style tables
// ============================================================================

fn verbosity_for(style: PrimaryStyle) -> f64 {
    match style {
        PrimaryStyle::Plain => 5.0,
        PrimaryStyle::Upset => 6.0,
        PrimaryStyle::Verbose => 9.0,
        PrimaryStyle::Reserved => 2.0,
        PrimaryStyle::Tangent => 7.0,
        PrimaryStyle::Pleasing => 5.0,
        PrimaryStyle::Defensive => 4.0,
    }
}

fn expressiveness_for(style: PrimaryStyle) -> f64 {
    match style {
        PrimaryStyle::Plain => 5.0,
        PrimaryStyle::Upset => 8.0,
        PrimaryStyle::Verbose => 6.0,
        PrimaryStyle::Reserved => 3.0,
        PrimaryStyle::Tangent => 6.0,
        PrimaryStyle::Pleasing => 6.0,
        PrimaryStyle::Defensive => 4.0,
    }
}

fn resistance_for_style(style: PrimaryStyle) -> f64 {
    match style {
        PrimaryStyle::Plain => 4.0,
        PrimaryStyle::Upset => 8.0,
        PrimaryStyle::Verbose => 4.0,
        PrimaryStyle::Reserved => 6.0,
        PrimaryStyle::Tangent => 5.0,
        PrimaryStyle::Pleasing => 2.0,
        PrimaryStyle::Defensive => 7.0,
    }
}

fn resistance_for_difficulty(difficulty: StyleDifficulty) -> f64 {
    match difficulty {
        StyleDifficulty::Easy => 3.0,
        StyleDifficulty::Medium => 5.0,
        StyleDifficulty::Hard => 8.0,
    }
}

fn insight_for(style: PrimaryStyle) -> f64 {
    match style {
        PrimaryStyle::Plain => 6.0,
        PrimaryStyle::Upset => 4.0,
        PrimaryStyle::Verbose => 5.0,
        PrimaryStyle::Reserved => 4.0,
        PrimaryStyle::Tangent => 3.0,
        PrimaryStyle::Pleasing => 5.0,
        PrimaryStyle::Defensive => 4.0,
    }
}

/// Map a categorical style label and optional difficulty tag to numeric dimensions.
///
/// Difficulty takes precedence for resistance. Unknown labels fall back to
/// the neutral value for the dimensions they would have set.
pub fn map_conversational_style(
    label: Option<&str>,
    difficulty: Option<&str>,
) -> ConversationalStyle {
    let style = label.and_then(|l| l.parse::<PrimaryStyle>().ok());
    let difficulty = difficulty.and_then(|d| d.parse::<StyleDifficulty>().ok());

    if label.is_none() && difficulty.is_none() {
        return ConversationalStyle::neutral();
    }

    let neutral = ConversationalStyle::neutral();
    let resistance = match (difficulty, style) {
        (Some(d), _) => resistance_for_difficulty(d),
        (None, Some(s)) => resistance_for_style(s),
        (None, None) => neutral.resistance,
    };

    ConversationalStyle {
        verbosity: style.map(verbosity_for).unwrap_or(neutral.verbosity),
        emotional_expressiveness: style
            .map(expressiveness_for)
            .unwrap_or(neutral.emotional_expressiveness),
        resistance,
        insight_level: style.map(insight_for).unwrap_or(neutral.insight_level),
    }
}
