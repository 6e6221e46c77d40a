//! Primary conversational style inference.
//!
//! Both the indexer and the insight engine reduce the four numeric style
//! dimensions to one categorical label. Rules are evaluated in a fixed
//! priority order and the first match wins.

use serde::{Deserialize, Serialize};

use super::types::ConversationalStyle;

/// Categorical conversational style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimaryStyle {
    /// Straightforward, cooperative.
    Plain,
    /// Agitated and resistant.
    Upset,
    /// Talks at length.
    Verbose,
    /// Says little.
    Reserved,
    /// Wanders off topic.
    Tangent,
    /// Eager to please the therapist.
    Pleasing,
    /// Guarded without fitting another label. Only produced for style distributions.
    Defensive,
}

/// How hard a style is for a trainee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleDifficulty {
    /// Beginner-friendly.
    Easy,
    /// Intermediate.
    Medium,
    /// Advanced.
    Hard,
}

impl StyleDifficulty {
    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            StyleDifficulty::Easy => "easy",
            StyleDifficulty::Medium => "medium",
            StyleDifficulty::Hard => "hard",
        }
    }
}

impl std::fmt::Display for StyleDifficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for StyleDifficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(StyleDifficulty::Easy),
            "medium" => Ok(StyleDifficulty::Medium),
            "hard" => Ok(StyleDifficulty::Hard),
            _ => Err(format!("Unknown style difficulty: {}", s)),
        }
    }
}

impl PrimaryStyle {
    /// The six styles a raw record can carry.
    pub const LABELS: [PrimaryStyle; 6] = [
        PrimaryStyle::Plain,
        PrimaryStyle::Upset,
        PrimaryStyle::Verbose,
        PrimaryStyle::Reserved,
        PrimaryStyle::Tangent,
        PrimaryStyle::Pleasing,
    ];

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimaryStyle::Plain => "plain",
            PrimaryStyle::Upset => "upset",
            PrimaryStyle::Verbose => "verbose",
            PrimaryStyle::Reserved => "reserved",
            PrimaryStyle::Tangent => "tangent",
            PrimaryStyle::Pleasing => "pleasing",
            PrimaryStyle::Defensive => "defensive",
        }
    }

    /// Difficulty tier for the style.
    pub fn difficulty(&self) -> StyleDifficulty {
        match self {
            PrimaryStyle::Plain | PrimaryStyle::Pleasing => StyleDifficulty::Easy,
            PrimaryStyle::Verbose | PrimaryStyle::Tangent => StyleDifficulty::Medium,
            PrimaryStyle::Upset | PrimaryStyle::Reserved | PrimaryStyle::Defensive => {
                StyleDifficulty::Hard
            }
        }
    }
}

impl std::fmt::Display for PrimaryStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PrimaryStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "plain" => Ok(PrimaryStyle::Plain),
            "upset" => Ok(PrimaryStyle::Upset),
            "verbose" => Ok(PrimaryStyle::Verbose),
            "reserved" => Ok(PrimaryStyle::Reserved),
            "tangent" => Ok(PrimaryStyle::Tangent),
            "pleasing" => Ok(PrimaryStyle::Pleasing),
            "defensive" => Ok(PrimaryStyle::Defensive),
            _ => Err(format!("Unknown conversational style: {}", s)),
        }
    }
}

/// Infer the primary style used for indexing and search.
pub fn infer_primary_style(style: &ConversationalStyle) -> PrimaryStyle {
    if style.resistance >= 8.0 {
        PrimaryStyle::Upset
    } else if style.verbosity >= 8.0 {
        PrimaryStyle::Verbose
    } else if style.verbosity <= 3.0 {
        PrimaryStyle::Reserved
    } else if style.resistance <= 3.0 {
        PrimaryStyle::Pleasing
    } else if style.insight_level <= 4.0 {
        PrimaryStyle::Tangent
    } else {
        PrimaryStyle::Plain
    }
}

/// Variant used for style distributions: a resistance of 6 or more that
/// would otherwise fall through to `plain` is reported as `defensive`.
pub fn infer_distribution_style(style: &ConversationalStyle) -> PrimaryStyle {
    match infer_primary_style(style) {
        PrimaryStyle::Plain if style.resistance >= 6.0 => PrimaryStyle::Defensive,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style(verbosity: f64, resistance: f64, insight_level: f64) -> ConversationalStyle {
        ConversationalStyle {
            verbosity,
            emotional_expressiveness: 5.0,
            resistance,
            insight_level,
        }
    }

    #[test]
    fn test_priority_order() {
        // resistance wins over verbosity
        assert_eq!(infer_primary_style(&style(9.0, 9.0, 5.0)), PrimaryStyle::Upset);
        assert_eq!(infer_primary_style(&style(9.0, 5.0, 5.0)), PrimaryStyle::Verbose);
        // reserved before pleasing
        assert_eq!(infer_primary_style(&style(2.0, 2.0, 5.0)), PrimaryStyle::Reserved);
        assert_eq!(infer_primary_style(&style(5.0, 2.0, 2.0)), PrimaryStyle::Pleasing);
        assert_eq!(infer_primary_style(&style(5.0, 5.0, 4.0)), PrimaryStyle::Tangent);
        assert_eq!(infer_primary_style(&style(5.0, 5.0, 5.0)), PrimaryStyle::Plain);
    }

    #[test]
    fn test_defensive_only_replaces_plain() {
        assert_eq!(infer_distribution_style(&style(5.0, 6.0, 6.0)), PrimaryStyle::Defensive);
        assert_eq!(infer_primary_style(&style(5.0, 6.0, 6.0)), PrimaryStyle::Plain);
        assert_eq!(infer_distribution_style(&style(5.0, 6.0, 3.0)), PrimaryStyle::Tangent);
    }

    #[test]
    fn test_difficulty_table() {
        assert_eq!(PrimaryStyle::Plain.difficulty(), StyleDifficulty::Easy);
        assert_eq!(PrimaryStyle::Pleasing.difficulty(), StyleDifficulty::Easy);
        assert_eq!(PrimaryStyle::Verbose.difficulty(), StyleDifficulty::Medium);
        assert_eq!(PrimaryStyle::Tangent.difficulty(), StyleDifficulty::Medium);
        assert_eq!(PrimaryStyle::Upset.difficulty(), StyleDifficulty::Hard);
        assert_eq!(PrimaryStyle::Reserved.difficulty(), StyleDifficulty::Hard);
    }

    #[test]
    fn test_style_from_str() {
        assert_eq!("UPSET".parse::<PrimaryStyle>(), Ok(PrimaryStyle::Upset));
        assert!("chatty".parse::<PrimaryStyle>().is_err());
    }
}
