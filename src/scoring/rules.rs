use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Lowest possible health score
pub const MIN_SCORE: i32 = 1;

/// Highest possible health score
pub const MAX_SCORE: i32 = 10;

#[derive(Error, Debug)]
pub enum RulesError {
    #[error("Failed to read scoring rules: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse scoring rules: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid scoring rules: {0}")]
    Invalid(String),
}

/// What the calorie bands are measured against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CalorieMetric {
    /// Total calories of the serving
    #[default]
    Absolute,
    /// Calories per gram of protein
    CaloriesPerProteinGram,
}

/// A half-open range `[min, max)` with a score delta. A missing bound is
/// unbounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    pub delta: i32,
}

impl Band {
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value < max)
    }
}

/// First band in the list containing `value`
pub fn first_band(bands: &[Band], value: f64) -> Option<&Band> {
    bands.iter().find(|b| b.contains(value))
}

/// Bands on the share of calories coming from each macro
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroBands {
    #[serde(default)]
    pub protein: Vec<Band>,
    #[serde(default)]
    pub fat: Vec<Band>,
    #[serde(default)]
    pub carbs: Vec<Band>,
}

/// A named keyword list with a score delta.
///
/// Tiers sharing a `group` form a ladder: only the first matching tier of
/// the group applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordTier {
    pub name: String,
    pub delta: i32,
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

impl KeywordTier {
    /// First keyword contained in `lowercase_name`
    pub fn matching_keyword(&self, lowercase_name: &str) -> Option<&str> {
        self.keywords
            .iter()
            .find(|k| lowercase_name.contains(&k.to_lowercase()))
            .map(String::as_str)
    }
}

/// The swappable health-score table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringRules {
    pub base_score: i32,
    #[serde(default)]
    pub calorie_metric: CalorieMetric,
    #[serde(default)]
    pub calorie_bands: Vec<Band>,
    #[serde(default)]
    pub macro_bands: MacroBands,
    #[serde(default)]
    pub keyword_tiers: Vec<KeywordTier>,
}

impl ScoringRules {
    /// Load the embedded default table
    pub fn load_embedded() -> Result<Self, RulesError> {
        // Validated at compile time by build.rs
        const EMBEDDED_RULES: &str = include_str!("../../rules/health_rules.json");
        Self::from_json(EMBEDDED_RULES)
    }

    /// Load a table from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, RulesError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse and check a table
    pub fn from_json(json: &str) -> Result<Self, RulesError> {
        let rules: Self = serde_json::from_str(json)?;
        rules.validate()?;
        Ok(rules)
    }

    /// Export the table to JSON
    pub fn to_json(&self) -> Result<String, RulesError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn validate(&self) -> Result<(), RulesError> {
        if !(MIN_SCORE..=MAX_SCORE).contains(&self.base_score) {
            return Err(RulesError::Invalid(format!(
                "baseScore must be between {MIN_SCORE} and {MAX_SCORE}, got {}",
                self.base_score
            )));
        }

        let band_lists = [
            ("calorieBands", &self.calorie_bands),
            ("macroBands.protein", &self.macro_bands.protein),
            ("macroBands.fat", &self.macro_bands.fat),
            ("macroBands.carbs", &self.macro_bands.carbs),
        ];
        for (list, bands) in band_lists {
            for (i, band) in bands.iter().enumerate() {
                if let (Some(min), Some(max)) = (band.min, band.max) {
                    if min >= max {
                        return Err(RulesError::Invalid(format!(
                            "{list}[{i}]: min {min} must be below max {max}"
                        )));
                    }
                }
            }
        }

        let mut names = HashSet::new();
        for tier in &self.keyword_tiers {
            if !names.insert(tier.name.as_str()) {
                return Err(RulesError::Invalid(format!("duplicate tier name '{}'", tier.name)));
            }
            if tier.keywords.is_empty() {
                return Err(RulesError::Invalid(format!("tier '{}' has no keywords", tier.name)));
            }
            // An empty keyword would match every name
            if tier.keywords.iter().any(|k| k.trim().is_empty()) {
                return Err(RulesError::Invalid(format!("tier '{}' has an empty keyword", tier.name)));
            }
        }

        Ok(())
    }
}
