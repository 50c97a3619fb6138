use serde::Serialize;
use std::collections::HashSet;

use crate::catalog::store::ReferenceDatabase;
use crate::core::record::NutritionData;
use crate::core::reference::ReferenceFood;
use crate::core::types::Nutrition;
use crate::scoring::rules::{first_band, Band, CalorieMetric, RulesError, ScoringRules, MAX_SCORE, MIN_SCORE};

/// Scores above this pass without a second look
pub const PASS_THRESHOLD: u8 = 7;

/// Calories per gram of each macro
const PROTEIN_KCAL_PER_GRAM: f64 = 4.0;
const FAT_KCAL_PER_GRAM: f64 = 9.0;
const CARBS_KCAL_PER_GRAM: f64 = 4.0;

/// Recommendation derived from a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Score above the threshold
    Pass,
    /// Ask the user to confirm and offer alternatives
    Reconsider,
}

impl Verdict {
    #[must_use]
    pub fn from_score(score: u8) -> Self {
        if score > PASS_THRESHOLD {
            Self::Pass
        } else {
            Self::Reconsider
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "pass"),
            Self::Reconsider => write!(f, "reconsider"),
        }
    }
}

/// One rule that moved the score
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreAdjustment {
    pub reason: String,
    pub delta: i32,
}

/// A health score with its breakdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthScore {
    /// Final score in `1..=10`
    pub score: u8,
    pub base: i32,
    pub adjustments: Vec<ScoreAdjustment>,
    /// Base plus all deltas, before clamping
    pub raw: i32,
    pub verdict: Verdict,
}

/// A catalog food offered instead of a low-scoring one
#[derive(Debug, Clone, Serialize)]
pub struct Alternative<'a> {
    pub food: &'a ReferenceFood,
    pub score: HealthScore,
}

/// Applies a [`ScoringRules`] table in one accumulating pass
#[derive(Debug, Clone)]
pub struct HealthScorer {
    rules: ScoringRules,
}

impl HealthScorer {
    pub fn new(rules: ScoringRules) -> Self {
        Self { rules }
    }

    /// Scorer using the embedded default table
    pub fn embedded() -> Result<Self, RulesError> {
        Ok(Self::new(ScoringRules::load_embedded()?))
    }

    pub fn rules(&self) -> &ScoringRules {
        &self.rules
    }

    /// The bare 1–10 score for a food
    pub fn calculate_health_score(&self, food_name: &str, nutrition: &Nutrition) -> u8 {
        self.score(food_name, nutrition).score
    }

    /// Score a resolved record at its displayed nutrition
    pub fn score_record(&self, record: &NutritionData) -> HealthScore {
        self.score(&record.food_name, &record.nutrition.as_nutrition())
    }

    /// Score a food with the full breakdown
    pub fn score(&self, food_name: &str, nutrition: &Nutrition) -> HealthScore {
        let mut adjustments = Vec::new();

        self.apply_calorie_band(nutrition, &mut adjustments);
        self.apply_macro_bands(nutrition, &mut adjustments);
        self.apply_keyword_tiers(food_name, &mut adjustments);

        let base = self.rules.base_score;
        let raw = base + adjustments.iter().map(|a| a.delta).sum::<i32>();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // Clamped to 1..=10
        let score = raw.clamp(MIN_SCORE, MAX_SCORE) as u8;

        HealthScore {
            score,
            base,
            adjustments,
            raw,
            verdict: Verdict::from_score(score),
        }
    }

    /// Completed foods from the catalog whose own serving passes, best
    /// first (catalog order breaks ties)
    pub fn suggest_alternatives<'a>(&self, db: &'a ReferenceDatabase, limit: usize) -> Vec<Alternative<'a>> {
        let mut passing: Vec<Alternative<'a>> = db
            .completed_foods
            .iter()
            .map(|food| Alternative {
                food,
                score: self.score(&food.name, &food.nutrition),
            })
            .filter(|a| a.score.verdict == Verdict::Pass)
            .collect();

        passing.sort_by(|a, b| b.score.score.cmp(&a.score.score));
        passing.truncate(limit);
        passing
    }

    fn apply_calorie_band(&self, nutrition: &Nutrition, adjustments: &mut Vec<ScoreAdjustment>) {
        let (value, label) = match self.rules.calorie_metric {
            CalorieMetric::Absolute => (nutrition.calories, "kcal"),
            CalorieMetric::CaloriesPerProteinGram => {
                if nutrition.protein <= 0.0 {
                    return;
                }
                (nutrition.calories / nutrition.protein, "kcal per g protein")
            }
        };
        push_band(&self.rules.calorie_bands, value, adjustments, |v| format!("calories {v:.1} {label}"));
    }

    fn apply_macro_bands(&self, nutrition: &Nutrition, adjustments: &mut Vec<ScoreAdjustment>) {
        if nutrition.calories <= 0.0 {
            return;
        }
        let bands = &self.rules.macro_bands;
        let fractions = [
            ("protein", &bands.protein, nutrition.protein * PROTEIN_KCAL_PER_GRAM),
            ("fat", &bands.fat, nutrition.fat * FAT_KCAL_PER_GRAM),
            ("carbs", &bands.carbs, nutrition.carbs * CARBS_KCAL_PER_GRAM),
        ];
        for (macro_name, list, kcal) in fractions {
            let fraction = kcal / nutrition.calories;
            push_band(list, fraction, adjustments, |v| format!("{macro_name} {:.0}% of calories", v * 100.0));
        }
    }

    fn apply_keyword_tiers(&self, food_name: &str, adjustments: &mut Vec<ScoreAdjustment>) {
        let name = food_name.to_lowercase();
        let mut matched_groups: HashSet<&str> = HashSet::new();

        for tier in &self.rules.keyword_tiers {
            if let Some(group) = tier.group.as_deref() {
                if matched_groups.contains(group) {
                    continue;
                }
            }
            let Some(keyword) = tier.matching_keyword(&name) else {
                continue;
            };
            if let Some(group) = tier.group.as_deref() {
                matched_groups.insert(group);
            }
            adjustments.push(ScoreAdjustment {
                reason: format!("{} ('{keyword}')", tier.name),
                delta: tier.delta,
            });
        }
    }
}

fn push_band(bands: &[Band], value: f64, adjustments: &mut Vec<ScoreAdjustment>, reason: impl Fn(f64) -> String) {
    if !value.is_finite() {
        return;
    }
    if let Some(band) = first_band(bands, value) {
        // A zero band still stops later bands from matching
        if band.delta != 0 {
            adjustments.push(ScoreAdjustment {
                reason: reason(value),
                delta: band.delta,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::rules::{KeywordTier, MacroBands};

    fn default_scorer() -> HealthScorer {
        HealthScorer::embedded().unwrap()
    }

    #[test]
    fn test_pork_belly_scores_low() {
        let scorer = default_scorer();
        let result = scorer.score("삼겹살", &Nutrition::new(993.0, 51.6, 85.2, 0.0));

        // 5 base, -1 calories, +1 protein, -2 fat, -2 greasy
        assert_eq!(result.raw, 1);
        assert_eq!(result.score, 1);
        assert_eq!(result.verdict, Verdict::Reconsider);
        assert!(result.adjustments.iter().any(|a| a.reason.starts_with("greasy") && a.delta == -2));
    }

    #[test]
    fn test_chicken_breast_passes() {
        let scorer = default_scorer();
        let result = scorer.score("닭가슴살", &Nutrition::new(165.0, 31.0, 3.6, 0.0));
        // 5 base, +2 calories, +2 protein, +3 top tier
        assert_eq!(result.raw, 12);
        assert_eq!(result.score, 10);
        assert_eq!(result.verdict, Verdict::Pass);
    }

    #[test]
    fn test_score_clamped_low() {
        let scorer = default_scorer();
        let score = scorer.calculate_health_score("감자튀김 치킨 피자 케이크", &Nutrition::new(3000.0, 10.0, 200.0, 200.0));
        assert_eq!(score, 1);
    }

    #[test]
    fn test_conflicting_tiers_stay_in_range() {
        let scorer = default_scorer();
        for (name, n) in [
            ("닭가슴살 샐러드 피자", Nutrition::new(150.0, 40.0, 0.0, 0.0)),
            ("연어 햄버거", Nutrition::new(2000.0, 0.0, 220.0, 0.0)),
            ("", Nutrition::zero()),
        ] {
            let score = scorer.calculate_health_score(name, &n);
            assert!((1..=10).contains(&score), "{name}: {score}");
        }
    }

    #[test]
    fn test_beverage_ladder_first_match_only() {
        let scorer = default_scorer();
        let zero = scorer.score("제로콜라", &Nutrition::zero());
        let sugary = scorer.score("콜라", &Nutrition::new(140.0, 0.0, 0.0, 35.0));

        let beverage = |s: &HealthScore| {
            s.adjustments
                .iter()
                .filter(|a| a.reason.contains("soda"))
                .map(|a| a.delta)
                .collect::<Vec<_>>()
        };
        assert_eq!(beverage(&zero), vec![-2]);
        assert_eq!(beverage(&sugary), vec![-3]);
    }

    #[test]
    fn test_zero_calories_skip_ratio_bands() {
        let scorer = default_scorer();
        let result = scorer.score("생수", &Nutrition::zero());
        // 5 base, +2 calories, +1 water
        assert_eq!(result.raw, 8);
        assert!(result.adjustments.iter().all(|a| !a.reason.contains("% of calories")));
    }

    #[test]
    fn test_protein_density_metric() {
        let rules = ScoringRules {
            base_score: 6,
            calorie_metric: CalorieMetric::CaloriesPerProteinGram,
            calorie_bands: vec![
                Band { min: None, max: Some(10.0), delta: 3 },
                Band { min: Some(10.0), max: Some(15.0), delta: 2 },
                Band { min: Some(50.0), max: None, delta: -1 },
            ],
            macro_bands: MacroBands::default(),
            keyword_tiers: Vec::new(),
        };
        let scorer = HealthScorer::new(rules);
        assert_eq!(scorer.calculate_health_score("x", &Nutrition::new(165.0, 31.0, 3.6, 0.0)), 9);
        assert_eq!(scorer.calculate_health_score("x", &Nutrition::new(500.0, 5.0, 20.0, 70.0)), 5);
        // No protein: the band is skipped
        assert_eq!(scorer.calculate_health_score("x", &Nutrition::new(100.0, 0.0, 0.0, 25.0)), 6);
    }

    #[test]
    fn test_keyword_case_insensitive_scoring() {
        let rules = ScoringRules {
            base_score: 5,
            calorie_metric: CalorieMetric::Absolute,
            calorie_bands: Vec::new(),
            macro_bands: MacroBands::default(),
            keyword_tiers: vec![KeywordTier {
                name: "salad".to_string(),
                delta: 3,
                keywords: vec!["salad".to_string()],
                group: None,
            }],
        };
        let scorer = HealthScorer::new(rules);
        assert_eq!(scorer.calculate_health_score("Caesar SALAD", &Nutrition::zero()), 8);
    }

    #[test]
    fn test_suggest_alternatives() {
        let db = ReferenceDatabase::load_embedded().unwrap();
        let scorer = default_scorer();
        let alternatives = scorer.suggest_alternatives(&db, 3);
        assert!(!alternatives.is_empty());
        assert!(alternatives.len() <= 3);
        assert!(alternatives.iter().all(|a| a.score.verdict == Verdict::Pass));
        assert!(alternatives.windows(2).all(|w| w[0].score.score >= w[1].score.score));
    }

    #[test]
    fn test_verdict_threshold() {
        assert_eq!(Verdict::from_score(7), Verdict::Reconsider);
        assert_eq!(Verdict::from_score(8), Verdict::Pass);
    }
}
